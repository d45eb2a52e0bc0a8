// Dweve Nomad LS - Nomad job specification language server
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Schema data model.
//!
//! A [`SchemaNode`] describes what one body may contain. Child blocks are
//! either [`BlockSchema::Unconditional`], with a single nested schema, or
//! [`BlockSchema::Dependent`], where a sibling attribute (the
//! *discriminator*) picks one of several nested schemas by its literal
//! value, the way a task's `driver` picks the shape of its `config` block.

use nomad_hcl::{
    evaluate_literal_string, AttributeShape, Block, BlockShape, Body, BodyShape, EvalError,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Type constraint of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Bool,
    Any,
    List(Box<ValueType>),
    Map(Box<ValueType>),
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map_of(element: ValueType) -> Self {
        Self::Map(Box::new(element))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
            Self::Any => write!(f, "any"),
            Self::List(inner) => write!(f, "list({})", inner),
            Self::Map(inner) => write!(f, "map({})", inner),
        }
    }
}

/// How a completion should pre-fill an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// `name = "$0"`
    String,
    /// `name = ["$0"]`
    ListOfString,
    /// `name = `
    Other,
}

/// Documented default of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<DefaultValue>),
    EmptyMap,
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{:?}", s),
            Self::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::EmptyMap => write!(f, "{{}}"),
        }
    }
}

/// Schema of a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    /// Markdown documentation.
    pub description: String,
    /// Literal type constraint. Attributes without one are never offered as
    /// completions.
    pub constraint: Option<ValueType>,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

impl AttributeSchema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            constraint: None,
            required: false,
            default: None,
        }
    }

    pub fn with_constraint(mut self, constraint: ValueType) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Completion snippet form derived from the constraint, if there is one.
    pub fn literal_kind(&self) -> Option<LiteralKind> {
        self.constraint.as_ref().map(|constraint| match constraint {
            ValueType::String => LiteralKind::String,
            ValueType::List(inner) if **inner == ValueType::String => LiteralKind::ListOfString,
            _ => LiteralKind::Other,
        })
    }
}

/// A named block label (`job "<name>"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    pub name: String,
}

impl LabelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Schema of a nested block type.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockSchema {
    /// The block always has the same body schema.
    Unconditional {
        description: String,
        labels: Vec<LabelSchema>,
        body: Arc<SchemaNode>,
    },
    /// The body schema is chosen by the literal value of the `discriminator`
    /// attribute.
    Dependent {
        description: String,
        labels: Vec<LabelSchema>,
        discriminator: String,
        bodies: BTreeMap<String, Arc<SchemaNode>>,
    },
}

impl BlockSchema {
    pub fn new(description: impl Into<String>, body: SchemaNode) -> Self {
        Self::Unconditional {
            description: description.into(),
            labels: Vec::new(),
            body: Arc::new(body),
        }
    }

    pub fn dependent(description: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self::Dependent {
            description: description.into(),
            labels: Vec::new(),
            discriminator: discriminator.into(),
            bodies: BTreeMap::new(),
        }
    }

    /// Adds a required label.
    pub fn with_label(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Self::Unconditional { labels, .. } | Self::Dependent { labels, .. } => {
                labels.push(LabelSchema::new(name))
            }
        }
        self
    }

    /// Adds the body used when the discriminator equals `value`. No effect
    /// on unconditional blocks.
    pub fn with_variant(mut self, value: impl Into<String>, body: SchemaNode) -> Self {
        if let Self::Dependent { bodies, .. } = &mut self {
            bodies.insert(value.into(), Arc::new(body));
        }
        self
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Unconditional { description, .. } | Self::Dependent { description, .. } => description,
        }
    }

    pub fn labels(&self) -> &[LabelSchema] {
        match self {
            Self::Unconditional { labels, .. } | Self::Dependent { labels, .. } => labels,
        }
    }

    pub fn requires_label(&self) -> bool {
        !self.labels().is_empty()
    }

    /// Picks the body schema for `block`, an instance of this block type
    /// found in `enclosing`.
    ///
    /// The discriminator is looked up among the block's siblings first and
    /// then inside the block itself.
    pub fn select<'s>(&'s self, enclosing: &Body, block: &Block) -> Selection<'s> {
        let (discriminator, bodies) = match self {
            Self::Unconditional { body, .. } => return Selection::Body(body),
            Self::Dependent {
                discriminator,
                bodies,
                ..
            } => (discriminator.as_str(), bodies),
        };
        let Some(attribute) = enclosing
            .attribute(discriminator)
            .or_else(|| block.body.attribute(discriminator))
        else {
            return Selection::MissingDiscriminator { discriminator };
        };
        let value = match evaluate_literal_string(&attribute.expr) {
            Ok(value) => value,
            Err(error) => return Selection::Unevaluable { discriminator, error },
        };
        match bodies.get(&value) {
            Some(body) => Selection::Body(body),
            None => Selection::UnknownValue { discriminator, value },
        }
    }
}

/// Outcome of choosing a block's body schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'s> {
    Body(&'s SchemaNode),
    MissingDiscriminator {
        discriminator: &'s str,
    },
    Unevaluable {
        discriminator: &'s str,
        error: EvalError,
    },
    UnknownValue {
        discriminator: &'s str,
        value: String,
    },
}

impl<'s> Selection<'s> {
    pub fn body(&self) -> Option<&'s SchemaNode> {
        match self {
            Self::Body(body) => Some(*body),
            _ => None,
        }
    }
}

/// What one body may contain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaNode {
    pub attributes: BTreeMap<String, AttributeSchema>,
    pub blocks: BTreeMap<String, BlockSchema>,
    /// Arbitrary attribute names are allowed in addition to the declared ones.
    pub open_attributes: bool,
}

impl SchemaNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A body accepting any attribute name (`env`, `meta`).
    pub fn open() -> Self {
        Self {
            open_attributes: true,
            ..Self::default()
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, schema: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), schema);
        self
    }

    pub fn block(mut self, block_type: impl Into<String>, schema: BlockSchema) -> Self {
        self.blocks.insert(block_type.into(), schema);
        self
    }

    pub fn get_attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    pub fn get_block(&self, block_type: &str) -> Option<&BlockSchema> {
        self.blocks.get(block_type)
    }

    /// Projects this node into the parser's structural shape.
    pub fn to_shape(&self) -> BodyShape {
        BodyShape {
            attributes: self
                .attributes
                .iter()
                .map(|(name, schema)| AttributeShape {
                    name: name.clone(),
                    required: schema.required,
                })
                .collect(),
            blocks: self
                .blocks
                .iter()
                .map(|(block_type, schema)| BlockShape {
                    block_type: block_type.clone(),
                    labels: schema.labels().iter().map(|l| l.name.clone()).collect(),
                })
                .collect(),
            open_attributes: self.open_attributes,
        }
    }
}
