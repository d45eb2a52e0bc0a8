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

//! Syntax tree for HCL bodies.
//!
//! A parsed file is a [`Body`]: attributes (`name = expr`) and nested blocks
//! (`type "label" { ... }`) in source order. Every node keeps the byte spans
//! the resolvers need:
//!
//! - [`Attribute::name_span`]: the attribute's name token
//! - [`Block::header_span`]: block type token through the last label
//! - [`Block::body_span`]: `{` through `}` inclusive
//!
//! Trees are immutable once built. A document edit produces a new tree.

use crate::span::Span;
use std::collections::BTreeMap;

/// A parsed HCL body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    /// Attributes in source order. Duplicates are kept so validation can
    /// report them.
    pub attributes: Vec<Attribute>,
    /// Nested blocks in source order.
    pub blocks: Vec<Block>,
    /// Bytes covered by the body's items (for a block body, the inside of
    /// the braces).
    pub span: Span,
}

impl Body {
    /// First attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns true if an attribute with this name is defined.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Blocks of one type, in source order.
    pub fn blocks_of_type<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |b| b.block_type == block_type)
    }

    /// Blocks grouped by type. Each group keeps source order.
    pub fn blocks_by_type(&self) -> BTreeMap<&str, Vec<&Block>> {
        let mut groups: BTreeMap<&str, Vec<&Block>> = BTreeMap::new();
        for block in &self.blocks {
            groups.entry(block.block_type.as_str()).or_default().push(block);
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.blocks.is_empty()
    }
}

/// `name = expression`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub name_span: Span,
    pub expr: Expression,
    /// Whole definition, name through end of expression.
    pub span: Span,
}

/// A block label, either quoted (`"web"`) or a bare identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub value: String,
    pub span: Span,
}

/// `type "label" ... { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub block_type: String,
    pub type_span: Span,
    pub labels: Vec<Label>,
    /// Type token through the last label.
    pub header_span: Span,
    pub body: Body,
    /// `{` through `}` inclusive. For an unclosed block this runs to the end
    /// of the input.
    pub body_span: Span,
    /// Whole block, header through closing brace.
    pub span: Span,
}

impl Block {
    /// Label values in order.
    pub fn label_values(&self) -> Vec<&str> {
        self.labels.iter().map(|l| l.value.as_str()).collect()
    }
}

/// One piece of a string template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text with escapes already decoded.
    Literal(String),
    /// A `${ ... }` interpolation.
    Interpolation(Box<Expression>),
    /// A `%{ ... }` directive; kept opaque.
    Directive(Span),
}

/// An HCL expression.
///
/// Only the forms needed by the language server are modelled in detail;
/// operator, conditional and `for` expressions are kept as
/// [`Expression::Complex`] with their span.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A quoted or heredoc template.
    Template { parts: Vec<TemplatePart>, span: Span },
    Number { value: f64, span: Span },
    Bool { value: bool, span: Span },
    Null { span: Span },
    /// `[a, b, c]`
    Tuple { items: Vec<Expression>, span: Span },
    /// `{ key = value, ... }`
    Object { items: Vec<(Expression, Expression)>, span: Span },
    /// `var.name`, `local.list[0]`, `NOMAD_META`
    Traversal { root: String, path: Vec<String>, span: Span },
    /// `name(args...)`
    FunctionCall { name: String, args: Vec<Expression>, span: Span },
    /// `( expr )`
    Parenthesized { inner: Box<Expression>, span: Span },
    /// Anything involving operators, conditionals or `for`.
    Complex { span: Span },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Self::Template { span, .. }
            | Self::Number { span, .. }
            | Self::Bool { span, .. }
            | Self::Null { span }
            | Self::Tuple { span, .. }
            | Self::Object { span, .. }
            | Self::Traversal { span, .. }
            | Self::FunctionCall { span, .. }
            | Self::Parenthesized { span, .. }
            | Self::Complex { span } => *span,
        }
    }

    /// Short name of the expression's form, used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Template { .. } => "string",
            Self::Number { .. } => "number",
            Self::Bool { .. } => "bool",
            Self::Null { .. } => "null",
            Self::Tuple { .. } => "tuple",
            Self::Object { .. } => "object",
            Self::Traversal { .. } => "variable reference",
            Self::FunctionCall { .. } => "function call",
            Self::Parenthesized { .. } => "expression",
            Self::Complex { .. } => "expression",
        }
    }
}
