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

//! Structural validation of a body against the set of names it may contain.
//!
//! A [`BodyShape`] lists the attributes and block types allowed at one
//! nesting level. [`validate_content`] checks a single [`Body`] against it
//! without descending into nested blocks; callers walk the tree and pick the
//! shape for each level themselves.

use crate::ast::Body;
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use std::collections::HashMap;

/// An attribute allowed in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeShape {
    pub name: String,
    pub required: bool,
}

/// A block type allowed in a body, with the names of its labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockShape {
    pub block_type: String,
    pub labels: Vec<String>,
}

/// The attributes and block types permitted at one nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyShape {
    pub attributes: Vec<AttributeShape>,
    pub blocks: Vec<BlockShape>,
    /// Attributes not listed above are accepted too (`env`, `meta`, `locals`).
    pub open_attributes: bool,
}

impl BodyShape {
    pub fn attribute(&self, name: &str) -> Option<&AttributeShape> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn block(&self, block_type: &str) -> Option<&BlockShape> {
        self.blocks.iter().find(|b| b.block_type == block_type)
    }
}

/// Validates the items of `body` against `shape`.
///
/// Findings are returned in source order: attributes first, then blocks,
/// then one "Missing required argument" per absent required attribute
/// anchored at `missing_item_span` (typically the closing brace of the
/// enclosing block).
///
/// # Examples
///
/// ```
/// use nomad_hcl::{parse, validate_content, AttributeShape, BodyShape, Span};
///
/// let parsed = parse("name = \"a\"\nextra = 1\n");
/// let shape = BodyShape {
///     attributes: vec![AttributeShape { name: "name".into(), required: true }],
///     blocks: vec![],
///     open_attributes: false,
/// };
/// let diags = validate_content(&parsed.body, &shape, Span::point(0));
/// assert_eq!(diags.len(), 1);
/// assert_eq!(diags[0].summary, "Unsupported argument");
/// ```
pub fn validate_content(body: &Body, shape: &BodyShape, missing_item_span: Span) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen: HashMap<&str, Span> = HashMap::new();

    for attribute in &body.attributes {
        let name = attribute.name.as_str();
        if shape.attribute(name).is_none() && !shape.open_attributes {
            let detail = if shape.block(name).is_some() {
                format!(
                    "An argument named \"{}\" is not expected here. Did you mean to define a block of type \"{}\"?",
                    name, name
                )
            } else {
                let mut detail = format!("An argument named \"{}\" is not expected here.", name);
                if let Some(suggestion) = suggest(name, shape.attributes.iter().map(|a| a.name.as_str())) {
                    detail.push_str(&format!(" Did you mean \"{}\"?", suggestion));
                }
                detail
            };
            diagnostics.push(Diagnostic::error("Unsupported argument", detail, attribute.name_span));
            continue;
        }
        if seen.insert(name, attribute.name_span).is_some() {
            diagnostics.push(Diagnostic::error(
                "Duplicate argument",
                format!(
                    "The argument \"{}\" was already set. Each argument may be set only once.",
                    name
                ),
                attribute.name_span,
            ));
        }
    }

    for block in &body.blocks {
        let block_type = block.block_type.as_str();
        let Some(block_shape) = shape.block(block_type) else {
            let detail = if shape.attribute(block_type).is_some() {
                format!(
                    "Blocks of type \"{}\" are not expected here. Did you mean to define argument \"{}\"? If so, use the equals sign to assign it a value.",
                    block_type, block_type
                )
            } else {
                let mut detail = format!("Blocks of type \"{}\" are not expected here.", block_type);
                if let Some(suggestion) = suggest(block_type, shape.blocks.iter().map(|b| b.block_type.as_str())) {
                    detail.push_str(&format!(" Did you mean \"{}\"?", suggestion));
                }
                detail
            };
            diagnostics.push(Diagnostic::error("Unsupported block type", detail, block.type_span));
            continue;
        };

        let expected = block_shape.labels.len();
        let found = block.labels.len();
        if found < expected {
            let missing = &block_shape.labels[found];
            let detail = if expected == 1 {
                format!("All {} blocks must have 1 label ({}).", block_type, missing)
            } else {
                format!(
                    "All {} blocks must have {} labels ({}).",
                    block_type,
                    expected,
                    block_shape.labels.join(", ")
                )
            };
            let span = Span::new(block.header_span.end, block.body_span.start.max(block.header_span.end));
            diagnostics.push(Diagnostic::error(
                format!("Missing {} for {}", missing, block_type),
                detail,
                if span.is_empty() { block.type_span } else { span },
            ));
        } else if found > expected {
            let extra = &block.labels[expected];
            let detail = if expected == 0 {
                format!("No labels are expected for {} blocks.", block_type)
            } else {
                "No more labels are expected.".to_string()
            };
            diagnostics.push(Diagnostic::error(
                format!("Extraneous label for {}", block_type),
                detail,
                extra.span,
            ));
        }
    }

    for required in shape.attributes.iter().filter(|a| a.required) {
        if !body.has_attribute(&required.name) {
            diagnostics.push(Diagnostic::error(
                "Missing required argument",
                format!(
                    "The argument \"{}\" is required, but no definition was found.",
                    required.name
                ),
                missing_item_span,
            ));
        }
    }

    diagnostics
}

/// Closest candidate within edit distance 2, if any.
fn suggest<'a>(given: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .map(|candidate| (levenshtein(given, candidate), candidate))
        .filter(|(distance, _)| *distance < 3)
        .min()
        .map(|(_, candidate)| candidate)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b_chars.len()]
}
