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

//! Hover information for Nomad job files.
//!
//! Hover walks the parsed body and the schema catalog side by side, one
//! nesting level at a time, and stops at the innermost schema entry whose
//! name token is under the cursor.
//!
//! # Resolution Order
//!
//! At each level:
//!
//! 1. A block whose header (type and labels) contains the cursor yields the
//!    block type's description.
//! 2. A block whose `{ ... }` body contains the cursor is descended into,
//!    using the body schema selected for it. Dependent blocks such as a
//!    task's `config` descend only when the `driver` resolves.
//! 3. Otherwise an attribute whose name contains the cursor yields the
//!    attribute's description.
//!
//! Blocks are checked before attributes, so a name declared as both at one
//! level resolves to the block.

use crate::analysis::AnalyzedDocument;
use crate::position::{position_to_byte_offset, span_to_range_with};
use nomad_hcl::{Body, Span};
use nomad_schema::{AttributeSchema, BlockSchema, Catalog, SchemaNode};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// What the cursor is on.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverTarget<'s> {
    Block {
        block_type: String,
        schema: &'s BlockSchema,
    },
    Attribute {
        name: String,
        schema: &'s AttributeSchema,
    },
}

/// A resolved hover: the schema entry and the source token it was found on.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverMatch<'s> {
    pub target: HoverTarget<'s>,
    pub span: Span,
}

impl<'s> HoverMatch<'s> {
    pub fn description(&self) -> &'s str {
        match &self.target {
            HoverTarget::Block { schema, .. } => schema.description(),
            HoverTarget::Attribute { schema, .. } => &schema.description,
        }
    }
}

/// Finds the schema entry under `offset`, starting from `schema` as the
/// schema of `body`.
pub fn find_hover<'s>(body: &Body, schema: &'s SchemaNode, offset: usize) -> Option<HoverMatch<'s>> {
    for (block_type, blocks) in body.blocks_by_type() {
        let Some(block_schema) = schema.get_block(block_type) else {
            continue;
        };
        for block in blocks {
            if !block.body_span.contains(offset) {
                if block.header_span.contains(offset) {
                    return Some(HoverMatch {
                        target: HoverTarget::Block {
                            block_type: block_type.to_string(),
                            schema: block_schema,
                        },
                        span: block.header_span,
                    });
                }
                continue;
            }

            // Sibling bodies never overlap, so this is the only candidate.
            return match block_schema.select(body, block).body() {
                Some(child) => find_hover(&block.body, child, offset),
                None => {
                    debug!("No body schema selected for {} block, hover stops", block_type);
                    None
                }
            };
        }
    }

    body.attributes
        .iter()
        .filter(|attribute| attribute.name_span.contains(offset))
        .find_map(|attribute| {
            schema.get_attribute(&attribute.name).map(|attribute_schema| HoverMatch {
                target: HoverTarget::Attribute {
                    name: attribute.name.clone(),
                    schema: attribute_schema,
                },
                span: attribute.name_span,
            })
        })
}

/// Description of the schema entry under `offset`, or `""` if there is none.
pub fn resolve_hover(body: &Body, schema: &SchemaNode, offset: usize) -> String {
    find_hover(body, schema, offset)
        .map(|found| found.description().to_string())
        .unwrap_or_default()
}

/// Hover text at `offset` for a whole document, as a one-element list.
pub fn collect_hover_info(body: &Body, catalog: &Catalog, offset: usize) -> Vec<String> {
    vec![resolve_hover(body, catalog.root(), offset)]
}

/// Get hover information for a position.
///
/// Returns `None` when the cursor is not on a documented name.
pub fn get_hover(
    analysis: &AnalyzedDocument,
    catalog: &Catalog,
    content: &str,
    position: Position,
) -> Option<Hover> {
    let offset = position_to_byte_offset(content, position.line, position.character);
    let found = find_hover(&analysis.body, catalog.root(), offset)?;
    if found.description().is_empty() {
        return None;
    }

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: render_markdown(&found),
        }),
        range: Some(span_to_range_with(&analysis.line_index, content, found.span)),
    })
}

fn render_markdown(found: &HoverMatch<'_>) -> String {
    match &found.target {
        HoverTarget::Block { .. } => found.description().to_string(),
        HoverTarget::Attribute { schema, .. } => {
            let mut value = found.description().to_string();
            let mut facts = Vec::new();
            if let Some(constraint) = &schema.constraint {
                facts.push(format!("Type: `{}`", constraint));
            }
            if schema.required {
                facts.push("Required".to_string());
            }
            if let Some(default) = &schema.default {
                facts.push(format!("Default: `{}`", default));
            }
            if !facts.is_empty() {
                value.push_str("\n\n");
                value.push_str(&facts.join(" · "));
            }
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_hcl::parse;
    use nomad_schema::ValueType;

    fn schema() -> SchemaNode {
        SchemaNode::new().block(
            "job",
            BlockSchema::new(
                "Job block.",
                SchemaNode::new()
                    .attribute(
                        "region",
                        AttributeSchema::new("Region.").with_constraint(ValueType::String),
                    )
                    .attribute("update", AttributeSchema::new("Update attribute."))
                    .block("update", BlockSchema::new("Update block.", SchemaNode::new())),
            )
            .with_label("name"),
        )
    }

    fn offset_of(src: &str, needle: &str) -> usize {
        src.find(needle).unwrap()
    }

    #[test]
    fn test_hover_block_type() {
        let src = "job \"web\" {\n  region = \"global\"\n}\n";
        let parsed = parse(src);
        assert_eq!(resolve_hover(&parsed.body, &schema(), 1), "Job block.");
        // The label belongs to the header too.
        assert_eq!(resolve_hover(&parsed.body, &schema(), offset_of(src, "web")), "Job block.");
    }

    #[test]
    fn test_hover_nested_attribute() {
        let src = "job \"web\" {\n  region = \"global\"\n}\n";
        let parsed = parse(src);
        let offset = offset_of(src, "region") + 2;
        assert_eq!(resolve_hover(&parsed.body, &schema(), offset), "Region.");
    }

    #[test]
    fn test_hover_on_value_is_empty() {
        let src = "job \"web\" {\n  region = \"global\"\n}\n";
        let parsed = parse(src);
        let offset = offset_of(src, "global");
        assert_eq!(resolve_hover(&parsed.body, &schema(), offset), "");
    }

    #[test]
    fn test_block_wins_over_attribute_of_same_name() {
        let src = "job \"web\" {\n  update {}\n}\n";
        let parsed = parse(src);
        let offset = offset_of(src, "update") + 1;
        assert_eq!(resolve_hover(&parsed.body, &schema(), offset), "Update block.");
    }

    #[test]
    fn test_unknown_block_is_skipped() {
        let src = "mystery {\n  region = \"x\"\n}\n";
        let parsed = parse(src);
        let offset = offset_of(src, "region");
        assert_eq!(resolve_hover(&parsed.body, &schema(), offset), "");
    }

    #[test]
    fn test_collect_hover_info_is_single_element() {
        let parsed = parse("");
        let info = collect_hover_info(&parsed.body, &Catalog::nomad(), 0);
        assert_eq!(info, vec![String::new()]);
    }

    #[test]
    fn test_render_attribute_facts() {
        let attribute = AttributeSchema::new("Count.")
            .with_constraint(ValueType::Number)
            .required();
        let found = HoverMatch {
            target: HoverTarget::Attribute {
                name: "count".to_string(),
                schema: &attribute,
            },
            span: Span::new(0, 5),
        };
        assert_eq!(render_markdown(&found), "Count.\n\nType: `number` · Required");
    }
}
