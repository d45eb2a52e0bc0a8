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

//! Schema-driven autocompletion for Nomad job files.
//!
//! Completion descends through the blocks whose `{ ... }` contains the
//! cursor, exactly as hover does, and offers the contents of the innermost
//! one: every block type its schema declares, and every typed attribute that
//! is not already set there.
//!
//! # Snippets
//!
//! ```text
//! group "${1:name}" {      labelled block
//! 	$0
//! }
//! update {                 anonymous block
//! 	$0
//! }
//! driver = "$0"            string attribute
//! datacenters = ["$0"]     list of strings
//! count =                  anything else
//! ```

use crate::analysis::AnalyzedDocument;
use crate::constants::{SNIPPET_CURSOR, SNIPPET_LABEL};
use crate::position::position_to_byte_offset;
use nomad_hcl::Body;
use nomad_schema::{AttributeSchema, Catalog, LiteralKind, SchemaNode};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Whether a candidate inserts a block or an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Block,
    Attribute,
}

/// A completion candidate, before conversion to the protocol type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    /// Snippet text with `$0` / `${1:name}` tab stops.
    pub insert_text: String,
    pub kind: CandidateKind,
    /// Markdown.
    pub documentation: String,
    /// Type and default of an attribute.
    pub detail: Option<String>,
}

/// Candidates for the innermost body containing `offset`.
///
/// Blocks the schema does not declare are skipped, so the cursor is treated
/// as sitting in the enclosing body. Returns nothing inside a dependent
/// block whose discriminator does not resolve.
pub fn resolve_completions(body: &Body, schema: &SchemaNode, offset: usize) -> Vec<CompletionCandidate> {
    for block in &body.blocks {
        if !block.body_span.contains(offset) {
            continue;
        }
        let Some(block_schema) = schema.get_block(&block.block_type) else {
            debug!("Cursor inside undeclared {} block, using enclosing body", block.block_type);
            continue;
        };
        return match block_schema.select(body, block).body() {
            Some(child) => resolve_completions(&block.body, child, offset),
            None => {
                debug!("No body schema selected for {} block, no completions", block.block_type);
                Vec::new()
            }
        };
    }

    candidates_for(body, schema)
}

fn candidates_for(body: &Body, schema: &SchemaNode) -> Vec<CompletionCandidate> {
    let mut candidates = Vec::with_capacity(schema.blocks.len() + schema.attributes.len());

    for (block_type, block_schema) in &schema.blocks {
        let insert_text = if block_schema.requires_label() {
            format!("{} \"{}\" {{\n\t{}\n}}", block_type, SNIPPET_LABEL, SNIPPET_CURSOR)
        } else {
            format!("{} {{\n\t{}\n}}", block_type, SNIPPET_CURSOR)
        };
        candidates.push(CompletionCandidate {
            label: block_type.clone(),
            insert_text,
            kind: CandidateKind::Block,
            documentation: block_schema.description().to_string(),
            detail: None,
        });
    }

    for (name, attribute_schema) in &schema.attributes {
        let Some(kind) = attribute_schema.literal_kind() else {
            continue;
        };
        if body.has_attribute(name) {
            continue;
        }
        let insert_text = match kind {
            LiteralKind::String => format!("{} = \"{}\"", name, SNIPPET_CURSOR),
            LiteralKind::ListOfString => format!("{} = [\"{}\"]", name, SNIPPET_CURSOR),
            LiteralKind::Other => format!("{} = ", name),
        };
        candidates.push(CompletionCandidate {
            label: name.clone(),
            insert_text,
            kind: CandidateKind::Attribute,
            documentation: attribute_schema.description.clone(),
            detail: attribute_detail(attribute_schema),
        });
    }

    candidates
}

fn attribute_detail(schema: &AttributeSchema) -> Option<String> {
    let constraint = schema.constraint.as_ref()?;
    Some(match &schema.default {
        Some(default) => format!("{} = {}", constraint, default),
        None => constraint.to_string(),
    })
}

/// Get completions for a position in the document.
pub fn get_completions(
    analysis: &AnalyzedDocument,
    catalog: &Catalog,
    content: &str,
    position: Position,
) -> Vec<CompletionItem> {
    let offset = position_to_byte_offset(content, position.line, position.character);
    resolve_completions(&analysis.body, catalog.root(), offset)
        .into_iter()
        .map(to_completion_item)
        .collect()
}

fn to_completion_item(candidate: CompletionCandidate) -> CompletionItem {
    let kind = match candidate.kind {
        CandidateKind::Block => CompletionItemKind::INTERFACE,
        CandidateKind::Attribute => CompletionItemKind::VARIABLE,
    };
    CompletionItem {
        label: candidate.label,
        kind: Some(kind),
        detail: candidate.detail,
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: candidate.documentation,
        })),
        insert_text: Some(candidate.insert_text),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_hcl::parse;
    use nomad_schema::{BlockSchema, DefaultValue, ValueType};

    fn schema() -> SchemaNode {
        SchemaNode::new()
            .attribute("x", AttributeSchema::new("X.").with_constraint(ValueType::String))
            .attribute(
                "y",
                AttributeSchema::new("Y.").with_constraint(ValueType::list_of(ValueType::String)),
            )
            .attribute(
                "z",
                AttributeSchema::new("Z.")
                    .with_constraint(ValueType::Number)
                    .with_default(DefaultValue::Number(3.0)),
            )
            .attribute("untyped", AttributeSchema::new("Untyped."))
            .block("named", BlockSchema::new("Named.", SchemaNode::new()).with_label("name"))
            .block("plain", BlockSchema::new("Plain.", SchemaNode::new()))
    }

    fn insert_text_for<'a>(candidates: &'a [CompletionCandidate], label: &str) -> Option<&'a str> {
        candidates
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.insert_text.as_str())
    }

    #[test]
    fn test_snippet_forms() {
        let parsed = parse("");
        let candidates = resolve_completions(&parsed.body, &schema(), 0);
        assert_eq!(insert_text_for(&candidates, "x"), Some("x = \"$0\""));
        assert_eq!(insert_text_for(&candidates, "y"), Some("y = [\"$0\"]"));
        assert_eq!(insert_text_for(&candidates, "z"), Some("z = "));
        assert_eq!(insert_text_for(&candidates, "named"), Some("named \"${1:name}\" {\n\t$0\n}"));
        assert_eq!(insert_text_for(&candidates, "plain"), Some("plain {\n\t$0\n}"));
    }

    #[test]
    fn test_untyped_attributes_are_skipped() {
        let parsed = parse("");
        let candidates = resolve_completions(&parsed.body, &schema(), 0);
        assert!(insert_text_for(&candidates, "untyped").is_none());
        assert_eq!(candidates.len(), 5);
    }

    #[test]
    fn test_present_attributes_are_excluded() {
        let src = "x = \"set\"\n\n";
        let parsed = parse(src);
        let candidates = resolve_completions(&parsed.body, &schema(), src.len());
        assert!(insert_text_for(&candidates, "x").is_none());
        assert!(insert_text_for(&candidates, "y").is_some());
    }

    #[test]
    fn test_detail_includes_default() {
        let parsed = parse("");
        let candidates = resolve_completions(&parsed.body, &schema(), 0);
        let z = candidates.iter().find(|c| c.label == "z").unwrap();
        assert_eq!(z.detail.as_deref(), Some("number = 3"));
        assert_eq!(z.kind, CandidateKind::Attribute);
        let plain = candidates.iter().find(|c| c.label == "plain").unwrap();
        assert_eq!(plain.kind, CandidateKind::Block);
        assert_eq!(plain.documentation, "Plain.");
    }

    #[test]
    fn test_descends_into_containing_block() {
        let src = "plain {\n  \n}\n";
        let parsed = parse(src);
        let inside = src.find("\n  ").unwrap() + 2;
        assert!(resolve_completions(&parsed.body, &schema(), inside).is_empty());

        let outside = src.len();
        assert_eq!(resolve_completions(&parsed.body, &schema(), outside).len(), 5);
    }

    #[test]
    fn test_undeclared_block_offers_enclosing_candidates() {
        let src = "mystery {\n  \n}\n";
        let parsed = parse(src);
        let inside = src.find("\n  ").unwrap() + 2;
        let labels: Vec<String> = resolve_completions(&parsed.body, &schema(), inside)
            .into_iter()
            .map(|c| c.label)
            .collect();
        let outside: Vec<String> = resolve_completions(&parsed.body, &schema(), src.len())
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels, outside);
    }

    #[test]
    fn test_completion_item_conversion() {
        let item = to_completion_item(CompletionCandidate {
            label: "driver".to_string(),
            insert_text: "driver = \"$0\"".to_string(),
            kind: CandidateKind::Attribute,
            documentation: "Driver.".to_string(),
            detail: Some("string".to_string()),
        });
        assert_eq!(item.kind, Some(CompletionItemKind::VARIABLE));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::SNIPPET));
        assert_eq!(item.insert_text.as_deref(), Some("driver = \"$0\""));
    }
}
