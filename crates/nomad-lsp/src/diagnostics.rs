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

//! Schema validation of a parsed job file.
//!
//! Each body is checked against the structural shape of its schema node,
//! then every declared child block is validated recursively. Dependent
//! blocks are validated against the body their discriminator selects; when
//! the discriminator is missing, not a literal string, or names an unknown
//! variant, the block is skipped without a diagnostic.

use nomad_hcl::{validate_content, Block, Body, Diagnostic, Span};
use nomad_schema::{SchemaNode, Selection};
use tracing::debug;

/// Validates `body` against `schema` and all nested blocks against their
/// selected schemas. Findings are returned in traversal order.
pub fn collect_diagnostics(body: &Body, schema: &SchemaNode) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    collect_into(body, schema, Span::point(body.span.end), &mut diagnostics);
    diagnostics
}

fn collect_into(body: &Body, schema: &SchemaNode, missing_item_span: Span, out: &mut Vec<Diagnostic>) {
    out.extend(validate_content(body, &schema.to_shape(), missing_item_span));

    for block in &body.blocks {
        let Some(block_schema) = schema.get_block(&block.block_type) else {
            continue;
        };
        match block_schema.select(body, block) {
            Selection::Body(child) => collect_into(&block.body, child, closing_brace(block), out),
            Selection::MissingDiscriminator { discriminator } => {
                debug!(
                    "Skipping {} block at {}: no {} attribute",
                    block.block_type, block.span, discriminator
                );
            }
            Selection::Unevaluable { discriminator, error } => {
                debug!(
                    "Skipping {} block at {}: {} is not a literal string ({})",
                    block.block_type, block.span, discriminator, error
                );
            }
            Selection::UnknownValue { discriminator, value } => {
                debug!(
                    "Skipping {} block at {}: no schema for {} = {:?}",
                    block.block_type, block.span, discriminator, value
                );
            }
        }
    }
}

/// Span of the `}` closing a block, where missing arguments are reported.
fn closing_brace(block: &Block) -> Span {
    let end = block.body_span.end;
    Span::new(end.saturating_sub(1).max(block.body_span.start), end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_hcl::parse;
    use nomad_schema::{AttributeSchema, BlockSchema, ValueType};

    fn task_schema() -> SchemaNode {
        let config = BlockSchema::dependent("Driver configuration.", "driver")
            .with_variant(
                "docker",
                SchemaNode::new().attribute(
                    "image",
                    AttributeSchema::new("Image.").with_constraint(ValueType::String).required(),
                ),
            )
            .with_variant(
                "exec",
                SchemaNode::new().attribute(
                    "command",
                    AttributeSchema::new("Command.").with_constraint(ValueType::String),
                ),
            );
        SchemaNode::new().block(
            "task",
            BlockSchema::new(
                "Task.",
                SchemaNode::new()
                    .attribute(
                        "driver",
                        AttributeSchema::new("Driver.").with_constraint(ValueType::String).required(),
                    )
                    .block("config", config),
            )
            .with_label("name"),
        )
    }

    fn summaries(src: &str) -> Vec<String> {
        let parsed = parse(src);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        collect_diagnostics(&parsed.body, &task_schema())
            .into_iter()
            .map(|d| d.summary)
            .collect()
    }

    #[test]
    fn test_valid_document() {
        let src = "task \"t\" {\n  driver = \"docker\"\n  config {\n    image = \"redis\"\n  }\n}\n";
        assert!(summaries(src).is_empty());
    }

    #[test]
    fn test_dependent_schema_follows_driver() {
        // `command` belongs to exec, not docker.
        let src = "task \"t\" {\n  driver = \"docker\"\n  config {\n    image = \"redis\"\n    command = \"x\"\n  }\n}\n";
        assert_eq!(summaries(src), vec!["Unsupported argument"]);

        let src = "task \"t\" {\n  driver = \"exec\"\n  config {\n    command = \"x\"\n  }\n}\n";
        assert!(summaries(src).is_empty());
    }

    #[test]
    fn test_missing_discriminator_is_silent() {
        let src = "task \"t\" {\n  config {\n    anything = 1\n  }\n}\n";
        // Only the missing `driver` itself is reported.
        assert_eq!(summaries(src), vec!["Missing required argument"]);
    }

    #[test]
    fn test_unknown_and_unevaluable_drivers_are_silent() {
        let src = "task \"t\" {\n  driver = \"qemu\"\n  config {\n    anything = 1\n  }\n}\n";
        assert!(summaries(src).is_empty());

        let src = "task \"t\" {\n  driver = var.driver\n  config {\n    anything = 1\n  }\n}\n";
        assert!(summaries(src).is_empty());
    }

    #[test]
    fn test_missing_argument_reported_at_closing_brace() {
        let src = "task \"t\" {\n}\n";
        let parsed = parse(src);
        let diagnostics = collect_diagnostics(&parsed.body, &task_schema());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(&src[diagnostics[0].span.start..diagnostics[0].span.end], "}");
    }

    #[test]
    fn test_missing_label() {
        let src = "task {\n  driver = \"exec\"\n}\n";
        assert_eq!(summaries(src), vec!["Missing name for task"]);
    }

    #[test]
    fn test_deterministic_order() {
        let src = "task \"a\" {\n  bogus = 1\n}\ntask \"b\" {\n  driver = \"exec\"\n  other = 2\n}\n";
        let first = summaries(src);
        assert_eq!(first, summaries(src));
        assert_eq!(first.len(), 3);
    }
}
