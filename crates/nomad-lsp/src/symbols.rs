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

//! Document symbols for Nomad job files.
//!
//! The outline mirrors the block tree: `job "web"` contains `group "api"`,
//! which contains `task "server"`, and so on. Attributes appear as leaf
//! fields whose detail is their (possibly truncated) source text.
//!
//! # Error Handling
//!
//! Symbols come from the recovered body, so a document with syntax errors
//! still gets an outline of whatever parsed.

use crate::analysis::AnalyzedDocument;
use crate::constants::SYMBOL_DETAIL_MAX_BYTES;
use crate::position::{safe_slice_to, span_text, span_to_range_with};
use nomad_hcl::{Attribute, Block, Body, LineIndex};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Get document symbols for outline view.
pub fn get_document_symbols(analysis: &AnalyzedDocument, content: &str) -> Vec<DocumentSymbol> {
    if analysis.body.is_empty() {
        debug!("Empty document, no symbols to extract");
        return Vec::new();
    }
    body_symbols(&analysis.body, &analysis.line_index, content)
}

fn body_symbols(body: &Body, index: &LineIndex, content: &str) -> Vec<DocumentSymbol> {
    let mut symbols: Vec<DocumentSymbol> = body
        .attributes
        .iter()
        .map(|attribute| attribute_symbol(attribute, index, content))
        .collect();
    symbols.extend(body.blocks.iter().map(|block| block_symbol(block, index, content)));
    symbols.sort_by_key(|symbol| (symbol.range.start.line, symbol.range.start.character));
    symbols
}

#[allow(deprecated)]
fn block_symbol(block: &Block, index: &LineIndex, content: &str) -> DocumentSymbol {
    let mut name = block.block_type.clone();
    for label in &block.labels {
        name.push_str(&format!(" \"{}\"", label.value));
    }
    let children = body_symbols(&block.body, index, content);

    DocumentSymbol {
        name,
        detail: None,
        kind: if block.labels.is_empty() {
            SymbolKind::OBJECT
        } else {
            SymbolKind::STRUCT
        },
        tags: None,
        deprecated: None,
        range: span_to_range_with(index, content, block.span),
        selection_range: span_to_range_with(index, content, block.header_span),
        children: if children.is_empty() { None } else { Some(children) },
    }
}

#[allow(deprecated)]
fn attribute_symbol(attribute: &Attribute, index: &LineIndex, content: &str) -> DocumentSymbol {
    let value = span_text(content, attribute.expr.span()).trim();
    let detail = if value.len() > SYMBOL_DETAIL_MAX_BYTES {
        format!("{}…", safe_slice_to(value, SYMBOL_DETAIL_MAX_BYTES))
    } else {
        value.to_string()
    };

    DocumentSymbol {
        name: attribute.name.clone(),
        detail: if detail.is_empty() { None } else { Some(detail) },
        kind: SymbolKind::FIELD,
        tags: None,
        deprecated: None,
        range: span_to_range_with(index, content, attribute.span),
        selection_range: span_to_range_with(index, content, attribute.name_span),
        children: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_schema::Catalog;

    #[test]
    fn test_nested_outline() {
        let content = "job \"web\" {\n  type = \"service\"\n  group \"api\" {\n    task \"server\" {\n      driver = \"docker\"\n    }\n  }\n}\n";
        let analysis = AnalyzedDocument::analyze(content, &Catalog::nomad());
        let symbols = get_document_symbols(&analysis, content);

        assert_eq!(symbols.len(), 1);
        let job = &symbols[0];
        assert_eq!(job.name, "job \"web\"");
        assert_eq!(job.kind, SymbolKind::STRUCT);

        let children = job.children.as_ref().unwrap();
        assert_eq!(children[0].name, "type");
        assert_eq!(children[0].detail.as_deref(), Some("\"service\""));
        assert_eq!(children[1].name, "group \"api\"");

        let task = &children[1].children.as_ref().unwrap()[0];
        assert_eq!(task.name, "task \"server\"");
        assert_eq!(task.selection_range.start, Position { line: 3, character: 4 });
    }

    #[test]
    fn test_long_values_are_truncated() {
        let value = "x".repeat(100);
        let content = format!("locals {{\n  long = \"{}\"\n}}\n", value);
        let analysis = AnalyzedDocument::analyze(&content, &Catalog::nomad());
        let symbols = get_document_symbols(&analysis, &content);
        let long = &symbols[0].children.as_ref().unwrap()[0];
        let detail = long.detail.as_ref().unwrap();
        assert!(detail.ends_with('…'));
        assert_eq!(detail.len(), SYMBOL_DETAIL_MAX_BYTES + '…'.len_utf8());
    }

    #[test]
    fn test_empty_document() {
        let analysis = AnalyzedDocument::analyze("", &Catalog::nomad());
        assert!(get_document_symbols(&analysis, "").is_empty());
    }
}
