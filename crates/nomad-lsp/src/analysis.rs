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

//! Document analysis for Nomad job files.
//!
//! Analysis parses the text once, validates it against the schema catalog,
//! and keeps the immutable [`Body`] snapshot that hover, completion and
//! symbols query afterwards. An edit produces a new `AnalyzedDocument`;
//! existing snapshots are never mutated.

use crate::constants::DIAGNOSTIC_SOURCE;
use crate::diagnostics::collect_diagnostics;
use crate::position::span_to_range_with;
use nomad_hcl::{parse, Body, Diagnostic, LineIndex, Severity};
use nomad_schema::Catalog;
use std::sync::Arc;
use tower_lsp::lsp_types::{self, DiagnosticSeverity};
use tracing::debug;

/// Analyzed document with parsed body and diagnostics.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    /// Parsed body. Present even when parsing reported errors.
    pub body: Arc<Body>,
    /// Syntax errors from the parser.
    pub syntax_diagnostics: Vec<Diagnostic>,
    /// Findings from validating the body against the catalog.
    pub schema_diagnostics: Vec<Diagnostic>,
    /// Line starts of the analysed text.
    pub line_index: LineIndex,
    /// The text this snapshot was built from. Positions against this
    /// snapshot must be translated through it, not the live buffer.
    pub content: Arc<str>,
}

impl AnalyzedDocument {
    /// Parse and validate `content`.
    ///
    /// Schema validation runs on the recovered body even when the parser
    /// reported errors, so a typo in one block does not hide findings in
    /// the others.
    pub fn analyze(content: &str, catalog: &Catalog) -> Self {
        let parsed = parse(content);
        let schema_diagnostics = collect_diagnostics(&parsed.body, catalog.root());

        debug!(
            "Analysis complete: {} blocks, {} syntax errors, {} schema diagnostics",
            parsed.body.blocks.len(),
            parsed.diagnostics.len(),
            schema_diagnostics.len()
        );

        Self {
            body: Arc::new(parsed.body),
            syntax_diagnostics: parsed.diagnostics,
            schema_diagnostics,
            line_index: LineIndex::new(content),
            content: Arc::from(content),
        }
    }

    /// All diagnostics: syntax first, then schema findings.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.syntax_diagnostics.iter().chain(&self.schema_diagnostics)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(Diagnostic::is_error)
    }

    /// Convert diagnostics to LSP format.
    ///
    /// `content` must be the text this analysis was produced from.
    pub fn to_lsp_diagnostics(&self, content: &str) -> Vec<lsp_types::Diagnostic> {
        self.diagnostics()
            .map(|diagnostic| lsp_types::Diagnostic {
                range: span_to_range_with(&self.line_index, content, diagnostic.span),
                severity: Some(match diagnostic.severity {
                    Severity::Error => DiagnosticSeverity::ERROR,
                    Severity::Warning => DiagnosticSeverity::WARNING,
                }),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: diagnostic.message().to_string(),
                ..Default::default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    #[test]
    fn test_analyze_valid_job() {
        let content = "job \"web\" {\n  group \"g\" {\n    task \"t\" {\n      driver = \"exec\"\n      config {\n        command = \"/bin/true\"\n      }\n    }\n  }\n}\n";
        let analysis = AnalyzedDocument::analyze(content, &Catalog::nomad());
        assert!(analysis.syntax_diagnostics.is_empty());
        assert!(analysis.schema_diagnostics.is_empty(), "{:?}", analysis.schema_diagnostics);
        assert!(!analysis.has_errors());
        assert_eq!(analysis.body.blocks.len(), 1);
    }

    #[test]
    fn test_syntax_errors_keep_partial_body() {
        let content = "job \"web\" {\n  datacenters = [\"dc1\"\n";
        let analysis = AnalyzedDocument::analyze(content, &Catalog::nomad());
        assert!(!analysis.syntax_diagnostics.is_empty());
        assert!(analysis.has_errors());
        assert_eq!(analysis.body.blocks.len(), 1);
    }

    #[test]
    fn test_lsp_diagnostic_shape() {
        let content = "job \"web\" {\n  bogus = 1\n}\n";
        let analysis = AnalyzedDocument::analyze(content, &Catalog::nomad());
        let diagnostics = analysis.to_lsp_diagnostics(content);
        assert_eq!(diagnostics.len(), 1);

        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.source.as_deref(), Some("nomad-ls"));
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostic.range.start, Position { line: 1, character: 2 });
        assert_eq!(diagnostic.range.end, Position { line: 1, character: 7 });
        assert!(diagnostic.message.contains("\"bogus\""));
    }
}
