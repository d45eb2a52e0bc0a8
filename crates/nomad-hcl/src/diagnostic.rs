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

//! Diagnostics produced by parsing and structural validation.

use crate::span::Span;
use std::fmt;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Might be an issue.
    Warning,
    /// Definitely an issue.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A finding about the source text, anchored to a byte span.
///
/// `summary` is a short title ("Unsupported argument"); `detail` is the full
/// sentence shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            span,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            span,
        }
    }

    /// Text shown to the user: the detail, or the summary when there is none.
    pub fn message(&self) -> &str {
        if self.detail.is_empty() {
            &self.summary
        } else {
            &self.detail
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.span, self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_detail() {
        let diag = Diagnostic::error("Unsupported argument", "An argument named \"x\" is not expected here.", Span::new(0, 1));
        assert_eq!(diag.message(), "An argument named \"x\" is not expected here.");
        assert!(diag.is_error());
    }

    #[test]
    fn test_message_falls_back_to_summary() {
        let diag = Diagnostic::warning("Deprecated", "", Span::point(3));
        assert_eq!(diag.message(), "Deprecated");
        assert!(!diag.is_error());
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::error("Bad", "Broken thing", Span::new(2, 4));
        assert_eq!(diag.to_string(), "error at 2..4: Broken thing");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_shape() {
        let diag = Diagnostic::error("Bad", "Broken", Span::new(1, 2));
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["span"]["start"], 1);
        assert_eq!(json["severity"], "Error");
    }
}
