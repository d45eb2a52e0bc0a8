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

//! Restricted evaluation of literal expressions.
//!
//! There is no variable or function scope: only string templates built from
//! literal text (and interpolations of other literals) evaluate. Anything
//! that would need runtime context yields an [`EvalError`].

use crate::ast::{Expression, TemplatePart};
use thiserror::Error;

/// Reasons an expression is not a literal string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("variables not allowed: there is no variable named \"{name}\" in this context")]
    UnknownVariable { name: String },

    #[error("function calls not allowed: \"{name}\" cannot be called in this context")]
    FunctionCallsNotAllowed { name: String },

    #[error("wrong type: expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("expression is not a literal value")]
    NotLiteral,
}

/// Evaluates `expr` to a string with no variables or functions in scope.
///
/// # Examples
///
/// ```
/// use nomad_hcl::{evaluate_literal_string, parse, EvalError};
///
/// let parsed = parse("a = \"docker\"\nb = var.driver\n");
/// let a = &parsed.body.attributes[0].expr;
/// let b = &parsed.body.attributes[1].expr;
/// assert_eq!(evaluate_literal_string(a).unwrap(), "docker");
/// assert!(matches!(evaluate_literal_string(b), Err(EvalError::UnknownVariable { .. })));
/// ```
pub fn evaluate_literal_string(expr: &Expression) -> Result<String, EvalError> {
    match expr {
        Expression::Template { parts, .. } => {
            let mut out = String::new();
            for part in parts {
                match part {
                    TemplatePart::Literal(text) => out.push_str(text),
                    TemplatePart::Interpolation(inner) => out.push_str(&interpolate(inner)?),
                    TemplatePart::Directive(_) => return Err(EvalError::NotLiteral),
                }
            }
            Ok(out)
        }
        Expression::Parenthesized { inner, .. } => evaluate_literal_string(inner),
        other => Err(non_string(other)),
    }
}

/// Renders a primitive literal the way a template interpolation does.
fn interpolate(expr: &Expression) -> Result<String, EvalError> {
    match expr {
        Expression::Template { .. } => evaluate_literal_string(expr),
        Expression::Number { value, .. } => Ok(format_number(*value)),
        Expression::Bool { value, .. } => Ok(value.to_string()),
        Expression::Parenthesized { inner, .. } => interpolate(inner),
        other => Err(non_string(other)),
    }
}

fn non_string(expr: &Expression) -> EvalError {
    match expr {
        Expression::Traversal { root, .. } => EvalError::UnknownVariable { name: root.clone() },
        Expression::FunctionCall { name, .. } => EvalError::FunctionCallsNotAllowed { name: name.clone() },
        Expression::Complex { .. } => EvalError::NotLiteral,
        other => EvalError::WrongType {
            expected: "string",
            found: other.kind_name(),
        },
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval(value: &str) -> Result<String, EvalError> {
        let parsed = parse(&format!("x = {}\n", value));
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        evaluate_literal_string(&parsed.body.attributes[0].expr)
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(eval("\"raw_exec\"").unwrap(), "raw_exec");
    }

    #[test]
    fn test_literal_interpolations() {
        assert_eq!(eval("\"v${1}-${true}-${\"x\"}\"").unwrap(), "v1-true-x");
        assert_eq!(eval("\"${1.5}\"").unwrap(), "1.5");
    }

    #[test]
    fn test_parenthesized() {
        assert_eq!(eval("(\"java\")").unwrap(), "java");
    }

    #[test]
    fn test_variable_reference() {
        assert_eq!(
            eval("\"${var.driver}\""),
            Err(EvalError::UnknownVariable {
                name: "var".to_string()
            })
        );
    }

    #[test]
    fn test_function_call() {
        assert!(matches!(
            eval("lower(\"DOCKER\")"),
            Err(EvalError::FunctionCallsNotAllowed { name }) if name == "lower"
        ));
    }

    #[test]
    fn test_wrong_type() {
        assert_eq!(
            eval("42"),
            Err(EvalError::WrongType {
                expected: "string",
                found: "number"
            })
        );
        assert!(matches!(eval("[\"a\"]"), Err(EvalError::WrongType { found: "tuple", .. })));
    }

    #[test]
    fn test_complex_is_not_literal() {
        assert_eq!(eval("\"a\" == \"b\" ? \"x\" : \"y\""), Err(EvalError::NotLiteral));
        assert_eq!(eval("\"%{ if true }x%{ endif }\""), Err(EvalError::NotLiteral));
    }

    #[test]
    fn test_error_messages() {
        let err = EvalError::WrongType {
            expected: "string",
            found: "bool",
        };
        assert_eq!(err.to_string(), "wrong type: expected string, found bool");
    }
}
