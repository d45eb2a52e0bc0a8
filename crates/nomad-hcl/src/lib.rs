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

//! HCL native syntax parser for Nomad job files.
//!
//! This crate turns HCL source text into an immutable [`Body`] tree whose
//! nodes carry byte [`Span`]s, which is what editor tooling needs to map a
//! cursor back onto structure:
//!
//! - [`lexer`]: tokens, including quoted templates and heredocs
//! - [`parse`]: error-recovering recursive-descent parser
//! - [`validate_content`]: checks one body against a [`BodyShape`]
//! - [`evaluate_literal_string`]: evaluation with no variables in scope
//!
//! # Examples
//!
//! ```
//! use nomad_hcl::{evaluate_literal_string, parse};
//!
//! let parsed = parse("task \"web\" {\n  driver = \"docker\"\n}\n");
//! let task = &parsed.body.blocks[0];
//! let driver = task.body.attribute("driver").unwrap();
//! assert_eq!(evaluate_literal_string(&driver.expr).unwrap(), "docker");
//! ```

mod ast;
mod diagnostic;
mod eval;
pub mod lexer;
mod parser;
mod shape;
mod span;

pub use ast::{Attribute, Block, Body, Expression, Label, TemplatePart};
pub use diagnostic::{Diagnostic, Severity};
pub use eval::{evaluate_literal_string, EvalError};
pub use parser::{parse, parse_with_limits, Limits, Parsed};
pub use shape::{validate_content, AttributeShape, BlockShape, BodyShape};
pub use span::{LineIndex, Span};
