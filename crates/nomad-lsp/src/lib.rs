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

//! Nomad Language Server Protocol (LSP) Implementation
//!
//! This crate provides IDE integration for HashiCorp Nomad job files
//! (`*.nomad.hcl`) through the Language Server Protocol. Everything it knows
//! about Nomad comes from the schema catalog in `nomad-schema`.
//!
//! # Features
//!
//! - **Diagnostics**: Syntax errors plus schema findings such as unknown
//!   arguments, missing required arguments and missing block labels
//! - **Autocomplete**: Block and attribute snippets for the block under the
//!   cursor, following the task `driver` into its `config` block
//! - **Hover**: Markdown documentation for block types and attribute names
//! - **Document Symbols**: Outline of jobs, groups, tasks and their settings
//!
//! # Memory Management
//!
//! - **Document Size Limit**: Maximum 64MB per document (configurable)
//! - **Open Document Limit**: Maximum 1000 cached documents with LRU eviction
//! - **UTF-8 Safety**: Positions are converted between UTF-16 code units and
//!   byte offsets without ever slicing inside a character
//!
//! # Usage
//!
//! ## Running the Server
//!
//! ```bash
//! # Run the language server (stdio transport)
//! nomad-lsp
//!
//! # With debug logging
//! RUST_LOG=debug nomad-lsp
//! ```
//!
//! ## Programmatic Usage
//!
//! ```no_run
//! use nomad_lsp::NomadLanguageServer;
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stdin = tokio::io::stdin();
//!     let stdout = tokio::io::stdout();
//!
//!     let (service, socket) = LspService::new(NomadLanguageServer::new);
//!
//!     Server::new(stdin, stdout, socket).serve(service).await;
//! }
//! ```
//!
//! The editor features are plain functions over an [`analysis::AnalyzedDocument`]
//! and can be used without a server:
//!
//! ```
//! use nomad_lsp::analysis::AnalyzedDocument;
//! use nomad_lsp::hover::get_hover;
//! use nomad_schema::Catalog;
//! use tower_lsp::lsp_types::Position;
//!
//! let catalog = Catalog::nomad();
//! let content = "job \"web\" {\n  datacenters = [\"dc1\"]\n}\n";
//! let analysis = AnalyzedDocument::analyze(content, &catalog);
//!
//! let hover = get_hover(&analysis, &catalog, content, Position::new(1, 4));
//! assert!(hover.is_some());
//! ```
//!
//! # Architecture
//!
//! - `backend`: LSP server implementation with debounced analysis
//! - [`analysis`]: Parsing and schema validation of one document version
//! - [`completion`]: Schema-driven autocompletion
//! - [`config`]: Client-supplied settings
//! - [`diagnostics`]: Recursive schema validation
//! - [`document_manager`]: Document cache with dirty tracking and LRU eviction
//! - [`hover`]: Hover documentation lookup
//! - [`position`]: UTF-16 position and byte offset conversion
//! - [`symbols`]: Document outline

pub mod analysis;
mod backend;
pub mod completion;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod document_manager;
pub mod hover;
pub mod position;
pub mod symbols;


pub use backend::NomadLanguageServer;
pub use document_manager::{CacheStatistics, DocumentManager};

/// LSP server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
