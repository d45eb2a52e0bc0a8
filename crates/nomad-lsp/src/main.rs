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

//! Nomad Language Server binary.
//!
//! Speaks LSP over stdio; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! nomad-lsp
//!
//! # With debug logging
//! RUST_LOG=debug nomad-lsp
//! ```
//!
//! # Editor Integration
//!
//! ## VS Code
//!
//! Add to `settings.json`:
//! ```json
//! {
//!   "nomad.server.path": "/path/to/nomad-lsp",
//!   "nomad": { "maxDocumentSizeMb": 16 }
//! }
//! ```
//!
//! ## Neovim (nvim-lspconfig)
//!
//! ```lua
//! require('lspconfig.configs').nomad = {
//!   default_config = {
//!     cmd = { 'nomad-lsp' },
//!     filetypes = { 'hcl.nomad' },
//!     root_dir = function() return vim.fn.getcwd() end,
//!   },
//! }
//! require('lspconfig').nomad.setup {}
//! ```

use nomad_lsp::NomadLanguageServer;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("nomad_lsp=info".parse().expect("valid log directive"))
                .add_directive("tower_lsp=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Nomad Language Server v{}", nomad_lsp::VERSION);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(NomadLanguageServer::new);

    Server::new(stdin, stdout, socket).serve(service).await;
}
