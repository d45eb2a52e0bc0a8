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

//! LSP backend implementation.
//!
//! # Analysis Scheduling
//!
//! 1. **Debouncing**: `didChange` analysis is delayed by 200ms so a burst of
//!    keystrokes is analysed once.
//! 2. **Dirty Tracking**: A content hash and dirty flag prevent redundant
//!    parsing when document content hasn't actually changed.
//! 3. **Snapshots**: Hover, completion and symbols read the cached
//!    `AnalyzedDocument` without waiting for pending analysis.

use crate::completion::get_completions;
use crate::config::ServerOptions;
use crate::constants::{BYTES_PER_MEGABYTE, DEBOUNCE_MS, DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DOCUMENT_SIZE};
use crate::document_manager::{CacheStatistics, DocumentManager};
use crate::hover::get_hover;
use crate::symbols::get_document_symbols;
use dashmap::DashMap;
use nomad_schema::Catalog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

/// Nomad Language Server backend.
///
/// Protocol handling lives here; document storage and analysis live in
/// [`DocumentManager`].
pub struct NomadLanguageServer {
    /// LSP client connection.
    client: Client,
    /// Document manager for storage and caching.
    document_manager: Arc<DocumentManager>,
    /// Debounce channels: URI -> sender for triggering analysis.
    debounce_channels: DashMap<Url, mpsc::UnboundedSender<()>>,
}

impl NomadLanguageServer {
    /// Create a new language server with the Nomad catalog and default limits.
    ///
    /// Default settings:
    /// - Max cache size: 1000 documents
    /// - Max document size: 64 MB
    pub fn new(client: Client) -> Self {
        Self::with_catalog(client, Catalog::nomad())
    }

    /// Create a new language server validating against `catalog`.
    pub fn with_catalog(client: Client, catalog: Catalog) -> Self {
        Self::with_config(client, catalog, DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DOCUMENT_SIZE)
    }

    /// Create a new language server with custom configuration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nomad_lsp::NomadLanguageServer;
    /// use nomad_schema::Catalog;
    /// use tower_lsp::Client;
    ///
    /// fn create_server(client: Client) -> NomadLanguageServer {
    ///     NomadLanguageServer::with_config(
    ///         client,
    ///         Catalog::nomad(),
    ///         200,               // max documents
    ///         16 * 1024 * 1024,  // 16 MB per document
    ///     )
    /// }
    /// ```
    pub fn with_config(
        client: Client,
        catalog: Catalog,
        max_cache_size: usize,
        max_document_size: usize,
    ) -> Self {
        Self {
            client,
            document_manager: Arc::new(DocumentManager::with_catalog(
                catalog,
                max_cache_size,
                max_document_size,
            )),
            debounce_channels: DashMap::new(),
        }
    }

    /// Get current cache statistics.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.document_manager.statistics()
    }

    /// Update maximum cache size (can be called during runtime).
    pub fn set_max_cache_size(&self, new_max: usize) {
        self.document_manager.set_max_cache_size(new_max);
    }

    /// Get current maximum cache size.
    pub fn max_cache_size(&self) -> usize {
        self.document_manager.max_cache_size()
    }

    /// Update maximum document size (can be called during runtime).
    pub fn set_max_document_size(&self, new_max: usize) {
        self.document_manager.set_max_document_size(new_max);
    }

    /// Get current maximum document size.
    pub fn max_document_size(&self) -> usize {
        self.document_manager.max_document_size()
    }

    /// Analyze a document if dirty and publish its diagnostics.
    async fn analyze_if_dirty(&self, uri: &Url) {
        analyze_and_publish(&self.client, &self.document_manager, uri).await;
    }

    /// Start debounced analysis for a document.
    fn schedule_analysis(&self, uri: Url) {
        let tx = if let Some(entry) = self.debounce_channels.get(&uri) {
            entry.clone()
        } else {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let uri_clone = uri.clone();
            let client = self.client.clone();
            let document_manager = Arc::clone(&self.document_manager);

            tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    sleep(Duration::from_millis(DEBOUNCE_MS)).await;

                    // Drain any additional signals during debounce
                    while rx.try_recv().is_ok() {}

                    debug!("Debounced analysis for: {}", uri_clone);
                    analyze_and_publish(&client, &document_manager, &uri_clone).await;
                }
            });

            self.debounce_channels.insert(uri.clone(), tx.clone());
            tx
        };

        if tx.send(()).is_err() {
            warn!("Debounce task for {} has stopped", uri);
        }
    }
}

/// Re-analyses a dirty document and publishes the resulting diagnostics.
///
/// Nothing is published if the document is clean, gone, or changed again
/// while it was being analysed.
async fn analyze_and_publish(client: &Client, document_manager: &DocumentManager, uri: &Url) {
    let Some((content, content_hash)) = document_manager.dirty_snapshot(uri) else {
        debug!("Document {} is clean or closed, skipping analysis", uri);
        return;
    };

    debug!("Starting analysis for dirty document: {} ({} bytes)", uri, content.len());
    let analysis = document_manager.analyze(&content);

    if !document_manager.update_analysis(uri, content_hash, Arc::clone(&analysis)) {
        return;
    }

    let diagnostics = analysis.to_lsp_diagnostics(&content);
    debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
    client.publish_diagnostics(uri.clone(), diagnostics, None).await;
}

#[tower_lsp::async_trait]
impl LanguageServer for NomadLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Nomad Language Server initializing");

        if let Some(value) = params.initialization_options {
            match ServerOptions::from_value(value) {
                Ok(options) => options.apply(&self.document_manager),
                Err(e) => warn!("Ignoring initialization options: {}", e),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        will_save: None,
                        will_save_wait_until: None,
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: None,
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "nomad-lsp".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("Nomad Language Server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Nomad Language Server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = &params.text_document.uri;
        let content_len = params.text_document.text.len();

        info!("Document opened: {} ({} bytes)", uri, content_len);

        let max_size = self.document_manager.max_document_size();
        if content_len > max_size {
            error!(
                "Document size limit exceeded on open: {} has {} bytes > {} bytes maximum",
                uri, content_len, max_size
            );
            self.client
                .show_message(
                    MessageType::ERROR,
                    format!(
                        "Document too large: {} bytes exceeds maximum of {} bytes ({} MB)",
                        content_len,
                        max_size,
                        max_size / BYTES_PER_MEGABYTE
                    ),
                )
                .await;
            return;
        }

        if !self
            .document_manager
            .insert_or_update(uri, &params.text_document.text)
        {
            error!("Failed to register document {} (size validation failed)", uri);
            return;
        }

        // Newly inserted documents are analysed on insert; a re-open of a
        // cached document may still be dirty.
        self.analyze_if_dirty(uri).await;
        if let Some((content, analysis)) = self.document_manager.get(uri) {
            let diagnostics = analysis.to_lsp_diagnostics(&content);
            self.client
                .publish_diagnostics(uri.clone(), diagnostics, None)
                .await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = &params.text_document.uri;

        let Some(change) = params.content_changes.into_iter().last() else {
            warn!("Document change event for {} had no content changes", uri);
            return;
        };

        if self.document_manager.insert_or_update(uri, &change.text) {
            debug!("Document {} updated, scheduling debounced analysis", uri);
            self.schedule_analysis(uri.clone());
        } else {
            warn!(
                "Failed to update document {} (size limit exceeded: {} bytes)",
                uri,
                change.text.len()
            );
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("Document saved: {}", params.text_document.uri);
        if let Some(text) = params.text {
            self.document_manager
                .insert_or_update(&params.text_document.uri, &text);
        }
        self.analyze_if_dirty(&params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);
        self.document_manager.remove(&params.text_document.uri);
        self.debounce_channels.remove(&params.text_document.uri);
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        debug!(
            "Completion request for {} at {}:{}",
            uri, position.line, position.character
        );

        let Some((content, analysis)) = self.document_manager.get(uri) else {
            debug!("No completion available for {} (document not found in cache)", uri);
            return Ok(None);
        };

        let items = get_completions(
            analysis.as_ref(),
            self.document_manager.catalog(),
            &content,
            position,
        );
        debug!("Providing {} completion items for {}", items.len(), uri);
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some((content, analysis)) = self.document_manager.get(uri) else {
            return Ok(None);
        };
        Ok(get_hover(
            analysis.as_ref(),
            self.document_manager.catalog(),
            &content,
            position,
        ))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = &params.text_document.uri;

        let Some((content, analysis)) = self.document_manager.get(uri) else {
            return Ok(None);
        };
        let symbols = get_document_symbols(analysis.as_ref(), &content);
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}
