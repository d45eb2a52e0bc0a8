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

//! Document management with caching and LRU eviction.
//!
//! This module handles document storage, caching, and lifecycle management for the LSP server.
//!
//! # Responsibilities
//!
//! - Document storage and retrieval
//! - Content hash-based change detection
//! - LRU-based cache eviction
//! - Cache statistics tracking
//! - Document size limits enforcement
//!
//! # Snapshots
//!
//! Each document holds an `Arc<AnalyzedDocument>`. Re-analysis builds a new
//! snapshot and swaps the `Arc`; readers holding the previous one keep a
//! complete, consistent view.

use crate::analysis::AnalyzedDocument;
use dashmap::DashMap;
use nomad_schema::Catalog;
use parking_lot::{Mutex, RwLock};
use ropey::Rope;
use std::sync::Arc;
use std::time::Instant;
use tower_lsp::lsp_types::Url;
use tracing::{debug, error, warn};

pub use crate::constants::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DOCUMENT_SIZE};

/// Document state with caching and dirty tracking.
struct DocumentState {
    /// Current text.
    pub rope: Rope,
    /// Analysis of the text as of the last parse.
    pub analysis: Arc<AnalyzedDocument>,
    /// Content hash for change detection.
    pub content_hash: u64,
    /// True if content changed since last analysis.
    pub dirty: bool,
    /// Last access timestamp for LRU eviction.
    pub last_access: Instant,
}

/// Cache statistics for monitoring and optimization.
#[derive(Debug, Clone, Default)]
pub struct CacheStatistics {
    /// Number of cache hits (document found in cache).
    pub hits: u64,
    /// Number of cache misses (document not in cache).
    pub misses: u64,
    /// Number of document evictions due to cache size limit.
    pub evictions: u64,
    /// Current number of documents in cache.
    pub current_size: usize,
    /// Maximum cache size.
    pub max_size: usize,
}

/// Document manager with LRU caching and dirty tracking.
///
/// # Thread Safety
///
/// Documents live in a `DashMap`, each behind its own `parking_lot::Mutex`.
/// The manager can be shared across threads behind an `Arc`.
///
/// # Example
///
/// ```
/// use nomad_lsp::document_manager::DocumentManager;
/// use tower_lsp::lsp_types::Url;
///
/// let manager = DocumentManager::new(1000, 64 * 1024 * 1024);
/// let uri = Url::parse("file:///jobs/web.nomad.hcl").unwrap();
/// assert!(manager.insert_or_update(&uri, "job \"web\" {}\n"));
/// let (content, analysis) = manager.get(&uri).unwrap();
/// assert_eq!(content, "job \"web\" {}\n");
/// assert_eq!(analysis.body.blocks.len(), 1);
/// ```
pub struct DocumentManager {
    /// Document store: URI -> document state.
    documents: DashMap<Url, Arc<Mutex<DocumentState>>>,
    /// Schema every document is validated against.
    catalog: Catalog,
    /// Cache statistics for monitoring.
    cache_stats: Arc<Mutex<CacheStatistics>>,
    /// Maximum number of documents to cache.
    max_cache_size: Arc<RwLock<usize>>,
    /// Maximum document size in bytes.
    max_document_size: Arc<RwLock<usize>>,
}

impl DocumentManager {
    /// Create a document manager validating against the Nomad catalog.
    pub fn new(max_cache_size: usize, max_document_size: usize) -> Self {
        Self::with_catalog(Catalog::nomad(), max_cache_size, max_document_size)
    }

    /// Create a document manager validating against `catalog`.
    pub fn with_catalog(catalog: Catalog, max_cache_size: usize, max_document_size: usize) -> Self {
        Self {
            documents: DashMap::new(),
            catalog,
            cache_stats: Arc::new(Mutex::new(CacheStatistics {
                max_size: max_cache_size,
                ..Default::default()
            })),
            max_cache_size: Arc::new(RwLock::new(max_cache_size)),
            max_document_size: Arc::new(RwLock::new(max_document_size)),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get current cache statistics.
    pub fn statistics(&self) -> CacheStatistics {
        let mut stats = self.cache_stats.lock();
        stats.current_size = self.documents.len();
        stats.clone()
    }

    /// Update maximum cache size (can be called during runtime).
    pub fn set_max_cache_size(&self, new_max: usize) {
        *self.max_cache_size.write() = new_max;
        self.cache_stats.lock().max_size = new_max;
        debug!("Cache max size updated to: {}", new_max);
    }

    /// Get current maximum cache size.
    pub fn max_cache_size(&self) -> usize {
        *self.max_cache_size.read()
    }

    /// Update maximum document size (can be called during runtime).
    pub fn set_max_document_size(&self, new_max: usize) {
        *self.max_document_size.write() = new_max;
        debug!("Max document size updated to: {} bytes", new_max);
    }

    /// Get current maximum document size.
    pub fn max_document_size(&self) -> usize {
        *self.max_document_size.read()
    }

    fn hash_content(content: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        hasher.finish()
    }

    /// Analyze `content` against this manager's catalog.
    pub fn analyze(&self, content: &str) -> Arc<AnalyzedDocument> {
        Arc::new(AnalyzedDocument::analyze(content, &self.catalog))
    }

    /// Insert or update a document.
    ///
    /// A changed document is marked dirty; a new one is analysed immediately.
    ///
    /// # Returns
    ///
    /// `false` if the document exceeds the size limit and was rejected.
    pub fn insert_or_update(&self, uri: &Url, content: &str) -> bool {
        let max_size = self.max_document_size();
        if content.len() > max_size {
            warn!(
                "Document size limit exceeded for {}: {} bytes > {} bytes maximum (rejected)",
                uri,
                content.len(),
                max_size
            );
            return false;
        }

        let content_hash = Self::hash_content(content);

        if let Some(state_ref) = self.documents.get(uri) {
            self.cache_stats.lock().hits += 1;

            let mut state = state_ref.lock();
            if state.content_hash != content_hash {
                debug!(
                    "Document content changed for {}: {} -> {} bytes",
                    uri,
                    state.rope.len_bytes(),
                    content.len()
                );
                state.rope = Rope::from_str(content);
                state.content_hash = content_hash;
                state.dirty = true;
            } else {
                debug!("Document content unchanged for {} (hash: {:#x})", uri, content_hash);
            }
            state.last_access = Instant::now();
            return true;
        }

        self.cache_stats.lock().misses += 1;
        debug!(
            "New document registered: {} ({} bytes, {} lines)",
            uri,
            content.len(),
            content.lines().count()
        );

        let max_cache = self.max_cache_size();
        if self.documents.len() >= max_cache {
            warn!(
                "Cache limit reached ({}/{}), triggering LRU eviction before inserting {}",
                self.documents.len(),
                max_cache,
                uri
            );
            self.evict_lru_document();
        }

        let analysis = self.analyze(content);
        if analysis.has_errors() {
            debug!(
                "Initial analysis found {} syntax and {} schema diagnostics for {}",
                analysis.syntax_diagnostics.len(),
                analysis.schema_diagnostics.len(),
                uri
            );
        }

        let state = DocumentState {
            rope: Rope::from_str(content),
            analysis,
            content_hash,
            dirty: false,
            last_access: Instant::now(),
        };
        self.documents.insert(uri.clone(), Arc::new(Mutex::new(state)));
        true
    }

    /// Get the latest analysis and the text it was built from, updating the
    /// LRU access time.
    ///
    /// While a document is dirty the returned text lags the live buffer, so
    /// editor positions always resolve against the tree they were parsed into.
    pub fn get(&self, uri: &Url) -> Option<(String, Arc<AnalyzedDocument>)> {
        self.documents.get(uri).map(|entry| {
            let mut state = entry.lock();
            state.last_access = Instant::now();
            (state.analysis.content.to_string(), Arc::clone(&state.analysis))
        })
    }

    /// Check if a document is dirty (needs re-analysis).
    pub fn is_dirty(&self, uri: &Url) -> bool {
        self.documents
            .get(uri)
            .map(|entry| entry.lock().dirty)
            .unwrap_or(false)
    }

    /// Mark a document as clean (analysis is up-to-date).
    pub fn mark_clean(&self, uri: &Url) {
        if let Some(state_ref) = self.documents.get(uri) {
            state_ref.lock().dirty = false;
        }
    }

    /// Replace the analysis snapshot of a document and mark it clean.
    ///
    /// The snapshot is only installed if `content_hash` still matches the
    /// document, so an analysis that raced with a newer edit is dropped.
    pub fn update_analysis(&self, uri: &Url, content_hash: u64, analysis: Arc<AnalyzedDocument>) -> bool {
        let Some(state_ref) = self.documents.get(uri) else {
            warn!(
                "Attempted to update analysis for non-existent document: {} (may have been closed/evicted)",
                uri
            );
            return false;
        };
        let mut state = state_ref.lock();
        if state.content_hash != content_hash {
            debug!("Discarding stale analysis for {}", uri);
            return false;
        }
        state.analysis = analysis;
        state.dirty = false;
        true
    }

    /// Take a snapshot of a dirty document's text for analysis.
    ///
    /// Returns the text and its hash, or `None` if the document is clean or
    /// gone.
    pub fn dirty_snapshot(&self, uri: &Url) -> Option<(String, u64)> {
        let state_ref = self.documents.get(uri)?;
        let state = state_ref.lock();
        if !state.dirty {
            return None;
        }
        let snapshot = (state.rope.to_string(), state.content_hash);
        Some(snapshot)
    }

    /// Remove a document from the cache.
    pub fn remove(&self, uri: &Url) -> bool {
        self.documents.remove(uri).is_some()
    }

    /// Get all document URIs currently in the cache.
    pub fn all_uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }

    fn evict_lru_document(&self) {
        let mut lru: Option<(Url, Instant, usize)> = None;
        for entry in self.documents.iter() {
            let state = entry.value().lock();
            if lru.as_ref().map_or(true, |(_, time, _)| state.last_access < *time) {
                lru = Some((entry.key().clone(), state.last_access, state.rope.len_bytes()));
            }
        }

        let Some((uri, last_access, size)) = lru else {
            error!("LRU eviction requested but no document found");
            return;
        };
        warn!(
            "Evicting LRU document {} ({} bytes, idle for {:?})",
            uri,
            size,
            last_access.elapsed()
        );
        self.documents.remove(&uri);

        let mut stats = self.cache_stats.lock();
        stats.evictions += 1;
        debug!(
            "Cache statistics after eviction: {} hits, {} misses, {} evictions, {}/{} size",
            stats.hits,
            stats.misses,
            stats.evictions,
            self.documents.len(),
            stats.max_size
        );
    }

    /// Clear all documents from the cache.
    pub fn clear(&self) {
        self.documents.clear();
        let mut stats = self.cache_stats.lock();
        stats.hits = 0;
        stats.misses = 0;
        stats.evictions = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = "job \"web\" {\n  datacenters = [\"dc1\"]\n}\n";

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///jobs/{}.nomad.hcl", name)).unwrap()
    }

    #[test]
    fn test_document_manager_new() {
        let manager = DocumentManager::new(100, 1024 * 1024);
        assert_eq!(manager.max_cache_size(), 100);
        assert_eq!(manager.max_document_size(), 1024 * 1024);

        let stats = manager.statistics();
        assert_eq!(stats.max_size, 100);
        assert_eq!(stats.current_size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_insert_and_get() {
        let manager = DocumentManager::new(10, 1024 * 1024);
        let uri = uri("web");

        assert!(manager.insert_or_update(&uri, JOB));

        let (content, analysis) = manager.get(&uri).unwrap();
        assert_eq!(content, JOB);
        assert_eq!(analysis.body.blocks.len(), 1);

        let stats = manager.statistics();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.current_size, 1);
    }

    #[test]
    fn test_update_marks_dirty() {
        let manager = DocumentManager::new(10, 1024 * 1024);
        let uri = uri("web");

        manager.insert_or_update(&uri, JOB);
        assert!(!manager.is_dirty(&uri));

        manager.insert_or_update(&uri, "job \"web\" {}\n");
        assert!(manager.is_dirty(&uri));

        // Same content again: still dirty until re-analysed.
        manager.insert_or_update(&uri, "job \"web\" {}\n");
        assert!(manager.is_dirty(&uri));

        manager.mark_clean(&uri);
        assert!(!manager.is_dirty(&uri));
    }

    #[test]
    fn test_update_analysis_swaps_snapshot() {
        let manager = DocumentManager::new(10, 1024 * 1024);
        let uri = uri("web");
        manager.insert_or_update(&uri, JOB);
        let (_, before) = manager.get(&uri).unwrap();

        manager.insert_or_update(&uri, "job \"web\" {}\njob \"api\" {}\n");
        let (content, hash) = manager.dirty_snapshot(&uri).unwrap();
        assert!(manager.update_analysis(&uri, hash, manager.analyze(&content)));
        assert!(!manager.is_dirty(&uri));
        assert!(manager.dirty_snapshot(&uri).is_none());

        let (_, after) = manager.get(&uri).unwrap();
        assert_eq!(before.body.blocks.len(), 1);
        assert_eq!(after.body.blocks.len(), 2);
    }

    #[test]
    fn test_get_pairs_analysis_with_its_own_text() {
        let manager = DocumentManager::new(10, 1024 * 1024);
        let uri = uri("web");
        manager.insert_or_update(&uri, JOB);

        let edited = format!("region = \"eu\"\n{}", JOB);
        manager.insert_or_update(&uri, &edited);
        assert!(manager.is_dirty(&uri));

        let (content, analysis) = manager.get(&uri).unwrap();
        assert_eq!(content, JOB);
        assert_eq!(&*analysis.content, JOB);
        assert_eq!(manager.dirty_snapshot(&uri).unwrap().0, edited);
    }

    #[test]
    fn test_stale_analysis_is_discarded() {
        let manager = DocumentManager::new(10, 1024 * 1024);
        let uri = uri("web");
        manager.insert_or_update(&uri, JOB);
        manager.insert_or_update(&uri, "job \"a\" {}\n");
        let (content, hash) = manager.dirty_snapshot(&uri).unwrap();

        manager.insert_or_update(&uri, "job \"b\" {}\n");
        assert!(!manager.update_analysis(&uri, hash, manager.analyze(&content)));
        assert!(manager.is_dirty(&uri));
    }

    #[test]
    fn test_document_size_limit() {
        let manager = DocumentManager::new(10, 100);
        let uri = uri("web");

        assert!(manager.insert_or_update(&uri, JOB));
        assert!(!manager.insert_or_update(&uri, &"x".repeat(101)));
    }

    #[test]
    fn test_lru_eviction() {
        let manager = DocumentManager::new(3, 1024 * 1024);

        for i in 0..3 {
            manager.insert_or_update(&uri(&format!("job{}", i)), JOB);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(manager.statistics().evictions, 0);

        // Touch job0 so job1 becomes least recently used.
        manager.get(&uri("job0"));

        manager.insert_or_update(&uri("job3"), JOB);

        let stats = manager.statistics();
        assert_eq!(stats.current_size, 3);
        assert_eq!(stats.evictions, 1);
        assert!(manager.get(&uri("job0")).is_some());
        assert!(manager.get(&uri("job1")).is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let manager = DocumentManager::new(10, 1024 * 1024);
        for i in 0..3 {
            manager.insert_or_update(&uri(&format!("job{}", i)), JOB);
        }
        assert_eq!(manager.all_uris().len(), 3);

        assert!(manager.remove(&uri("job0")));
        assert!(!manager.remove(&uri("job0")));

        manager.clear();
        assert_eq!(manager.statistics().current_size, 0);
        assert_eq!(manager.statistics().misses, 0);
    }

    #[test]
    fn test_runtime_config_update() {
        let manager = DocumentManager::new(100, 1024 * 1024);
        manager.set_max_cache_size(200);
        assert_eq!(manager.max_cache_size(), 200);
        assert_eq!(manager.statistics().max_size, 200);
        manager.set_max_document_size(2 * 1024 * 1024);
        assert_eq!(manager.max_document_size(), 2 * 1024 * 1024);
    }
}
