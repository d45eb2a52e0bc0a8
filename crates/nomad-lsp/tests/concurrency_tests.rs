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

//! Concurrency tests for nomad-lsp.
//!
//! # Thread Safety Requirements
//!
//! - DocumentManager uses DashMap with a parking_lot::Mutex per document
//! - AnalyzedDocument snapshots are shared through Arc and never mutated
//! - A stale analysis must never replace a newer one

use nomad_lsp::document_manager::DocumentManager;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tower_lsp::lsp_types::*;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// A job whose group count identifies the version.
fn sample_job(version: usize) -> String {
    format!(
        r#"job "web" {{
  datacenters = ["dc1"]

  group "api" {{
    count = {}

    task "server" {{
      driver = "docker"

      config {{
        image = "nginx:1.{}"
      }}
    }}
  }}
}}
"#,
        version, version
    )
}

fn test_uri(id: usize) -> Url {
    Url::parse(&format!("file:///jobs/test{}.nomad.hcl", id)).unwrap()
}

/// Runs the backend's analysis step once.
fn analyze_if_dirty(manager: &DocumentManager, uri: &Url) -> bool {
    let Some((content, hash)) = manager.dirty_snapshot(uri) else {
        return false;
    };
    let analysis = manager.analyze(&content);
    manager.update_analysis(uri, hash, analysis)
}

// ============================================================================
// DOCUMENT MANAGER
// ============================================================================

#[test]
fn test_concurrent_inserts_of_distinct_documents() {
    let manager = Arc::new(DocumentManager::new(1000, 1024 * 1024));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..25 {
                    let id = t * 100 + i;
                    assert!(manager.insert_or_update(&test_uri(id), &sample_job(id)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.statistics().current_size, 200);
    for uri in manager.all_uris() {
        let (_, analysis) = manager.get(&uri).unwrap();
        assert!(!analysis.has_errors());
    }
}

#[test]
fn test_readers_always_see_complete_snapshots() {
    let manager = Arc::new(DocumentManager::new(10, 1024 * 1024));
    let uri = test_uri(0);
    manager.insert_or_update(&uri, &sample_job(0));

    let done = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(AtomicUsize::new(0));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let uri = uri.clone();
            let done = Arc::clone(&done);
            let reads = Arc::clone(&reads);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let (_, analysis) = manager.get(&uri).unwrap();
                    // Every version parses to exactly one job with one group.
                    assert_eq!(analysis.body.blocks.len(), 1);
                    assert_eq!(analysis.body.blocks[0].body.blocks_of_type("group").count(), 1);
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for version in 1..=50 {
        manager.insert_or_update(&uri, &sample_job(version));
        analyze_if_dirty(&manager, &uri);
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    assert!(reads.load(Ordering::Relaxed) > 0);
    let (content, _) = manager.get(&uri).unwrap();
    assert_eq!(content, sample_job(50));
    assert!(!manager.is_dirty(&uri));
}

#[test]
fn test_racing_analyses_keep_latest_content() {
    let manager = Arc::new(DocumentManager::new(10, 1024 * 1024));
    let uri = test_uri(1);
    manager.insert_or_update(&uri, &sample_job(0));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            let uri = uri.clone();
            thread::spawn(move || {
                for i in 0..20 {
                    manager.insert_or_update(&uri, &sample_job(t * 100 + i + 1));
                    analyze_if_dirty(&manager, &uri);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    // Settle whatever the last writer left dirty.
    analyze_if_dirty(&manager, &uri);

    let (content, analysis) = manager.get(&uri).unwrap();
    let fresh = manager.analyze(&content);
    assert!(!manager.is_dirty(&uri));
    assert_eq!(
        *analysis.body, *fresh.body,
        "installed analysis does not match the stored content"
    );
}

#[test]
fn test_concurrent_eviction_respects_limit() {
    let manager = Arc::new(DocumentManager::new(16, 1024 * 1024));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..50 {
                    manager.insert_or_update(&test_uri(t * 1000 + i), &sample_job(i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = manager.statistics();
    // Concurrent inserts may each pass the size check before evicting.
    assert!(stats.current_size <= 16 + 4, "{} documents cached", stats.current_size);
    assert!(stats.evictions >= 200 - 20);
}
