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

//! LSP constants and magic number definitions.
//!
//! Constants are organized by category:
//! - **Performance Tuning**: Debounce delays
//! - **Memory Limits**: Document and cache size constraints
//! - **LSP Protocol**: Diagnostic source tag and snippet placeholders
//! - **Display Constants**: Outline rendering

// ============================================================================
// Performance Tuning
// ============================================================================

/// Debounce delay for document analysis (in milliseconds).
///
/// Consecutive `didChange` notifications arriving within this window are
/// analysed once, after the last one.
pub const DEBOUNCE_MS: u64 = 200;

// ============================================================================
// Memory Limits
// ============================================================================

/// Default maximum document size in bytes (64 MB).
///
/// Nomad job files are rarely larger than a few hundred kilobytes; anything
/// above this limit is rejected on open and change.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 64 * BYTES_PER_MEGABYTE;

/// Default maximum number of simultaneously open documents (1000).
///
/// Exceeding it evicts the least recently used document.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

/// Bytes per megabyte (1024 * 1024).
pub const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

// ============================================================================
// LSP Protocol Constants
// ============================================================================

/// `source` field of every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "nomad-ls";

/// Final tab stop of a completion snippet.
pub const SNIPPET_CURSOR: &str = "$0";

/// First tab stop of a labelled block snippet, pre-filled with `name`.
pub const SNIPPET_LABEL: &str = "${1:name}";

// ============================================================================
// Display Constants
// ============================================================================

/// Longest attribute value shown as outline detail, in bytes.
pub const SYMBOL_DETAIL_MAX_BYTES: usize = 60;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_conversions() {
        assert_eq!(BYTES_PER_MEGABYTE, 1048576);
        assert_eq!(DEFAULT_MAX_DOCUMENT_SIZE, 67108864); // 64 MB
    }

    #[test]
    fn test_reasonable_limits() {
        assert!(DEBOUNCE_MS >= 50, "Debounce too short, will cause excessive CPU");
        assert!(DEBOUNCE_MS <= 500, "Debounce too long, will feel laggy");

        assert!(DEFAULT_MAX_CACHE_SIZE >= 100, "Cache too small for normal usage");
        assert!(DEFAULT_MAX_CACHE_SIZE <= 10000, "Cache too large, excessive memory");
    }

    #[test]
    fn test_snippet_placeholders() {
        // Rendered verbatim as editor tab stops.
        assert_eq!(SNIPPET_CURSOR, "$0");
        assert_eq!(SNIPPET_LABEL, "${1:name}");
        assert_eq!(DIAGNOSTIC_SOURCE, "nomad-ls");
    }
}
