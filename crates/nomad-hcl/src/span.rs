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

//! Byte spans and line indexing for HCL source text.
//!
//! Every syntax node carries a [`Span`] into the UTF-8 source buffer. Spans
//! are half-open intervals `[start, end)` measured in bytes, which is what the
//! resolvers compare cursor offsets against.
//!
//! # Examples
//!
//! ```
//! use nomad_hcl::Span;
//!
//! let span = Span::new(4, 10);
//! assert!(span.contains(4));
//! assert!(span.contains(9));
//! assert!(!span.contains(10));
//! ```

use std::fmt;

/// A half-open byte range `[start, end)` in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// First byte covered by the span.
    pub start: usize,
    /// First byte after the span.
    pub end: usize,
}

impl Span {
    /// Creates a new span. `end` is clamped so it never precedes `start`.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        let end = if end < start { start } else { end };
        Self { start, end }
    }

    /// Creates a zero-width span at `offset`.
    #[inline]
    pub const fn point(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns true if `offset` lies inside the span.
    #[inline]
    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Returns true if the two spans share at least one byte.
    #[inline]
    pub const fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Precomputed line starts for converting byte offsets back into
/// `(line, utf16 column)` pairs.
///
/// Lines are zero-based. Columns are counted in UTF-16 code units, matching
/// the position encoding used by editor protocols.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Builds the index for `source`.
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', bytes).map(|i| i + 1));
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Number of lines (a trailing newline opens one more, empty, line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where `line` starts, or `None` if the line does not exist.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Converts a byte offset into a zero-based `(line, utf16_column)` pair.
    ///
    /// Offsets past the end clamp to the end of the source. Offsets falling
    /// inside a multi-byte scalar are rounded down to its first byte.
    pub fn position(&self, source: &str, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let mut end = offset;
        while end > start && !source.is_char_boundary(end) {
            end -= 1;
        }
        let column = source
            .get(start..end)
            .map(|text| text.chars().map(char::len_utf16).sum())
            .unwrap_or(0);
        (line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains_is_half_open() {
        let span = Span::new(2, 5);
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
    }

    #[test]
    fn test_span_new_clamps_inverted_range() {
        let span = Span::new(8, 3);
        assert_eq!(span.start, 8);
        assert!(span.is_empty());
    }

    #[test]
    fn test_span_overlaps_and_merge() {
        let a = Span::new(0, 4);
        let b = Span::new(4, 9);
        let c = Span::new(3, 6);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert_eq!(a.merge(&b), Span::new(0, 9));
    }

    #[test]
    fn test_line_index_ascii() {
        let src = "job \"a\" {\n  x = 1\n}\n";
        let index = LineIndex::new(src);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(src, 0), (0, 0));
        assert_eq!(index.position(src, 12), (1, 2));
        assert_eq!(index.position(src, src.len()), (3, 0));
    }

    #[test]
    fn test_line_index_counts_utf16_units() {
        // 'é' is 2 bytes / 1 unit, '😀' is 4 bytes / 2 units
        let src = "é😀x";
        let index = LineIndex::new(src);
        assert_eq!(index.position(src, 2), (0, 1));
        assert_eq!(index.position(src, 6), (0, 3));
        // Mid-scalar offsets round down
        assert_eq!(index.position(src, 3), (0, 1));
    }

    #[test]
    fn test_line_index_clamps_past_end() {
        let src = "a\nb";
        let index = LineIndex::new(src);
        assert_eq!(index.position(src, 100), (1, 1));
        assert_eq!(index.line_start(5), None);
    }
}
