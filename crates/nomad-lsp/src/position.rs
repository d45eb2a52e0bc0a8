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

//! Conversions between protocol positions and byte offsets.
//!
//! Protocol positions are `(line, character)` pairs where `character`
//! counts UTF-16 code units. Syntax spans are byte offsets into the UTF-8
//! buffer. Every conversion here clamps instead of failing: a position past
//! the end of a line lands on that line's end, a position past the end of
//! the buffer lands on the buffer's end.

use nomad_hcl::{LineIndex, Span};
use tower_lsp::lsp_types::{Position, Range};

/// Converts a protocol position into a byte offset in `text`.
///
/// Walks scalar values up to the requested line, then counts UTF-16 code
/// units along that line. Lines past the end of the buffer yield
/// `text.len()`.
///
/// # Example
///
/// ```
/// use nomad_lsp::position::position_to_byte_offset;
///
/// let text = "a = \"ü\"\nb = 1\n";
/// assert_eq!(position_to_byte_offset(text, 0, 6), 7);
/// assert_eq!(position_to_byte_offset(text, 1, 0), 9);
/// assert_eq!(position_to_byte_offset(text, 5, 0), text.len());
/// ```
pub fn position_to_byte_offset(text: &str, line: u32, utf16_character: u32) -> usize {
    let mut line_start = 0;
    let mut current_line = 0;
    let mut scalars = text.char_indices();

    while current_line < line {
        match scalars.next() {
            Some((index, '\n')) => {
                current_line += 1;
                line_start = index + 1;
            }
            Some(_) => {}
            None => return text.len(),
        }
    }

    let mut units = 0;
    for (index, ch) in text[line_start..].char_indices() {
        if units >= utf16_character || ch == '\n' {
            return line_start + index;
        }
        units += ch.len_utf16() as u32;
    }
    text.len()
}

/// Converts a byte offset into a protocol position.
///
/// Offsets past the end clamp to the end of `text`.
pub fn byte_offset_to_position(text: &str, offset: usize) -> Position {
    let index = LineIndex::new(text);
    offset_to_position(&index, text, offset)
}

/// Like [`byte_offset_to_position`], reusing a prebuilt [`LineIndex`].
pub fn offset_to_position(index: &LineIndex, text: &str, offset: usize) -> Position {
    let (line, character) = index.position(text, offset);
    Position {
        line: line as u32,
        character: character as u32,
    }
}

/// Converts a byte span into a protocol range.
pub fn span_to_range(text: &str, span: Span) -> Range {
    let index = LineIndex::new(text);
    span_to_range_with(&index, text, span)
}

/// Like [`span_to_range`], reusing a prebuilt [`LineIndex`].
pub fn span_to_range_with(index: &LineIndex, text: &str, span: Span) -> Range {
    Range {
        start: offset_to_position(index, text, span.start),
        end: offset_to_position(index, text, span.end),
    }
}

/// Safely get a string slice up to a byte position, ensuring UTF-8 character boundaries.
///
/// If `byte_pos` falls inside a multi-byte character, the slice ends at that
/// character's first byte.
///
/// # Example
///
/// ```
/// use nomad_lsp::position::safe_slice_to;
///
/// let s = "Hello 世界";
/// assert_eq!(safe_slice_to(s, 6), "Hello ");
/// assert_eq!(safe_slice_to(s, 7), "Hello ");
/// ```
pub fn safe_slice_to(s: &str, byte_pos: usize) -> &str {
    if byte_pos >= s.len() {
        return s;
    }
    let mut pos = byte_pos;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    &s[..pos]
}

/// Source text covered by `span`, or `""` if the span does not fall on
/// character boundaries inside `text`.
pub fn span_text(text: &str, span: Span) -> &str {
    text.get(span.start..span.end).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets() {
        let text = "job \"x\" {\n  datacenters = [\"dc1\"]\n}\n";
        assert_eq!(position_to_byte_offset(text, 0, 0), 0);
        assert_eq!(position_to_byte_offset(text, 0, 4), 4);
        assert_eq!(position_to_byte_offset(text, 1, 2), 12);
        assert_eq!(position_to_byte_offset(text, 2, 0), text.len() - 2);
    }

    #[test]
    fn test_multibyte_scalars() {
        // "é" is 2 bytes, 1 UTF-16 unit; "€" is 3 bytes, 1 unit.
        let text = "é€x\n";
        assert_eq!(position_to_byte_offset(text, 0, 1), 2);
        assert_eq!(position_to_byte_offset(text, 0, 2), 5);
        assert_eq!(position_to_byte_offset(text, 0, 3), 6);
    }

    #[test]
    fn test_supplementary_plane() {
        // "🦀" is 4 bytes and 2 UTF-16 units.
        let text = "a🦀b";
        assert_eq!(position_to_byte_offset(text, 0, 1), 1);
        assert_eq!(position_to_byte_offset(text, 0, 3), 5);
        assert_eq!(position_to_byte_offset(text, 0, 4), 6);
    }

    #[test]
    fn test_past_line_end_clamps_to_line_end() {
        let text = "ab\ncd\n";
        assert_eq!(position_to_byte_offset(text, 0, 50), 2);
        assert_eq!(position_to_byte_offset(text, 1, 50), 5);
    }

    #[test]
    fn test_past_buffer_end() {
        let text: String = (0..100).map(|i| format!("line{}\n", i)).collect();
        assert_eq!(position_to_byte_offset(&text, 100, 0), text.len());
        assert_eq!(position_to_byte_offset(&text, 250, 7), text.len());
        assert_eq!(position_to_byte_offset("", 0, 0), 0);
        assert_eq!(position_to_byte_offset("no newline", 0, 99), 10);
    }

    #[test]
    fn test_round_trip_with_line_index() {
        let text = "env {\n  GREETING = \"grüß 🦀\"\n}\n";
        for offset in [0, 6, 8, 20, 24, text.len()] {
            let position = byte_offset_to_position(text, offset);
            assert_eq!(
                position_to_byte_offset(text, position.line, position.character),
                offset
            );
        }
    }

    #[test]
    fn test_span_to_range() {
        let text = "a = 1\nbb = 2\n";
        let range = span_to_range(text, Span::new(6, 8));
        assert_eq!(range.start, Position { line: 1, character: 0 });
        assert_eq!(range.end, Position { line: 1, character: 2 });
    }

    #[test]
    fn test_safe_slice_to_utf8() {
        let s = "Hello 世界";
        assert_eq!(safe_slice_to(s, 6), "Hello ");
        assert_eq!(safe_slice_to(s, 8), "Hello ");
        assert_eq!(safe_slice_to(s, 9), "Hello 世");
        assert_eq!(safe_slice_to(s, 100), s);
    }

    #[test]
    fn test_span_text() {
        let s = "Hi 👋 there";
        assert_eq!(span_text(s, Span::new(0, 2)), "Hi");
        assert_eq!(span_text(s, Span::new(4, 6)), "");
        assert_eq!(span_text(s, Span::new(3, 100)), "");
    }
}
