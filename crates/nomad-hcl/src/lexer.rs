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

//! Tokenizer for the HCL native syntax.
//!
//! The lexer works on bytes and produces a flat token stream with byte spans.
//! Quoted strings and heredocs are emitted as single tokens covering their
//! whole source text; the parser splits them into template parts later.
//! Comments are dropped. Newlines are significant in HCL (they terminate
//! attribute definitions) so they are kept as tokens.
//!
//! Lexing never stops on an error: malformed input produces a [`LexError`]
//! and scanning resumes after the offending bytes.

use crate::span::Span;
use thiserror::Error;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    /// A `"..."` template, quotes included.
    QuotedString,
    /// A `<<EOF ... EOF` template, markers included.
    Heredoc,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Equals,
    Comma,
    Dot,
    Colon,
    Question,
    FatArrow,
    Ellipsis,
    /// Arithmetic, comparison and logic operators.
    Operator,
    Newline,
    Eof,
}

/// A token and the bytes it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Source text of the token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.start..self.span.end).unwrap_or("")
    }
}

/// Errors found while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated template string")]
    UnterminatedString { span: Span },
    #[error("unterminated heredoc; no closing marker \"{marker}\" was found")]
    UnterminatedHeredoc { marker: String, span: Span },
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },
    #[error("invalid character {ch:?}")]
    UnexpectedCharacter { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnterminatedString { span }
            | Self::UnterminatedHeredoc { span, .. }
            | Self::UnterminatedComment { span }
            | Self::UnexpectedCharacter { span, .. } => *span,
        }
    }
}

/// Tokenizes `source`. The returned stream always ends with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer {
        src: source,
        bytes: source.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    let end = source.len();
    lexer.tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::point(end),
    });
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

/// A construct still open while scanning a quoted template.
#[derive(Debug, Clone, Copy)]
enum Open {
    Quoted,
    /// A `${` or `%{` sequence with its unmatched brace count.
    Sequence { braces: usize },
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos),
        });
    }

    fn run(&mut self) {
        while let Some(b) = self.peek() {
            let start = self.pos;
            match b {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.push(TokenKind::Newline, start);
                }
                b'#' => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                b'"' => self.lex_quoted_string(),
                b'<' if self.peek_at(1) == Some(b'<') && self.heredoc_follows() => self.lex_heredoc(),
                b'0'..=b'9' => self.lex_number(),
                b if is_ident_start(b) => self.lex_ident(),
                _ => self.lex_punctuation(),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        // The newline itself stays in the stream.
        self.pos = match memchr::memchr(b'\n', &self.bytes[self.pos..]) {
            Some(i) => self.pos + i,
            None => self.bytes.len(),
        };
    }

    fn skip_block_comment(&mut self) {
        let start = self.pos;
        match memchr::memmem::find(&self.bytes[self.pos + 2..], b"*/") {
            Some(i) => self.pos += 2 + i + 2,
            None => {
                self.pos = self.bytes.len();
                self.errors.push(LexError::UnterminatedComment {
                    span: Span::new(start, self.pos),
                });
            }
        }
    }

    fn lex_ident(&mut self) {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_ident_continue(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        // Non-ASCII bytes are accepted as identifier bytes; make sure the
        // token still ends on a scalar boundary.
        while !self.src.is_char_boundary(self.pos) {
            self.pos += 1;
        }
        self.push(TokenKind::Ident, start);
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        self.eat_digits();
        if self.peek() == Some(b'.') && self.peek_at(1).map_or(false, |b| b.is_ascii_digit()) {
            self.pos += 1;
            self.eat_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = matches!(self.peek_at(1), Some(b'+' | b'-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).map_or(false, |b| b.is_ascii_digit()) {
                self.pos += digit_at;
                self.eat_digits();
            }
        }
        self.push(TokenKind::Number, start);
    }

    fn eat_digits(&mut self) {
        while self.peek().map_or(false, |b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn lex_quoted_string(&mut self) {
        let start = self.pos;
        if self.scan_quoted_string() {
            self.push(TokenKind::QuotedString, start);
        } else {
            self.errors.push(LexError::UnterminatedString {
                span: Span::new(start, self.pos),
            });
            self.push(TokenKind::QuotedString, start);
        }
    }

    /// Scans a quoted template starting at the opening quote, including any
    /// nested strings inside `${ }` sequences. Returns false if the string is
    /// not closed before the end of the line.
    ///
    /// Nesting is tracked on an explicit stack, so arbitrarily deep
    /// `"${"${...}"}"` chains cannot exhaust the call stack.
    fn scan_quoted_string(&mut self) -> bool {
        self.pos += 1;
        let mut open = vec![Open::Quoted];
        while let Some(b) = self.peek() {
            if b == b'\n' {
                return false;
            }
            let Some(top) = open.pop() else {
                return true;
            };
            match top {
                Open::Quoted => match b {
                    b'"' => {
                        self.pos += 1;
                        if open.is_empty() {
                            return true;
                        }
                    }
                    b'\\' => {
                        self.pos = (self.pos + 2).min(self.bytes.len());
                        open.push(Open::Quoted);
                    }
                    b'$' | b'%' if self.peek_at(1) == Some(b) && self.peek_at(2) == Some(b'{') => {
                        // `$${` and `%%{` are escaped literals
                        self.pos += 3;
                        open.push(Open::Quoted);
                    }
                    b'$' | b'%' if self.peek_at(1) == Some(b'{') => {
                        self.pos += 2;
                        open.push(Open::Quoted);
                        open.push(Open::Sequence { braces: 1 });
                    }
                    _ => {
                        self.pos += 1;
                        open.push(Open::Quoted);
                    }
                },
                Open::Sequence { braces } => {
                    self.pos += 1;
                    match b {
                        b'{' => open.push(Open::Sequence { braces: braces + 1 }),
                        b'}' if braces > 1 => open.push(Open::Sequence { braces: braces - 1 }),
                        b'}' => {}
                        b'"' => {
                            open.push(Open::Sequence { braces });
                            open.push(Open::Quoted);
                        }
                        _ => open.push(Open::Sequence { braces }),
                    }
                }
            }
        }
        false
    }

    fn heredoc_follows(&self) -> bool {
        let mut i = self.pos + 2;
        if self.bytes.get(i) == Some(&b'-') {
            i += 1;
        }
        self.bytes.get(i).map_or(false, |&b| is_ident_start(b))
    }

    fn lex_heredoc(&mut self) {
        let start = self.pos;
        self.pos += 2;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let marker_start = self.pos;
        while self.peek().map_or(false, is_ident_continue) {
            self.pos += 1;
        }
        let marker = self.src[marker_start..self.pos].to_string();

        // Skip to the end of the opening line.
        self.skip_line_comment();
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }

        loop {
            if self.pos >= self.bytes.len() {
                self.errors.push(LexError::UnterminatedHeredoc {
                    marker,
                    span: Span::new(start, self.pos),
                });
                self.push(TokenKind::Heredoc, start);
                return;
            }
            let line_start = self.pos;
            let line_end = match memchr::memchr(b'\n', &self.bytes[line_start..]) {
                Some(i) => line_start + i,
                None => self.bytes.len(),
            };
            let line = self.src[line_start..line_end].trim_end_matches('\r');
            if line.trim_start() == marker {
                self.pos = line_end;
                self.push(TokenKind::Heredoc, start);
                return;
            }
            self.pos = if line_end < self.bytes.len() {
                line_end + 1
            } else {
                line_end
            };
        }
    }

    fn lex_punctuation(&mut self) {
        let start = self.pos;
        let b = self.bytes[self.pos];
        let next = self.peek_at(1);
        let kind = match (b, next) {
            (b'=', Some(b'=')) | (b'!', Some(b'=')) | (b'<', Some(b'=')) | (b'>', Some(b'='))
            | (b'&', Some(b'&')) | (b'|', Some(b'|')) => {
                self.pos += 2;
                TokenKind::Operator
            }
            (b'=', Some(b'>')) => {
                self.pos += 2;
                TokenKind::FatArrow
            }
            (b'.', Some(b'.')) if self.peek_at(2) == Some(b'.') => {
                self.pos += 3;
                TokenKind::Ellipsis
            }
            _ => {
                self.pos += 1;
                match b {
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'=' => TokenKind::Equals,
                    b',' => TokenKind::Comma,
                    b'.' => TokenKind::Dot,
                    b':' => TokenKind::Colon,
                    b'?' => TokenKind::Question,
                    b'+' | b'-' | b'*' | b'/' | b'%' | b'!' | b'<' | b'>' => TokenKind::Operator,
                    _ => {
                        // Step over the whole scalar so spans stay on boundaries.
                        while !self.src.is_char_boundary(self.pos) {
                            self.pos += 1;
                        }
                        let ch = self.src[start..self.pos].chars().next().unwrap_or('\u{fffd}');
                        self.errors.push(LexError::UnexpectedCharacter {
                            ch,
                            span: Span::new(start, self.pos),
                        });
                        return;
                    }
                }
            }
        };
        self.push(kind, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_attribute_tokens() {
        assert_eq!(
            kinds("count = 3\n"),
            vec![
                TokenKind::Ident,
                TokenKind::Equals,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_block_header_tokens() {
        let (tokens, errors) = tokenize("job \"example\" {\n}");
        assert!(errors.is_empty());
        let src = "job \"example\" {\n}";
        assert_eq!(tokens[0].text(src), "job");
        assert_eq!(tokens[1].kind, TokenKind::QuotedString);
        assert_eq!(tokens[1].text(src), "\"example\"");
        assert_eq!(tokens[2].kind, TokenKind::LBrace);
    }

    #[test]
    fn test_identifiers_may_contain_dashes() {
        let src = "raw-exec_driver";
        let (tokens, _) = tokenize(src);
        assert_eq!(tokens[0].text(src), "raw-exec_driver");
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "# hash\n// slashes\n/* block\n comment */ a = 1";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Equals,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_nested_strings_in_interpolation() {
        let src = r#"x = "${lookup(var.m, "key")}-suffix""#;
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty());
        assert_eq!(tokens[2].kind, TokenKind::QuotedString);
        assert_eq!(tokens[2].span.end, src.len());
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = tokenize("x = \"open\ny = 1");
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
        // Lexing continues on the following line
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_heredoc() {
        let src = "data = <<EOF\nline one\n  line two\nEOF\nnext = 1\n";
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty());
        let heredoc = tokens.iter().find(|t| t.kind == TokenKind::Heredoc).unwrap();
        assert!(heredoc.text(src).starts_with("<<EOF"));
        assert!(heredoc.text(src).ends_with("EOF"));
        assert!(tokens.iter().any(|t| t.text(src) == "next"));
    }

    #[test]
    fn test_indented_heredoc_marker() {
        let src = "data = <<-EOT\n    hi\n    EOT\n";
        let (_, errors) = tokenize(src);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unterminated_heredoc() {
        let (_, errors) = tokenize("data = <<EOF\nnever closed\n");
        assert!(matches!(errors[0], LexError::UnterminatedHeredoc { .. }));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a == b && c"),
            vec![
                TokenKind::Ident,
                TokenKind::Operator,
                TokenKind::Ident,
                TokenKind::Operator,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("k => v")[1], TokenKind::FatArrow);
        assert_eq!(kinds("a...")[1], TokenKind::Ellipsis);
    }

    #[test]
    fn test_numbers() {
        let src = "1.5e3 42";
        let (tokens, _) = tokenize(src);
        assert_eq!(tokens[0].text(src), "1.5e3");
        assert_eq!(tokens[1].text(src), "42");
    }

    #[test]
    fn test_escaped_template_sequence() {
        let src = r#"x = "$${not_interp} %%{nor_this}""#;
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty());
        assert_eq!(tokens[2].span.end, src.len());
    }

    #[test]
    fn test_deeply_nested_template_strings() {
        let depth = 20_000;
        let src = format!("x = {}{}", "\"${".repeat(depth), "}\"".repeat(depth));
        let (tokens, errors) = tokenize(&src);
        assert!(errors.is_empty());
        assert_eq!(tokens[2].span.end, src.len());

        // Unclosed at the end of the line.
        let (_, errors) = tokenize(&"\"${".repeat(depth));
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_non_ascii_identifier_keeps_boundaries() {
        let src = "café = 1";
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].text(src), "café");
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, errors) = tokenize("a = `");
        assert!(matches!(errors[0], LexError::UnexpectedCharacter { ch: '`', .. }));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }
}
