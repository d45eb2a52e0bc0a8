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

//! Recursive-descent parser for HCL bodies.
//!
//! # Grammar (informal)
//!
//! ```text
//! body       = (item NEWLINE)*
//! item       = attribute | block
//! attribute  = IDENT "=" expr
//! block      = IDENT (STRING | IDENT)* "{" body "}"
//! expr       = primary postfix* (OPERATOR ...)?
//! primary    = NUMBER | STRING | HEREDOC | "true" | "false" | "null"
//!            | traversal | call | tuple | object | "(" expr ")"
//! ```
//!
//! Parsing never fails. Syntax errors become [`Diagnostic`]s and the parser
//! skips ahead to the next line (or closing brace) so the rest of the
//! document is still available to the language server.

use crate::ast::{Attribute, Block, Body, Expression, Label, TemplatePart};
use crate::diagnostic::Diagnostic;
use crate::lexer::{tokenize, LexError, Token, TokenKind};
use crate::span::Span;

/// Parser resource limits.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting of blocks and bracketed expressions (default: 100).
    pub max_nesting_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_nesting_depth: 100,
        }
    }
}

/// Result of parsing a file: the body tree plus syntax diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub body: Body,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parses an HCL file with default limits.
///
/// # Examples
///
/// ```
/// use nomad_hcl::parse;
///
/// let parsed = parse("job \"web\" {\n  datacenters = [\"dc1\"]\n}\n");
/// assert!(parsed.diagnostics.is_empty());
/// let job = &parsed.body.blocks[0];
/// assert_eq!(job.block_type, "job");
/// assert_eq!(job.labels[0].value, "web");
/// assert!(job.body.has_attribute("datacenters"));
/// ```
pub fn parse(source: &str) -> Parsed {
    parse_with_limits(source, &Limits::default())
}

/// Parses an HCL file with explicit limits.
pub fn parse_with_limits(source: &str, limits: &Limits) -> Parsed {
    let (tokens, lex_errors) = tokenize(source);
    let mut parser = Parser::new(source, tokens, limits.max_nesting_depth);
    for error in lex_errors {
        parser.lex_error(error);
    }
    let mut body = parser.parse_body(false);
    body.span = Span::new(0, source.len());
    Parsed {
        body,
        diagnostics: parser.diagnostics,
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// Depth of `[`/`(` nesting; newlines are insignificant when > 0.
    bracket_depth: usize,
    depth: usize,
    max_depth: usize,
}

fn is_item_end(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Newline | TokenKind::Eof | TokenKind::RBrace)
}

fn is_expression_end(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Newline
            | TokenKind::Eof
            | TokenKind::Comma
            | TokenKind::RBrace
            | TokenKind::RBracket
            | TokenKind::RParen
    )
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Token>, max_depth: usize) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            bracket_depth: 0,
            depth: 0,
            max_depth,
        }
    }

    // ---- token helpers ------------------------------------------------

    fn peek(&self) -> Token {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .copied()
            .unwrap_or(Token {
                kind: TokenKind::Eof,
                span: Span::point(self.source.len()),
            })
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    /// End offset of the previously consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == TokenKind::Newline {
            self.pos += 1;
        }
    }

    fn skip_newlines_if_nested(&mut self) {
        if self.bracket_depth > 0 {
            self.skip_newlines();
        }
    }

    fn error(&mut self, summary: &str, detail: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::error(summary, detail, span));
    }

    fn lex_error(&mut self, error: LexError) {
        let summary = match error {
            LexError::UnterminatedString { .. } => "Unterminated template string",
            LexError::UnterminatedHeredoc { .. } => "Unterminated template string",
            LexError::UnterminatedComment { .. } => "Unterminated comment",
            LexError::UnexpectedCharacter { .. } => "Invalid character",
        };
        let detail = format!("{}.", capitalize(&error.to_string()));
        self.error(summary, detail, error.span());
    }

    /// Skips to the end of the current item: the next newline outside any
    /// brackets, or a closing brace / end of input at the current level.
    fn recover_to_item_end(&mut self) {
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => return,
                TokenKind::Newline if depth == 0 => return,
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ---- bodies ---------------------------------------------------------

    fn parse_body(&mut self, in_block: bool) -> Body {
        let mut body = Body::default();
        loop {
            self.skip_newlines();
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::RBrace if in_block => break,
                TokenKind::RBrace => {
                    self.error(
                        "Argument or block definition required",
                        "An argument or block definition is required here; this closing brace has no matching opening brace.",
                        token.span,
                    );
                    self.advance();
                }
                TokenKind::Ident => self.parse_item(&mut body),
                _ => {
                    self.error(
                        "Argument or block definition required",
                        "An argument or block definition is required here.",
                        token.span,
                    );
                    self.recover_to_item_end();
                    if self.peek_kind() == TokenKind::RBrace && !in_block {
                        self.advance();
                    }
                }
            }
        }
        body
    }

    fn parse_item(&mut self, body: &mut Body) {
        let name_token = self.advance();
        let name = self.text(name_token).to_string();

        match self.peek_kind() {
            TokenKind::Equals => {
                self.advance();
                self.skip_newlines_if_nested();
                let expr = self.parse_expression();
                let span = name_token.span.merge(&expr.span());
                body.attributes.push(Attribute {
                    name,
                    name_span: name_token.span,
                    expr,
                    span,
                });
                self.expect_item_end("Missing newline after argument", "An argument definition must end with a newline.");
            }
            TokenKind::QuotedString | TokenKind::Ident | TokenKind::LBrace => {
                if let Some(block) = self.parse_block(name, name_token.span) {
                    body.blocks.push(block);
                }
            }
            _ => {
                let found = self.peek();
                self.error(
                    "Argument or block definition required",
                    "An argument or block definition is required here. To set an argument, use the equals sign \"=\" to introduce the argument value.",
                    found.span,
                );
                self.recover_to_item_end();
            }
        }
    }

    fn expect_item_end(&mut self, summary: &str, detail: &str) {
        let token = self.peek();
        if !is_item_end(token.kind) {
            self.error(summary, detail, token.span);
            self.recover_to_item_end();
        }
    }

    fn parse_block(&mut self, block_type: String, type_span: Span) -> Option<Block> {
        let mut labels = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::QuotedString => {
                    self.advance();
                    let value = self.label_value(token);
                    labels.push(Label {
                        value,
                        span: token.span,
                    });
                }
                TokenKind::Ident => {
                    self.advance();
                    labels.push(Label {
                        value: self.text(token).to_string(),
                        span: token.span,
                    });
                }
                _ => break,
            }
        }
        let header_span = labels
            .last()
            .map(|l| type_span.merge(&l.span))
            .unwrap_or(type_span);

        let open = self.peek();
        if open.kind != TokenKind::LBrace {
            self.error(
                "Invalid block definition",
                "A block definition must have block content delimited by \"{\" and \"}\", starting on the same line as the block header.",
                open.span,
            );
            self.recover_to_item_end();
            return None;
        }
        self.advance();

        if self.depth >= self.max_depth {
            self.error(
                "Nesting too deep",
                format!("Blocks may be nested at most {} levels deep.", self.max_depth),
                open.span,
            );
            self.skip_to_matching_brace();
            return None;
        }

        self.depth += 1;
        let saved_brackets = std::mem::replace(&mut self.bracket_depth, 0);
        let mut body = self.parse_body(true);
        self.bracket_depth = saved_brackets;
        self.depth -= 1;

        let close = self.peek();
        let closed = close.kind == TokenKind::RBrace;
        let (inner_end, body_end) = if closed {
            self.advance();
            (close.span.start, close.span.end)
        } else {
            self.error(
                "Unclosed configuration block",
                "There is no closing brace for this block before the end of the file. This may be caused by incorrect brace nesting elsewhere in this file.",
                open.span,
            );
            (self.source.len(), self.source.len())
        };
        body.span = Span::new(open.span.end, inner_end);

        let block = Block {
            block_type,
            type_span,
            labels,
            header_span,
            body,
            body_span: Span::new(open.span.start, body_end),
            span: Span::new(type_span.start, body_end),
        };

        if closed {
            self.expect_item_end(
                "Missing newline after block definition",
                "A block definition must end with a newline.",
            );
        }
        Some(block)
    }

    fn skip_to_matching_brace(&mut self) {
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance().kind {
                TokenKind::Eof => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
        }
    }

    fn label_value(&mut self, token: Token) -> String {
        let parts = self.template_parts(token);
        let mut value = String::new();
        for part in parts {
            match part {
                TemplatePart::Literal(text) => value.push_str(&text),
                TemplatePart::Interpolation(_) | TemplatePart::Directive(_) => {
                    self.error(
                        "Invalid string literal",
                        "Template sequences are not allowed in this string. To include a literal \"$\", double it (as \"$$\") to escape it.",
                        token.span,
                    );
                    return self.text(token).trim_matches('"').to_string();
                }
            }
        }
        value
    }

    // ---- expressions ----------------------------------------------------

    fn parse_expression(&mut self) -> Expression {
        let start = self.peek().span.start;
        let first = self.parse_postfix();
        self.skip_newlines_if_nested();

        match self.peek_kind() {
            TokenKind::Operator | TokenKind::Question => {
                self.consume_complex_tail();
                Expression::Complex {
                    span: Span::new(start, self.prev_end()),
                }
            }
            _ => first,
        }
    }

    /// Consumes the remainder of an operator / conditional expression.
    fn consume_complex_tail(&mut self) {
        let mut depth = 0usize;
        loop {
            let kind = self.peek_kind();
            if depth == 0 && is_expression_end(kind) {
                if kind == TokenKind::Newline && self.bracket_depth > 0 {
                    self.advance();
                    continue;
                }
                return;
            }
            match kind {
                TokenKind::Eof => return,
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_postfix(&mut self) -> Expression {
        let start = self.peek().span.start;
        let expr = self.parse_primary();
        if matches!(expr, Expression::Traversal { .. }) {
            return expr;
        }
        if matches!(self.peek_kind(), TokenKind::Dot | TokenKind::LBracket) {
            // Attribute or index access on a non-variable value.
            while matches!(self.peek_kind(), TokenKind::Dot | TokenKind::LBracket) {
                if self.peek_kind() == TokenKind::Dot {
                    self.advance();
                    self.advance();
                } else {
                    self.parse_index();
                }
            }
            return Expression::Complex {
                span: Span::new(start, self.prev_end()),
            };
        }
        expr
    }

    fn parse_primary(&mut self) -> Expression {
        let token = self.peek();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = self.text(token).parse::<f64>().unwrap_or(0.0);
                Expression::Number {
                    value,
                    span: token.span,
                }
            }
            TokenKind::QuotedString | TokenKind::Heredoc => {
                self.advance();
                let parts = self.template_parts(token);
                Expression::Template {
                    parts,
                    span: token.span,
                }
            }
            TokenKind::Ident => self.parse_identifier_expression(),
            TokenKind::LBracket => self.nested(|p| p.parse_tuple()),
            TokenKind::LBrace => self.nested(|p| p.parse_object()),
            TokenKind::LParen => self.nested(|p| p.parse_parenthesized()),
            TokenKind::Operator if matches!(self.text(token), "-" | "!") => {
                self.advance();
                let operand = self.nested(|p| p.parse_postfix());
                match operand {
                    Expression::Number { value, span } if self.text(token) == "-" => Expression::Number {
                        value: -value,
                        span: token.span.merge(&span),
                    },
                    other => Expression::Complex {
                        span: token.span.merge(&other.span()),
                    },
                }
            }
            _ => {
                let detail = match token.kind {
                    TokenKind::Newline | TokenKind::Eof => {
                        "Expected the start of an expression, but found the end of the line.".to_string()
                    }
                    _ => format!(
                        "Expected the start of an expression, but found {:?}.",
                        self.text(token)
                    ),
                };
                self.error("Invalid expression", detail, token.span);
                if !is_expression_end(token.kind) {
                    self.advance();
                }
                Expression::Complex {
                    span: Span::point(token.span.start),
                }
            }
        }
    }

    /// Runs `f` one nesting level deeper, refusing to recurse past the limit.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Expression) -> Expression {
        let open = self.peek();
        if self.depth >= self.max_depth {
            self.error(
                "Nesting too deep",
                format!("Expressions may be nested at most {} levels deep.", self.max_depth),
                open.span,
            );
            self.recover_to_item_end();
            return Expression::Complex {
                span: Span::new(open.span.start, self.prev_end()),
            };
        }
        self.depth += 1;
        let expr = f(self);
        self.depth -= 1;
        expr
    }

    fn parse_identifier_expression(&mut self) -> Expression {
        let token = self.advance();
        let name = self.text(token);
        match name {
            "true" | "false" => {
                return Expression::Bool {
                    value: name == "true",
                    span: token.span,
                }
            }
            "null" => return Expression::Null { span: token.span },
            _ => {}
        }

        if self.peek_kind() == TokenKind::LParen {
            return self.nested(|p| p.parse_call(token));
        }

        let mut path = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let next = self.peek_kind_at(1);
                    if matches!(next, TokenKind::Ident | TokenKind::Number) {
                        self.advance();
                        let step = self.advance();
                        path.push(self.text(step).to_string());
                    } else if next == TokenKind::Operator
                        && self.tokens.get(self.pos + 1).map(|t| self.text(*t)) == Some("*")
                    {
                        self.advance();
                        self.advance();
                        path.push("*".to_string());
                    } else {
                        let dot = self.advance();
                        self.error(
                            "Invalid attribute name",
                            "An attribute name is required after a dot.",
                            dot.span,
                        );
                        break;
                    }
                }
                TokenKind::LBracket => {
                    let index = self.parse_index();
                    path.push(index);
                }
                _ => break,
            }
        }

        Expression::Traversal {
            root: name.to_string(),
            path,
            span: Span::new(token.span.start, self.prev_end()),
        }
    }

    /// Parses `[ expr ]` and returns its source text as a path step.
    fn parse_index(&mut self) -> String {
        let open = self.advance();
        self.bracket_depth += 1;
        self.skip_newlines();
        let token = self.peek();
        if token.kind == TokenKind::Operator && self.text(token) == "*" {
            self.advance();
        } else if token.kind != TokenKind::RBracket {
            self.nested(|p| p.parse_expression());
        }
        self.skip_newlines();
        self.bracket_depth -= 1;
        let close = self.peek();
        if close.kind == TokenKind::RBracket {
            self.advance();
        } else {
            self.error(
                "Missing close bracket on index",
                "The index operator must end with a closing bracket (\"]\").",
                close.span,
            );
        }
        self.source
            .get(open.span.start..self.prev_end())
            .unwrap_or("[]")
            .to_string()
    }

    fn parse_call(&mut self, name_token: Token) -> Expression {
        self.advance(); // (
        self.bracket_depth += 1;
        let mut args = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::RParen | TokenKind::Eof => break,
                _ => {}
            }
            args.push(self.parse_expression());
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Ellipsis => {
                    self.advance();
                }
                TokenKind::RParen => break,
                _ => {
                    let token = self.peek();
                    self.error(
                        "Missing argument separator",
                        "A comma is required to separate each function argument from the next.",
                        token.span,
                    );
                    break;
                }
            }
        }
        self.bracket_depth -= 1;
        let close = self.peek();
        if close.kind == TokenKind::RParen {
            self.advance();
        } else {
            self.error(
                "Unterminated function call",
                "There is no closing parenthesis for this function call.",
                name_token.span,
            );
            self.recover_nested(TokenKind::RParen);
        }
        Expression::FunctionCall {
            name: self.text(name_token).to_string(),
            args,
            span: Span::new(name_token.span.start, self.prev_end()),
        }
    }

    fn parse_tuple(&mut self) -> Expression {
        let open = self.advance();
        self.bracket_depth += 1;
        self.skip_newlines();

        if self.peek_kind() == TokenKind::Ident && self.text(self.peek()) == "for" {
            self.bracket_depth -= 1;
            return self.consume_for_expression(open, TokenKind::RBracket);
        }

        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek_kind(), TokenKind::RBracket | TokenKind::Eof) {
                break;
            }
            items.push(self.parse_expression());
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBracket => break,
                _ => {
                    let token = self.peek();
                    self.error(
                        "Missing item separator",
                        "Expected a comma to mark the beginning of the next item.",
                        token.span,
                    );
                    break;
                }
            }
        }
        self.bracket_depth -= 1;
        let close = self.peek();
        if close.kind == TokenKind::RBracket {
            self.advance();
        } else {
            self.recover_nested(TokenKind::RBracket);
        }
        Expression::Tuple {
            items,
            span: Span::new(open.span.start, self.prev_end()),
        }
    }

    fn parse_object(&mut self) -> Expression {
        let open = self.advance();
        let saved_brackets = std::mem::replace(&mut self.bracket_depth, 0);
        self.skip_newlines();

        if self.peek_kind() == TokenKind::Ident && self.text(self.peek()) == "for" {
            self.bracket_depth = saved_brackets;
            return self.consume_for_expression(open, TokenKind::RBrace);
        }

        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                break;
            }
            let key = self.parse_object_key();
            match self.peek_kind() {
                TokenKind::Equals | TokenKind::Colon => {
                    self.advance();
                }
                _ => {
                    let token = self.peek();
                    self.error(
                        "Missing key/value separator",
                        "Expected an equals sign (\"=\") to mark the beginning of the attribute value.",
                        token.span,
                    );
                    self.recover_to_item_end();
                    continue;
                }
            }
            let value = self.parse_expression();
            items.push((key, value));
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::RBrace => {}
                _ => {
                    let token = self.peek();
                    self.error(
                        "Missing attribute separator",
                        "Expected a newline or comma to mark the beginning of the next attribute.",
                        token.span,
                    );
                    self.recover_to_item_end();
                }
            }
        }
        self.bracket_depth = saved_brackets;
        let close = self.peek();
        if close.kind == TokenKind::RBrace {
            self.advance();
        } else {
            self.error(
                "Unterminated object constructor expression",
                "There is no corresponding closing brace before the end of the file.",
                open.span,
            );
        }
        Expression::Object {
            items,
            span: Span::new(open.span.start, self.prev_end()),
        }
    }

    /// Object keys written as bare identifiers are literal strings.
    fn parse_object_key(&mut self) -> Expression {
        let token = self.peek();
        if token.kind == TokenKind::Ident
            && matches!(self.peek_kind_at(1), TokenKind::Equals | TokenKind::Colon)
        {
            self.advance();
            return Expression::Template {
                parts: vec![TemplatePart::Literal(self.text(token).to_string())],
                span: token.span,
            };
        }
        self.parse_postfix()
    }

    fn parse_parenthesized(&mut self) -> Expression {
        let open = self.advance();
        self.bracket_depth += 1;
        self.skip_newlines();
        let inner = self.parse_expression();
        self.skip_newlines();
        self.bracket_depth -= 1;
        if self.peek_kind() == TokenKind::RParen {
            self.advance();
        } else {
            let token = self.peek();
            self.error(
                "Unbalanced parentheses",
                "Expected a closing parenthesis to terminate the expression.",
                token.span,
            );
            self.recover_nested(TokenKind::RParen);
        }
        Expression::Parenthesized {
            inner: Box::new(inner),
            span: Span::new(open.span.start, self.prev_end()),
        }
    }

    fn consume_for_expression(&mut self, open: Token, close: TokenKind) -> Expression {
        self.recover_nested(close);
        Expression::Complex {
            span: Span::new(open.span.start, self.prev_end()),
        }
    }

    /// Skips to and consumes the closing token of the current bracket level.
    fn recover_nested(&mut self, close: TokenKind) {
        let mut depth = 0usize;
        loop {
            let kind = self.peek_kind();
            match kind {
                TokenKind::Eof => return,
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                k if k == close && depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ---- templates ------------------------------------------------------

    fn template_parts(&mut self, token: Token) -> Vec<TemplatePart> {
        let text = self.text(token);
        if token.kind == TokenKind::Heredoc {
            return self.heredoc_parts(token, text);
        }
        let inner_start = token.span.start + 1;
        let inner_end = if text.len() >= 2 && text.ends_with('"') {
            token.span.end - 1
        } else {
            token.span.end
        };
        self.split_template(Span::new(inner_start, inner_end), true)
    }

    fn heredoc_parts(&mut self, token: Token, text: &str) -> Vec<TemplatePart> {
        let indented = text.starts_with("<<-");
        let content_start = match text.find('\n') {
            Some(i) => token.span.start + i + 1,
            None => return Vec::new(),
        };
        // The closing marker sits on the last line of the token.
        let content_end = match text.rfind('\n') {
            Some(i) if token.span.start + i + 1 > content_start => token.span.start + i + 1,
            _ => content_start,
        };
        let parts = self.split_template(Span::new(content_start, content_end), false);
        if !indented {
            return parts;
        }
        strip_common_indent(parts)
    }

    /// Splits template text into literal and interpolation parts.
    fn split_template(&mut self, span: Span, quoted: bool) -> Vec<TemplatePart> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut i = span.start;

        while i < span.end {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            if quoted && b == b'\\' {
                let (decoded, consumed) = decode_escape(&source[i..span.end]);
                literal.push_str(&decoded);
                i += consumed;
                continue;
            }
            if (b == b'$' || b == b'%') && next == Some(b) && bytes.get(i + 2) == Some(&b'{') {
                literal.push(b as char);
                literal.push('{');
                i += 3;
                continue;
            }
            if (b == b'$' || b == b'%') && next == Some(b'{') {
                let close = find_sequence_end(bytes, i + 2, span.end);
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                let inner = Span::new(i + 2, close.unwrap_or(span.end));
                if b == b'$' {
                    let expr = self.parse_interpolation(inner);
                    parts.push(TemplatePart::Interpolation(Box::new(expr)));
                } else {
                    parts.push(TemplatePart::Directive(inner));
                }
                i = close.map(|c| c + 1).unwrap_or(span.end);
                continue;
            }
            let ch_len = source[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            literal.push_str(&source[i..i + ch_len]);
            i += ch_len;
        }
        if !literal.is_empty() {
            parts.push(TemplatePart::Literal(literal));
        }
        parts
    }

    fn parse_interpolation(&mut self, span: Span) -> Expression {
        let mut inner = span;
        let text = self.source.get(span.start..span.end).unwrap_or("");
        if text.starts_with('~') {
            inner.start += 1;
        }
        if text.ends_with('~') && inner.end > inner.start {
            inner.end -= 1;
        }

        if self.depth >= self.max_depth {
            self.error(
                "Nesting too deep",
                format!("Expressions may be nested at most {} levels deep.", self.max_depth),
                span,
            );
            return Expression::Complex { span };
        }

        let (mut tokens, lex_errors) = tokenize(&self.source[inner.start..inner.end]);
        for token in &mut tokens {
            token.span = Span::new(token.span.start + inner.start, token.span.end + inner.start);
        }
        let mut sub = Parser::new(self.source, tokens, self.max_depth);
        sub.depth = self.depth + 1;
        sub.bracket_depth = 1;
        for error in lex_errors {
            sub.lex_error(shift_lex_error(error, inner.start));
        }
        sub.skip_newlines();
        let expr = sub.parse_expression();
        sub.skip_newlines();
        if sub.peek_kind() != TokenKind::Eof {
            let token = sub.peek();
            sub.error(
                "Extra characters after interpolation expression",
                "Expected a closing brace to end the interpolation expression.",
                token.span,
            );
        }
        self.diagnostics.append(&mut sub.diagnostics);
        expr
    }
}

/// Finds the `}` closing a `${` / `%{` sequence whose content starts at
/// `from`, skipping nested braces and quoted strings.
fn find_sequence_end(bytes: &[u8], from: usize, limit: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = from;
    let mut in_string = false;
    while i < limit {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Decodes one backslash escape at the start of `text`. Returns the decoded
/// text and the number of bytes consumed.
fn decode_escape(text: &str) -> (String, usize) {
    let mut chars = text.chars();
    chars.next(); // backslash
    let Some(c) = chars.next() else {
        return ("\\".to_string(), 1);
    };
    let simple = match c {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '"' => Some('"'),
        '\\' => Some('\\'),
        _ => None,
    };
    if let Some(decoded) = simple {
        return (decoded.to_string(), 2);
    }
    let digits = match c {
        'u' => 4,
        'U' => 8,
        _ => return (format!("\\{}", c), 1 + c.len_utf8()),
    };
    let hex = text.get(2..2 + digits).unwrap_or("");
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(decoded) if hex.len() == digits => (decoded.to_string(), 2 + digits),
        _ => (format!("\\{}", c), 2),
    }
}

fn strip_common_indent(parts: Vec<TemplatePart>) -> Vec<TemplatePart> {
    let literal_text: String = parts
        .iter()
        .filter_map(|p| match p {
            TemplatePart::Literal(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let indent = literal_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    if indent == 0 {
        return parts;
    }
    parts
        .into_iter()
        .map(|part| match part {
            TemplatePart::Literal(text) => TemplatePart::Literal(
                text.split_inclusive('\n')
                    .map(|line| {
                        let ws = line.len() - line.trim_start_matches([' ', '\t']).len();
                        &line[ws.min(indent)..]
                    })
                    .collect(),
            ),
            other => other,
        })
        .collect()
}

fn shift_lex_error(error: LexError, base: usize) -> LexError {
    let shift = |span: Span| Span::new(span.start + base, span.end + base);
    match error {
        LexError::UnterminatedString { span } => LexError::UnterminatedString { span: shift(span) },
        LexError::UnterminatedHeredoc { marker, span } => LexError::UnterminatedHeredoc {
            marker,
            span: shift(span),
        },
        LexError::UnterminatedComment { span } => LexError::UnterminatedComment { span: shift(span) },
        LexError::UnexpectedCharacter { ch, span } => LexError::UnexpectedCharacter {
            ch,
            span: shift(span),
        },
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(expr: &Expression) -> Option<String> {
        match expr {
            Expression::Template { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => out.push_str(text),
                        _ => return None,
                    }
                }
                Some(out)
            }
            _ => None,
        }
    }

    const JOB: &str = r#"job "example" {
  datacenters = ["dc1"]

  group "cache" {
    count = 1

    task "redis" {
      driver = "docker"

      config {
        image = "redis:7"
        ports = ["db"]
      }
    }
  }
}
"#;

    #[test]
    fn test_parse_nested_blocks() {
        let parsed = parse(JOB);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

        let job = &parsed.body.blocks[0];
        assert_eq!(job.block_type, "job");
        assert_eq!(job.label_values(), vec!["example"]);

        let group = &job.body.blocks[0];
        assert_eq!(group.block_type, "group");
        assert!(matches!(
            group.body.attribute("count").map(|a| &a.expr),
            Some(Expression::Number { value, .. }) if *value == 1.0
        ));

        let task = &group.body.blocks[0];
        let driver = task.body.attribute("driver").unwrap();
        assert_eq!(literal(&driver.expr).as_deref(), Some("docker"));
        assert_eq!(task.body.blocks[0].block_type, "config");
    }

    #[test]
    fn test_spans_point_at_source() {
        let parsed = parse(JOB);
        let job = &parsed.body.blocks[0];
        assert_eq!(&JOB[job.type_span.start..job.type_span.end], "job");
        assert_eq!(&JOB[job.header_span.start..job.header_span.end], "job \"example\"");
        assert_eq!(&JOB[job.body_span.start..job.body_span.start + 1], "{");
        assert_eq!(&JOB[job.body_span.end - 1..job.body_span.end], "}");

        let dcs = job.body.attribute("datacenters").unwrap();
        assert_eq!(&JOB[dcs.name_span.start..dcs.name_span.end], "datacenters");
        assert_eq!(&JOB[dcs.expr.span().start..dcs.expr.span().end], "[\"dc1\"]");
    }

    #[test]
    fn test_sibling_block_spans_never_overlap() {
        let src = "a {\n}\nb {\n  c {}\n}\na { x = 1 }\n";
        let parsed = parse(src);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        let blocks = &parsed.body.blocks;
        assert_eq!(blocks.len(), 3);
        for (i, first) in blocks.iter().enumerate() {
            for second in &blocks[i + 1..] {
                assert!(!first.span.overlaps(&second.span));
                assert!(!first.body_span.overlaps(&second.body_span));
            }
        }
    }

    #[test]
    fn test_single_line_block() {
        let parsed = parse("resources { cpu = 500 }\n");
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert!(parsed.body.blocks[0].body.has_attribute("cpu"));
    }

    #[test]
    fn test_template_with_interpolation() {
        let parsed = parse("image = \"redis:${var.version}\"\n");
        assert!(parsed.diagnostics.is_empty());
        let expr = &parsed.body.attributes[0].expr;
        match expr {
            Expression::Template { parts, .. } => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(&parts[0], TemplatePart::Literal(t) if t == "redis:"));
                match &parts[1] {
                    TemplatePart::Interpolation(inner) => match inner.as_ref() {
                        Expression::Traversal { root, path, .. } => {
                            assert_eq!(root, "var");
                            assert_eq!(path, &vec!["version".to_string()]);
                        }
                        other => panic!("unexpected {:?}", other),
                    },
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_escapes_are_decoded() {
        let parsed = parse(r#"x = "a\"b\né $${lit}""#);
        let value = literal(&parsed.body.attributes[0].expr).unwrap();
        assert_eq!(value, "a\"b\né ${lit}");
    }

    #[test]
    fn test_heredoc_template() {
        let src = "data = <<EOF\nhello\nworld\nEOF\n";
        let parsed = parse(src);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert_eq!(literal(&parsed.body.attributes[0].expr).unwrap(), "hello\nworld\n");
    }

    #[test]
    fn test_indented_heredoc_strips_indent() {
        let src = "data = <<-EOT\n    one\n      two\n    EOT\n";
        let parsed = parse(src);
        assert_eq!(literal(&parsed.body.attributes[0].expr).unwrap(), "one\n  two\n");
    }

    #[test]
    fn test_complex_expressions_are_opaque() {
        let parsed = parse("a = var.x == \"y\" ? 1 : 2\nb = 2\n");
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert!(matches!(parsed.body.attributes[0].expr, Expression::Complex { .. }));
        assert_eq!(parsed.body.attributes[1].name, "b");
    }

    #[test]
    fn test_multiline_tuple_and_object() {
        let src = "ports = [\n  \"http\",\n  \"grpc\",\n]\nmeta = {\n  a = 1\n  b = \"x\"\n}\n";
        let parsed = parse(src);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert!(matches!(&parsed.body.attributes[0].expr, Expression::Tuple { items, .. } if items.len() == 2));
        assert!(matches!(&parsed.body.attributes[1].expr, Expression::Object { items, .. } if items.len() == 2));
    }

    #[test]
    fn test_function_call_and_for_expression() {
        let src = "a = lookup(var.m, \"k\", null)\nb = [for s in var.list : upper(s)]\n";
        let parsed = parse(src);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert!(matches!(&parsed.body.attributes[0].expr, Expression::FunctionCall { name, args, .. } if name == "lookup" && args.len() == 3));
        assert!(matches!(parsed.body.attributes[1].expr, Expression::Complex { .. }));
    }

    #[test]
    fn test_missing_equals_recovers() {
        let parsed = parse("job \"a\" {\n  count 3 4\n  region = \"global\"\n}\n");
        assert!(parsed.has_errors());
        let job = &parsed.body.blocks[0];
        assert!(job.body.has_attribute("region"));
    }

    #[test]
    fn test_unclosed_block_reports_and_keeps_structure() {
        let src = "job \"a\" {\n  group \"b\" {\n    count = 1\n";
        let parsed = parse(src);
        assert!(parsed
            .diagnostics
            .iter()
            .any(|d| d.summary == "Unclosed configuration block"));
        let job = &parsed.body.blocks[0];
        assert_eq!(job.body_span.end, src.len());
        assert!(job.body.blocks[0].body.has_attribute("count"));
    }

    #[test]
    fn test_stray_closing_brace() {
        let parsed = parse("}\na = 1\n");
        assert!(parsed.has_errors());
        assert!(parsed.body.has_attribute("a"));
    }

    #[test]
    fn test_interpolated_label_is_rejected() {
        let parsed = parse("job \"${var.name}\" {\n}\n");
        assert!(parsed.diagnostics.iter().any(|d| d.summary == "Invalid string literal"));
        assert_eq!(parsed.body.blocks.len(), 1);
    }

    #[test]
    fn test_nesting_limit() {
        let src = "a = ".to_string() + &"[".repeat(20) + &"]".repeat(20) + "\n";
        let parsed = parse_with_limits(&src, &Limits { max_nesting_depth: 5 });
        assert!(parsed.diagnostics.iter().any(|d| d.summary == "Nesting too deep"));
    }

    #[test]
    fn test_negative_number() {
        let parsed = parse("weight = -50\n");
        assert!(matches!(parsed.body.attributes[0].expr, Expression::Number { value, .. } if value == -50.0));
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse("");
        assert!(parsed.body.is_empty());
        assert!(parsed.diagnostics.is_empty());
    }
}
