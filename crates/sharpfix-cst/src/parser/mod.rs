// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser for the supported C# subset.
//!
//! The parser walks the token vector produced by [`crate::tokenizer`] and
//! records nodes into a [`TreeBuilder`]. Ambiguities between types and
//! expressions are settled by speculative `scan_*` functions that look ahead
//! without building anything.

mod decl;
mod expr;
mod stmt;
mod types;

use thiserror::Error;

use crate::kind::SyntaxKind;
use crate::tokenizer::{tokenize, Token, TokenKind, TokenizeError};
use crate::tree::{Checkpoint, SyntaxTree, TreeBuilder};

/// A syntax error with its position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {col}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset of the offending token.
    pub offset: usize,
    /// 1-based line.
    pub line: u32,
    /// 1-based column, in characters.
    pub col: u32,
}

impl ParseError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, col) = sharpfix_core::text::byte_offset_to_position_str(source, offset);
        ParseError {
            message: message.into(),
            offset,
            line,
            col,
        }
    }

    pub(crate) fn from_tokenize(source: &str, err: TokenizeError) -> Self {
        ParseError::at(source, err.offset, err.message)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a complete C# source file.
pub fn parse_source(source: &str) -> ParseResult<SyntaxTree> {
    let tokens = tokenize(source).map_err(|e| ParseError::from_tokenize(source, e))?;
    let mut parser = Parser::new(source, &tokens);
    parser.compilation_unit()?;
    let builder = parser.builder;
    Ok(builder.finish(source.to_string(), tokens))
}

/// Predefined type keywords.
pub(crate) const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void",
];

pub(crate) struct Parser<'t> {
    source: &'t str,
    tokens: &'t [Token],
    pos: usize,
    builder: TreeBuilder,
}

impl<'t> Parser<'t> {
    fn new(source: &'t str, tokens: &'t [Token]) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
            builder: TreeBuilder::new(tokens.len()),
        }
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    /// Token at an absolute index, clamped to end of file.
    fn token_at(&self, index: usize) -> &'t Token {
        let last = self.tokens.len() - 1;
        &self.tokens[index.min(last)]
    }

    fn current(&self) -> &'t Token {
        self.token_at(self.pos)
    }

    fn nth(&self, n: usize) -> &'t Token {
        self.token_at(self.pos + n)
    }

    fn at(&self, punct: &str) -> bool {
        self.current().is_punct(punct)
    }

    fn at_kw(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    fn at_contextual(&self, word: &str) -> bool {
        self.current().is_contextual(word)
    }

    fn at_identifier(&self) -> bool {
        self.current().is_identifier()
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::EndOfFile
    }

    /// True when the token at `index` starts right where the previous one ends.
    fn adjacent_at(&self, index: usize) -> bool {
        index > 0
            && index < self.tokens.len()
            && self.tokens[index - 1].end() == self.tokens[index].offset
    }

    // ------------------------------------------------------------------
    // Tree building
    // ------------------------------------------------------------------

    fn bump(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.builder.token(self.pos);
            self.pos += 1;
        }
    }

    fn start(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind);
    }

    fn finish(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&self) -> Checkpoint {
        self.builder.checkpoint()
    }

    fn start_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind);
    }

    /// Wrap everything added since `checkpoint` in a finished node.
    fn wrap(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.start_at(checkpoint, kind);
        self.finish();
    }

    // ------------------------------------------------------------------
    // Expectations
    // ------------------------------------------------------------------

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, self.current().offset, message)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = self.current();
        let found = if found.kind == TokenKind::EndOfFile {
            "end of file".to_string()
        } else {
            format!("'{}'", found.text)
        };
        self.error(format!("expected {}, found {}", expected, found))
    }

    fn expect(&mut self, punct: &str) -> ParseResult<()> {
        if self.at(punct) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", punct)))
        }
    }

    fn expect_kw(&mut self, keyword: &str) -> ParseResult<()> {
        if self.at_kw(keyword) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<()> {
        if self.at_identifier() {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    // ------------------------------------------------------------------
    // Speculative scanning (no tree output)
    // ------------------------------------------------------------------

    fn is_punct_at(&self, index: usize, punct: &str) -> bool {
        self.token_at(index).is_punct(punct)
    }

    /// Index just past a balanced group opened at `index`.
    fn scan_balanced(&self, index: usize) -> Option<usize> {
        let (open, close) = match self.token_at(index).text.as_str() {
            "(" => ("(", ")"),
            "[" => ("[", "]"),
            "{" => ("{", "}"),
            "<" => ("<", ">"),
            _ => return None,
        };
        let mut depth = 0usize;
        let mut i = index;
        loop {
            let token = self.token_at(i);
            if token.kind == TokenKind::EndOfFile {
                return None;
            }
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            i += 1;
        }
    }

    /// `<T, U>` starting at `index`.
    fn scan_type_args(&self, index: usize) -> Option<usize> {
        if !self.is_punct_at(index, "<") {
            return None;
        }
        let mut i = index + 1;
        loop {
            i = self.scan_type(i, true)?;
            if self.is_punct_at(i, ",") {
                i += 1;
                continue;
            }
            return self.is_punct_at(i, ">").then_some(i + 1);
        }
    }

    /// `Name`, `Name<T>`, `A.B<T>.C`, `global::A.B`.
    fn scan_name(&self, index: usize) -> Option<usize> {
        let mut i = index;
        loop {
            if !self.token_at(i).is_identifier() {
                return None;
            }
            i += 1;
            if let Some(next) = self.scan_type_args(i) {
                i = next;
            }
            if (self.is_punct_at(i, ".") || self.is_punct_at(i, "::"))
                && self.token_at(i + 1).is_identifier()
            {
                i += 1;
                continue;
            }
            return Some(i);
        }
    }

    /// A type starting at `index`, returning the index just past it.
    ///
    /// `nullable` controls whether a trailing `?` is taken as part of the
    /// type; it is off after `is`/`as`, where `?` usually starts a
    /// conditional.
    fn scan_type(&self, index: usize, nullable: bool) -> Option<usize> {
        let token = self.token_at(index);
        let mut i = if token.is_punct("(") {
            self.scan_tuple_type(index)?
        } else if token.kind == TokenKind::Keyword && PREDEFINED_TYPES.contains(&token.text.as_str())
        {
            index + 1
        } else {
            self.scan_name(index)?
        };
        loop {
            if nullable && self.is_punct_at(i, "?") {
                i += 1;
            } else if self.is_punct_at(i, "[") {
                let mut j = i + 1;
                while self.is_punct_at(j, ",") {
                    j += 1;
                }
                if !self.is_punct_at(j, "]") {
                    return Some(i);
                }
                i = j + 1;
            } else {
                return Some(i);
            }
        }
    }

    /// `(T1 a, T2 b)` with at least two elements.
    fn scan_tuple_type(&self, index: usize) -> Option<usize> {
        let mut i = index + 1;
        let mut elements = 0;
        loop {
            i = self.scan_type(i, true)?;
            if self.token_at(i).is_identifier() {
                i += 1;
            }
            elements += 1;
            if self.is_punct_at(i, ",") {
                i += 1;
                continue;
            }
            if self.is_punct_at(i, ")") && elements >= 2 {
                return Some(i + 1);
            }
            return None;
        }
    }

    /// `Type name` followed by one of `terminators`; returns the index of the
    /// name.
    fn scan_typed_name(&self, index: usize, terminators: &[&str]) -> Option<usize> {
        let after_type = self.scan_type(index, true)?;
        let name = self.token_at(after_type);
        if !name.is_identifier() {
            return None;
        }
        let next = self.token_at(after_type + 1);
        let terminated = terminators.iter().any(|t| {
            if t.chars().all(|c| c.is_alphabetic()) {
                next.text == *t && next.kind != TokenKind::Punctuation
            } else {
                next.is_punct(t)
            }
        });
        terminated.then_some(after_type)
    }
}

// ============================================================================
// Tests
// ============================================================================
