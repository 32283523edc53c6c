// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lossless C# tokenizer.
//!
//! Every byte of the input ends up either in a token's text or in one of its
//! trivia lists, so concatenating `leading + text + trailing` over all tokens
//! reproduces the source exactly.
//!
//! `>` is always produced as a single token (except in `>=`); the parser glues
//! adjacent `>` tokens into shift operators so that nested generic argument
//! lists close cleanly.

use serde::Serialize;
use thiserror::Error;
use winnow::combinator::{alt, opt};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_until, take_while};
use winnow::ModalResult;

use sharpfix_core::patch::Span;

use crate::trivia::{self, Trivia, TriviaKind};

// ============================================================================
// Tokens
// ============================================================================

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    IntegerLiteral,
    RealLiteral,
    StringLiteral,
    CharacterLiteral,
    Punctuation,
    EndOfFile,
}

/// A token with its attached trivia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of `text` in the source.
    pub offset: usize,
    pub leading: Vec<Trivia>,
    pub trailing: Vec<Trivia>,
}

impl Token {
    /// Span of the token text, without trivia.
    pub fn span(&self) -> Span {
        Span::new(self.offset, self.end())
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Offset where the leading trivia starts.
    pub fn full_start(&self) -> usize {
        self.offset - trivia::width(&self.leading)
    }

    /// Offset where the trailing trivia ends.
    pub fn full_end(&self) -> usize {
        self.end() + trivia::width(&self.trailing)
    }

    pub fn full_span(&self) -> Span {
        Span::new(self.full_start(), self.full_end())
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == punct
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Identifier or contextual keyword with the given spelling.
    pub fn is_contextual(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::IntegerLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharacterLiteral
        )
    }

    /// Identifier text with a verbatim `@` prefix stripped.
    pub fn value_text(&self) -> &str {
        match self.kind {
            TokenKind::Identifier => self.text.strip_prefix('@').unwrap_or(&self.text),
            _ => &self.text,
        }
    }

    pub fn leading_text(&self) -> String {
        trivia::render(&self.leading)
    }

    pub fn trailing_text(&self) -> String {
        trivia::render(&self.trailing)
    }
}

/// Reserved C# keywords. Contextual keywords (`var`, `get`, `where`, ...)
/// lex as identifiers.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Multi-character operators, longest first.
const COMPOUND_PUNCTUATION: &[&str] = &[
    "??=", "<<=", "=>", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "<<", "??", "::", "->", "..",
];

const SINGLE_PUNCTUATION: &[char] = &[
    '{', '}', '(', ')', '[', ']', ';', ',', '.', ':', '?', '+', '-', '*', '/', '%', '&', '|',
    '^', '!', '~', '=', '<', '>',
];

// ============================================================================
// Errors
// ============================================================================

/// Failure to split the input into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct TokenizeError {
    pub message: String,
    pub offset: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        TokenizeError {
            message: message.into(),
            offset,
        }
    }
}

pub type TokenizeResult<T> = Result<T, TokenizeError>;

// ============================================================================
// Trivia lexers
// ============================================================================

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{FEFF}' | '\u{00A0}')
}

fn whitespace<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., is_space).parse_next(input)
}

fn end_of_line<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    alt(("\r\n", "\n", "\r")).parse_next(input)
}

fn single_line_comment<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    ("//", take_till(0.., ['\r', '\n'])).take().parse_next(input)
}

fn multi_line_comment<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    ("/*", take_until(0.., "*/"), "*/").take().parse_next(input)
}

fn directive<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    ('#', take_till(0.., ['\r', '\n'])).take().parse_next(input)
}

/// One trivia piece other than a directive.
fn trivia_piece(input: &mut &str) -> ModalResult<Trivia> {
    alt((
        whitespace.map(|t| Trivia::new(TriviaKind::Whitespace, t)),
        end_of_line.map(|t| Trivia::new(TriviaKind::EndOfLine, t)),
        single_line_comment.map(|t| Trivia::new(TriviaKind::SingleLineComment, t)),
        multi_line_comment.map(|t| Trivia::new(TriviaKind::MultiLineComment, t)),
    ))
    .parse_next(input)
}

// ============================================================================
// Token lexers
// ============================================================================

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        opt('@'),
        take_while(1, is_ident_start),
        take_while(0.., is_ident_continue),
    )
        .take()
        .parse_next(input)
}

fn digits<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_ascii_digit() || c == '_').parse_next(input)
}

fn prefixed_integer<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        alt((
            (
                '0',
                one_of(['x', 'X']),
                take_while(1.., |c: char| c.is_ascii_hexdigit() || c == '_'),
            ),
            (
                '0',
                one_of(['b', 'B']),
                take_while(1.., |c: char| c == '0' || c == '1' || c == '_'),
            ),
        )),
        take_while(0..=2, ['u', 'U', 'l', 'L']),
    )
        .take()
        .parse_next(input)
}

fn exponent<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (one_of(['e', 'E']), opt(one_of(['+', '-'])), digits)
        .take()
        .parse_next(input)
}

fn decimal_number<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    alt((
        (
            digits,
            opt(('.', digits)),
            opt(exponent),
            take_while(0..=2, ['u', 'U', 'l', 'L', 'f', 'F', 'd', 'D', 'm', 'M']),
        )
            .take(),
        (
            '.',
            digits,
            opt(exponent),
            take_while(0..=1, ['f', 'F', 'd', 'D', 'm', 'M']),
        )
            .take(),
    ))
    .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<(TokenKind, String)> {
    if let Some(text) = opt(prefixed_integer).parse_next(input)? {
        return Ok((TokenKind::IntegerLiteral, text.to_string()));
    }
    let text = decimal_number.parse_next(input)?;
    let real = text.contains('.')
        || text.contains(['e', 'E'])
        || text.ends_with(['f', 'F', 'd', 'D', 'm', 'M']);
    let kind = if real {
        TokenKind::RealLiteral
    } else {
        TokenKind::IntegerLiteral
    };
    Ok((kind, text.to_string()))
}

/// Length of a quoted body starting right after the opening quote.
///
/// `verbatim` bodies escape quotes by doubling; regular bodies use `\`.
/// `interpolated` bodies may contain `{...}` holes with nested strings.
fn quoted_len(body: &str, verbatim: bool, interpolated: bool) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !verbatim => i += 2,
            b'"' if verbatim && bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => return Some(i + 1),
            b'\n' | b'\r' if !verbatim => return None,
            b'{' if interpolated && bytes.get(i + 1) == Some(&b'{') => i += 2,
            b'{' if interpolated => i += 1 + hole_len(&body[i + 1..])?,
            _ => i += 1,
        }
    }
    None
}

/// Length of an interpolation hole up to and including its closing `}`.
fn hole_len(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' if depth == 0 => return Some(i + 1),
            b'}' => {
                depth -= 1;
                i += 1;
            }
            b'"' => i += 1 + quoted_len(&body[i + 1..], false, false)?,
            b'@' if bytes.get(i + 1) == Some(&b'"') => {
                i += 2 + quoted_len(&body[i + 2..], true, false)?
            }
            b'\'' => i += 1 + char_body_len(&body[i + 1..])?,
            b'\n' | b'\r' => return None,
            _ => i += 1,
        }
    }
    None
}

fn char_body_len(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' if i > 0 => return Some(i + 1),
            b'\n' | b'\r' => return None,
            _ => i += 1,
        }
    }
    None
}

fn split_off<'s>(input: &mut &'s str, len: usize) -> ModalResult<&'s str> {
    let text: &'s str = input;
    if len > text.len() || !text.is_char_boundary(len) {
        return Err(ErrMode::from_input(input));
    }
    let (head, rest) = text.split_at(len);
    *input = rest;
    Ok(head)
}

fn string_literal<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    let prefix: &str = alt(("$@\"", "@$\"", "$\"", "@\"", "\"")).parse_next(input)?;
    let verbatim = prefix.contains('@');
    let interpolated = prefix.contains('$');
    let len = quoted_len(input, verbatim, interpolated).ok_or_else(|| ErrMode::from_input(input))?;
    split_off(input, len)?;
    Ok(prefix)
}

fn character_literal<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    '\''.parse_next(input)?;
    let len = char_body_len(input).ok_or_else(|| ErrMode::from_input(input))?;
    split_off(input, len)
}

fn punctuation<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    let text: &'s str = input;
    // `?.5` is a conditional followed by a real literal.
    if text.starts_with("?.") && !text[2..].starts_with(|c: char| c.is_ascii_digit()) {
        return split_off(input, 2);
    }
    if let Some(op) = COMPOUND_PUNCTUATION.iter().find(|op| text.starts_with(**op)) {
        return split_off(input, op.len());
    }
    one_of(SINGLE_PUNCTUATION).take().parse_next(input)
}

// ============================================================================
// Driver
// ============================================================================

struct Lexer<'s> {
    source: &'s str,
    input: &'s str,
    at_line_start: bool,
}

impl<'s> Lexer<'s> {
    fn offset(&self) -> usize {
        self.source.len() - self.input.len()
    }

    fn error(&self, message: impl Into<String>) -> TokenizeError {
        TokenizeError::new(message, self.offset())
    }

    fn leading_trivia(&mut self) -> TokenizeResult<Vec<Trivia>> {
        let mut pieces = Vec::new();
        loop {
            let mut cursor = self.input;
            if self.at_line_start {
                if let Ok(text) = directive.parse_next(&mut cursor) {
                    self.input = cursor;
                    pieces.push(Trivia::new(TriviaKind::Directive, text));
                    self.at_line_start = false;
                    continue;
                }
                cursor = self.input;
            }
            match trivia_piece.parse_next(&mut cursor) {
                Ok(piece) => {
                    self.input = cursor;
                    match piece.kind {
                        TriviaKind::EndOfLine => self.at_line_start = true,
                        TriviaKind::Whitespace => {}
                        _ => self.at_line_start = false,
                    }
                    pieces.push(piece);
                }
                Err(_) => break,
            }
        }
        if self.input.starts_with("/*") {
            return Err(self.error("unterminated comment"));
        }
        Ok(pieces)
    }

    /// Trivia on the rest of the current line, through the line break.
    fn trailing_trivia(&mut self) -> Vec<Trivia> {
        let mut pieces = Vec::new();
        let mut cursor = self.input;
        while let Ok(piece) = trivia_piece.parse_next(&mut cursor) {
            self.input = cursor;
            let done = piece.is_end_of_line();
            pieces.push(piece);
            if done {
                self.at_line_start = true;
                break;
            }
        }
        pieces
    }

    fn token_body(&mut self) -> TokenizeResult<(TokenKind, String)> {
        let first = self.input.chars().next().unwrap_or('\0');
        let starts_string = matches!(first, '"' | '$')
            || (first == '@' && self.input[1..].starts_with(['"', '$']));

        if starts_string {
            let start = self.input;
            let mut cursor = self.input;
            return match string_literal.parse_next(&mut cursor) {
                Ok(_) => {
                    let len = start.len() - cursor.len();
                    self.input = cursor;
                    Ok((TokenKind::StringLiteral, start[..len].to_string()))
                }
                Err(_) => Err(self.error("unterminated string literal")),
            };
        }
        if first == '\'' {
            let start = self.input;
            let mut cursor = self.input;
            return match character_literal.parse_next(&mut cursor) {
                Ok(_) => {
                    let len = start.len() - cursor.len();
                    self.input = cursor;
                    Ok((TokenKind::CharacterLiteral, start[..len].to_string()))
                }
                Err(_) => Err(self.error("unterminated character literal")),
            };
        }
        if first.is_ascii_digit()
            || (first == '.' && self.input[1..].starts_with(|c: char| c.is_ascii_digit()))
        {
            return number
                .parse_next(&mut self.input)
                .map_err(|_| self.error("malformed numeric literal"));
        }
        let mut cursor = self.input;
        if let Ok(text) = identifier.parse_next(&mut cursor) {
            self.input = cursor;
            let kind = if is_keyword(text) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            return Ok((kind, text.to_string()));
        }
        let mut cursor = self.input;
        if let Ok(text) = punctuation.parse_next(&mut cursor) {
            self.input = cursor;
            return Ok((TokenKind::Punctuation, text.to_string()));
        }
        Err(self.error(format!("unexpected character {:?}", first)))
    }
}

/// Split `source` into tokens; the last token is always `EndOfFile`.
pub fn tokenize(source: &str) -> TokenizeResult<Vec<Token>> {
    let mut lexer = Lexer {
        source,
        input: source,
        at_line_start: true,
    };
    let mut tokens = Vec::new();

    loop {
        let leading = lexer.leading_trivia()?;
        let offset = lexer.offset();
        if lexer.input.is_empty() {
            tokens.push(Token {
                kind: TokenKind::EndOfFile,
                text: String::new(),
                offset,
                leading,
                trailing: Vec::new(),
            });
            return Ok(tokens);
        }
        let (kind, text) = lexer.token_body()?;
        lexer.at_line_start = false;
        let trailing = lexer.trailing_trivia();
        tokens.push(Token {
            kind,
            text,
            offset,
            leading,
            trailing,
        });
    }
}

/// Concatenate every token with its trivia.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        for piece in &token.leading {
            out.push_str(&piece.text);
        }
        out.push_str(&token.text);
        for piece in &token.trailing {
            out.push_str(&piece.text);
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
