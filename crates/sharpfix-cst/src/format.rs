// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Whitespace normalization inside rewritten regions.
//!
//! After a rewrite, the regions it touched may carry doubled spaces or
//! whitespace left dangling before a line break. [`format_regions`] walks the
//! whitespace trivia that intersects those regions and:
//!
//! - removes whitespace that runs into a line break or the end of the file;
//! - leaves indentation (whitespace at the start of a line) alone;
//! - removes whitespace right after `(` or right before `)`;
//! - collapses any other run to a single space.
//!
//! Comments, directives and line breaks are never changed, and whitespace is
//! never inserted where there was none.

use sharpfix_core::edit::{apply_edits, EditError, TextEdit};
use sharpfix_core::patch::Span;
use thiserror::Error;

use crate::tokenizer::{tokenize, Token, TokenKind, TokenizeError};
use crate::trivia::{Trivia, TriviaKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("cannot format rewritten text: {0}")]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Normalize whitespace that intersects any of `regions`.
///
/// A whitespace run touching a region boundary counts as intersecting, so an
/// empty region marks the two gaps on either side of a deletion.
pub fn format_regions(source: &str, regions: &[Span]) -> Result<String, FormatError> {
    if regions.is_empty() {
        return Ok(source.to_string());
    }
    let edits = format_edits(source, regions)?;
    Ok(apply_edits(source, &edits)?)
}

/// The edits [`format_regions`] would apply, in ascending order.
///
/// Callers that track offsets across several rewrites apply these through
/// their own edit log instead of taking the formatted string.
pub fn format_edits(source: &str, regions: &[Span]) -> Result<Vec<TextEdit>, FormatError> {
    if regions.is_empty() {
        return Ok(Vec::new());
    }
    let tokens = tokenize(source)?;
    let mut edits = Vec::new();

    let mut gap_start = 0;
    let mut previous: Option<&Token> = None;
    for token in &tokens {
        let previous_trailing = previous.map_or(&[][..], |p| &p.trailing[..]);
        let pieces: Vec<&Trivia> = previous_trailing.iter().chain(&token.leading).collect();
        let gap = Gap {
            start: gap_start,
            after_open_paren: previous.is_some_and(|p| p.text == "("),
            before_close_paren: token.text == ")",
            at_eof: token.kind == TokenKind::EndOfFile,
        };
        collect_gap_edits(source, &gap, &pieces, regions, &mut edits);
        gap_start = token.end();
        previous = Some(token);
    }
    Ok(edits)
}

/// The trivia between two tokens.
struct Gap {
    start: usize,
    after_open_paren: bool,
    before_close_paren: bool,
    at_eof: bool,
}

fn collect_gap_edits(
    source: &str,
    gap: &Gap,
    pieces: &[&Trivia],
    regions: &[Span],
    edits: &mut Vec<TextEdit>,
) {
    let mut offset = gap.start;
    for (i, piece) in pieces.iter().enumerate() {
        let span = Span::new(offset, offset + piece.text.len());
        offset = span.end;
        if piece.kind != TriviaKind::Whitespace || !touches_any(span, regions) {
            continue;
        }
        let before_line_break = match pieces.get(i + 1) {
            Some(next) => next.kind == TriviaKind::EndOfLine,
            None => gap.at_eof,
        };
        let hugs_paren = (i == 0 && gap.after_open_paren)
            || (i + 1 == pieces.len() && gap.before_close_paren);
        if before_line_break {
            edits.push(TextEdit::delete(span));
        } else if at_line_start(source, span.start) {
            continue;
        } else if hugs_paren {
            edits.push(TextEdit::delete(span));
        } else if piece.text != " " {
            edits.push(TextEdit::new(span, " "));
        }
    }
}

fn touches_any(span: Span, regions: &[Span]) -> bool {
    regions
        .iter()
        .any(|r| span.start <= r.end && r.start <= span.end)
}

fn at_line_start(source: &str, offset: usize) -> bool {
    offset == 0 || source[..offset].ends_with(['\n', '\r'])
}

// ============================================================================
// Tests
// ============================================================================
