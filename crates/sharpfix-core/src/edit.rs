//! Span-based text edits.
//!
//! Two pieces live here:
//!
//! - [`apply_edits`] applies a batch of [`TextEdit`]s expressed against one
//!   source text. Edits are validated (bounds, overlap) and applied in
//!   descending position order so earlier spans stay valid.
//! - [`EditLog`] records a sequence of replacements, each expressed against the
//!   *current* text, and reports the net effect as edits against the
//!   *original* text. The rewrite engine applies one fix as many small
//!   successive replacements; the log turns those back into non-overlapping
//!   edits that can be previewed, diffed and merged with other fixes.
//!
//! # Example
//!
//! ```
//! use sharpfix_core::edit::{apply_edits, EditLog, TextEdit};
//! use sharpfix_core::patch::Span;
//!
//! let mut log = EditLog::new("M(ref a, ref b);");
//! log.replace(Span::new(9, 13), "").unwrap(); // second `ref `
//! log.replace(Span::new(2, 6), "").unwrap(); // first `ref `
//! assert_eq!(log.current_text(), "M(a, b);");
//!
//! let edits = log.edits();
//! assert_eq!(edits.len(), 2);
//! assert_eq!(apply_edits("M(ref a, ref b);", &edits).unwrap(), "M(a, b);");
//! ```

use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patch::Span;

/// A replacement of `span` by `new_text`. An empty span is an insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(span: Span, new_text: impl Into<String>) -> Self {
        TextEdit {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn delete(span: Span) -> Self {
        TextEdit::new(span, "")
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        TextEdit::new(Span::empty(offset), text)
    }

    pub fn is_insertion(&self) -> bool {
        self.span.is_empty()
    }

    /// Change in document length caused by this edit.
    pub fn delta(&self) -> isize {
        self.new_text.len() as isize - self.span.len() as isize
    }
}

/// Error type for edit application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Two edits touch the same bytes.
    #[error("overlapping edits: {first} and {second}")]
    OverlappingEdits { first: Span, second: Span },

    /// An edit span extends beyond the source.
    #[error("span {span} is out of bounds for source of length {source_len}")]
    SpanOutOfBounds { span: Span, source_len: usize },

    /// An edit span does not fall on character boundaries.
    #[error("span {span} splits a UTF-8 character")]
    NotCharBoundary { span: Span },
}

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

// ============================================================================
// Batch Application
// ============================================================================

/// Order edits by descending position; at equal positions replacements come
/// before insertions so an insertion lands in front of the replaced text.
fn descending(a: &TextEdit, b: &TextEdit) -> Ordering {
    match b.span.start.cmp(&a.span.start) {
        Ordering::Equal => match (a.is_insertion(), b.is_insertion()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => Ordering::Equal,
        },
        other => other,
    }
}

/// Validate a batch of edits against `source` without applying it.
pub fn validate_edits(source: &str, edits: &[TextEdit]) -> EditResult<()> {
    for edit in edits {
        let span = edit.span;
        if span.end > source.len() {
            return Err(EditError::SpanOutOfBounds {
                span,
                source_len: source.len(),
            });
        }
        if !source.is_char_boundary(span.start) || !source.is_char_boundary(span.end) {
            return Err(EditError::NotCharBoundary { span });
        }
    }

    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by(|a, b| descending(a, b));
    for pair in sorted.windows(2) {
        if pair[0].span.overlaps(&pair[1].span) {
            return Err(EditError::OverlappingEdits {
                first: pair[1].span,
                second: pair[0].span,
            });
        }
    }
    Ok(())
}

/// Apply a batch of edits, all expressed against `source`.
///
/// # Errors
///
/// - `EditError::SpanOutOfBounds` if any span exceeds the source length
/// - `EditError::NotCharBoundary` if any span splits a character
/// - `EditError::OverlappingEdits` if any two edits overlap
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> EditResult<String> {
    validate_edits(source, edits)?;

    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by(|a, b| descending(a, b));

    let mut result = source.to_string();
    for edit in sorted {
        result.replace_range(edit.span.start..edit.span.end, &edit.new_text);
    }
    Ok(result)
}

/// True if any edit in `a` overlaps any edit in `b`.
pub fn edits_conflict(a: &[TextEdit], b: &[TextEdit]) -> bool {
    a.iter()
        .any(|x| b.iter().any(|y| x.span.overlaps(&y.span)))
}

// ============================================================================
// Edit Log
// ============================================================================

#[derive(Debug, Clone)]
enum Piece {
    Original(Range<usize>),
    Inserted(String),
}

impl Piece {
    fn len(&self) -> usize {
        match self {
            Piece::Original(r) => r.end - r.start,
            Piece::Inserted(s) => s.len(),
        }
    }

    /// Sub-piece covering `from..to`, relative to the piece start.
    fn slice(&self, from: usize, to: usize) -> Piece {
        match self {
            Piece::Original(r) => Piece::Original(r.start + from..r.start + to),
            Piece::Inserted(s) => Piece::Inserted(s[from..to].to_string()),
        }
    }
}

/// Sequential replacements over one document, tracked against the original.
///
/// The current text is kept as a piece table: runs of original text and runs
/// of inserted text. Original runs never reorder, so the gaps between them are
/// exactly the regions of the original that changed.
#[derive(Debug, Clone)]
pub struct EditLog {
    original: String,
    current: String,
    pieces: Vec<Piece>,
}

impl EditLog {
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let pieces = if original.is_empty() {
            Vec::new()
        } else {
            vec![Piece::Original(0..original.len())]
        };
        EditLog {
            current: original.clone(),
            original,
            pieces,
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    pub fn current_text(&self) -> &str {
        &self.current
    }

    pub fn is_unchanged(&self) -> bool {
        self.current == self.original
    }

    /// Replace `span` of the current text with `text`.
    pub fn replace(&mut self, span: Span, text: &str) -> EditResult<()> {
        if span.end > self.current.len() {
            return Err(EditError::SpanOutOfBounds {
                span,
                source_len: self.current.len(),
            });
        }
        if !self.current.is_char_boundary(span.start) || !self.current.is_char_boundary(span.end)
        {
            return Err(EditError::NotCharBoundary { span });
        }

        let mut pieces = Vec::with_capacity(self.pieces.len() + 2);
        let mut inserted = false;
        let mut pos = 0;
        for piece in &self.pieces {
            let len = piece.len();
            let (start, end) = (pos, pos + len);
            pos = end;

            if start < span.start {
                pieces.push(piece.slice(0, len.min(span.start - start)));
            }
            if !inserted && span.start <= end {
                if !text.is_empty() {
                    pieces.push(Piece::Inserted(text.to_string()));
                }
                inserted = true;
            }
            if end > span.end {
                let from = span.end.max(start) - start;
                pieces.push(piece.slice(from, len));
            }
        }
        if !inserted && !text.is_empty() {
            pieces.push(Piece::Inserted(text.to_string()));
        }

        self.pieces = pieces
            .into_iter()
            .filter(|p| p.len() > 0)
            .collect();
        self.current.replace_range(span.start..span.end, text);
        Ok(())
    }

    /// Net changes as edits against the original text, in ascending order.
    ///
    /// Regions whose replacement equals the original text are omitted.
    pub fn edits(&self) -> Vec<TextEdit> {
        let mut edits = Vec::new();
        let mut orig_pos = 0;
        let mut pending: Option<String> = None;

        let flush = |edits: &mut Vec<TextEdit>, lo: usize, hi: usize, text: Option<String>| {
            let text = text.unwrap_or_default();
            if self.original[lo..hi] != text {
                edits.push(TextEdit::new(Span::new(lo, hi), text));
            }
        };

        for piece in &self.pieces {
            match piece {
                Piece::Inserted(text) => pending.get_or_insert_with(String::new).push_str(text),
                Piece::Original(range) => {
                    if range.start != orig_pos || pending.is_some() {
                        flush(&mut edits, orig_pos, range.start, pending.take());
                    }
                    orig_pos = range.end;
                }
            }
        }
        if orig_pos != self.original.len() || pending.is_some() {
            flush(&mut edits, orig_pos, self.original.len(), pending.take());
        }
        edits
    }

    /// Map an offset in the current text back to the original text.
    ///
    /// Offsets inside inserted text map to the start of the changed region.
    pub fn original_offset(&self, current: usize) -> usize {
        let mut pos = 0;
        let mut orig_pos = 0;
        for piece in &self.pieces {
            let len = piece.len();
            match piece {
                Piece::Original(range) => {
                    if current < pos + len {
                        return range.start + (current - pos);
                    }
                    orig_pos = range.end;
                }
                Piece::Inserted(_) => {
                    if current < pos + len {
                        return orig_pos;
                    }
                }
            }
            pos += len;
        }
        orig_pos.max(current.min(self.original.len()))
    }
}

// ============================================================================
// Tests
// ============================================================================
