//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values, not bytes
//! - Line/column values of 0 are treated as 1

use crate::patch::Span;

// ============================================================================
// Position Conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column.
///
/// Offsets past the end of `content` report the position just after the
/// last character.
pub fn byte_offset_to_position_str(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Convert 1-indexed line and column to a byte offset.
///
/// A column past the end of its line clamps to the line end; a line past the
/// end of the content returns the content length.
pub fn position_to_byte_offset_str(content: &str, line: u32, col: u32) -> usize {
    let Some(line_start) = line_start_offset(content, line.max(1)) else {
        return content.len();
    };
    let line_end = content[line_start..]
        .find('\n')
        .map(|p| line_start + p)
        .unwrap_or(content.len());

    content[line_start..line_end]
        .char_indices()
        .nth((col.max(1) - 1) as usize)
        .map(|(i, _)| line_start + i)
        .unwrap_or(line_end)
}

// ============================================================================
// Span Utilities
// ============================================================================

/// Get the 1-indexed `(start_line, end_line)` range spanned by a byte span.
pub fn span_to_line_range(content: &str, span: &Span) -> (u32, u32) {
    let (start_line, _) = byte_offset_to_position_str(content, span.start);
    let (end_line, _) =
        byte_offset_to_position_str(content, span.end.saturating_sub(1).max(span.start));
    (start_line, end_line)
}

/// Extract the text of a span.
///
/// Returns `None` if the span is out of bounds or splits a character.
pub fn extract_span_str<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start..span.end)
}

// ============================================================================
// Line Utilities
// ============================================================================

/// Byte offset where the given 1-indexed line starts, if the line exists.
pub fn line_start_offset(content: &str, line: u32) -> Option<usize> {
    if line == 0 {
        return None;
    }
    if line == 1 {
        return Some(0);
    }
    content
        .match_indices('\n')
        .nth((line - 2) as usize)
        .map(|(i, _)| i + 1)
        .filter(|&start| start <= content.len())
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start_of(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Leading whitespace of the line containing `offset`.
pub fn indentation_at(content: &str, offset: usize) -> &str {
    let start = line_start_of(content, offset);
    let rest = &content[start..];
    let len = rest
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(rest.len());
    &rest[..len]
}

/// Count the number of lines in the content.
pub fn line_count(content: &str) -> u32 {
    if content.is_empty() {
        return 0;
    }
    let newlines = content.matches('\n').count() as u32;
    if content.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

// ============================================================================
// Tests
// ============================================================================
