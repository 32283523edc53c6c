//! Expressions inside interpolated string literals.
//!
//! The parser keeps `$"..."` as a single string token, so the holes are
//! recovered here by scanning the literal text.

use std::ops::Range;

use sharpfix_cst::{tokenize, TokenKind};

/// A simple name appearing inside an interpolation hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleName {
    /// Byte offset within the literal.
    pub offset: usize,
    pub name: String,
    /// Preceded by `.` or `?.`, so a member name rather than a simple name.
    pub after_dot: bool,
    /// Followed by `(`.
    pub called: bool,
}

/// True if the literal text is an interpolated string.
pub fn is_interpolated(literal: &str) -> bool {
    literal.starts_with('$') || literal.starts_with("@$")
}

/// Byte ranges of the expression part of every hole in an interpolated
/// literal. Alignment and format clauses are excluded.
pub fn holes(literal: &str) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    if !is_interpolated(literal) {
        return result;
    }
    let verbatim = literal.starts_with("$@") || literal.starts_with("@$");
    let bytes = literal.as_bytes();
    let Some(open_quote) = literal.find('"') else {
        return result;
    };
    let mut i = open_quote + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !verbatim => i += 2,
            b'"' if verbatim && bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => break,
            b'{' if bytes.get(i + 1) == Some(&b'{') => i += 2,
            b'{' => {
                let start = i + 1;
                let (end, close) = hole_bounds(bytes, start);
                if end > start {
                    result.push(start..end);
                }
                i = close + 1;
            }
            _ => i += 1,
        }
    }
    result
}

/// End of the expression and position of the closing `}` of a hole
/// starting at `start`.
fn hole_bounds(bytes: &[u8], start: usize) -> (usize, usize) {
    let mut depth = 0usize;
    let mut expression_end = None;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'}' if depth == 0 => return (expression_end.unwrap_or(i), i),
            b'}' => depth -= 1,
            b',' | b':' if depth == 0 && expression_end.is_none() => {
                // `::` is an alias qualifier, not a format clause.
                if bytes[i] == b':' && bytes.get(i + 1) == Some(&b':') {
                    i += 2;
                    continue;
                }
                expression_end = Some(i);
            }
            b'"' => i = skip_quoted(bytes, i + 1),
            b'\'' => i = skip_char(bytes, i + 1),
            _ => {}
        }
        i += 1;
    }
    (expression_end.unwrap_or(bytes.len()), bytes.len())
}

/// Position of the closing quote of a regular string.
fn skip_quoted(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_char(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Every identifier in the holes of an interpolated literal, in order.
///
/// Holes that do not tokenize are skipped.
pub fn names_in_holes(literal: &str) -> Vec<HoleName> {
    let mut names = Vec::new();
    for hole in holes(literal) {
        let Ok(tokens) = tokenize(&literal[hole.clone()]) else {
            continue;
        };
        for (index, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Identifier {
                continue;
            }
            let after_dot = index
                .checked_sub(1)
                .map(|prev| tokens[prev].is_punct(".") || tokens[prev].is_punct("?."))
                .unwrap_or(false);
            let called = tokens.get(index + 1).is_some_and(|next| next.is_punct("("));
            names.push(HoleName {
                offset: hole.start + token.offset,
                name: token.value_text().to_string(),
                after_dot,
                called,
            });
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole_texts(literal: &str) -> Vec<&str> {
        holes(literal).into_iter().map(|r| &literal[r]).collect()
    }

    #[test]
    fn plain_strings_have_no_holes() {
        assert!(holes(r#""a {b}""#).is_empty());
        assert!(!is_interpolated(r#"@"x""#));
    }

    #[test]
    fn finds_hole_expressions() {
        assert_eq!(hole_texts(r#"$"{a} and {b.C(d)}""#), vec!["a", "b.C(d)"]);
        assert_eq!(hole_texts(r#"$"{{not}} {x}""#), vec!["x"]);
        assert_eq!(hole_texts(r#"$@"{x}""#), vec!["x"]);
    }

    #[test]
    fn alignment_and_format_are_excluded() {
        assert_eq!(hole_texts(r#"$"{value,10:F2}""#), vec!["value"]);
        assert_eq!(hole_texts(r#"$"{(a ? b : c)}""#), vec!["(a ? b : c)"]);
        assert_eq!(hole_texts(r#"$"{F("}")}""#), vec![r#"F("}")"#]);
    }

    #[test]
    fn names_know_their_context() {
        let literal = r#"$"{M(x)} {y.M()}""#;
        let names = names_in_holes(literal);
        let summary: Vec<(&str, bool, bool)> = names
            .iter()
            .map(|n| (n.name.as_str(), n.after_dot, n.called))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("M", false, true),
                ("x", false, false),
                ("y", false, false),
                ("M", true, true),
            ]
        );
        assert_eq!(&literal[names[1].offset..names[1].offset + 1], "x");
    }
}
