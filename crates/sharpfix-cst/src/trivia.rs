// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Trivia: whitespace, line breaks, comments and directives attached to tokens.
//!
//! A token owns the trivia that precedes it (leading) and the trivia that
//! follows it on the same line, up to and including the line break
//! (trailing). The functions here are pure arithmetic over trivia lists and
//! are what rewrites use to decide which formatting survives when a token is
//! deleted.

use serde::Serialize;

/// Kind of a trivia piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriviaKind {
    /// Spaces and tabs.
    Whitespace,
    /// `\n` or `\r\n`.
    EndOfLine,
    /// `// ...` up to (not including) the line break.
    SingleLineComment,
    /// `/* ... */`.
    MultiLineComment,
    /// `#region`, `#if`, ... up to (not including) the line break.
    Directive,
}

/// One piece of trivia.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Trivia {
            kind,
            text: text.into(),
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Trivia::new(TriviaKind::Whitespace, text)
    }

    pub fn end_of_line() -> Self {
        Trivia::new(TriviaKind::EndOfLine, "\n")
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self.kind,
            TriviaKind::SingleLineComment | TriviaKind::MultiLineComment
        )
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TriviaKind::Whitespace
    }

    pub fn is_end_of_line(&self) -> bool {
        self.kind == TriviaKind::EndOfLine
    }
}

/// Concatenated text of a trivia list.
pub fn render(trivia: &[Trivia]) -> String {
    trivia.iter().map(|t| t.text.as_str()).collect()
}

/// Total byte width of a trivia list.
pub fn width(trivia: &[Trivia]) -> usize {
    trivia.iter().map(|t| t.text.len()).sum()
}

/// True if the list is exactly one `" "` whitespace piece.
pub fn is_single_space(trivia: &[Trivia]) -> bool {
    matches!(trivia, [t] if t.kind == TriviaKind::Whitespace && t.text == " ")
}

/// True if the list holds at least one comment.
pub fn has_comments(trivia: &[Trivia]) -> bool {
    trivia.iter().any(Trivia::is_comment)
}

/// True if the list holds a line break.
pub fn has_end_of_line(trivia: &[Trivia]) -> bool {
    trivia.iter().any(Trivia::is_end_of_line)
}

/// Leading trivia of the token that follows a deleted token.
///
/// The deleted token's leading trivia comes first, then its trailing trivia
/// unless that is a lone single space, then the next token's own leading
/// trivia.
pub fn trivia_after_removal(
    removed_leading: &[Trivia],
    removed_trailing: &[Trivia],
    next_leading: &[Trivia],
) -> Vec<Trivia> {
    let mut merged = Vec::with_capacity(
        removed_leading.len() + removed_trailing.len() + next_leading.len(),
    );
    merged.extend_from_slice(removed_leading);
    if !is_single_space(removed_trailing) {
        merged.extend_from_slice(removed_trailing);
    }
    merged.extend_from_slice(next_leading);
    merged
}

/// Split leading trivia into the part before the last line break and the
/// indentation of the token's own line.
///
/// Comments and blank lines land in the first part; the second part is the
/// whitespace between the last line break and the token.
pub fn split_indentation(leading: &[Trivia]) -> (Vec<Trivia>, Vec<Trivia>) {
    let split = leading
        .iter()
        .rposition(Trivia::is_end_of_line)
        .map(|i| i + 1)
        .unwrap_or(0);
    let (head, tail) = leading.split_at(split);
    if tail.iter().all(Trivia::is_whitespace) {
        (head.to_vec(), tail.to_vec())
    } else {
        (leading.to_vec(), Vec::new())
    }
}

/// Comments in a trivia list, in order.
pub fn comments(trivia: &[Trivia]) -> impl Iterator<Item = &Trivia> {
    trivia.iter().filter(|t| t.is_comment())
}

/// Whitespace-only trivia that stays on one line, rendered as `" "` when empty.
///
/// Used where generated code needs a separator but existing trivia with a
/// line break or comment must be kept.
pub fn or_single_space(trivia: &[Trivia]) -> String {
    if trivia.iter().all(Trivia::is_whitespace) {
        " ".to_string()
    } else {
        render(trivia)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ws(s: &str) -> Trivia {
        Trivia::whitespace(s)
    }

    fn block(s: &str) -> Trivia {
        Trivia::new(TriviaKind::MultiLineComment, s)
    }

    fn line(s: &str) -> Trivia {
        Trivia::new(TriviaKind::SingleLineComment, s)
    }

    mod removal {
        use super::*;

        #[test]
        fn no_trivia() {
            assert!(trivia_after_removal(&[], &[], &[]).is_empty());
        }

        #[test]
        fn single_space_trailing_is_dropped() {
            let merged = trivia_after_removal(&[ws("  ")], &[ws(" ")], &[]);
            assert_eq!(render(&merged), "  ");
        }

        #[test]
        fn wider_whitespace_trailing_is_kept() {
            let merged = trivia_after_removal(&[], &[ws("  ")], &[]);
            assert_eq!(render(&merged), "  ");
        }

        #[test]
        fn block_comments_survive_in_order() {
            // `/*d*/ref/*c*/ b`
            let merged = trivia_after_removal(&[block("/*d*/")], &[block("/*c*/"), ws(" ")], &[]);
            assert_eq!(render(&merged), "/*d*//*c*/ ");
        }

        #[test]
        fn trailing_line_comment_and_line_break_survive() {
            let merged = trivia_after_removal(
                &[],
                &[ws(" "), line("// note"), Trivia::end_of_line()],
                &[ws("    ")],
            );
            assert_eq!(render(&merged), " // note\n    ");
        }

        #[test]
        fn next_leading_follows_removed_trivia() {
            let merged = trivia_after_removal(&[ws("\t")], &[ws(" "), block("/*a*/")], &[ws(" ")]);
            assert_eq!(render(&merged), "\t /*a*/ ");
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn single_space_detection() {
            assert!(is_single_space(&[ws(" ")]));
            assert!(!is_single_space(&[ws("  ")]));
            assert!(!is_single_space(&[ws(" "), ws(" ")]));
            assert!(!is_single_space(&[]));
            assert!(!is_single_space(&[block("/**/")]));
        }

        #[test]
        fn split_indentation_keeps_comments_in_head() {
            let leading = vec![
                ws("    "),
                line("// why"),
                Trivia::end_of_line(),
                ws("    "),
            ];
            let (head, indent) = split_indentation(&leading);
            assert_eq!(render(&head), "    // why\n");
            assert_eq!(render(&indent), "    ");
        }

        #[test]
        fn split_indentation_same_line_comment() {
            let leading = vec![ws("  "), block("/*x*/"), ws(" ")];
            let (head, indent) = split_indentation(&leading);
            assert_eq!(render(&head), "  /*x*/ ");
            assert!(indent.is_empty());
        }

        #[test]
        fn or_single_space_keeps_meaningful_trivia() {
            assert_eq!(or_single_space(&[]), " ");
            assert_eq!(or_single_space(&[ws("   ")]), " ");
            assert_eq!(
                or_single_space(&[Trivia::end_of_line(), ws("  ")]),
                "\n  "
            );
        }

        #[test]
        fn width_and_comments() {
            let list = vec![ws("  "), block("/*a*/"), line("//b")];
            assert_eq!(width(&list), 10);
            assert_eq!(comments(&list).count(), 2);
            assert!(has_comments(&list));
            assert!(!has_end_of_line(&list));
        }
    }
}
