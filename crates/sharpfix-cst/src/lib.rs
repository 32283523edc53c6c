// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A lossless C# tokenizer, parser and Concrete Syntax Tree (CST) library.
//!
//! The parser covers the subset of C# that sharpfix analyzes: namespaces,
//! classes, structs, interfaces and records with their methods,
//! constructors, fields and properties; the usual statements; and
//! expressions down to lambdas, patterns and tuple deconstruction. Members
//! it does not model (enums, events, operators, indexers) are kept as
//! opaque token runs so that any file in the subset still round-trips.
//!
//! # Overview
//!
//! - **Tokenizing**: [`tokenize`] splits source into [`Token`]s, each owning
//!   its leading and trailing [`Trivia`].
//! - **Parsing**: [`parse_source`] builds an arena [`SyntaxTree`] addressed by
//!   [`NodeId`] and [`TokenId`].
//! - **Code generation**: [`SyntaxTree::codegen`] reproduces the source byte
//!   for byte.
//! - **Formatting**: [`format_regions`] normalizes whitespace in rewritten
//!   regions.
//!
//! # Quick Start
//!
//! ```
//! use sharpfix_cst::{parse_source, SyntaxKind};
//!
//! let source = "class C { void M(ref int a) { a = 1; } }";
//! let tree = parse_source(source).expect("parse error");
//!
//! let method = tree
//!     .descendants(tree.root())
//!     .find(|&n| tree.kind(n) == SyntaxKind::MethodDeclaration)
//!     .unwrap();
//! assert_eq!(tree.text(method), "void M(ref int a) { a = 1; }");
//! assert_eq!(tree.codegen(), source);
//! ```

use std::cmp::{max, min};

// ============================================================================
// Public modules and re-exports
// ============================================================================

/// Whitespace normalization for rewritten regions.
pub mod format;
pub use format::{format_edits, format_regions, FormatError};

/// Node kinds.
pub mod kind;
pub use kind::SyntaxKind;

mod parser;
pub use parser::{parse_source, ParseError, ParseResult};

/// Tokenizer for C# source code.
pub mod tokenizer;
pub use tokenizer::{render_tokens, tokenize, Token, TokenKind, TokenizeError};

/// Arena syntax tree.
pub mod tree;
pub use tree::{Element, NodeId, SyntaxTree, TokenId};

pub mod trivia;
pub use trivia::{Trivia, TriviaKind};

// ============================================================================
// Error formatting
// ============================================================================

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: i64) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth((n - 2) as usize)
        .map(|(index, _)| index + 1)
        .unwrap_or(source.len())
}

/// Formats a parse error into a human-readable string with source context.
///
/// The snippet shows the offending line and one line on either side, with
/// the error position underlined.
///
/// # Example
///
/// ```
/// use sharpfix_cst::{parse_source, prettify_error};
///
/// let source = "class C { void M() { int x = 1 } }";
/// if let Err(e) = parse_source(source) {
///     let formatted = prettify_error(source, &e, "Example.cs");
///     println!("{}", formatted);
/// }
/// ```
pub fn prettify_error(source: &str, err: &ParseError, label: &str) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};

    let context = 1i64;
    let line = i64::from(err.line);
    let line_start = max(1, line - context) as usize;
    let start_offset = bol_offset(source, line - context);
    let end_offset = bol_offset(source, line + context + 1);
    let snippet = &source[start_offset..end_offset];
    let start = err.offset.saturating_sub(start_offset);
    let end = min(start + 1, snippet.len() + 1);
    Renderer::styled()
        .render(
            Level::Error.title(label).snippet(
                Snippet::source(snippet)
                    .line_start(line_start)
                    .fold(false)
                    .annotations(vec![Level::Error.span(start..end).label(&format!(
                        "{} (line {}, column {})",
                        err.message, err.line, err.col
                    ))]),
            ),
        )
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bol_offset_first_line() {
        assert_eq!(0, bol_offset("hello", 1));
        assert_eq!(0, bol_offset("hello", 0));
        assert_eq!(0, bol_offset("hello\nhello", 1));
        assert_eq!(0, bol_offset("hello\nhello", 0));
    }

    #[test]
    fn bol_offset_second_line() {
        assert_eq!(5, bol_offset("hello", 2));
        assert_eq!(6, bol_offset("hello\nhello", 2));
        assert_eq!(6, bol_offset("hello\nhello\nhello", 2));
    }

    #[test]
    fn bol_offset_last_line() {
        assert_eq!(5, bol_offset("hello", 3));
        assert_eq!(11, bol_offset("hello\nhello", 3));
        assert_eq!(12, bol_offset("hello\nhello\nhello", 3));
    }

    #[test]
    fn test_prettify_error_mentions_label_and_message() {
        let source = "class C\n{\n    void M() { int x = 1 }\n}\n";
        let err = parse_source(source).unwrap_err();
        assert_eq!(err.line, 3);
        let formatted = prettify_error(source, &err, "Broken.cs");
        assert!(formatted.contains("Broken.cs"));
        assert!(formatted.contains("expected ';', found '}'"));
        assert!(formatted.contains("void M() { int x = 1 }"));
    }

    #[test]
    fn test_prettify_error_at_end_of_file() {
        let source = "class C {";
        let err = parse_source(source).unwrap_err();
        let formatted = prettify_error(source, &err, "Eof.cs");
        assert!(formatted.contains("end of file"));
    }

    #[test]
    fn test_round_trip_through_public_api() {
        let source = "namespace N\n{\n    // c\n    class C { int F() => 1; }\n}\n";
        let tree = parse_source(source).unwrap();
        assert_eq!(tree.codegen(), source);
        assert_eq!(render_tokens(&tokenize(source).unwrap()), source);
    }
}
