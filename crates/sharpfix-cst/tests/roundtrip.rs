// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Round-trip tests for the sharpfix-cst parser.
//!
//! These tests verify that `parse(code).codegen() == code` for every file in
//! the supported subset. Rewrites depend on it: a fix must change only the
//! bytes it means to change.
//!
//! - Fixture-based tests: One test per fixture file in `tests/fixtures/`
//! - Inline tests: Individual cases for trivia placement

use difference::assert_diff;
use itertools::Itertools;
use sharpfix_cst::{parse_source, prettify_error, SyntaxKind};
use std::path::PathBuf;

/// Helper to visualize whitespace differences in test output
fn visualize(s: &str) -> String {
    s.replace(' ', "▩").lines().join("↩\n")
}

fn assert_roundtrip(input: &str, label: &str) {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let tree = match parse_source(input) {
        Ok(tree) => tree,
        Err(e) => panic!("{}", prettify_error(input, &e, label)),
    };

    let generated = tree.codegen();
    if generated != input {
        let got = visualize(&generated);
        let expected = visualize(input);
        assert_diff!(expected.as_ref(), got.as_ref(), "", 0);
    }
}

fn read_fixture(fixture_name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(fixture_name);

    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", fixture_name, e))
}

fn assert_roundtrip_fixture(fixture_name: &str) {
    assert_roundtrip(&read_fixture(fixture_name), fixture_name);
}

// =============================================================================
// Fixture-based round-trip tests
// =============================================================================

#[test]
fn roundtrip_fixture_ref_parameters() {
    assert_roundtrip_fixture("ref_parameters.cs");
}

#[test]
fn roundtrip_fixture_statements() {
    assert_roundtrip_fixture("statements.cs");
}

#[test]
fn roundtrip_fixture_expressions() {
    assert_roundtrip_fixture("expressions.cs");
}

#[test]
fn roundtrip_fixture_members() {
    assert_roundtrip_fixture("members.cs");
}

#[test]
fn roundtrip_fixture_trivia() {
    assert_roundtrip_fixture("trivia.cs");
}

// =============================================================================
// Inline tests
// =============================================================================

#[test]
fn roundtrip_byte_order_mark_is_skipped() {
    assert_roundtrip("\u{feff}class C { }\n", "bom.cs");
}

#[test]
fn roundtrip_crlf_line_endings() {
    assert_roundtrip("class C\r\n{\r\n    void M() { }\r\n}\r\n", "crlf.cs");
}

#[test]
fn roundtrip_no_trailing_newline() {
    assert_roundtrip("class C { void M() { } } // end", "eof.cs");
}

#[test]
fn fixtures_contain_the_expected_members() {
    let source = read_fixture("ref_parameters.cs");
    let tree = parse_source(&source).unwrap();
    let methods = tree
        .descendants(tree.root())
        .filter(|&n| tree.kind(n) == SyntaxKind::MethodDeclaration)
        .count();
    assert_eq!(methods, 8);

    let source = read_fixture("members.cs");
    let tree = parse_source(&source).unwrap();
    let unknown = tree
        .descendants(tree.root())
        .filter(|&n| tree.kind(n) == SyntaxKind::UnknownMember)
        .count();
    // event, enum, delegate, destructor, indexer and two operators
    assert_eq!(unknown, 7);
}
