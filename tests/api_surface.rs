//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Core Infrastructure Types
// ============================================================================

use sharpfix::diff::{generate_unified_diff, unified_diff, FileDiff};
use sharpfix::edit::{apply_edits, edits_conflict, validate_edits, EditError, EditLog, TextEdit};
use sharpfix::error::{OutputErrorCode, SharpfixError};
use sharpfix::output::{
    emit_response, AnalyzeResponse, ErrorInfo, ErrorResponse, FileSnapshot, FindingInfo,
    FixResponse, Location, RuleInfo, RulesResponse, Warning, SCHEMA_VERSION,
};
use sharpfix::patch::{ContentHash, OutputEdit, Span};
use sharpfix::text::{byte_offset_to_position_str, indentation_at, position_to_byte_offset_str};

// ============================================================================
// Syntax Layer
// ============================================================================

use sharpfix::cst::{format_edits, parse_source, NodeId, ParseError, SyntaxKind, SyntaxTree};

// ============================================================================
// Analysis and Rewriting
// ============================================================================

use sharpfix::analyzers::{
    detect_document, execute, resolve, AnalyzerResult, Descriptor, Document, DocumentChange,
    DocumentId, Edit, EditKind, RewriteOutcome, RewritePlan, SemanticModel, Severity,
};
use sharpfix::{
    apply_fix, compute_fix, detect_all, fix_all, AnalyzerError, BatchOutcome, CodeFix, Finding,
    FixAllScope, ProgramModel, RuleId, RuleSet, Solution,
};

// ============================================================================
// CLI Front Door
// ============================================================================

use sharpfix::cli::{
    analyze, fix, load_solution, parse_rules, render_findings, render_fix_summary, render_rules,
    rules, write_changes, FixOutcome, FixTarget,
};

#[test]
fn api_surface_compiles() {
    // This test passes if the file compiles.
}

#[test]
fn rule_ids_are_stable() {
    let ids: Vec<&str> = RuleId::ALL.iter().map(|r| r.as_str()).collect();
    assert_eq!(
        ids,
        vec!["ACNU0001", "ACNU0002", "ACNU0003", "ACNU0005", "ACNU0010", "ACNU0011"]
    );
    assert_eq!(SCHEMA_VERSION, "1");
}
