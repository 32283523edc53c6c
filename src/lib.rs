//! sharpfix: static analysis and cross-reference-consistent rewrites for
//! C# method signatures and call sites.
//!
//! The engine lives in the member crates; this crate re-exports them and
//! adds the CLI front door.

// Core infrastructure - re-exported from sharpfix-core
pub use sharpfix_core::diff;
pub use sharpfix_core::edit;
pub use sharpfix_core::error;
pub use sharpfix_core::output;
pub use sharpfix_core::patch;
pub use sharpfix_core::text;
pub use sharpfix_core::types;

// Syntax layer
pub use sharpfix_cst as cst;

// Analysis and rewriting
pub use sharpfix_analyzers as analyzers;
pub use sharpfix_analyzers::{
    apply_fix, compute_fix, detect_all, fix_all, AnalyzerError, BatchOutcome, CodeFix, Finding,
    FixAllScope, ProgramModel, RuleId, RuleSet, Solution,
};

// Front door
pub mod cli;
