//! Detectors and cross-reference-consistent rewrites for C# method
//! signatures and call sites.
//!
//! This crate provides:
//! - Immutable solution snapshots of parsed documents
//! - A semantic model: symbols, binding, typing, references and data flow
//! - Detectors for the ACNU rules and their descriptors
//! - The resolver that turns a finding into a plan over every call site
//! - The rewrite engine and one rewrite strategy per rule
//! - Code fix registration and fix-all
//!
//! # Example
//!
//! ```
//! use sharpfix_analyzers::{apply_fix, detect_all, ProgramModel, RuleSet, Solution};
//! use tokio_util::sync::CancellationToken;
//!
//! let solution = Solution::from_sources([
//!     ("A.cs", "class A { public static void M(ref int a) { } }"),
//!     ("B.cs", "class B { void N() { int x = 0; A.M(ref x); } }"),
//! ])
//! .unwrap();
//! let model = ProgramModel::build(&solution);
//! let findings = detect_all(&model, &RuleSet::all()).unwrap();
//! assert_eq!(findings[0].rule.as_str(), "ACNU0001");
//!
//! let outcome = apply_fix(&model, &findings[0], &CancellationToken::new())
//!     .unwrap()
//!     .unwrap();
//! let b = outcome.solution.document_by_path("B.cs").unwrap();
//! assert_eq!(b.text(), "class B { void N() { int x = 0; A.M(x); } }");
//! ```

pub mod detectors;
pub mod engine;
pub mod error;
pub mod finding;
pub mod fix;
pub mod resolver;
pub mod semantic;
pub mod strategies;
pub mod syntax;
pub mod workspace;

pub use detectors::{detect_all, detect_document, RuleSet};
pub use engine::{execute, DocumentChange, RewriteOutcome};
pub use error::{AnalyzerError, AnalyzerResult};
pub use finding::{Descriptor, Finding, RuleId, Severity};
pub use fix::{apply_fix, compute_fix, fix_all, BatchOutcome, CodeFix, FixAllScope};
pub use resolver::{resolve, Edit, EditKind, RewritePlan};
pub use semantic::{ProgramModel, SemanticModel};
pub use workspace::{Document, DocumentId, Solution};
