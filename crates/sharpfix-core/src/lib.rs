//! Core infrastructure for sharpfix.
//!
//! This crate provides language-agnostic infrastructure:
//! - Spans, locations and content hashes
//! - Text edits and the edit log that maps rewrites back to original coordinates
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Text utilities and diff generation

pub mod diff;
pub mod edit;
pub mod error;
pub mod output;
pub mod patch;
pub mod text;
pub mod types;
