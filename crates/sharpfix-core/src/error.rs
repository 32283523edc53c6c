//! Error types and error code constants for sharpfix.
//!
//! This module provides a unified error type (`SharpfixError`) that bridges
//! domain-specific errors from the subsystems (parsing, analysis, edit
//! application) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller, unknown rule id)
//! - `3`: Resolution errors (finding not found, file not found)
//! - `4`: Apply errors (failed to apply or write changes, cancelled fix)
//! - `5`: Verification failed (a rewritten document no longer parses)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `SharpfixError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for SharpfixError` bridges domain errors
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for JSON

use std::fmt;

use thiserror::Error;

use crate::edit::EditError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (finding not found, file not found).
    ResolutionError = 3,
    /// Apply errors (failed to write changes, cancelled).
    ApplyError = 4,
    /// Verification failed (rewritten source no longer parses).
    VerificationFailed = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// All subsystem errors are converted to this type before being rendered as
/// JSON output. Each variant carries enough context to produce a helpful
/// message and an optional `details` field.
#[derive(Debug, Error)]
pub enum SharpfixError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Rule identifier is not one of the known rules.
    #[error("unknown rule '{id}'")]
    UnknownRule { id: String },

    /// No finding at the requested location.
    #[error("no finding at {file}:{line}:{col}")]
    FindingNotFound { file: String, line: u32, col: u32 },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Source file could not be parsed.
    #[error("parse error in {file}: {message}")]
    ParseError { file: String, message: String },

    /// A possible call of the method being rewritten could not be bound.
    #[error("unbound call site in {file}: {message}")]
    UnboundCallSite { file: String, message: String },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// The operation was cancelled before commit.
    #[error("operation cancelled")]
    Cancelled,

    /// A rewritten document failed verification.
    #[error("verification failed for {file}: {message}")]
    VerificationFailed { file: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&SharpfixError> for OutputErrorCode {
    fn from(err: &SharpfixError) -> Self {
        match err {
            SharpfixError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            SharpfixError::UnknownRule { .. } => OutputErrorCode::InvalidArguments,
            SharpfixError::FindingNotFound { .. } => OutputErrorCode::ResolutionError,
            SharpfixError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            SharpfixError::ParseError { .. } => OutputErrorCode::ResolutionError,
            SharpfixError::UnboundCallSite { .. } => OutputErrorCode::ResolutionError,
            SharpfixError::ApplyError { .. } => OutputErrorCode::ApplyError,
            SharpfixError::Cancelled => OutputErrorCode::ApplyError,
            SharpfixError::VerificationFailed { .. } => OutputErrorCode::VerificationFailed,
            SharpfixError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<SharpfixError> for OutputErrorCode {
    fn from(err: SharpfixError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: EditError -> SharpfixError
// ============================================================================

impl From<EditError> for SharpfixError {
    fn from(err: EditError) -> Self {
        SharpfixError::ApplyError {
            message: err.to_string(),
            file: None,
        }
    }
}

impl From<std::io::Error> for SharpfixError {
    fn from(err: std::io::Error) -> Self {
        SharpfixError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl SharpfixError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        SharpfixError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        SharpfixError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a finding not found error.
    pub fn finding_not_found(file: impl Into<String>, line: u32, col: u32) -> Self {
        SharpfixError::FindingNotFound {
            file: file.into(),
            line,
            col,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        SharpfixError::FileNotFound { path: path.into() }
    }

    /// Create an apply error attributed to a file.
    pub fn apply_failed(message: impl Into<String>, file: impl Into<String>) -> Self {
        SharpfixError::ApplyError {
            message: message.into(),
            file: Some(file.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SharpfixError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
