//! Error types for analysis and rewriting.
//!
//! Detectors never report "no finding" for a failure: anything unexpected
//! surfaces as an [`AnalyzerError`] and is propagated to the caller.

use std::io;
use std::path::PathBuf;

use sharpfix_core::edit::EditError;
use sharpfix_core::error::SharpfixError;
use sharpfix_cst::{FormatError, ParseError};
use thiserror::Error;

use crate::workspace::DocumentId;

/// Errors raised while loading, analyzing or rewriting a solution.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A document could not be parsed.
    #[error("{path}: {error}")]
    Parse { path: String, error: ParseError },

    /// A rewritten document no longer parses.
    #[error("rewrite of {path} produced invalid code: {message}")]
    Verification { path: String, message: String },

    /// A possible call of a rewritten method could not be bound, so the
    /// rewrite cannot follow every call site.
    #[error("cannot rewrite every call of {method}: {reason} in {path}")]
    UnboundCallSite {
        method: String,
        path: String,
        reason: String,
    },

    /// The operation was cancelled before commit.
    #[error("operation cancelled")]
    Cancelled,

    /// A document id that is not part of the solution.
    #[error("unknown document {0}")]
    UnknownDocument(DocumentId),

    /// Applying edits failed.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// Formatting rewritten regions failed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Reading a source file failed.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An invariant of the engine did not hold.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

impl From<AnalyzerError> for SharpfixError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::Parse { path, error } => SharpfixError::ParseError {
                file: path,
                message: format!(
                    "{} (line {}, column {})",
                    error.message, error.line, error.col
                ),
            },
            AnalyzerError::Verification { path, message } => {
                SharpfixError::VerificationFailed {
                    file: path,
                    message,
                }
            }
            AnalyzerError::UnboundCallSite {
                method,
                path,
                reason,
            } => SharpfixError::UnboundCallSite {
                file: path,
                message: format!("{} ({})", reason, method),
            },
            AnalyzerError::Cancelled => SharpfixError::Cancelled,
            AnalyzerError::UnknownDocument(id) => {
                SharpfixError::internal(format!("unknown document {}", id))
            }
            AnalyzerError::Edit(e) => e.into(),
            AnalyzerError::Format(e) => SharpfixError::ApplyError {
                message: e.to_string(),
                file: None,
            },
            AnalyzerError::Io { path, source } => {
                if source.kind() == io::ErrorKind::NotFound {
                    SharpfixError::file_not_found(path.display().to_string())
                } else {
                    SharpfixError::internal(format!("cannot read {}: {}", path.display(), source))
                }
            }
            AnalyzerError::Internal(message) => SharpfixError::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpfix_core::error::OutputErrorCode;

    #[test]
    fn verification_maps_to_code_5() {
        let err: SharpfixError = AnalyzerError::Verification {
            path: "A.cs".to_string(),
            message: "expected ';'".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), OutputErrorCode::VerificationFailed);
    }

    #[test]
    fn unbound_call_site_maps_to_resolution_error() {
        let err: SharpfixError = AnalyzerError::UnboundCallSite {
            method: "M".to_string(),
            path: "App.cs".to_string(),
            reason: "call at 4:9 could not be bound".to_string(),
        }
        .into();
        assert_eq!(err.error_code().code(), 3);
        assert!(err.to_string().contains("App.cs"));
    }

    #[test]
    fn cancelled_maps_to_apply_error() {
        let err: SharpfixError = AnalyzerError::Cancelled.into();
        assert_eq!(err.error_code().code(), 4);
    }

    #[test]
    fn missing_file_maps_to_resolution_error() {
        let err: SharpfixError = AnalyzerError::Io {
            path: PathBuf::from("Missing.cs"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }
        .into();
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    }
}
