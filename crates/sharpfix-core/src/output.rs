//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as its first field
//! 2. **Deterministic:** Same input produces the same output (field order, array ordering)
//! 3. **Nullable vs absent:** Absent field means "not applicable"
//! 4. **Versioned:** Schema version in every response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{OutputErrorCode, SharpfixError};
use crate::patch::{ContentHash, OutputEdit};

pub use crate::types::Location;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Shared Output Types
// ============================================================================

/// A reported finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingInfo {
    /// Stable rule identifier, e.g. `ACNU0001`.
    pub rule: String,
    /// `warning` or `info`.
    pub severity: String,
    /// Formatted diagnostic message.
    pub message: String,
    /// Anchor location.
    pub location: Location,
    /// Ordered message arguments.
    pub arguments: Vec<String>,
    /// Title of the offered fix, absent when no fix is offered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

/// Warning surfaced alongside a successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the warning applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Warning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(
        code: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: Some(location),
        }
    }
}

/// Hash of a file as it was read before a fix was computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub file: String,
    pub hash: ContentHash,
}

/// Static description of a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleInfo {
    pub id: String,
    pub title: String,
    pub severity: String,
    pub category: String,
    pub help_uri: String,
}

// ============================================================================
// Error Types
// ============================================================================

/// Error details in a JSON error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    /// Create from a SharpfixError.
    pub fn from_error(err: &SharpfixError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            SharpfixError::FindingNotFound { file, line, col } => {
                (None, Some(Location::new(file.clone(), *line, *col)))
            }
            SharpfixError::InvalidArguments { details, .. } => (details.clone(), None),
            SharpfixError::UnknownRule { id } => (Some(serde_json::json!({ "rule": id })), None),
            SharpfixError::FileNotFound { path } => {
                (Some(serde_json::json!({ "path": path })), None)
            }
            SharpfixError::ParseError { file, .. } | SharpfixError::UnboundCallSite { file, .. } => {
                (Some(serde_json::json!({ "file": file })), None)
            }
            SharpfixError::ApplyError { file, .. } => {
                let details = file.as_ref().map(|f| serde_json::json!({ "file": f }));
                (details, None)
            }
            SharpfixError::VerificationFailed { file, .. } => {
                (Some(serde_json::json!({ "file": file })), None)
            }
            _ => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a SharpfixError.
    pub fn from_error(err: &SharpfixError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Response Structs
// ============================================================================

/// Response for the analyze command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Number of source files analyzed.
    pub files_analyzed: usize,
    /// Findings (ordered by file, then line, then col).
    #[serde(serialize_with = "serialize_sorted_findings")]
    pub findings: Vec<FindingInfo>,
    /// Warnings (may be empty).
    pub warnings: Vec<Warning>,
}

impl AnalyzeResponse {
    pub fn new(files_analyzed: usize, findings: Vec<FindingInfo>, warnings: Vec<Warning>) -> Self {
        AnalyzeResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files_analyzed,
            findings,
            warnings,
        }
    }
}

/// Response for the fix command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Findings whose fixes were included.
    #[serde(serialize_with = "serialize_sorted_findings")]
    pub fixed: Vec<FindingInfo>,
    /// Files the edits were computed against.
    pub snapshots: Vec<FileSnapshot>,
    /// Edits against the original files (ordered by file, then span.start).
    #[serde(serialize_with = "serialize_sorted_edits")]
    pub edits: Vec<OutputEdit>,
    /// Unified diff of all edits.
    pub diff: String,
    /// Whether the edits were written to disk.
    pub applied: bool,
    /// Files that were modified (present when applied).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_written: Option<Vec<String>>,
    /// Fixes that were skipped (may be empty).
    pub warnings: Vec<Warning>,
}

/// Response for the rules command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    pub rules: Vec<RuleInfo>,
}

impl RulesResponse {
    pub fn new(rules: Vec<RuleInfo>) -> Self {
        RulesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            rules,
        }
    }
}

// ============================================================================
// Deterministic Serialization
// ============================================================================

fn serialize_sorted_findings<S>(findings: &[FindingInfo], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut sorted: Vec<_> = findings.iter().collect();
    sorted.sort_by(|a, b| {
        a.location
            .cmp(&b.location)
            .then_with(|| a.rule.cmp(&b.rule))
    });
    sorted.serialize(serializer)
}

fn serialize_sorted_edits<S>(edits: &[OutputEdit], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut sorted: Vec<_> = edits.iter().collect();
    sorted.sort_by(|a, b| (&a.file, a.span.start).cmp(&(&b.file, b.span.start)));
    sorted.serialize(serializer)
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for CLI, ensuring consistency.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Span;

    fn finding(file: &str, line: u32, rule: &str) -> FindingInfo {
        FindingInfo {
            rule: rule.to_string(),
            severity: "info".to_string(),
            message: "m".to_string(),
            location: Location::new(file, line, 1),
            arguments: vec!["a".to_string()],
            fix: None,
        }
    }

    mod error_response {
        use super::*;

        #[test]
        fn status_comes_first() {
            let resp = ErrorResponse::from_error(&SharpfixError::invalid_args("bad"));
            let json = serde_json::to_string(&resp).unwrap();
            assert!(json.starts_with("{\"status\":\"error\""));
            assert!(json.contains("\"code\":2"));
        }

        #[test]
        fn finding_not_found_carries_location() {
            let info = ErrorInfo::from_error(&SharpfixError::finding_not_found("A.cs", 3, 4));
            let loc = info.location.unwrap();
            assert_eq!((loc.file.as_str(), loc.line, loc.col), ("A.cs", 3, 4));
            assert!(info.details.is_none());
        }

        #[test]
        fn unknown_rule_details() {
            let info = ErrorInfo::from_error(&SharpfixError::UnknownRule {
                id: "ACNU0042".to_string(),
            });
            assert_eq!(info.details.unwrap()["rule"], "ACNU0042");
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn analyze_findings_are_sorted() {
            let resp = AnalyzeResponse::new(
                2,
                vec![
                    finding("b.cs", 1, "ACNU0001"),
                    finding("a.cs", 7, "ACNU0003"),
                    finding("a.cs", 7, "ACNU0002"),
                ],
                vec![],
            );
            let value = serde_json::to_value(&resp).unwrap();
            let rules: Vec<_> = value["findings"]
                .as_array()
                .unwrap()
                .iter()
                .map(|f| f["rule"].as_str().unwrap().to_string())
                .collect();
            assert_eq!(rules, vec!["ACNU0002", "ACNU0003", "ACNU0001"]);
            assert_eq!(value["schema_version"], SCHEMA_VERSION);
        }

        #[test]
        fn fix_response_omits_files_written_on_dry_run() {
            let resp = FixResponse {
                status: "ok".to_string(),
                schema_version: SCHEMA_VERSION.to_string(),
                fixed: vec![],
                snapshots: vec![],
                edits: vec![OutputEdit {
                    file: "a.cs".to_string(),
                    span: Span::new(0, 4),
                    old_text: "ref ".to_string(),
                    new_text: String::new(),
                    line: 1,
                    col: 1,
                }],
                diff: String::new(),
                applied: false,
                files_written: None,
                warnings: vec![],
            };
            let json = serde_json::to_string(&resp).unwrap();
            assert!(!json.contains("files_written"));
            assert!(json.contains("\"old_text\":\"ref \""));
        }

        #[test]
        fn emit_writes_trailing_newline() {
            let mut buf = Vec::new();
            emit_response(&RulesResponse::new(vec![]), &mut buf).unwrap();
            let text = String::from_utf8(buf).unwrap();
            assert!(text.ends_with("}\n"));
        }
    }
}
