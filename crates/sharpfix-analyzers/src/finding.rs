//! Rules, their descriptors, and the findings detectors emit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sharpfix_core::error::SharpfixError;
use sharpfix_core::output::{FindingInfo, RuleInfo};
use sharpfix_core::patch::Span;
use sharpfix_core::types::Location;
use thiserror::Error;

use crate::error::AnalyzerResult;
use crate::workspace::{DocumentId, Solution};

// ============================================================================
// Rule Identifiers
// ============================================================================

/// The closed set of rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    /// ACNU0001: a `ref` parameter that is never written.
    #[serde(rename = "ACNU0001")]
    RemoveUnnecessaryRef,
    /// ACNU0002: a `ref` parameter whose incoming value is never read.
    #[serde(rename = "ACNU0002")]
    ConvertRefToOut,
    /// ACNU0003: an if/else or conditional whose branches call the same
    /// method with one differing argument.
    #[serde(rename = "ACNU0003")]
    DuplicateCall,
    /// ACNU0005: a `System.Convert` call whose argument already has the
    /// target type.
    #[serde(rename = "ACNU0005")]
    RedundantConvert,
    /// ACNU0010: a void method with one `out` parameter.
    #[serde(rename = "ACNU0010")]
    OutParameterToReturn,
    /// ACNU0011: a void method with several `out` parameters.
    #[serde(rename = "ACNU0011")]
    OutParametersToTuple,
}

impl RuleId {
    pub const ALL: [RuleId; 6] = [
        RuleId::RemoveUnnecessaryRef,
        RuleId::ConvertRefToOut,
        RuleId::DuplicateCall,
        RuleId::RedundantConvert,
        RuleId::OutParameterToReturn,
        RuleId::OutParametersToTuple,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::RemoveUnnecessaryRef => "ACNU0001",
            RuleId::ConvertRefToOut => "ACNU0002",
            RuleId::DuplicateCall => "ACNU0003",
            RuleId::RedundantConvert => "ACNU0005",
            RuleId::OutParameterToReturn => "ACNU0010",
            RuleId::OutParametersToTuple => "ACNU0011",
        }
    }

    pub fn descriptor(self) -> &'static Descriptor {
        match self {
            RuleId::RemoveUnnecessaryRef => &REMOVE_UNNECESSARY_REF,
            RuleId::ConvertRefToOut => &CONVERT_REF_TO_OUT,
            RuleId::DuplicateCall => &DUPLICATE_CALL,
            RuleId::RedundantConvert => &REDUNDANT_CONVERT,
            RuleId::OutParameterToReturn => &OUT_PARAMETER_TO_RETURN,
            RuleId::OutParametersToTuple => &OUT_PARAMETERS_TO_TUPLE,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule id string that names no rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rule '{0}'")]
pub struct UnknownRuleId(pub String);

impl From<UnknownRuleId> for SharpfixError {
    fn from(err: UnknownRuleId) -> Self {
        SharpfixError::UnknownRule { id: err.0 }
    }
}

impl FromStr for RuleId {
    type Err = UnknownRuleId;

    /// Parses `ACNU0001` style ids, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .into_iter()
            .find(|rule| rule.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRuleId(s.to_string()))
    }
}

// ============================================================================
// Descriptors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a rule and of the fix it offers.
#[derive(Debug)]
pub struct Descriptor {
    pub id: RuleId,
    pub title: &'static str,
    /// Message with `{0}`, `{1}` placeholders for the finding arguments.
    pub message_format: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub fix_title: &'static str,
    /// Fixes sharing a key are applied together by fix-all.
    pub equivalence_key: &'static str,
}

const CATEGORY: &str = "Usage";

const HELP_BASE: &str = "https://github.com/acnutech/Analyzers/wiki/";

static REMOVE_UNNECESSARY_REF: Descriptor = Descriptor {
    id: RuleId::RemoveUnnecessaryRef,
    title: "Unnecessary ref modifier",
    message_format: "Parameter '{0}' is never assigned; the ref modifier is unnecessary",
    category: CATEGORY,
    severity: Severity::Warning,
    fix_title: "Remove ref modifier",
    equivalence_key: "RemoveUnnecessaryRefModifier",
};

static CONVERT_REF_TO_OUT: Descriptor = Descriptor {
    id: RuleId::ConvertRefToOut,
    title: "Ref parameter can be out",
    message_format: "Parameter '{0}' is always assigned before it is read; use out instead of ref",
    category: CATEGORY,
    severity: Severity::Info,
    fix_title: "Convert ref to out",
    equivalence_key: "ConvertRefToOutParameter",
};

static DUPLICATE_CALL: Descriptor = Descriptor {
    id: RuleId::DuplicateCall,
    title: "Duplicate method call in branches",
    message_format: "Both branches call '{0}' with one differing argument",
    category: CATEGORY,
    severity: Severity::Info,
    fix_title: "Call once with a conditional argument",
    equivalence_key: "DuplicateMethodCall",
};

static REDUNDANT_CONVERT: Descriptor = Descriptor {
    id: RuleId::RedundantConvert,
    title: "Redundant conversion",
    message_format: "Call to '{0}' is redundant; the argument is already of type '{1}'",
    category: CATEGORY,
    severity: Severity::Info,
    fix_title: "Remove redundant conversion",
    equivalence_key: "RedundantConvert",
};

static OUT_PARAMETER_TO_RETURN: Descriptor = Descriptor {
    id: RuleId::OutParameterToReturn,
    title: "Out parameter can be a return value",
    message_format: "Method '{0}' can return its out parameter",
    category: CATEGORY,
    severity: Severity::Info,
    fix_title: "Convert out parameters to return value",
    equivalence_key: "OutParameterToReturn",
};

static OUT_PARAMETERS_TO_TUPLE: Descriptor = Descriptor {
    id: RuleId::OutParametersToTuple,
    title: "Out parameters can be a returned tuple",
    message_format: "Method '{0}' can return its out parameters as a tuple",
    category: CATEGORY,
    severity: Severity::Info,
    fix_title: "Convert out parameters to return value",
    equivalence_key: "OutParameterToReturn",
};

impl Descriptor {
    pub fn help_uri(&self) -> String {
        format!("{}{}", HELP_BASE, self.id)
    }

    /// The message for a finding with `arguments`.
    pub fn format_message(&self, arguments: &[String]) -> String {
        format_placeholders(self.message_format, arguments)
    }

    pub fn to_rule_info(&self) -> RuleInfo {
        RuleInfo {
            id: self.id.to_string(),
            title: self.title.to_string(),
            severity: self.severity.to_string(),
            category: self.category.to_string(),
            help_uri: self.help_uri(),
        }
    }
}

/// Substitute `{n}` with `arguments[n]`. Placeholders without an argument
/// are left as written.
fn format_placeholders(format: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            Some((arguments.get(index)?, close))
        });
        match replaced {
            Some((argument, close)) => {
                out.push_str(argument);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Findings
// ============================================================================

/// One reported occurrence of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule: RuleId,
    pub document: DocumentId,
    /// The anchor: a keyword, a return type or a callee expression.
    pub span: Span,
    pub arguments: Vec<String>,
}

impl Finding {
    pub fn new(rule: RuleId, document: DocumentId, span: Span, arguments: Vec<String>) -> Self {
        Finding {
            rule,
            document,
            span,
            arguments,
        }
    }

    pub fn severity(&self) -> Severity {
        self.rule.descriptor().severity
    }

    pub fn message(&self) -> String {
        self.rule.descriptor().format_message(&self.arguments)
    }

    /// Output form of the finding, located in `solution`.
    ///
    /// `fix` is the title of the fix on offer, if any.
    pub fn to_info(&self, solution: &Solution, fix: Option<&str>) -> AnalyzerResult<FindingInfo> {
        let document = solution.document(self.document)?;
        Ok(FindingInfo {
            rule: self.rule.to_string(),
            severity: self.severity().to_string(),
            message: self.message(),
            location: Location::from_span(document.path(), document.text(), self.span),
            arguments: self.arguments.clone(),
            fix: fix.map(str::to_string),
        })
    }
}
