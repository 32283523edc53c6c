//! Detectors: one module per rule family.
//!
//! Each detector looks at a single node of a single document and either
//! reports a [`Finding`] or abstains. Detection of one document never
//! depends on another document's findings, so documents are scanned in
//! parallel and the results merged into a stable order.

pub mod duplicate_call;
pub mod out_parameter;
pub mod redundant_convert;
pub mod ref_parameter;

use std::collections::BTreeSet;

use rayon::prelude::*;
use sharpfix_cst::{NodeId, SyntaxKind};
use tracing::debug;

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::finding::{Finding, RuleId};
use crate::semantic::binder::Binder;
use crate::semantic::{MethodSymbol, ProgramModel, SemanticModel};
use crate::workspace::Document;

pub use redundant_convert::{classify_usage, ResultUsage};

/// The rules a run is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeSet<RuleId>,
}

impl RuleSet {
    pub fn all() -> Self {
        RuleSet {
            rules: RuleId::ALL.into_iter().collect(),
        }
    }

    pub fn only(rules: impl IntoIterator<Item = RuleId>) -> Self {
        RuleSet {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn contains(&self, rule: RuleId) -> bool {
        self.rules.contains(&rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().copied()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::all()
    }
}

/// Run every enabled detector over every document.
///
/// Findings come back ordered by document, anchor offset and rule.
pub fn detect_all(model: &ProgramModel, rules: &RuleSet) -> AnalyzerResult<Vec<Finding>> {
    let documents: Vec<_> = model.solution().documents().collect();
    let per_document = documents
        .par_iter()
        .map(|document| detect_document(model, document, rules))
        .collect::<AnalyzerResult<Vec<_>>>()?;
    let mut findings: Vec<Finding> = per_document.into_iter().flatten().collect();
    findings.sort_by_key(|f| (f.document, f.span.start, f.rule));
    debug!(count = findings.len(), "detection finished");
    Ok(findings)
}

/// Run every enabled detector over one document.
pub fn detect_document(
    model: &ProgramModel,
    document: &Document,
    rules: &RuleSet,
) -> AnalyzerResult<Vec<Finding>> {
    let binder = Binder::new(model, document);
    let tree = document.tree();
    let mut findings = Vec::new();
    for node in tree.descendants(tree.root()) {
        let found = match tree.kind(node) {
            SyntaxKind::Parameter
                if rules.contains(RuleId::RemoveUnnecessaryRef)
                    || rules.contains(RuleId::ConvertRefToOut) =>
            {
                ref_parameter::detect(&binder, node)?
            }
            SyntaxKind::MethodDeclaration
                if rules.contains(RuleId::OutParameterToReturn)
                    || rules.contains(RuleId::OutParametersToTuple) =>
            {
                out_parameter::detect(&binder, node)?
            }
            SyntaxKind::InvocationExpression if rules.contains(RuleId::RedundantConvert) => {
                redundant_convert::detect(&binder, node)?
            }
            SyntaxKind::IfStatement | SyntaxKind::ConditionalExpression
                if rules.contains(RuleId::DuplicateCall) =>
            {
                duplicate_call::detect(&binder, node)?
            }
            _ => None,
        };
        if let Some(finding) = found.filter(|f| rules.contains(f.rule)) {
            findings.push(finding);
        }
    }
    debug!(document = document.path(), count = findings.len(), "scanned document");
    Ok(findings)
}

/// The symbol of a method declaration. Every declaration in the snapshot is
/// indexed, so a miss is an engine bug.
pub(crate) fn declared_method<'a>(
    binder: &Binder<'a>,
    declaration: NodeId,
) -> AnalyzerResult<&'a MethodSymbol> {
    let document = binder.document();
    binder
        .model()
        .declared_method(document.id(), declaration)
        .ok_or_else(|| {
            AnalyzerError::Internal(format!(
                "no symbol for method declaration at {} in {}",
                binder.tree().span(declaration).start,
                document.path()
            ))
        })
}
