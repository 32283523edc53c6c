//! Code fixes: one finding at a time, or every finding in one pass.
//!
//! A [`CodeFix`] is registered for a finding without doing any work; the
//! rewrite plan is resolved and executed only when the fix is applied.
//! [`fix_all`] computes every fix in scope independently against the same
//! snapshot and keeps those whose changes do not overlap a fix it already
//! accepted. A fix that overlaps is dropped whole, never applied in part.

use std::collections::BTreeMap;

use rayon::prelude::*;
use sharpfix_core::edit::{apply_edits, edits_conflict, TextEdit};
use sharpfix_cst::parse_source;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::detectors::{classify_usage, ResultUsage, RuleSet};
use crate::engine::{execute, DocumentChange, RewriteOutcome};
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::finding::{Finding, RuleId};
use crate::resolver::{invocation_at_callee, resolve};
use crate::semantic::SemanticModel;
use crate::workspace::{DocumentId, Solution};

/// A fix on offer for one finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFix {
    pub finding: Finding,
    pub title: &'static str,
    /// Fixes with the same key are applied together by fix-all.
    pub equivalence_key: &'static str,
}

impl CodeFix {
    fn new(finding: &Finding) -> Self {
        let descriptor = finding.rule.descriptor();
        CodeFix {
            finding: finding.clone(),
            title: descriptor.fix_title,
            equivalence_key: descriptor.equivalence_key,
        }
    }

    /// Resolve and run the rewrite against the model's snapshot.
    pub fn apply(
        &self,
        model: &dyn SemanticModel,
        cancel: &CancellationToken,
    ) -> AnalyzerResult<RewriteOutcome> {
        let plan = resolve(model, &self.finding, cancel)?;
        execute(model.solution(), &plan, cancel)
    }
}

/// The fix for `finding`, if one is offered.
///
/// A redundant conversion only gets a fix where its result is used.
pub fn compute_fix(model: &dyn SemanticModel, finding: &Finding) -> AnalyzerResult<Option<CodeFix>> {
    if finding.rule == RuleId::RedundantConvert {
        let tree = model.solution().document(finding.document)?.tree();
        let Some(invocation) = invocation_at_callee(tree, finding.span) else {
            return Ok(None);
        };
        if classify_usage(tree, invocation) != ResultUsage::Used {
            debug!(span = %finding.span, "conversion result is not used, no fix");
            return Ok(None);
        }
    }
    Ok(Some(CodeFix::new(finding)))
}

/// Compute and apply the fix for `finding`. `Ok(None)` when none is offered.
pub fn apply_fix(
    model: &dyn SemanticModel,
    finding: &Finding,
    cancel: &CancellationToken,
) -> AnalyzerResult<Option<RewriteOutcome>> {
    match compute_fix(model, finding)? {
        Some(fix) => fix.apply(model, cancel).map(Some),
        None => Ok(None),
    }
}

// ============================================================================
// Fix All
// ============================================================================

/// Which fixes a fix-all pass applies.
#[derive(Debug, Clone)]
pub enum FixAllScope {
    /// Fixes registered under one equivalence key.
    Key(String),
    /// Fixes for findings of these rules.
    Rules(RuleSet),
}

impl FixAllScope {
    fn includes(&self, fix: &CodeFix) -> bool {
        match self {
            FixAllScope::Key(key) => fix.equivalence_key == key.as_str(),
            FixAllScope::Rules(rules) => rules.contains(fix.finding.rule),
        }
    }
}

/// Result of a fix-all pass.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub solution: Solution,
    pub documents: Vec<DocumentChange>,
    /// Findings whose fix was applied.
    pub applied: Vec<Finding>,
    /// Findings whose fix overlapped an applied fix, changed nothing, or
    /// could not follow every call site.
    pub dropped: Vec<Finding>,
}

/// Apply every non-overlapping fix in `scope`, in finding order.
pub fn fix_all(
    model: &dyn SemanticModel,
    findings: &[Finding],
    scope: &FixAllScope,
    cancel: &CancellationToken,
) -> AnalyzerResult<BatchOutcome> {
    let mut fixes = Vec::new();
    for finding in findings {
        if let Some(fix) = compute_fix(model, finding)?.filter(|fix| scope.includes(fix)) {
            fixes.push(fix);
        }
    }

    let outcomes = fixes
        .par_iter()
        .map(|fix| fix.apply(model, cancel))
        .collect::<Vec<_>>();

    let mut accepted: BTreeMap<DocumentId, Vec<TextEdit>> = BTreeMap::new();
    let mut applied = Vec::new();
    let mut dropped = Vec::new();
    for (fix, outcome) in fixes.iter().zip(outcomes) {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(AnalyzerError::Verification { path, message }) => {
                warn!(rule = %fix.finding.rule, path = %path, message = %message, "fix produced invalid code, dropping");
                dropped.push(fix.finding.clone());
                continue;
            }
            Err(err @ AnalyzerError::UnboundCallSite { .. }) => {
                warn!(rule = %fix.finding.rule, error = %err, "call sites incomplete, dropping");
                dropped.push(fix.finding.clone());
                continue;
            }
            Err(err) => return Err(err),
        };
        let conflicts = outcome.documents.iter().any(|change| {
            accepted
                .get(&change.document)
                .is_some_and(|edits| edits_conflict(edits, &change.edits))
        });
        if outcome.is_empty() || conflicts {
            debug!(rule = %fix.finding.rule, span = %fix.finding.span, conflicts, "dropping fix");
            dropped.push(fix.finding.clone());
            continue;
        }
        for change in outcome.documents {
            accepted.entry(change.document).or_default().extend(change.edits);
        }
        applied.push(fix.finding.clone());
    }

    if cancel.is_cancelled() {
        warn!("fix-all cancelled before commit");
        return Err(AnalyzerError::Cancelled);
    }
    let (solution, documents) = commit(model.solution(), accepted)?;
    info!(
        applied = applied.len(),
        dropped = dropped.len(),
        documents = documents.len(),
        "fix-all finished"
    );
    Ok(BatchOutcome {
        solution,
        documents,
        applied,
        dropped,
    })
}

/// Apply the merged edits of every document and build the new solution.
fn commit(
    solution: &Solution,
    accepted: BTreeMap<DocumentId, Vec<TextEdit>>,
) -> AnalyzerResult<(Solution, Vec<DocumentChange>)> {
    let mut next = solution.clone();
    let mut documents = Vec::new();
    for (id, mut edits) in accepted {
        let document = solution.document(id)?;
        let text = apply_edits(document.text(), &edits)?;
        parse_source(&text).map_err(|error| AnalyzerError::Verification {
            path: document.path().to_string(),
            message: error.message.clone(),
        })?;
        edits.sort_by_key(|e| e.span.start);
        next = next.with_document_text(id, text.clone())?;
        documents.push(DocumentChange {
            document: id,
            path: document.path().to_string(),
            original: document.text().to_string(),
            text,
            edits,
        });
    }
    Ok((next, documents))
}
