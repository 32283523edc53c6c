//! Shared helpers for the analyzer integration tests.

#![allow(dead_code)]

use sharpfix_analyzers::{
    apply_fix, detect_all, fix_all, BatchOutcome, Finding, FixAllScope, ProgramModel, RuleId,
    RuleSet, Solution,
};
use tokio_util::sync::CancellationToken;

pub fn solution(sources: &[(&str, &str)]) -> Solution {
    Solution::from_sources(sources.iter().copied()).expect("sources parse")
}

/// Findings of `rule` in `sources`.
pub fn findings(sources: &[(&str, &str)], rule: RuleId) -> Vec<Finding> {
    let model = ProgramModel::build(&solution(sources));
    detect_all(&model, &RuleSet::only([rule])).expect("detection succeeds")
}

/// `(rule, anchor text, arguments)` for every finding in a single file.
pub fn anchors(source: &str) -> Vec<(RuleId, String, Vec<String>)> {
    let model = ProgramModel::build(&solution(&[("Test.cs", source)]));
    detect_all(&model, &RuleSet::all())
        .expect("detection succeeds")
        .into_iter()
        .map(|f| (f.rule, source[f.span.start..f.span.end].to_string(), f.arguments))
        .collect()
}

/// Apply the fix for the first finding of `rule` and return every
/// document's text afterwards.
pub fn fix_first(sources: &[(&str, &str)], rule: RuleId) -> Vec<String> {
    let model = ProgramModel::build(&solution(sources));
    let findings = detect_all(&model, &RuleSet::only([rule])).expect("detection succeeds");
    let finding = findings.first().expect("a finding to fix");
    let outcome = apply_fix(&model, finding, &CancellationToken::new())
        .expect("fix applies")
        .expect("a fix is offered");
    texts(&outcome.solution)
}

/// Single-file form of [`fix_first`].
pub fn fix_one(source: &str, rule: RuleId) -> String {
    fix_first(&[("Test.cs", source)], rule).remove(0)
}

/// Run fix-all for `rules` over `sources`.
pub fn fix_everything(sources: &[(&str, &str)], rules: RuleSet) -> BatchOutcome {
    let model = ProgramModel::build(&solution(sources));
    let findings = detect_all(&model, &rules).expect("detection succeeds");
    fix_all(
        &model,
        &findings,
        &FixAllScope::Rules(rules),
        &CancellationToken::new(),
    )
    .expect("fix-all succeeds")
}

pub fn texts(solution: &Solution) -> Vec<String> {
    solution.documents().map(|d| d.text().to_string()).collect()
}
