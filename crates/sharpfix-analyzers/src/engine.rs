//! Multi-site rewrite engine.
//!
//! [`execute`] applies a [`RewritePlan`] document by document. Within a
//! document the edits run from the end of the file towards its start, each
//! against a fresh parse of the text the previous edit left behind, so an
//! edit only ever shifts text after the nodes still waiting for their turn.
//! A site whose node is gone or no longer has the expected shape is skipped
//! and the rest of the plan still applies.
//!
//! Once every edit of a document has run, the whitespace in regions that
//! strategies marked for formatting is normalized, the result is re-parsed
//! as a check, and the document joins the new solution. Nothing is
//! committed if the operation is cancelled on the way.

use std::cmp::Reverse;

use sharpfix_core::edit::{EditLog, TextEdit};
use sharpfix_core::patch::Span;
use sharpfix_cst::{format_edits, parse_source, SyntaxTree};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::resolver::{Edit, EditKind, RewritePlan};
use crate::strategies::{strategy_for, Rewrite};
use crate::workspace::{Document, DocumentId, Solution};

/// The rewritten text of one document.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub document: DocumentId,
    pub path: String,
    pub original: String,
    pub text: String,
    /// Net changes against `original`, ascending.
    pub edits: Vec<TextEdit>,
}

/// Result of applying one plan.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    /// The solution with every changed document replaced.
    pub solution: Solution,
    /// Changed documents in document order.
    pub documents: Vec<DocumentChange>,
    /// Sites that were skipped because they no longer matched.
    pub skipped: usize,
}

impl RewriteOutcome {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Apply `plan` to `solution`.
pub fn execute(
    solution: &Solution,
    plan: &RewritePlan,
    cancel: &CancellationToken,
) -> AnalyzerResult<RewriteOutcome> {
    let mut documents = Vec::new();
    let mut skipped = 0;
    for (&id, edits) in &plan.documents {
        let document = solution.document(id)?;
        let (change, document_skipped) = rewrite_document(document, plan, edits, cancel)?;
        skipped += document_skipped;
        if let Some(change) = change {
            documents.push(change);
        }
    }

    if cancel.is_cancelled() {
        warn!(rule = %plan.rule, "rewrite cancelled before commit");
        return Err(AnalyzerError::Cancelled);
    }
    let mut next = solution.clone();
    for change in &documents {
        next = next.with_document_text(change.document, change.text.clone())?;
    }
    Ok(RewriteOutcome {
        solution: next,
        documents,
        skipped,
    })
}

fn rewrite_document(
    document: &Document,
    plan: &RewritePlan,
    edits: &[Edit],
    cancel: &CancellationToken,
) -> AnalyzerResult<(Option<DocumentChange>, usize)> {
    let strategy = strategy_for(plan.rule);
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|e| (Reverse(e.span.start), e.depth));
    ordered.dedup();

    let mut log = EditLog::new(document.text());
    let mut regions: Vec<Span> = Vec::new();
    let mut skipped = 0;
    let mut applied = 0;
    for edit in ordered {
        if cancel.is_cancelled() {
            warn!(path = document.path(), "rewrite cancelled");
            return Err(AnalyzerError::Cancelled);
        }
        let tree = reparse(document, log.current_text())?;
        let Some(node) = edit.relocate(&tree) else {
            debug!(path = document.path(), span = %edit.span, "rewrite target not found, skipping");
            skipped += 1;
            continue;
        };
        let rewrites = match &edit.kind {
            EditKind::Declaration => strategy.rewrite_declaration(&tree, node, plan),
            EditKind::CallSite { arguments } => {
                strategy.rewrite_call_site(&tree, node, arguments, plan)
            }
        };
        let Some(rewrites) = rewrites else {
            debug!(
                path = document.path(),
                node = tree.text(node),
                "site no longer matches the rewrite, skipping"
            );
            skipped += 1;
            continue;
        };
        apply_rewrites(&mut log, &mut regions, &tree, rewrites)?;
        applied += 1;
    }

    if !regions.is_empty() {
        let formatting = format_edits(log.current_text(), &regions)?;
        for edit in formatting.iter().rev() {
            log.replace(edit.span, &edit.new_text)?;
        }
    }
    reparse(document, log.current_text())?;

    info!(
        path = document.path(),
        rule = %plan.rule,
        applied,
        skipped,
        "rewrote document"
    );
    if log.is_unchanged() {
        return Ok((None, skipped));
    }
    Ok((
        Some(DocumentChange {
            document: document.id(),
            path: document.path().to_string(),
            original: log.original_text().to_string(),
            text: log.current_text().to_string(),
            edits: log.edits(),
        }),
        skipped,
    ))
}

/// Apply one site's rewrites, last first, and keep the format regions in
/// current-text coordinates.
fn apply_rewrites(
    log: &mut EditLog,
    regions: &mut Vec<Span>,
    tree: &SyntaxTree,
    mut rewrites: Vec<Rewrite>,
) -> AnalyzerResult<()> {
    rewrites.sort_by_key(|r| Reverse((r.span.start, r.span.end)));
    if let Some(pair) = rewrites.windows(2).find(|w| w[1].span.end > w[0].span.start) {
        return Err(AnalyzerError::Internal(format!(
            "overlapping rewrites at {} and {} in `{}`",
            pair[1].span,
            pair[0].span,
            tree.slice(pair[1].span.cover(&pair[0].span))
        )));
    }
    for rewrite in rewrites {
        log.replace(rewrite.span, &rewrite.text)?;
        shift_regions(regions, rewrite.span, rewrite.text.len());
        if rewrite.format {
            regions.push(Span::new(
                rewrite.span.start,
                rewrite.span.start + rewrite.text.len(),
            ));
        }
    }
    Ok(())
}

/// Move regions after `replaced` by the change in length, and stretch
/// regions that overlap it over the new text.
fn shift_regions(regions: &mut [Span], replaced: Span, new_len: usize) {
    let new_end = replaced.start + new_len;
    for region in regions.iter_mut() {
        if region.start >= replaced.end {
            *region = Span::new(region.start - replaced.end + new_end, region.end - replaced.end + new_end);
        } else if region.end > replaced.start {
            let end = if region.end >= replaced.end {
                region.end - replaced.end + new_end
            } else {
                new_end
            };
            *region = Span::new(region.start.min(replaced.start), end.max(new_end));
        }
    }
}

fn reparse(document: &Document, text: &str) -> AnalyzerResult<SyntaxTree> {
    parse_source(text).map_err(|error| AnalyzerError::Verification {
        path: document.path().to_string(),
        message: format!("{} (line {}, column {})", error.message, error.line, error.col),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::RuleId;
    use crate::resolver::resolve;
    use crate::semantic::ProgramModel;

    fn fix(sources: &[(&str, &str)], rule: RuleId) -> RewriteOutcome {
        let solution = Solution::from_sources(sources.iter().copied()).unwrap();
        let model = ProgramModel::build(&solution);
        let findings = crate::detectors::detect_all(&model, &crate::detectors::RuleSet::only([rule])).unwrap();
        let finding = findings.first().expect("a finding");
        let plan = resolve(&model, finding, &CancellationToken::new()).unwrap();
        execute(&solution, &plan, &CancellationToken::new()).unwrap()
    }

    fn text(outcome: &RewriteOutcome, path: &str) -> String {
        outcome
            .solution
            .document_by_path(path)
            .unwrap()
            .text()
            .to_string()
    }

    mod sites {
        use super::*;

        #[test]
        fn removes_ref_at_declaration_and_calls() {
            let source = "class C {
    void M(ref int a) {}
    void N() { int x = 0; M(ref x); M(ref x); }
}";
            let outcome = fix(&[("C.cs", source)], RuleId::RemoveUnnecessaryRef);
            assert_eq!(
                text(&outcome, "C.cs"),
                "class C {
    void M(int a) {}
    void N() { int x = 0; M(x); M(x); }
}"
            );
            assert_eq!(outcome.skipped, 0);
            assert_eq!(outcome.documents.len(), 1);
        }

        #[test]
        fn out_parameter_becomes_return_value() {
            let source = "class C {
    void M(out int a) { a = 1; }
    void N() { int x; M(out x); }
}";
            let outcome = fix(&[("C.cs", source)], RuleId::OutParameterToReturn);
            assert_eq!(
                text(&outcome, "C.cs"),
                "class C {
    int M() { int a; a = 1; return a; }
    void N() { int x; x = M(); }
}"
            );
        }

        #[test]
        fn recursive_call_is_rewritten_with_the_declaration() {
            let source = "class C { void M(out int a, int n) { a = n; if (n > 0) M(out a, n - 1); } }";
            let outcome = fix(&[("C.cs", source)], RuleId::OutParameterToReturn);
            assert_eq!(
                text(&outcome, "C.cs"),
                "class C { int M(int n) { int a; a = n; if (n > 0) a = M(n - 1); return a; } }"
            );
        }

        #[test]
        fn calls_in_other_documents_change_too() {
            let outcome = fix(
                &[
                    ("A.cs", "class A { public static void M(ref int a) { } }"),
                    ("B.cs", "class B { void N() { int x = 0; A.M(ref x); } }"),
                    ("D.cs", "class D { void M(ref int a) { a = 1; } }"),
                ],
                RuleId::RemoveUnnecessaryRef,
            );
            assert_eq!(text(&outcome, "A.cs"), "class A { public static void M(int a) { } }");
            assert_eq!(text(&outcome, "B.cs"), "class B { void N() { int x = 0; A.M(x); } }");
            assert_eq!(text(&outcome, "D.cs"), "class D { void M(ref int a) { a = 1; } }");
            let paths: Vec<&str> = outcome.documents.iter().map(|d| d.path.as_str()).collect();
            assert_eq!(paths, vec!["A.cs", "B.cs"]);
        }

        #[test]
        fn unmatched_call_sites_are_skipped() {
            let source = "class C {
    void M(out int a) { a = 1; }
    void N(C c) { int x; M(out x); c?.M(out x); }
}";
            let outcome = fix(&[("C.cs", source)], RuleId::OutParameterToReturn);
            assert_eq!(outcome.skipped, 1);
            assert!(text(&outcome, "C.cs").contains("x = M();"));
            assert!(text(&outcome, "C.cs").contains("c?.M(out x);"));
        }
    }

    mod formatting {
        use super::*;

        #[test]
        fn preserves_indentation() {
            let source = "class C {
    void M(int a,
           ref int b) { }
}";
            let outcome = fix(&[("C.cs", source)], RuleId::RemoveUnnecessaryRef);
            assert_eq!(
                text(&outcome, "C.cs"),
                "class C {
    void M(int a,
           int b) { }
}"
            );
        }

        #[test]
        fn formats_modified_fragments_only() {
            let source = "class C {  void M(int a,  ref  int b) { }  }";
            let outcome = fix(&[("C.cs", source)], RuleId::RemoveUnnecessaryRef);
            assert_eq!(
                text(&outcome, "C.cs"),
                "class C {  void M(int a, int b) { }  }"
            );
        }

        #[test]
        fn net_edits_describe_the_change() {
            let source = "class C { void M(ref int a) { } }";
            let outcome = fix(&[("C.cs", source)], RuleId::RemoveUnnecessaryRef);
            let change = &outcome.documents[0];
            assert_eq!(change.original, source);
            assert_eq!(
                sharpfix_core::edit::apply_edits(&change.original, &change.edits).unwrap(),
                change.text
            );
        }

        #[test]
        fn regions_follow_earlier_replacements() {
            let mut regions = vec![Span::new(10, 12), Span::new(3, 5), Span::new(0, 1)];
            shift_regions(&mut regions, Span::new(4, 8), 1);
            assert_eq!(regions, vec![Span::new(7, 9), Span::new(3, 5), Span::new(0, 1)]);
        }
    }

    mod cancellation {
        use super::*;

        #[test]
        fn cancelled_rewrite_commits_nothing() {
            let source = "class C { void M(ref int a) { } void N() { int x = 0; M(ref x); } }";
            let solution = Solution::from_sources([("C.cs", source)]).unwrap();
            let model = ProgramModel::build(&solution);
            let findings = crate::detectors::detect_all(&model, &crate::detectors::RuleSet::all()).unwrap();
            let plan = resolve(&model, &findings[0], &CancellationToken::new()).unwrap();

            let cancel = CancellationToken::new();
            cancel.cancel();
            let err = execute(&solution, &plan, &cancel).unwrap_err();
            assert!(matches!(err, AnalyzerError::Cancelled));
            assert_eq!(solution.document(DocumentId(0)).unwrap().text(), source);
        }
    }
}
