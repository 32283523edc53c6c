//! CLI front door operations.
//!
//! Each command is a plain function from a loaded [`Solution`] to a response
//! struct, so the binary only parses flags, picks an output format and
//! writes files. All functions return `Result<T, SharpfixError>` so that
//! failures map onto stable exit codes.

use std::fmt::Write as _;
use std::path::Path;

use sharpfix_analyzers::{
    apply_fix, compute_fix, detect_all, fix_all, DocumentChange, Finding, FixAllScope,
    ProgramModel, RuleId, RuleSet, SemanticModel, Solution,
};
use sharpfix_core::diff::{generate_unified_diff, FileDiff};
use sharpfix_core::error::SharpfixError;
use sharpfix_core::output::{
    AnalyzeResponse, FileSnapshot, FindingInfo, FixResponse, Location, RulesResponse, Warning,
    SCHEMA_VERSION,
};
use sharpfix_core::patch::{ContentHash, OutputEdit};
use sharpfix_core::text::position_to_byte_offset_str;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ============================================================================
// Inputs
// ============================================================================

/// Load every `.cs` file under `root`.
pub fn load_solution(root: &Path) -> Result<Solution, SharpfixError> {
    if !root.is_dir() {
        return Err(SharpfixError::file_not_found(root.display().to_string()));
    }
    let solution = Solution::load(root)?;
    info!(
        documents = solution.len(),
        skipped = solution.skipped().len(),
        root = %root.display(),
        "loaded workspace"
    );
    Ok(solution)
}

/// Rule selection from repeated `--rule` flags. No flags selects every rule.
pub fn parse_rules(ids: &[String]) -> Result<RuleSet, SharpfixError> {
    if ids.is_empty() {
        return Ok(RuleSet::all());
    }
    let rules = ids
        .iter()
        .map(|id| id.parse::<RuleId>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RuleSet::only(rules))
}

/// What `fix` applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixTarget {
    /// The finding anchored at a `path:line:col` location.
    At(Location),
    /// Every fixable finding.
    All,
}

impl FixTarget {
    /// Parse an `--at` argument.
    pub fn at(arg: &str) -> Result<Self, SharpfixError> {
        let location = Location::parse(arg).ok_or_else(|| {
            SharpfixError::invalid_args(format!(
                "invalid location format '{}', expected path:line:col",
                arg
            ))
        })?;
        Ok(FixTarget::At(location))
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Report every finding of `rules`.
pub fn analyze(solution: &Solution, rules: &RuleSet) -> Result<AnalyzeResponse, SharpfixError> {
    let model = ProgramModel::build(solution);
    let findings = detect_all(&model, rules)?;
    let mut infos = Vec::with_capacity(findings.len());
    for finding in &findings {
        let fix = compute_fix(&model, finding)?;
        infos.push(finding.to_info(solution, fix.as_ref().map(|f| f.title))?);
    }
    info!(findings = infos.len(), "analysis finished");
    Ok(AnalyzeResponse::new(
        solution.len(),
        infos,
        skipped_warnings(solution),
    ))
}

/// A computed fix: the response plus the documents to write.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub response: FixResponse,
    pub changes: Vec<DocumentChange>,
}

/// Compute the fix for `target` without touching the file system.
pub fn fix(
    solution: &Solution,
    target: &FixTarget,
    rules: &RuleSet,
    cancel: &CancellationToken,
) -> Result<FixOutcome, SharpfixError> {
    let model = ProgramModel::build(solution);
    match target {
        FixTarget::At(location) => fix_at(&model, location, rules, cancel),
        FixTarget::All => fix_everything(&model, rules, cancel),
    }
}

fn fix_at(
    model: &ProgramModel,
    location: &Location,
    rules: &RuleSet,
    cancel: &CancellationToken,
) -> Result<FixOutcome, SharpfixError> {
    let solution = model.solution();
    let path = normalize_path(&location.file);
    let Some(document) = solution.document_by_path(&path) else {
        return Err(missing_document(solution, &path));
    };
    let offset = position_to_byte_offset_str(document.text(), location.line, location.col);

    let findings = detect_all(model, rules)?;
    let finding = findings
        .iter()
        .find(|f| f.document == document.id() && f.span.contains_offset(offset))
        .ok_or_else(|| SharpfixError::finding_not_found(&path, location.line, location.col))?;
    debug!(rule = %finding.rule, span = %finding.span, "fixing finding");

    let Some(outcome) = apply_fix(model, finding, cancel)? else {
        let info = finding.to_info(solution, None)?;
        let warning = Warning::with_location(
            "no_fix",
            format!("no fix is offered for {}", finding.rule),
            info.location,
        );
        return Ok(FixOutcome {
            response: fix_response(Vec::new(), &[], vec![warning]),
            changes: Vec::new(),
        });
    };
    let title = finding.rule.descriptor().fix_title;
    let fixed = vec![finding.to_info(solution, Some(title))?];
    let mut warnings = Vec::new();
    if outcome.skipped > 0 {
        warnings.push(Warning::new(
            "sites_skipped",
            format!("{} call site(s) were left unchanged", outcome.skipped),
        ));
    }
    Ok(FixOutcome {
        response: fix_response(fixed, &outcome.documents, warnings),
        changes: outcome.documents,
    })
}

fn fix_everything(
    model: &ProgramModel,
    rules: &RuleSet,
    cancel: &CancellationToken,
) -> Result<FixOutcome, SharpfixError> {
    let solution = model.solution();
    let findings = detect_all(model, rules)?;
    let batch = fix_all(model, &findings, &FixAllScope::Rules(rules.clone()), cancel)?;

    let fixed = batch
        .applied
        .iter()
        .map(|f| f.to_info(solution, Some(f.rule.descriptor().fix_title)))
        .collect::<Result<Vec<_>, _>>()?;
    let mut warnings = Vec::new();
    for finding in &batch.dropped {
        warnings.push(dropped_warning(solution, finding)?);
    }
    Ok(FixOutcome {
        response: fix_response(fixed, &batch.documents, warnings),
        changes: batch.documents,
    })
}

fn dropped_warning(solution: &Solution, finding: &Finding) -> Result<Warning, SharpfixError> {
    let info = finding.to_info(solution, None)?;
    Ok(Warning::with_location(
        "fix_skipped",
        format!("fix for {} was not applied in this pass", finding.rule),
        info.location,
    ))
}

fn fix_response(
    fixed: Vec<FindingInfo>,
    changes: &[DocumentChange],
    warnings: Vec<Warning>,
) -> FixResponse {
    let snapshots = changes
        .iter()
        .map(|c| FileSnapshot {
            file: c.path.clone(),
            hash: ContentHash::compute(c.original.as_bytes()),
        })
        .collect();
    let edits = changes
        .iter()
        .flat_map(|c| {
            c.edits
                .iter()
                .map(|e| OutputEdit::new(&c.path, &c.original, e.span, e.new_text.clone()))
        })
        .collect();
    let files: Vec<FileDiff<'_>> = changes
        .iter()
        .map(|c| FileDiff {
            path: &c.path,
            old: &c.original,
            new: &c.text,
        })
        .collect();
    FixResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        fixed,
        snapshots,
        edits,
        diff: generate_unified_diff(&files),
        applied: false,
        files_written: None,
        warnings,
    }
}

/// Every rule's static description.
pub fn rules() -> RulesResponse {
    RulesResponse::new(
        RuleId::ALL
            .iter()
            .map(|rule| rule.descriptor().to_rule_info())
            .collect(),
    )
}

// ============================================================================
// Writing
// ============================================================================

/// Write every changed document under `root`.
///
/// Each file must still hold the text the fix was computed from; nothing is
/// written if any file changed in the meantime.
pub fn write_changes(root: &Path, changes: &[DocumentChange]) -> Result<Vec<String>, SharpfixError> {
    for change in changes {
        let on_disk = std::fs::read(root.join(&change.path))
            .map_err(|e| SharpfixError::apply_failed(e.to_string(), &change.path))?;
        if ContentHash::compute(&on_disk) != ContentHash::compute(change.original.as_bytes()) {
            warn!(path = %change.path, "file changed on disk since it was analyzed");
            return Err(SharpfixError::apply_failed(
                "file changed on disk since it was analyzed",
                &change.path,
            ));
        }
    }

    let mut written = Vec::with_capacity(changes.len());
    for change in changes {
        std::fs::write(root.join(&change.path), &change.text)
            .map_err(|e| SharpfixError::apply_failed(e.to_string(), &change.path))?;
        info!(path = %change.path, edits = change.edits.len(), "wrote file");
        written.push(change.path.clone());
    }
    Ok(written)
}

// ============================================================================
// Text Rendering
// ============================================================================

/// One line per finding, `path:line:col: severity RULE: message`.
pub fn render_findings(response: &AnalyzeResponse) -> String {
    let mut findings: Vec<&FindingInfo> = response.findings.iter().collect();
    findings.sort_by(|a, b| a.location.cmp(&b.location).then_with(|| a.rule.cmp(&b.rule)));

    let mut out = String::new();
    for finding in findings {
        let _ = writeln!(
            out,
            "{}:{}:{}: {} {}: {}",
            finding.location.file,
            finding.location.line,
            finding.location.col,
            finding.severity,
            finding.rule,
            finding.message
        );
    }
    render_warnings(&mut out, &response.warnings);
    let _ = writeln!(
        out,
        "{} finding(s) in {} file(s)",
        response.findings.len(),
        response.files_analyzed
    );
    out
}

/// Summary of a fix: what was fixed, what was written, what was skipped.
pub fn render_fix_summary(response: &FixResponse) -> String {
    let mut out = String::new();
    for finding in &response.fixed {
        let _ = writeln!(
            out,
            "fixed {} at {}:{}:{}",
            finding.rule, finding.location.file, finding.location.line, finding.location.col
        );
    }
    render_warnings(&mut out, &response.warnings);
    match &response.files_written {
        Some(files) => {
            let _ = writeln!(out, "{} file(s) written", files.len());
        }
        None => {
            let _ = writeln!(out, "{} edit(s), nothing written", response.edits.len());
        }
    }
    out
}

pub fn render_rules(response: &RulesResponse) -> String {
    let mut out = String::new();
    for rule in &response.rules {
        let _ = writeln!(out, "{} {:<7} {}", rule.id, rule.severity, rule.title);
    }
    out
}

fn render_warnings(out: &mut String, warnings: &[Warning]) {
    for warning in warnings {
        match &warning.location {
            Some(loc) => {
                let _ = writeln!(
                    out,
                    "warning[{}] {}:{}:{}: {}",
                    warning.code, loc.file, loc.line, loc.col, warning.message
                );
            }
            None => {
                let _ = writeln!(out, "warning[{}]: {}", warning.code, warning.message);
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn skipped_warnings(solution: &Solution) -> Vec<Warning> {
    solution
        .skipped()
        .iter()
        .map(|skipped| {
            Warning::with_location(
                "parse_error",
                format!("file skipped: {}", skipped.error.message),
                Location::new(&skipped.path, skipped.error.line, skipped.error.col),
            )
        })
        .collect()
}

fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

fn missing_document(solution: &Solution, path: &str) -> SharpfixError {
    match solution.skipped().iter().find(|s| s.path == path) {
        Some(skipped) => SharpfixError::ParseError {
            file: skipped.path.clone(),
            message: format!(
                "{} (line {}, column {})",
                skipped.error.message, skipped.error.line, skipped.error.col
            ),
        },
        None => SharpfixError::file_not_found(path),
    }
}

// ============================================================================
// Tests
// ============================================================================
