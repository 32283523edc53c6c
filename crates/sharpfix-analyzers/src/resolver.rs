//! From a finding to every site its rewrite touches.
//!
//! Signature rules (ACNU0001, 0002, 0010, 0011) change a method declaration,
//! so every call of that method must change with it. The resolver asks the
//! semantic model for all references to the declared method and turns each
//! usable call into a call-site [`Edit`], next to one declaration [`Edit`].
//! Expression rules (ACNU0003, 0005) rewrite a single node in place.
//!
//! Edits record where their target node starts, not the node id: the engine
//! re-parses a document after every edit and finds the node again by its
//! start offset.

use std::collections::BTreeMap;

use sharpfix_core::patch::Span;
use sharpfix_core::text::byte_offset_to_position_str;
use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::finding::{Finding, RuleId};
use crate::semantic::{MethodId, ReferenceRole, SemanticModel, SymbolReference};
use crate::syntax::{ArgumentView, InvocationView, MethodView, ParameterView, SeparatedList};
use crate::workspace::{Document, DocumentId};

// ============================================================================
// Plan
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    /// The node the finding is about: a method declaration for signature
    /// rules, the statement or expression for expression rules.
    Declaration,
    /// A call of the rewritten method. `arguments[i]` is the argument bound
    /// to the plan's `i`-th affected parameter.
    CallSite { arguments: Vec<usize> },
}

/// One node to rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    pub target: SyntaxKind,
    /// Span of the target node when the plan was made.
    pub span: Span,
    /// Position among the nodes of `target` kind starting at `span.start`,
    /// innermost first.
    pub depth: usize,
}

impl Edit {
    fn at(tree: &SyntaxTree, node: NodeId, kind: EditKind) -> Edit {
        let target = tree.kind(node);
        let span = tree.span(node);
        let depth = tree
            .nodes_starting_at(target, span.start)
            .iter()
            .position(|&n| n == node)
            .unwrap_or(0);
        Edit {
            kind,
            target,
            span,
            depth,
        }
    }

    /// Find the target again in a tree where only text at or after the
    /// target's first token may have changed.
    pub fn relocate(&self, tree: &SyntaxTree) -> Option<NodeId> {
        tree.nodes_starting_at(self.target, self.span.start)
            .get(self.depth)
            .copied()
    }
}

/// Every edit one fix needs, grouped by document.
#[derive(Debug, Clone)]
pub struct RewritePlan {
    pub rule: RuleId,
    /// The declaring method, for signature rules.
    pub method: Option<MethodId>,
    /// Indexes of the affected parameters in declaration order.
    pub parameters: Vec<usize>,
    pub documents: BTreeMap<DocumentId, Vec<Edit>>,
}

impl RewritePlan {
    pub fn edit_count(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    fn push(&mut self, document: DocumentId, edit: Edit) {
        self.documents.entry(document).or_default().push(edit);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Build the plan for `finding`.
///
/// The finding must come from the snapshot `model` describes; an anchor that
/// no longer points at the node its rule reports is an internal error.
pub fn resolve(
    model: &dyn SemanticModel,
    finding: &Finding,
    cancel: &CancellationToken,
) -> AnalyzerResult<RewritePlan> {
    let document = model.solution().document(finding.document)?;
    let tree = document.tree();
    let stale = || {
        AnalyzerError::Internal(format!(
            "{} finding at {} in {} does not match the source",
            finding.rule,
            finding.span,
            document.path()
        ))
    };
    match finding.rule {
        RuleId::RemoveUnnecessaryRef | RuleId::ConvertRefToOut | RuleId::OutParameterToReturn => {
            let (method, index) = anchored_parameter(tree, finding.span).ok_or_else(stale)?;
            signature_plan(model, finding.rule, document, method, vec![index], cancel)
        }
        RuleId::OutParametersToTuple => {
            let method = anchored_method(tree, finding.span).ok_or_else(stale)?;
            let view = MethodView::new(tree, method).ok_or_else(stale)?;
            let indexes = out_parameter_indexes(tree, &view.parameters(tree));
            if indexes.is_empty() {
                return Err(stale());
            }
            signature_plan(model, finding.rule, document, method, indexes, cancel)
        }
        RuleId::DuplicateCall => {
            let node = anchored_branching(tree, finding.span).ok_or_else(stale)?;
            Ok(single_site_plan(finding, tree, node))
        }
        RuleId::RedundantConvert => {
            let node = invocation_at_callee(tree, finding.span).ok_or_else(stale)?;
            Ok(single_site_plan(finding, tree, node))
        }
    }
}

fn single_site_plan(finding: &Finding, tree: &SyntaxTree, node: NodeId) -> RewritePlan {
    let mut plan = RewritePlan {
        rule: finding.rule,
        method: None,
        parameters: Vec::new(),
        documents: BTreeMap::new(),
    };
    plan.push(finding.document, Edit::at(tree, node, EditKind::Declaration));
    plan
}

fn signature_plan(
    model: &dyn SemanticModel,
    rule: RuleId,
    document: &Document,
    method_node: NodeId,
    parameters: Vec<usize>,
    cancel: &CancellationToken,
) -> AnalyzerResult<RewritePlan> {
    let symbol = model
        .declared_method(document.id(), method_node)
        .ok_or_else(|| {
            AnalyzerError::Internal(format!("no symbol for method declaration in {}", document.path()))
        })?;
    let names = parameters
        .iter()
        .map(|&i| symbol.parameters.get(i).map(|p| p.name.clone()))
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| {
            AnalyzerError::Internal(format!("method {} has fewer parameters than its declaration", symbol.name))
        })?;

    let mut plan = RewritePlan {
        rule,
        method: Some(symbol.id),
        parameters,
        documents: BTreeMap::new(),
    };
    plan.push(
        document.id(),
        Edit::at(document.tree(), method_node, EditKind::Declaration),
    );

    let references = model.find_all_references(symbol.id, cancel)?;
    ensure_complete(model, &symbol.name, &references)?;
    let mut discarded = 0;
    for reference in &references {
        match call_site(model, rule, &plan.parameters, &names, reference)? {
            Some(edit) => plan.push(reference.document, edit),
            None => discarded += 1,
        }
    }
    debug!(
        rule = %rule,
        method = %symbol.name,
        references = references.len(),
        discarded,
        "resolved rewrite plan"
    );
    Ok(plan)
}

/// Refuse a signature rewrite when some call of the method may have been
/// missed: a call the model could not bind, or a document that did not
/// parse and mentions the method's name.
fn ensure_complete(
    model: &dyn SemanticModel,
    method: &str,
    references: &[SymbolReference],
) -> AnalyzerResult<()> {
    if let Some(reference) = references
        .iter()
        .find(|r| r.role == ReferenceRole::Unresolved)
    {
        let document = model.solution().document(reference.document)?;
        let (line, col) = byte_offset_to_position_str(document.text(), reference.span.start);
        return Err(AnalyzerError::UnboundCallSite {
            method: method.to_string(),
            path: document.path().to_string(),
            reason: format!("call at {}:{} could not be bound", line, col),
        });
    }
    if let Some(skipped) = model.solution().skipped().iter().find(|s| s.mentions(method)) {
        return Err(AnalyzerError::UnboundCallSite {
            method: method.to_string(),
            path: skipped.path.clone(),
            reason: "file does not parse".to_string(),
        });
    }
    Ok(())
}

/// The call-site edit for one reference, or `None` when the reference is
/// not a call the rewrite can follow.
fn call_site(
    model: &dyn SemanticModel,
    rule: RuleId,
    parameters: &[usize],
    names: &[String],
    reference: &SymbolReference,
) -> AnalyzerResult<Option<Edit>> {
    let document = model.solution().document(reference.document)?;
    let tree = document.tree();
    let (ReferenceRole::InvocationCallee, Some(invocation)) = (reference.role, reference.invocation)
    else {
        debug!(file = document.path(), span = %reference.span, "reference is not a call, skipping");
        return Ok(None);
    };
    let Some(view) = InvocationView::new(tree, invocation) else {
        return Ok(None);
    };
    let arguments = view.argument_views(tree);
    let mut positions = Vec::with_capacity(parameters.len());
    for (&index, name) in parameters.iter().zip(names) {
        let Some(position) = argument_for_parameter(tree, &arguments, index, name) else {
            debug!(file = document.path(), span = %reference.span, parameter = %name, "call has no argument for parameter, skipping");
            return Ok(None);
        };
        if !argument_matches(tree, rule, &arguments[position]) {
            debug!(file = document.path(), span = %reference.span, parameter = %name, "argument does not match the rewrite, skipping");
            return Ok(None);
        }
        positions.push(position);
    }
    Ok(Some(Edit::at(
        tree,
        invocation,
        EditKind::CallSite {
            arguments: positions,
        },
    )))
}

/// The argument bound to parameter `index` named `name`: a named argument
/// with that label, else an unlabeled argument at the same position.
fn argument_for_parameter(
    tree: &SyntaxTree,
    arguments: &[ArgumentView],
    index: usize,
    name: &str,
) -> Option<usize> {
    if let Some(position) = arguments.iter().position(|a| a.name(tree) == Some(name)) {
        return Some(position);
    }
    let positional = arguments.get(index)?;
    positional.name_colon.is_none().then_some(index)
}

fn argument_matches(tree: &SyntaxTree, rule: RuleId, argument: &ArgumentView) -> bool {
    match rule {
        RuleId::RemoveUnnecessaryRef | RuleId::ConvertRefToOut => {
            argument.ref_kind_text(tree) == Some("ref")
                && tree.kind(argument.expression) == SyntaxKind::IdentifierName
        }
        RuleId::OutParameterToReturn | RuleId::OutParametersToTuple => {
            argument.ref_kind_text(tree) == Some("out")
        }
        RuleId::DuplicateCall | RuleId::RedundantConvert => false,
    }
}

fn out_parameter_indexes(tree: &SyntaxTree, parameters: &SeparatedList) -> Vec<usize> {
    parameters
        .items
        .iter()
        .enumerate()
        .filter(|&(_, &p)| {
            ParameterView::new(tree, p).is_some_and(|v| v.single_modifier(tree) == Some("out"))
        })
        .map(|(i, _)| i)
        .collect()
}

// ============================================================================
// Anchors
// ============================================================================

/// The method declaration and parameter index of a `ref`/`out` anchor.
fn anchored_parameter(tree: &SyntaxTree, anchor: Span) -> Option<(NodeId, usize)> {
    let token = tree.token_at_offset(anchor.start)?;
    if tree.token(token).span() != anchor {
        return None;
    }
    let parameter = tree.token_parent(token);
    let list = tree.parent(parameter)?;
    let method = tree.parent(list)?;
    if tree.kind(parameter) != SyntaxKind::Parameter || tree.kind(method) != SyntaxKind::MethodDeclaration {
        return None;
    }
    let index = SeparatedList::new(tree, list)
        .items
        .iter()
        .position(|&p| p == parameter)?;
    Some((method, index))
}

/// The method declaration whose return type is `anchor`.
fn anchored_method(tree: &SyntaxTree, anchor: Span) -> Option<NodeId> {
    let covering = tree.covering_node(anchor);
    std::iter::once(covering)
        .chain(tree.ancestors(covering))
        .find(|&n| tree.kind(n) == SyntaxKind::MethodDeclaration)
        .filter(|&m| MethodView::new(tree, m).is_some_and(|v| tree.span(v.return_type) == anchor))
}

/// The if statement or conditional expression owning an `if` or `?` anchor.
fn anchored_branching(tree: &SyntaxTree, anchor: Span) -> Option<NodeId> {
    let token = tree.token_at_offset(anchor.start)?;
    if tree.token(token).span() != anchor {
        return None;
    }
    let node = tree.token_parent(token);
    matches!(
        tree.kind(node),
        SyntaxKind::IfStatement | SyntaxKind::ConditionalExpression
    )
    .then_some(node)
}

/// The invocation whose callee spans exactly `callee`.
pub(crate) fn invocation_at_callee(tree: &SyntaxTree, callee: Span) -> Option<NodeId> {
    tree.nodes_starting_at(SyntaxKind::InvocationExpression, callee.start)
        .into_iter()
        .find(|&n| InvocationView::new(tree, n).is_some_and(|v| tree.span(v.callee) == callee))
}
