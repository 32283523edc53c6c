//! ACNU0003: both branches of an if/else or a conditional expression call
//! the same method, and the calls differ in exactly one argument.

use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};

use crate::error::AnalyzerResult;
use crate::finding::{Finding, RuleId};
use crate::semantic::binder::Binder;
use crate::syntax::{ArgumentView, IfView, InvocationView};

/// How two arguments at the same position compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentComparison {
    /// Same tokens, trivia aside.
    Equivalent,
    /// Different expressions under the same label, or both unlabeled.
    Different,
    /// Different labels; the calls cannot be merged.
    NotComparable,
}

/// The pair of calls found in the two branches.
#[derive(Debug, Clone)]
pub struct BranchCalls {
    pub when_true: InvocationView,
    pub when_false: InvocationView,
    /// Comparison for every argument position.
    pub comparisons: Vec<ArgumentComparison>,
}

impl BranchCalls {
    /// The position of the single differing argument.
    pub fn differing_argument(&self) -> Option<usize> {
        let mut different = self
            .comparisons
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == ArgumentComparison::Different)
            .map(|(i, _)| i);
        match (different.next(), different.next()) {
            (Some(index), None) => Some(index),
            _ => None,
        }
    }
}

pub fn detect(binder: &Binder, node: NodeId) -> AnalyzerResult<Option<Finding>> {
    let tree = binder.tree();
    let (anchor, when_true, when_false) = match tree.kind(node) {
        SyntaxKind::IfStatement => {
            let Some((when_true, when_false)) = if_branch_invocations(tree, node) else {
                return Ok(None);
            };
            let Some(view) = IfView::new(tree, node) else {
                return Ok(None);
            };
            (view.if_keyword, when_true, when_false)
        }
        SyntaxKind::ConditionalExpression => {
            let Some((when_true, when_false)) = conditional_invocations(tree, node) else {
                return Ok(None);
            };
            let Some(question) = tree.child_token(node, "?") else {
                return Ok(None);
            };
            (question, when_true, when_false)
        }
        _ => return Ok(None),
    };

    let Some(calls) = matching_calls(binder, when_true, when_false) else {
        return Ok(None);
    };
    if calls.differing_argument().is_none() {
        return Ok(None);
    }
    let Some(method) = binder.resolve_invocation(when_true) else {
        return Ok(None);
    };
    Ok(Some(Finding::new(
        RuleId::DuplicateCall,
        binder.document().id(),
        tree.token(anchor).span(),
        vec![binder.model().method_at(method).name.clone()],
    )))
}

/// The invocations in the two branches of an if/else, when both branches
/// are single statements of the same kind whose only child is a call.
pub fn if_branch_invocations(tree: &SyntaxTree, if_statement: NodeId) -> Option<(NodeId, NodeId)> {
    let view = IfView::new(tree, if_statement)?;
    let (true_kind, when_true) = branch_invocation(tree, view.statement)?;
    let (false_kind, when_false) = branch_invocation(tree, view.else_statement?)?;
    (true_kind == false_kind).then_some((when_true, when_false))
}

/// The invocations forming both arms of `c ? F(a) : F(b)`.
pub fn conditional_invocations(tree: &SyntaxTree, conditional: NodeId) -> Option<(NodeId, NodeId)> {
    let mut nodes = tree.child_nodes(conditional).skip(1);
    let when_true = nodes.next()?;
    let when_false = nodes.next()?;
    let is_call = |n: NodeId| tree.kind(n) == SyntaxKind::InvocationExpression;
    (is_call(when_true) && is_call(when_false)).then_some((when_true, when_false))
}

/// The statement kind and invocation of a branch: one statement, possibly
/// wrapped in a block, whose only child node is an invocation.
pub fn branch_invocation(tree: &SyntaxTree, branch: NodeId) -> Option<(SyntaxKind, NodeId)> {
    let statement = if tree.kind(branch) == SyntaxKind::Block {
        single(tree.child_nodes(branch))?
    } else {
        branch
    };
    let child = single(tree.child_nodes(statement))?;
    (tree.kind(child) == SyntaxKind::InvocationExpression).then(|| (tree.kind(statement), child))
}

fn single(mut items: impl Iterator<Item = NodeId>) -> Option<NodeId> {
    let first = items.next()?;
    items.next().is_none().then_some(first)
}

/// Compare two calls argument by argument, requiring the same resolved
/// method and the same nonzero argument count. `None` when the calls are
/// not candidates for merging at all.
pub fn matching_calls(binder: &Binder, when_true: NodeId, when_false: NodeId) -> Option<BranchCalls> {
    let tree = binder.tree();
    let true_view = InvocationView::new(tree, when_true)?;
    let false_view = InvocationView::new(tree, when_false)?;
    if true_view.arguments.is_empty() || true_view.arguments.len() != false_view.arguments.len() {
        return None;
    }
    let true_method = binder.resolve_invocation(when_true)?;
    let false_method = binder.resolve_invocation(when_false)?;
    if true_method != false_method {
        return None;
    }
    let comparisons: Vec<ArgumentComparison> = true_view
        .argument_views(tree)
        .iter()
        .zip(false_view.argument_views(tree).iter())
        .map(|(a, b)| compare_arguments(tree, a, b))
        .collect();
    if comparisons.len() != true_view.arguments.len()
        || comparisons.contains(&ArgumentComparison::NotComparable)
    {
        return None;
    }
    Some(BranchCalls {
        when_true: true_view,
        when_false: false_view,
        comparisons,
    })
}

pub fn compare_arguments(tree: &SyntaxTree, a: &ArgumentView, b: &ArgumentView) -> ArgumentComparison {
    if equivalent(tree, a.node, b.node) {
        ArgumentComparison::Equivalent
    } else if a.name(tree) != b.name(tree) {
        ArgumentComparison::NotComparable
    } else {
        ArgumentComparison::Different
    }
}

/// Same token texts in the same order.
fn equivalent(tree: &SyntaxTree, a: NodeId, b: NodeId) -> bool {
    let mut left = tree.token_ids(a).map(|t| tree.token(t).text.as_str());
    let mut right = tree.token_ids(b).map(|t| tree.token(t).text.as_str());
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => continue,
            _ => return false,
        }
    }
}
