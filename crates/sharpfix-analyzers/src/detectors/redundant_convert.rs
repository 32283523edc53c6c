//! ACNU0005: `System.Convert.ToX` calls whose argument already has the
//! result type.

use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};

use crate::error::AnalyzerResult;
use crate::finding::{Finding, RuleId};
use crate::semantic::binder::Binder;
use crate::syntax::InvocationView;

const CONVERT_TYPE: &str = "System.Convert";

pub fn detect(binder: &Binder, invocation: NodeId) -> AnalyzerResult<Option<Finding>> {
    let tree = binder.tree();
    let Some(view) = InvocationView::new(tree, invocation) else {
        return Ok(None);
    };
    if view.arguments.len() != 1 {
        return Ok(None);
    }
    let Some(method) = binder.resolve_invocation(invocation) else {
        return Ok(None);
    };
    let model = binder.model();
    let symbol = model.method_at(method);
    if model.type_at(symbol.containing_type).qualified_name != CONVERT_TYPE
        || !symbol.name.starts_with("To")
    {
        return Ok(None);
    }
    let Some(argument) = view.argument(tree, 0) else {
        return Ok(None);
    };
    let argument_type = binder.type_of(argument.expression);
    if !argument_type.is_known() || argument_type != symbol.return_type {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        RuleId::RedundantConvert,
        binder.document().id(),
        tree.span(view.callee),
        vec![symbol.name.clone(), argument_type.to_string()],
    )))
}

// ============================================================================
// Result Usage
// ============================================================================

/// Whether the value of a call is consumed by its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultUsage {
    Used,
    Discarded,
    /// A parent shape the classifier does not know.
    Unknown,
}

/// Classify how the parent of `invocation` uses its value.
///
/// Only the listed parent shapes count as uses. An assignment's right-hand
/// side is deliberately not among them and comes back `Unknown`.
pub fn classify_usage(tree: &SyntaxTree, invocation: NodeId) -> ResultUsage {
    let Some(parent) = tree.parent(invocation) else {
        return ResultUsage::Unknown;
    };
    match tree.kind(parent) {
        SyntaxKind::ExpressionStatement => ResultUsage::Discarded,
        SyntaxKind::Argument
        | SyntaxKind::EqualsValueClause
        | SyntaxKind::ReturnStatement
        | SyntaxKind::BinaryExpression
        | SyntaxKind::ParenthesizedExpression
        | SyntaxKind::MemberAccessExpression
        | SyntaxKind::ConditionalExpression => ResultUsage::Used,
        SyntaxKind::ConditionalAccessExpression
            if tree.child_nodes(parent).next() == Some(invocation) =>
        {
            ResultUsage::Used
        }
        _ => ResultUsage::Unknown,
    }
}
