//! ACNU0001 and ACNU0002: drop `ref`, or turn it into `out`, at the
//! declaration and at every call.

use sharpfix_core::patch::Span;
use sharpfix_cst::trivia::{render, trivia_after_removal};
use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree, TokenId};

use crate::resolver::RewritePlan;
use crate::strategies::{Rewrite, RewriteStrategy};
use crate::syntax::{InvocationView, MethodView, ParameterView};

pub struct RemoveRefModifier;

pub struct ConvertRefToOut;

impl RewriteStrategy for RemoveRefModifier {
    fn rewrite_declaration(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        let token = parameter_ref(tree, node, plan)?;
        Some(vec![remove_token(tree, token)?])
    }

    fn rewrite_call_site(
        &self,
        tree: &SyntaxTree,
        invocation: NodeId,
        arguments: &[usize],
        _plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        let token = argument_ref(tree, invocation, arguments)?;
        Some(vec![remove_token(tree, token)?])
    }
}

impl RewriteStrategy for ConvertRefToOut {
    fn rewrite_declaration(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        let token = parameter_ref(tree, node, plan)?;
        Some(vec![Rewrite::replace(tree.token(token).span(), "out")])
    }

    fn rewrite_call_site(
        &self,
        tree: &SyntaxTree,
        invocation: NodeId,
        arguments: &[usize],
        _plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        let token = argument_ref(tree, invocation, arguments)?;
        Some(vec![Rewrite::replace(tree.token(token).span(), "out")])
    }
}

/// The `ref` of the plan's parameter in a method declaration.
fn parameter_ref(tree: &SyntaxTree, method: NodeId, plan: &RewritePlan) -> Option<TokenId> {
    let view = MethodView::new(tree, method)?;
    let index = *plan.parameters.first()?;
    let parameter = ParameterView::new(tree, *view.parameters(tree).items.get(index)?)?;
    (parameter.single_modifier(tree) == Some("ref")).then(|| parameter.modifiers[0])
}

/// The `ref` of a `ref identifier` argument.
fn argument_ref(tree: &SyntaxTree, invocation: NodeId, arguments: &[usize]) -> Option<TokenId> {
    let view = InvocationView::new(tree, invocation)?;
    let argument = view.argument(tree, *arguments.first()?)?;
    let is_ref_identifier = argument.ref_kind_text(tree) == Some("ref")
        && tree.kind(argument.expression) == SyntaxKind::IdentifierName;
    is_ref_identifier.then_some(argument.ref_kind).flatten()
}

/// Delete a token, moving its trivia onto the next token.
fn remove_token(tree: &SyntaxTree, token: TokenId) -> Option<Rewrite> {
    let removed = tree.token(token);
    let next = tree.token(tree.next_token(token)?);
    let trivia = trivia_after_removal(&removed.leading, &removed.trailing, &next.leading);
    Some(Rewrite::formatted(
        Span::new(removed.full_start(), next.offset),
        render(&trivia),
    ))
}
