//! ACNU0005: replace `Convert.ToX(e)` by `e`.

use sharpfix_core::patch::Span;
use sharpfix_cst::trivia::render;
use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};

use crate::detectors::{classify_usage, ResultUsage};
use crate::resolver::RewritePlan;
use crate::strategies::{Rewrite, RewriteStrategy};
use crate::syntax::InvocationView;

pub struct RemoveRedundantConvert;

impl RewriteStrategy for RemoveRedundantConvert {
    fn rewrite_declaration(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        _plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        if classify_usage(tree, node) != ResultUsage::Used {
            return None;
        }
        let view = InvocationView::new(tree, node)?;
        if view.arguments.len() != 1 {
            return None;
        }
        let argument = view.argument(tree, 0)?;
        if argument.ref_kind.is_some() || argument.name(tree).is_some() {
            return None;
        }

        let first = tree.token(tree.first_token(node));
        let last = tree.token(tree.last_token(node));
        let open = tree.token(view.arguments.open);
        let close = tree.token(view.arguments.close);
        let argument_first = tree.token(tree.first_token(argument.expression));
        let argument_last = tree.token(tree.last_token(argument.expression));

        let expression = tree.text(argument.expression);
        let expression = if needs_parentheses(tree, node, argument.expression) {
            format!("({})", expression)
        } else {
            expression.to_string()
        };
        let text = [
            render(&first.leading),
            render(&open.trailing),
            render(&argument_first.leading),
            expression,
            render(&argument_last.trailing),
            render(&close.leading),
            render(&close.trailing),
        ]
        .concat();
        Some(vec![Rewrite::replace(
            Span::new(first.full_start(), last.full_end()),
            text,
        )])
    }
}

/// An operand that binds looser than a call would change meaning once
/// the call's parentheses are gone.
fn needs_parentheses(tree: &SyntaxTree, invocation: NodeId, expression: NodeId) -> bool {
    let Some(parent) = tree.parent(invocation) else {
        return false;
    };
    let tight_parent = matches!(
        tree.kind(parent),
        SyntaxKind::MemberAccessExpression
            | SyntaxKind::ConditionalAccessExpression
            | SyntaxKind::BinaryExpression
            | SyntaxKind::PrefixUnaryExpression
            | SyntaxKind::PostfixUnaryExpression
    );
    tight_parent && !is_primary(tree.kind(expression))
}

fn is_primary(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LiteralExpression
            | SyntaxKind::IdentifierName
            | SyntaxKind::GenericName
            | SyntaxKind::QualifiedName
            | SyntaxKind::PredefinedType
            | SyntaxKind::ThisExpression
            | SyntaxKind::BaseExpression
            | SyntaxKind::MemberAccessExpression
            | SyntaxKind::InvocationExpression
            | SyntaxKind::ElementAccessExpression
            | SyntaxKind::ParenthesizedExpression
            | SyntaxKind::TupleExpression
            | SyntaxKind::ObjectCreationExpression
            | SyntaxKind::TypeOfExpression
            | SyntaxKind::DefaultExpression
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::RuleId;
    use crate::strategies::tests::{apply, plan};
    use sharpfix_cst::parse_source;

    fn rewrite(source: &str) -> Option<String> {
        let tree = parse_source(source).unwrap();
        let invocation = tree
            .descendants(tree.root())
            .filter(|&n| {
                tree.kind(n) == SyntaxKind::InvocationExpression
                    && (tree.text(n).starts_with("Convert") || tree.text(n).starts_with("System.Convert"))
            })
            .last()
            .unwrap();
        let plan = plan(RuleId::RedundantConvert, Vec::new());
        let rewrites = RemoveRedundantConvert.rewrite_declaration(&tree, invocation, &plan)?;
        Some(apply(source, &rewrites))
    }

    #[test]
    fn initializer_keeps_only_the_argument() {
        assert_eq!(
            rewrite("class C { void M() { var x = Convert.ToInt32(4); } }").unwrap(),
            "class C { void M() { var x = 4; } }"
        );
        assert_eq!(
            rewrite("class C { int M(int i) { return System.Convert.ToInt32(i); } }").unwrap(),
            "class C { int M(int i) { return i; } }"
        );
    }

    #[test]
    fn comments_inside_the_call_survive() {
        assert_eq!(
            rewrite("class C { void M(int i) { var x = Convert.ToInt32( /*a*/ i /*b*/ ); } }").unwrap(),
            "class C { void M(int i) { var x =  /*a*/ i /*b*/ ; } }"
        );
    }

    #[test]
    fn loose_operands_get_parentheses() {
        assert_eq!(
            rewrite("class C { void M(int i) { var s = Convert.ToInt32(i + 1).ToString(); } }").unwrap(),
            "class C { void M(int i) { var s = (i + 1).ToString(); } }"
        );
        assert_eq!(
            rewrite("class C { void M(int i) { var x = Convert.ToInt32(i + 1) * 2; } }").unwrap(),
            "class C { void M(int i) { var x = (i + 1) * 2; } }"
        );
        assert_eq!(
            rewrite("class C { void M(int i) { G(Convert.ToInt32(i + 1)); } }").unwrap(),
            "class C { void M(int i) { G(i + 1); } }"
        );
    }

    #[test]
    fn unused_results_are_left_alone() {
        assert!(rewrite("class C { void M(int i) { Convert.ToInt32(i); } }").is_none());
        assert!(rewrite("class C { void M(int i) { int x; x = Convert.ToInt32(i); } }").is_none());
    }
}
