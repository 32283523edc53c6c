//! ACNU0003: merge the calls of both branches into one call whose
//! differing argument is a conditional expression.
//!
//! `if (c) { F(1); } else { F(2); }` becomes `F(c ? 1 : 2);` and
//! `c ? F(1) : F(2)` becomes `F(c ? 1 : 2)`. The resolver already proved
//! both calls bind to one method; here only the syntax is re-checked.

use sharpfix_core::patch::Span;
use sharpfix_core::text::indentation_at;
use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};

use crate::detectors::duplicate_call::{
    compare_arguments, conditional_invocations, if_branch_invocations, ArgumentComparison,
};
use crate::resolver::RewritePlan;
use crate::strategies::{line_ending, Rewrite, RewriteStrategy};
use crate::syntax::{IfView, InvocationView};

pub struct MergeDuplicateCall;

impl RewriteStrategy for MergeDuplicateCall {
    fn rewrite_declaration(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        _plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        match tree.kind(node) {
            SyntaxKind::IfStatement => merge_if(tree, node),
            SyntaxKind::ConditionalExpression => merge_conditional(tree, node),
            _ => None,
        }
    }
}

fn merge_if(tree: &SyntaxTree, node: NodeId) -> Option<Vec<Rewrite>> {
    let view = IfView::new(tree, node)?;
    let (when_true, when_false) = if_branch_invocations(tree, node)?;
    let merged = merged_invocation(tree, view.condition, when_true, when_false)?;

    let statement = tree.parent(when_true)?;
    let statement_span = tree.span(statement);
    let invocation_span = tree.span(when_true);
    let source = tree.source();
    let statement_text = [
        &source[statement_span.start..invocation_span.start],
        merged.as_str(),
        &source[invocation_span.end..statement_span.end],
    ]
    .concat();

    let if_span = tree.span(node);
    let indent = indentation_at(source, if_span.start);
    let newline = line_ending(source);
    let comments: String = interior_comments(tree, node)
        .into_iter()
        .filter(|(span, _)| !statement_span.contains(span))
        .map(|(_, text)| format!("{text}{newline}{indent}"))
        .collect();
    Some(vec![Rewrite::replace(if_span, comments + &statement_text)])
}

fn merge_conditional(tree: &SyntaxTree, node: NodeId) -> Option<Vec<Rewrite>> {
    let condition = tree.child_nodes(node).next()?;
    let (when_true, when_false) = conditional_invocations(tree, node)?;
    let invocation_span = tree.span(when_true);
    if interior_comments(tree, node)
        .iter()
        .any(|(span, _)| !invocation_span.contains(span))
    {
        return None;
    }
    let merged = merged_invocation(tree, condition, when_true, when_false)?;
    Some(vec![Rewrite::replace(tree.span(node), merged)])
}

/// Text of `when_true` with its one differing argument replaced by
/// `condition ? a : b`.
fn merged_invocation(
    tree: &SyntaxTree,
    condition: NodeId,
    when_true: NodeId,
    when_false: NodeId,
) -> Option<String> {
    let true_view = InvocationView::new(tree, when_true)?;
    let false_view = InvocationView::new(tree, when_false)?;
    if !same_tokens(tree, true_view.callee, false_view.callee) {
        return None;
    }
    let true_arguments = true_view.argument_views(tree);
    let false_arguments = false_view.argument_views(tree);
    if true_arguments.is_empty() || true_arguments.len() != false_arguments.len() {
        return None;
    }

    let mut differing = None;
    for (i, (a, b)) in true_arguments.iter().zip(&false_arguments).enumerate() {
        match compare_arguments(tree, a, b) {
            ArgumentComparison::Equivalent => {}
            ArgumentComparison::NotComparable => return None,
            ArgumentComparison::Different if differing.is_some() => return None,
            ArgumentComparison::Different => differing = Some(i),
        }
    }
    let index = differing?;
    let (a, b) = (&true_arguments[index], &false_arguments[index]);
    if a.ref_kind.is_some() || b.ref_kind.is_some() {
        return None;
    }

    let conditional = format!(
        "{} ? {} : {}",
        operand(tree, condition, true),
        operand(tree, a.expression, false),
        operand(tree, b.expression, false),
    );
    let call = tree.span(when_true);
    let replaced = tree.span(a.expression);
    let source = tree.source();
    Some(
        [
            &source[call.start..replaced.start],
            conditional.as_str(),
            &source[replaced.end..call.end],
        ]
        .concat(),
    )
}

/// Expression text, parenthesized when it would not parse as that part of
/// a conditional expression.
fn operand(tree: &SyntaxTree, node: NodeId, is_condition: bool) -> String {
    let kind = tree.kind(node);
    let loose = kind == SyntaxKind::AssignmentExpression
        || kind.is_lambda()
        || (is_condition && kind == SyntaxKind::ConditionalExpression);
    if loose {
        format!("({})", tree.text(node))
    } else {
        tree.text(node).to_string()
    }
}

fn same_tokens(tree: &SyntaxTree, a: NodeId, b: NodeId) -> bool {
    tree.token_ids(a)
        .map(|t| tree.token(t).text.as_str())
        .eq(tree.token_ids(b).map(|t| tree.token(t).text.as_str()))
}

/// Comments between the first and last token of `node`, with their spans.
fn interior_comments(tree: &SyntaxTree, node: NodeId) -> Vec<(Span, &str)> {
    let tokens: Vec<_> = tree.token_ids(node).collect();
    let mut comments = Vec::new();
    for (i, &id) in tokens.iter().enumerate() {
        let token = tree.token(id);
        let mut pieces = Vec::new();
        if i > 0 {
            pieces.push((token.full_start(), &token.leading));
        }
        if i + 1 < tokens.len() {
            pieces.push((token.end(), &token.trailing));
        }
        for (mut offset, trivia) in pieces {
            for piece in trivia {
                let end = offset + piece.text.len();
                if piece.is_comment() {
                    comments.push((Span::new(offset, end), piece.text.as_str()));
                }
                offset = end;
            }
        }
    }
    comments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::RuleId;
    use crate::strategies::tests::{apply, nth, plan};
    use sharpfix_cst::parse_source;

    fn merge(kind: SyntaxKind, source: &str) -> Option<String> {
        let tree = parse_source(source).unwrap();
        let node = nth(&tree, kind, 0);
        let rewrites =
            MergeDuplicateCall.rewrite_declaration(&tree, node, &plan(RuleId::DuplicateCall, Vec::new()))?;
        Some(apply(source, &rewrites))
    }

    fn merge_if(body: &str) -> Option<String> {
        let source = format!("class C {{ void M(bool a) {{ {} }} }}", body);
        let merged = merge(SyntaxKind::IfStatement, &source)?;
        Some(merged["class C { void M(bool a) { ".len()..merged.len() - " } }".len()].to_string())
    }

    #[test]
    fn if_else_becomes_one_call() {
        assert_eq!(
            merge_if("if (a) { F(1); } else { F(2); }").unwrap(),
            "F(a ? 1 : 2);"
        );
        assert_eq!(
            merge_if("if (a) return G(x, 1); else return G(x, 2);").unwrap(),
            "return G(x, a ? 1 : 2);"
        );
    }

    #[test]
    fn comments_outside_the_kept_statement_move_above_it() {
        let source = "class C
{
    void M(bool a)
    {
        if (a)
        {
            // first
            F(1);
        }
        else
        {
            F(2); // second
        }
    }
}";
        let expected = "class C
{
    void M(bool a)
    {
        // first
        // second
        F(a ? 1 : 2);
    }
}";
        assert_eq!(merge(SyntaxKind::IfStatement, source).unwrap(), expected);
    }

    #[test]
    fn loose_parts_are_parenthesized() {
        assert_eq!(
            merge_if("if (a = b) { F(x => x); } else { F(x => 0); }").unwrap(),
            "F((a = b) ? (x => x) : (x => 0));"
        );
        assert_eq!(
            merge_if("if (b ? c : d) { F(1); } else { F(2); }").unwrap(),
            "F((b ? c : d) ? 1 : 2);"
        );
    }

    #[test]
    fn conditional_expression_becomes_one_call() {
        let source = "class C { void M(bool a) { var x = a ? G(1, y) : G(2, y); } }";
        assert_eq!(
            merge(SyntaxKind::ConditionalExpression, source).unwrap(),
            "class C { void M(bool a) { var x = G(a ? 1 : 2, y); } }"
        );
    }

    #[test]
    fn conditional_with_stray_comments_is_skipped() {
        let source = "class C { void M(bool a) { var x = a /*c*/ ? G(1) : G(2); } }";
        assert!(merge(SyntaxKind::ConditionalExpression, source).is_none());
        let source = "class C { void M(bool a) { var x = a ? G(/*c*/ 1) : G(2); } }";
        assert_eq!(
            merge(SyntaxKind::ConditionalExpression, source).unwrap(),
            "class C { void M(bool a) { var x = G(/*c*/ a ? 1 : 2); } }"
        );
    }

    #[test]
    fn shapes_that_no_longer_match_are_skipped() {
        assert!(merge_if("if (a) { F(1); } else { H(2); }").is_none());
        assert!(merge_if("if (a) { F(1, 1); } else { F(2, 2); }").is_none());
        assert!(merge_if("if (a) { F(ref x); } else { F(ref y); }").is_none());
    }
}
