//! ACNU0010: return the single `out` parameter instead.
//!
//! `void M(out int a) { a = 1; }` becomes `int M() { int a; a = 1; return a; }`
//! and a call `M(out x);` becomes `x = M();`. The helpers here are shared
//! with the tuple rewrite, which does the same for several parameters.

use sharpfix_core::patch::Span;
use sharpfix_cst::trivia::{has_end_of_line, render, split_indentation};
use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};
use tracing::debug;

use crate::resolver::RewritePlan;
use crate::strategies::{line_ending, list, Rewrite, RewriteStrategy};
use crate::syntax::{InvocationView, MethodView, ParameterView};

pub struct OutParameterToReturn;

impl RewriteStrategy for OutParameterToReturn {
    fn rewrite_declaration(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        let method = MethodView::new(tree, node)?;
        let parameters = out_parameters(tree, &method, &plan.parameters)?;
        let [parameter] = parameters.as_slice() else {
            return None;
        };
        let body = method.body?;
        if tree.text(method.return_type) != "void" {
            return None;
        }

        let mut rewrites = vec![Rewrite::replace(tree.span(method.return_type), parameter.ty.clone())];
        rewrites.extend(list::remove_items(tree, &method.parameters(tree), &plan.parameters)?);
        rewrites.extend(body_rewrites(
            tree,
            body,
            &[parameter.declaration()],
            &parameter.name,
        ));
        Some(rewrites)
    }

    fn rewrite_call_site(
        &self,
        tree: &SyntaxTree,
        invocation: NodeId,
        arguments: &[usize],
        _plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        let targets = out_argument_targets(tree, invocation, arguments)?;
        call_site_rewrites(tree, invocation, arguments, &targets.join(", "))
    }
}

/// An `out` parameter as the rewritten method declares it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct OutParameter {
    pub ty: String,
    pub name: String,
}

impl OutParameter {
    pub(super) fn declaration(&self) -> String {
        format!("{} {};", self.ty, self.name)
    }
}

/// The parameters at `indexes`, each of which must be a typed `out`
/// parameter.
pub(super) fn out_parameters(
    tree: &SyntaxTree,
    method: &MethodView,
    indexes: &[usize],
) -> Option<Vec<OutParameter>> {
    let list = method.parameters(tree);
    indexes
        .iter()
        .map(|&i| {
            let parameter = ParameterView::new(tree, *list.items.get(i)?)?;
            if parameter.single_modifier(tree) != Some("out") {
                return None;
            }
            Some(OutParameter {
                ty: tree.text(parameter.ty?).to_string(),
                name: tree.token(parameter.name).text.clone(),
            })
        })
        .collect()
}

/// Insertions that declare the locals at the top of `body`, return
/// `returned` at the end, and give every bare `return;` the value too.
pub(super) fn body_rewrites(
    tree: &SyntaxTree,
    body: NodeId,
    declarations: &[String],
    returned: &str,
) -> Vec<Rewrite> {
    let open = tree.token(tree.first_token(body));
    let close = tree.token(tree.last_token(body));
    let statements: Vec<NodeId> = tree.child_nodes(body).collect();
    let return_statement = format!("return {};", returned);
    let ends_with_return = statements.last().is_some_and(|&s| is_bare_return(tree, s));

    let mut rewrites = bare_returns(tree, body, returned);
    let (Some(&first), Some(&last)) = (statements.first(), statements.last()) else {
        let text = if has_end_of_line(&open.trailing) {
            let indent = format!("{}    ", render(&split_indentation(&close.leading).1));
            let newline = line_ending(tree.source());
            declarations
                .iter()
                .chain(std::iter::once(&return_statement))
                .map(|line| format!("{indent}{line}{newline}"))
                .collect()
        } else {
            format!(" {} {} ", declarations.join(" "), return_statement)
        };
        let span = if has_end_of_line(&open.trailing) {
            Span::empty(close.full_start())
        } else {
            Span::new(open.end(), close.offset)
        };
        rewrites.push(Rewrite::replace(span, text));
        return rewrites;
    };

    let first_token = tree.token(tree.first_token(first));
    let last_token = tree.token(tree.last_token(last));
    if has_end_of_line(&open.trailing) {
        let indent = render(&split_indentation(&first_token.leading).1);
        let newline = line_ending(tree.source());
        let lines: String = declarations
            .iter()
            .map(|line| format!("{indent}{line}{newline}"))
            .collect();
        rewrites.push(Rewrite::insert(first_token.full_start(), lines));
        if !ends_with_return {
            if has_end_of_line(&last_token.trailing) {
                rewrites.push(Rewrite::insert(
                    last_token.full_end(),
                    format!("{indent}{return_statement}{newline}"),
                ));
            } else {
                rewrites.push(Rewrite::insert(last_token.end(), format!(" {}", return_statement)));
            }
        }
    } else {
        rewrites.push(Rewrite::insert(
            first_token.offset,
            format!("{} ", declarations.join(" ")),
        ));
        if !ends_with_return {
            rewrites.push(Rewrite::insert(last_token.end(), format!(" {}", return_statement)));
        }
    }
    rewrites
}

fn is_bare_return(tree: &SyntaxTree, statement: NodeId) -> bool {
    tree.kind(statement) == SyntaxKind::ReturnStatement && tree.child_nodes(statement).next().is_none()
}

/// `return;` statements of the method itself, not of nested lambdas or
/// local functions, made to return `returned`.
fn bare_returns(tree: &SyntaxTree, body: NodeId, returned: &str) -> Vec<Rewrite> {
    tree.descendants(body)
        .filter(|&n| is_bare_return(tree, n))
        .filter(|&n| {
            !tree.ancestors(n).take_while(|&a| a != body).any(|a| {
                tree.kind(a) == SyntaxKind::LocalFunctionStatement || tree.kind(a).is_lambda()
            })
        })
        .map(|n| Rewrite::insert(tree.token(tree.first_token(n)).end(), format!(" {}", returned)))
        .collect()
}

/// Text of the expressions passed to the `out` arguments at `arguments`.
///
/// `None` for a conditional call (`x?.M(out a)`), whose result cannot be
/// assigned unconditionally, and for an inline declaration that would not
/// be a statement of its own after the rewrite.
pub(super) fn out_argument_targets(
    tree: &SyntaxTree,
    invocation: NodeId,
    arguments: &[usize],
) -> Option<Vec<String>> {
    let view = InvocationView::new(tree, invocation)?;
    if tree.kind(view.callee) == SyntaxKind::MemberBindingExpression {
        debug!(call = tree.text(invocation), "conditional call cannot take the result, skipping");
        return None;
    }
    let is_statement = tree
        .parent(invocation)
        .is_some_and(|p| tree.kind(p) == SyntaxKind::ExpressionStatement);
    arguments
        .iter()
        .map(|&i| {
            let argument = view.argument(tree, i)?;
            if argument.ref_kind_text(tree) != Some("out") {
                return None;
            }
            if tree.kind(argument.expression) == SyntaxKind::DeclarationExpression && !is_statement {
                return None;
            }
            Some(tree.text(argument.expression).to_string())
        })
        .collect()
}

/// Drop the arguments and assign the call's result to `target`.
pub(super) fn call_site_rewrites(
    tree: &SyntaxTree,
    invocation: NodeId,
    arguments: &[usize],
    target: &str,
) -> Option<Vec<Rewrite>> {
    let view = InvocationView::new(tree, invocation)?;
    let mut rewrites = list::remove_items(tree, &view.arguments, arguments)?;
    rewrites.push(Rewrite::insert(
        tree.span(invocation).start,
        format!("{} = ", target),
    ));
    Some(rewrites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::RuleId;
    use crate::strategies::tests::{apply, nth, plan};
    use sharpfix_cst::parse_source;

    fn declaration(source: &str, index: usize) -> Option<String> {
        let tree = parse_source(source).unwrap();
        let method = nth(&tree, SyntaxKind::MethodDeclaration, 0);
        let plan = plan(RuleId::OutParameterToReturn, vec![index]);
        let rewrites = OutParameterToReturn.rewrite_declaration(&tree, method, &plan)?;
        Some(apply(source, &rewrites))
    }

    fn call(source: &str, argument: usize) -> Option<String> {
        let tree = parse_source(source).unwrap();
        let invocation = nth(&tree, SyntaxKind::InvocationExpression, 0);
        let plan = plan(RuleId::OutParameterToReturn, vec![0]);
        let rewrites = OutParameterToReturn.rewrite_call_site(&tree, invocation, &[argument], &plan)?;
        Some(apply(source, &rewrites))
    }

    #[test]
    fn one_line_body() {
        assert_eq!(
            declaration("class C { void M(out int a) { a = 1; } }", 0).unwrap(),
            "class C { int M() { int a; a = 1; return a; } }"
        );
        assert_eq!(
            declaration("class C { void M(string s, out int a) { a = 1; } }", 1).unwrap(),
            "class C { int M(string s) { int a; a = 1; return a; } }"
        );
    }

    #[test]
    fn empty_body() {
        assert_eq!(
            declaration("class C { void M(out int a) {} }", 0).unwrap(),
            "class C { int M() { int a; return a; } }"
        );
        assert_eq!(
            declaration("class C {\n    void M(out int a)\n    {\n    }\n}", 0).unwrap(),
            "class C {\n    int M()\n    {\n        int a;\n        return a;\n    }\n}"
        );
    }

    #[test]
    fn multi_line_body_keeps_statement_indentation() {
        let source = "class C
{
    void M(out int a)
    {
        // first
        a = 1;
    }
}";
        let expected = "class C
{
    int M()
    {
        int a;
        // first
        a = 1;
        return a;
    }
}";
        assert_eq!(declaration(source, 0).unwrap(), expected);
    }

    #[test]
    fn bare_returns_return_the_value() {
        assert_eq!(
            declaration(
                "class C { void M(bool b, out int a) { a = 1; if (b) return; a = 2; } }",
                1
            )
            .unwrap(),
            "class C { int M(bool b) { int a; a = 1; if (b) return a; a = 2; return a; } }"
        );
        assert_eq!(
            declaration("class C { void M(out int a) { a = 1; return; } }", 0).unwrap(),
            "class C { int M() { int a; a = 1; return a; } }"
        );
    }

    #[test]
    fn return_type_keeps_its_leading_trivia() {
        assert_eq!(
            declaration("class C { public /*r*/ void M(out string a) { a = \"\"; } }", 0).unwrap(),
            "class C { public /*r*/ string M() { string a; a = \"\"; return a; } }"
        );
    }

    #[test]
    fn declaration_must_still_be_void_with_out() {
        assert!(declaration("class C { int M(out int a) { a = 1; return 0; } }", 0).is_none());
        assert!(declaration("class C { void M(ref int a) { a = 1; } }", 0).is_none());
    }

    #[test]
    fn call_becomes_assignment() {
        assert_eq!(
            call("class C { void N() { M(out x); } }", 0).unwrap(),
            "class C { void N() { x = M(); } }"
        );
        assert_eq!(
            call("class C { void N() { this.M(1, out var x); } }", 1).unwrap(),
            "class C { void N() { var x = this.M(1); } }"
        );
        assert_eq!(
            call("class C { void N() { M(out int x, 2); } }", 0).unwrap(),
            "class C { void N() { int x = M(2); } }"
        );
    }

    #[test]
    fn unsupported_calls_are_skipped() {
        assert!(call("class C { void N() { c?.M(out x); } }", 0).is_none());
        assert!(call("class C { void N() { M(x); } }", 0).is_none());
        assert!(call("class C { void N() { System.Action f = () => M(out var x); } }", 0).is_none());
    }
}
