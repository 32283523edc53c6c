//! ACNU0011: return several `out` parameters as a named tuple.

use sharpfix_cst::{NodeId, SyntaxTree};

use crate::resolver::RewritePlan;
use crate::strategies::out_to_return::{body_rewrites, call_site_rewrites, out_argument_targets, out_parameters};
use crate::strategies::{list, Rewrite, RewriteStrategy};
use crate::syntax::MethodView;

pub struct OutParametersToTuple;

impl RewriteStrategy for OutParametersToTuple {
    fn rewrite_declaration(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        let method = MethodView::new(tree, node)?;
        let parameters = out_parameters(tree, &method, &plan.parameters)?;
        let body = method.body?;
        if parameters.len() < 2 || tree.text(method.return_type) != "void" {
            return None;
        }

        let elements: Vec<String> = parameters
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect();
        let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        let declarations: Vec<String> = parameters.iter().map(|p| p.declaration()).collect();

        let mut rewrites = vec![Rewrite::replace(
            tree.span(method.return_type),
            format!("({})", elements.join(", ")),
        )];
        rewrites.extend(list::remove_items(tree, &method.parameters(tree), &plan.parameters)?);
        rewrites.extend(body_rewrites(
            tree,
            body,
            &declarations,
            &format!("({})", names.join(", ")),
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
        call_site_rewrites(
            tree,
            invocation,
            arguments,
            &format!("({})", targets.join(", ")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::RuleId;
    use crate::strategies::tests::{apply, nth, plan};
    use sharpfix_cst::{parse_source, SyntaxKind};

    fn declaration(source: &str, indexes: Vec<usize>) -> Option<String> {
        let tree = parse_source(source).unwrap();
        let method = nth(&tree, SyntaxKind::MethodDeclaration, 0);
        let plan = plan(RuleId::OutParametersToTuple, indexes);
        let rewrites = OutParametersToTuple.rewrite_declaration(&tree, method, &plan)?;
        Some(apply(source, &rewrites))
    }

    fn call(source: &str, arguments: &[usize]) -> Option<String> {
        let tree = parse_source(source).unwrap();
        let invocation = nth(&tree, SyntaxKind::InvocationExpression, 0);
        let plan = plan(RuleId::OutParametersToTuple, vec![0, 1]);
        let rewrites = OutParametersToTuple.rewrite_call_site(&tree, invocation, arguments, &plan)?;
        Some(apply(source, &rewrites))
    }

    #[test]
    fn declaration_returns_a_named_tuple() {
        assert_eq!(
            declaration(
                "class C { void M(out string s, out int a) { a = 1; s = \"\"; } }",
                vec![0, 1]
            )
            .unwrap(),
            "class C { (string s, int a) M() { string s; int a; a = 1; s = \"\"; return (s, a); } }"
        );
    }

    #[test]
    fn other_parameters_stay() {
        assert_eq!(
            declaration(
                "class C { void M(out int a, bool b, out int c) { a = 1; c = 2; } }",
                vec![0, 2]
            )
            .unwrap(),
            "class C { (int a, int c) M(bool b) { int a; int c; a = 1; c = 2; return (a, c); } }"
        );
    }

    #[test]
    fn multi_line_body_gets_one_declaration_per_line() {
        let source = "class C\n{\n    void M(out int a, out int b)\n    {\n        a = b = 0;\n    }\n}";
        let expected = "class C\n{\n    (int a, int b) M()\n    {\n        int a;\n        int b;\n        a = b = 0;\n        return (a, b);\n    }\n}";
        assert_eq!(declaration(source, vec![0, 1]).unwrap(), expected);
    }

    #[test]
    fn call_becomes_deconstruction() {
        assert_eq!(
            call("class C { void N() { M(out x, out y); } }", &[0, 1]).unwrap(),
            "class C { void N() { (x, y) = M(); } }"
        );
        assert_eq!(
            call("class C { void N() { M(out var x, 1, out var y); } }", &[0, 2]).unwrap(),
            "class C { void N() { (var x, var y) = M(1); } }"
        );
    }

    #[test]
    fn a_single_parameter_is_not_a_tuple() {
        assert!(declaration("class C { void M(out int a) { a = 1; } }", vec![0]).is_none());
    }
}
