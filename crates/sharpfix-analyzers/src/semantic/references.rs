//! Find-all-references for methods.

use sharpfix_core::patch::Span;
use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::semantic::binder::Binder;
use crate::semantic::interpolation::{is_interpolated, names_in_holes};
use crate::semantic::program::ProgramModel;
use crate::semantic::symbols::{MethodId, MethodSymbol, Symbol};
use crate::semantic::{ReferenceRole, SemanticModel, SymbolReference};
use crate::syntax::InvocationView;

/// Every reference to `method`, ordered by document and offset.
///
/// Documents are searched one at a time; cancellation is checked before
/// each one.
pub fn find_all_references(
    model: &ProgramModel,
    method: MethodId,
    cancel: &CancellationToken,
) -> AnalyzerResult<Vec<SymbolReference>> {
    let name = model.method_at(method).name.clone();
    let mut references = Vec::new();
    for document in model.solution().documents() {
        if cancel.is_cancelled() {
            return Err(AnalyzerError::Cancelled);
        }
        if !document.text().contains(name.as_str()) {
            continue;
        }
        let binder = Binder::new(model, document);
        let tree = document.tree();
        let mut found = Vec::new();
        for node in tree.descendants(tree.root()) {
            match tree.kind(node) {
                SyntaxKind::InvocationExpression => {
                    if let Some(reference) = invocation_reference(&binder, node, method, &name) {
                        found.push(reference);
                    }
                }
                SyntaxKind::IdentifierName | SyntaxKind::GenericName => {
                    if let Some(reference) = method_group_reference(&binder, node, method, &name) {
                        found.push(reference);
                    }
                }
                SyntaxKind::LiteralExpression => {
                    found.extend(interpolation_references(&binder, node, method, &name));
                }
                _ => {}
            }
        }
        found.sort_by_key(|r| r.span.start);
        references.extend(found);
    }
    debug!(method = %name, count = references.len(), "found references");
    Ok(references)
}

fn invocation_reference(
    binder: &Binder,
    invocation: NodeId,
    method: MethodId,
    name: &str,
) -> Option<SymbolReference> {
    let tree = binder.tree();
    let view = InvocationView::new(tree, invocation)?;
    let token = view.name_token(tree)?;
    if tree.token(token).value_text() != name {
        return None;
    }
    let role = match binder.resolve_invocation(invocation) {
        Some(found) if found == method => ReferenceRole::InvocationCallee,
        Some(_) => return None,
        None => {
            let symbol = binder.model().method_at(method);
            if !accepts_argument_count(symbol, view.arguments.items.len()) {
                return None;
            }
            debug!(
                file = binder.document().path(),
                span = %tree.token(token).span(),
                "call could not be bound"
            );
            ReferenceRole::Unresolved
        }
    };
    Some(SymbolReference {
        document: binder.document().id(),
        span: tree.token(token).span(),
        role,
        invocation: Some(invocation),
    })
}

/// True if a call with `count` arguments could bind to `method`.
fn accepts_argument_count(method: &MethodSymbol, count: usize) -> bool {
    let required = method
        .parameters
        .iter()
        .filter(|p| !p.has_default && !p.is_params)
        .count();
    let open_ended = method.parameters.iter().any(|p| p.is_params);
    count >= required && (open_ended || count <= method.parameters.len())
}

/// A method name used as a value: `Action a = M;`, `F(this.M)`.
fn method_group_reference(
    binder: &Binder,
    name_node: NodeId,
    method: MethodId,
    name: &str,
) -> Option<SymbolReference> {
    let tree = binder.tree();
    let token = tree.first_token(name_node);
    if tree.token(token).value_text() != name || is_callee_name(tree, name_node) {
        return None;
    }
    let parent = tree.parent(name_node)?;
    let expression = match tree.kind(parent) {
        SyntaxKind::NameColon => return None,
        SyntaxKind::MemberAccessExpression => {
            // Only the name on the right of the dot.
            if tree.child_nodes(parent).next() == Some(name_node) {
                return None;
            }
            parent
        }
        _ => name_node,
    };
    match binder.referenced_symbol(expression)? {
        Symbol::Method(found) if found == method => Some(SymbolReference {
            document: binder.document().id(),
            span: tree.token(token).span(),
            role: ReferenceRole::Other,
            invocation: None,
        }),
        _ => None,
    }
}

/// True if `name_node` names the method being called by an invocation.
fn is_callee_name(tree: &SyntaxTree, name_node: NodeId) -> bool {
    let Some(parent) = tree.parent(name_node) else {
        return false;
    };
    let callee = match tree.kind(parent) {
        SyntaxKind::MemberAccessExpression | SyntaxKind::MemberBindingExpression => parent,
        _ => name_node,
    };
    tree.parent(callee).is_some_and(|p| {
        tree.kind(p) == SyntaxKind::InvocationExpression && tree.child_nodes(p).next() == Some(callee)
    })
}

/// Calls written inside interpolation holes: `$"{M(x)}"`.
fn interpolation_references(
    binder: &Binder,
    literal: NodeId,
    method: MethodId,
    name: &str,
) -> Vec<SymbolReference> {
    let tree = binder.tree();
    let text = tree.text(literal);
    if !is_interpolated(text) || !text.contains(name) {
        return Vec::new();
    }
    let start = tree.span(literal).start;
    let candidates = binder.methods_in_scope(name, literal);
    if !candidates.contains(&method) {
        return Vec::new();
    }
    names_in_holes(text)
        .into_iter()
        .filter(|hole| hole.name == name && hole.called && !hole.after_dot)
        .map(|hole| SymbolReference {
            document: binder.document().id(),
            span: Span::new(start + hole.offset, start + hole.offset + hole.name.len()),
            role: ReferenceRole::Other,
            invocation: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Solution;

    fn references_to(
        sources: &[(&str, &str)],
        type_name: &str,
        method_index: usize,
    ) -> (Solution, Vec<SymbolReference>) {
        let solution = Solution::from_sources(sources.iter().copied()).unwrap();
        let model = ProgramModel::build(&solution);
        let ty = model.type_named(type_name).unwrap();
        let method = model.type_at(ty).methods[method_index];
        let refs = model
            .find_all_references(method, &CancellationToken::new())
            .unwrap();
        (solution, refs)
    }

    fn texts(solution: &Solution, refs: &[SymbolReference]) -> Vec<String> {
        refs.iter()
            .map(|r| {
                let document = solution.document(r.document).unwrap();
                let tree = document.tree();
                match r.invocation {
                    Some(invocation) => tree.text(invocation).to_string(),
                    None => tree.slice(r.span).to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn finds_calls_across_documents() {
        let sources = [
            ("A.cs", "class A { public static void M(ref int x) { } void N() { int y = 0; M(ref y); } }"),
            ("B.cs", "class B { void N() { int z = 0; A.M(ref z); } }"),
        ];
        let (solution, refs) = references_to(&sources, "A", 0);
        assert_eq!(texts(&solution, &refs), vec!["M(ref y)", "A.M(ref z)"]);
        assert!(refs.iter().all(|r| r.role == ReferenceRole::InvocationCallee));
        assert_eq!(solution.document(refs[1].document).unwrap().path(), "B.cs");
    }

    #[test]
    fn overloads_are_not_references() {
        let source = "class C {
            void M(ref int x) { }
            void M(int x) { }
            void N() { int y = 0; M(ref y); M(y); M(1); }
        }";
        let (solution, refs) = references_to(&[("A.cs", source)], "C", 0);
        assert_eq!(texts(&solution, &refs), vec!["M(ref y)"]);

        let (solution, refs) = references_to(&[("A.cs", source)], "C", 1);
        assert_eq!(texts(&solution, &refs), vec!["M(y)", "M(1)"]);
    }

    #[test]
    fn method_groups_and_interpolations_are_other_references() {
        let source = "class C {
            int M(int x) { return x; }
            void N(System.Func<int, int> f) { }
            string S() { N(M); N(this.M); return $\"{M(1)}\"; }
        }";
        let (solution, refs) = references_to(&[("A.cs", source)], "C", 0);
        let roles: Vec<ReferenceRole> = refs.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![ReferenceRole::Other, ReferenceRole::Other, ReferenceRole::Other]
        );
        assert_eq!(texts(&solution, &refs), vec!["M", "M", "M"]);
    }

    #[test]
    fn calls_on_untyped_receivers_are_unresolved() {
        let source = "class B { public void M(ref int a) { } }
            class C {
                void N(System.Collections.Generic.List<B> list, int x) {
                    foreach (var b in list) { b.M(ref x); }
                    list[0].M(ref x);
                    list[0].M(ref x, x, x);
                    new B().M(ref x);
                }
            }";
        let (solution, refs) = references_to(&[("A.cs", source)], "B", 0);
        let roles: Vec<ReferenceRole> = refs.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![
                ReferenceRole::Unresolved,
                ReferenceRole::Unresolved,
                ReferenceRole::InvocationCallee
            ]
        );
        assert_eq!(
            texts(&solution, &refs),
            vec!["b.M(ref x)", "list[0].M(ref x)", "new B().M(ref x)"]
        );
    }

    #[test]
    fn cancellation_stops_the_search() {
        let solution =
            Solution::from_sources([("A.cs", "class C { void M() { } void N() { M(); } }")])
                .unwrap();
        let model = ProgramModel::build(&solution);
        let ty = model.type_named("C").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = model.find_all_references(model.type_at(ty).methods[0], &cancel);
        assert!(matches!(result, Err(AnalyzerError::Cancelled)));
    }
}
