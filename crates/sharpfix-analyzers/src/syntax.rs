//! Typed views over the untyped syntax tree.
//!
//! The tree stores children as a flat list of nodes and tokens. The views
//! here pick the pieces of the shapes the analyzers care about (methods,
//! parameters, argument lists, if statements) out of that list once, so the
//! detectors and strategies can talk about "the return type" or "the
//! separator after argument 2" instead of child positions.

use sharpfix_cst::{Element, NodeId, SyntaxKind, SyntaxTree, TokenId};

/// A method declaration split into its parts.
#[derive(Debug, Clone)]
pub struct MethodView {
    pub node: NodeId,
    pub attributes: Vec<NodeId>,
    pub modifiers: Vec<TokenId>,
    pub return_type: NodeId,
    pub explicit_interface: Option<NodeId>,
    pub name: TokenId,
    pub type_parameters: Option<NodeId>,
    pub parameter_list: NodeId,
    /// `{ ... }` body.
    pub body: Option<NodeId>,
    /// `=> expr` body.
    pub arrow: Option<NodeId>,
}

impl MethodView {
    pub fn new(tree: &SyntaxTree, node: NodeId) -> Option<MethodView> {
        if tree.kind(node) != SyntaxKind::MethodDeclaration {
            return None;
        }
        let mut attributes = Vec::new();
        let mut modifiers = Vec::new();
        let mut return_type = None;
        let mut explicit_interface = None;
        let mut name = None;
        let mut type_parameters = None;
        let mut parameter_list = None;
        let mut body = None;
        let mut arrow = None;

        for &child in tree.children(node) {
            match child {
                Element::Node(n) => match tree.kind(n) {
                    SyntaxKind::AttributeList => attributes.push(n),
                    SyntaxKind::ExplicitInterfaceSpecifier => explicit_interface = Some(n),
                    SyntaxKind::TypeParameterList => type_parameters = Some(n),
                    SyntaxKind::ParameterList => parameter_list = Some(n),
                    SyntaxKind::Block => body = Some(n),
                    SyntaxKind::ArrowExpressionClause => arrow = Some(n),
                    kind if kind.is_type() && return_type.is_none() => return_type = Some(n),
                    _ => {}
                },
                Element::Token(t) => {
                    if return_type.is_none() {
                        modifiers.push(t);
                    } else if parameter_list.is_none() && type_parameters.is_none() {
                        name = Some(t);
                    }
                }
            }
        }

        Some(MethodView {
            node,
            attributes,
            modifiers,
            return_type: return_type?,
            explicit_interface,
            name: name?,
            type_parameters,
            parameter_list: parameter_list?,
            body,
            arrow,
        })
    }

    pub fn has_modifier(&self, tree: &SyntaxTree, text: &str) -> bool {
        self.modifiers.iter().any(|&t| tree.token(t).text == text)
    }

    pub fn name_text<'t>(&self, tree: &'t SyntaxTree) -> &'t str {
        tree.token(self.name).value_text()
    }

    pub fn parameters(&self, tree: &SyntaxTree) -> SeparatedList {
        SeparatedList::new(tree, self.parameter_list)
    }
}

/// A parameter split into its parts.
#[derive(Debug, Clone)]
pub struct ParameterView {
    pub node: NodeId,
    pub attributes: Vec<NodeId>,
    pub modifiers: Vec<TokenId>,
    /// Absent for untyped lambda parameters.
    pub ty: Option<NodeId>,
    pub name: TokenId,
    pub default: Option<NodeId>,
}

impl ParameterView {
    pub fn new(tree: &SyntaxTree, node: NodeId) -> Option<ParameterView> {
        if tree.kind(node) != SyntaxKind::Parameter {
            return None;
        }
        let mut attributes = Vec::new();
        let mut modifiers = Vec::new();
        let mut ty = None;
        let mut name = None;
        let mut default = None;
        for &child in tree.children(node) {
            match child {
                Element::Node(n) => match tree.kind(n) {
                    SyntaxKind::AttributeList => attributes.push(n),
                    SyntaxKind::EqualsValueClause => default = Some(n),
                    _ => ty = Some(n),
                },
                Element::Token(t) => {
                    let token = tree.token(t);
                    if token.is_identifier() && (ty.is_some() || name.is_none()) {
                        name = Some(t);
                    }
                    if ty.is_none() && !token.is_identifier() {
                        modifiers.push(t);
                    }
                }
            }
        }
        // `scoped` lexes as an identifier; it is a modifier when a type follows.
        let name = name?;
        if ty.is_some() {
            for &child in tree.children(node) {
                if let Element::Token(t) = child {
                    if t != name && tree.token(t).is_contextual("scoped") {
                        modifiers.push(t);
                    }
                }
            }
        }
        Some(ParameterView {
            node,
            attributes,
            modifiers,
            ty,
            name,
            default,
        })
    }

    pub fn name_text<'t>(&self, tree: &'t SyntaxTree) -> &'t str {
        tree.token(self.name).value_text()
    }

    /// The only modifier, if there is exactly one.
    pub fn single_modifier<'t>(&self, tree: &'t SyntaxTree) -> Option<&'t str> {
        match self.modifiers.as_slice() {
            [only] => Some(tree.token(*only).text.as_str()),
            _ => None,
        }
    }
}

/// An argument split into its parts.
#[derive(Debug, Clone)]
pub struct ArgumentView {
    pub node: NodeId,
    pub name_colon: Option<NodeId>,
    /// `ref`, `out` or `in`.
    pub ref_kind: Option<TokenId>,
    pub expression: NodeId,
}

impl ArgumentView {
    pub fn new(tree: &SyntaxTree, node: NodeId) -> Option<ArgumentView> {
        if tree.kind(node) != SyntaxKind::Argument {
            return None;
        }
        let name_colon = tree.child_of_kind(node, SyntaxKind::NameColon);
        let ref_kind = tree.child_tokens(node).next();
        let expression = tree
            .child_nodes(node)
            .find(|&n| tree.kind(n) != SyntaxKind::NameColon)?;
        Some(ArgumentView {
            node,
            name_colon,
            ref_kind,
            expression,
        })
    }

    pub fn ref_kind_text<'t>(&self, tree: &'t SyntaxTree) -> Option<&'t str> {
        self.ref_kind.map(|t| tree.token(t).text.as_str())
    }

    /// The label of a named argument.
    pub fn name<'t>(&self, tree: &'t SyntaxTree) -> Option<&'t str> {
        let colon = self.name_colon?;
        let ident = tree.child_of_kind(colon, SyntaxKind::IdentifierName)?;
        Some(tree.token(tree.first_token(ident)).value_text())
    }
}

/// The items, separators and delimiters of a parameter or argument list.
#[derive(Debug, Clone)]
pub struct SeparatedList {
    pub node: NodeId,
    pub open: TokenId,
    pub close: TokenId,
    pub items: Vec<NodeId>,
    /// `separators[i]` follows `items[i]`.
    pub separators: Vec<TokenId>,
}

impl SeparatedList {
    pub fn new(tree: &SyntaxTree, node: NodeId) -> SeparatedList {
        let mut items = Vec::new();
        let mut separators = Vec::new();
        for &child in tree.children(node) {
            match child {
                Element::Node(n) => items.push(n),
                Element::Token(t) if tree.token(t).is_punct(",") => separators.push(t),
                Element::Token(_) => {}
            }
        }
        SeparatedList {
            node,
            open: tree.first_token(node),
            close: tree.last_token(node),
            items,
            separators,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An invocation: callee and argument list.
#[derive(Debug, Clone)]
pub struct InvocationView {
    pub node: NodeId,
    pub callee: NodeId,
    pub arguments: SeparatedList,
}

impl InvocationView {
    pub fn new(tree: &SyntaxTree, node: NodeId) -> Option<InvocationView> {
        if tree.kind(node) != SyntaxKind::InvocationExpression {
            return None;
        }
        let callee = tree.child_nodes(node).next()?;
        let list = tree.child_of_kind(node, SyntaxKind::ArgumentList)?;
        Some(InvocationView {
            node,
            callee,
            arguments: SeparatedList::new(tree, list),
        })
    }

    pub fn argument(&self, tree: &SyntaxTree, index: usize) -> Option<ArgumentView> {
        ArgumentView::new(tree, *self.arguments.items.get(index)?)
    }

    pub fn argument_views(&self, tree: &SyntaxTree) -> Vec<ArgumentView> {
        self.arguments
            .items
            .iter()
            .filter_map(|&a| ArgumentView::new(tree, a))
            .collect()
    }

    /// The token naming the called method: `M` in `M(..)`, `x.M(..)` and
    /// `x?.M(..)`.
    pub fn name_token(&self, tree: &SyntaxTree) -> Option<TokenId> {
        let name_node = match tree.kind(self.callee) {
            SyntaxKind::IdentifierName | SyntaxKind::GenericName => self.callee,
            SyntaxKind::MemberAccessExpression | SyntaxKind::MemberBindingExpression => {
                tree.child_nodes(self.callee).last()?
            }
            _ => return None,
        };
        match tree.kind(name_node) {
            SyntaxKind::IdentifierName | SyntaxKind::GenericName => {
                Some(tree.first_token(name_node))
            }
            _ => None,
        }
    }
}

/// An if statement: condition, then-statement and optional else-statement.
#[derive(Debug, Clone)]
pub struct IfView {
    pub node: NodeId,
    pub if_keyword: TokenId,
    pub open_paren: TokenId,
    pub condition: NodeId,
    pub statement: NodeId,
    pub else_statement: Option<NodeId>,
}

impl IfView {
    pub fn new(tree: &SyntaxTree, node: NodeId) -> Option<IfView> {
        if tree.kind(node) != SyntaxKind::IfStatement {
            return None;
        }
        let mut nodes = tree.child_nodes(node);
        let condition = nodes.next()?;
        let statement = nodes.next()?;
        let else_statement = nodes
            .next()
            .filter(|&n| tree.kind(n) == SyntaxKind::ElseClause)
            .and_then(|clause| tree.child_nodes(clause).next());
        let if_keyword = tree.first_token(node);
        let open_paren = tree.next_token(if_keyword)?;
        Some(IfView {
            node,
            if_keyword,
            open_paren,
            condition,
            statement,
            else_statement,
        })
    }
}

/// The variable a statement declares by a bare identifier: `x` in
/// `foreach (var x in xs)` and `catch (E x)`.
pub fn declared_identifier(tree: &SyntaxTree, node: NodeId) -> Option<TokenId> {
    tree.child_tokens(node)
        .find(|&t| tree.token(t).is_identifier())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpfix_cst::parse_source;

    fn first(tree: &SyntaxTree, kind: SyntaxKind) -> NodeId {
        tree.descendants(tree.root())
            .find(|&n| tree.kind(n) == kind)
            .unwrap()
    }

    mod methods {
        use super::*;

        #[test]
        fn splits_method_declaration() {
            let tree = parse_source(
                "class C { [A] public static int IFoo.M<T>(ref int a, int b = 1) { return a; } }",
            )
            .unwrap();
            let view = MethodView::new(&tree, first(&tree, SyntaxKind::MethodDeclaration)).unwrap();
            assert_eq!(view.attributes.len(), 1);
            assert!(view.has_modifier(&tree, "public"));
            assert!(view.has_modifier(&tree, "static"));
            assert_eq!(tree.text(view.return_type), "int");
            assert!(view.explicit_interface.is_some());
            assert_eq!(view.name_text(&tree), "M");
            assert!(view.type_parameters.is_some());
            assert!(view.body.is_some());
            assert_eq!(view.parameters(&tree).len(), 2);
        }

        #[test]
        fn expression_bodied_and_abstract_methods() {
            let tree = parse_source("abstract class C { int F() => 1; abstract void G(); }").unwrap();
            let methods: Vec<_> = tree
                .descendants(tree.root())
                .filter(|&n| tree.kind(n) == SyntaxKind::MethodDeclaration)
                .map(|n| MethodView::new(&tree, n).unwrap())
                .collect();
            assert!(methods[0].arrow.is_some() && methods[0].body.is_none());
            assert!(methods[1].arrow.is_none() && methods[1].body.is_none());
            assert_eq!(methods[1].name_text(&tree), "G");
        }
    }

    mod parameters {
        use super::*;

        #[test]
        fn splits_parameter() {
            let tree = parse_source("class C { void M([In] ref params int[] a = null) { } }").unwrap();
            let view = ParameterView::new(&tree, first(&tree, SyntaxKind::Parameter)).unwrap();
            assert_eq!(view.attributes.len(), 1);
            assert_eq!(view.modifiers.len(), 2);
            assert_eq!(tree.text(view.ty.unwrap()), "int[]");
            assert_eq!(view.name_text(&tree), "a");
            assert!(view.default.is_some());
            assert_eq!(view.single_modifier(&tree), None);
        }

        #[test]
        fn single_modifier() {
            let tree = parse_source("class C { void M(out int a) { } }").unwrap();
            let view = ParameterView::new(&tree, first(&tree, SyntaxKind::Parameter)).unwrap();
            assert_eq!(view.single_modifier(&tree), Some("out"));
        }

        #[test]
        fn untyped_lambda_parameter() {
            let tree = parse_source("class C { void M() { F(x => x); } }").unwrap();
            let view = ParameterView::new(&tree, first(&tree, SyntaxKind::Parameter)).unwrap();
            assert!(view.ty.is_none());
            assert_eq!(view.name_text(&tree), "x");
        }
    }

    mod invocations {
        use super::*;

        #[test]
        fn splits_invocation_and_arguments() {
            let tree = parse_source("class C { void M() { x.F(1, name: ref y, out var z); } }").unwrap();
            let view =
                InvocationView::new(&tree, first(&tree, SyntaxKind::InvocationExpression)).unwrap();
            assert_eq!(tree.token(view.name_token(&tree).unwrap()).text, "F");
            assert_eq!(view.arguments.len(), 3);
            assert_eq!(view.arguments.separators.len(), 2);

            let args = view.argument_views(&tree);
            assert_eq!(args[0].ref_kind, None);
            assert_eq!(args[1].name(&tree), Some("name"));
            assert_eq!(args[1].ref_kind_text(&tree), Some("ref"));
            assert_eq!(tree.text(args[1].expression), "y");
            assert_eq!(
                tree.kind(args[2].expression),
                SyntaxKind::DeclarationExpression
            );
        }
    }

    mod statements {
        use super::*;

        #[test]
        fn splits_if_statement() {
            let tree = parse_source("class C { void M() { if (a) F(1); else { F(2); } } }").unwrap();
            let view = IfView::new(&tree, first(&tree, SyntaxKind::IfStatement)).unwrap();
            assert_eq!(tree.text(view.condition), "a");
            assert_eq!(tree.text(view.statement), "F(1);");
            assert_eq!(tree.text(view.else_statement.unwrap()), "{ F(2); }");
            assert_eq!(tree.token(view.open_paren).text, "(");
        }

        #[test]
        fn declared_identifier_of_foreach() {
            let tree = parse_source("class C { void M() { foreach (var x in xs) { } } }").unwrap();
            let node = first(&tree, SyntaxKind::ForEachStatement);
            let ident = declared_identifier(&tree, node).unwrap();
            assert_eq!(tree.token(ident).text, "x");
        }
    }
}
