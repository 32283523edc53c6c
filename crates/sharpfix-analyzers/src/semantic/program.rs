//! The program-wide symbol index and the [`SemanticModel`] implementation.
//!
//! Building happens in two passes over the solution. The first registers
//! every type declaration under its namespace-qualified name (partial
//! declarations merge into one type). The second resolves base lists and
//! indexes members, which needs the full set of type names.

use std::collections::{BTreeSet, HashMap};

use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::AnalyzerResult;
use crate::semantic::binder::Binder;
use crate::semantic::dataflow;
use crate::semantic::library::library_types;
use crate::semantic::references;
use crate::semantic::symbols::{
    Accessibility, Declaration, MemberSymbol, MethodId, MethodModifiers, MethodSymbol,
    ParameterSymbol, PassMode, Symbol, TypeId, TypeKind, TypeSymbol, VariableId,
};
use crate::semantic::types::{Primitive, Type};
use crate::semantic::{DataFlowAnalysis, SemanticModel, SymbolReference};
use crate::syntax::{MethodView, ParameterView};
use crate::workspace::{Document, DocumentId, Solution};

/// Symbol index for one solution snapshot.
#[derive(Debug, Default)]
pub struct ProgramModel {
    solution: Solution,
    types: Vec<TypeSymbol>,
    methods: Vec<MethodSymbol>,
    types_by_name: HashMap<String, TypeId>,
    type_declarations: HashMap<(DocumentId, NodeId), TypeId>,
    method_declarations: HashMap<(DocumentId, NodeId), MethodId>,
    /// Namespaces imported with plain `using` directives, per document.
    usings: HashMap<DocumentId, Vec<String>>,
}

impl ProgramModel {
    pub fn build(solution: &Solution) -> ProgramModel {
        let mut model = ProgramModel {
            solution: solution.clone(),
            ..ProgramModel::default()
        };
        model.register_library_types();
        for document in solution.documents() {
            model.register_usings(document);
            model.register_types(document);
        }
        for document in solution.documents() {
            model.index_members(document);
        }
        debug!(
            documents = solution.len(),
            types = model.types.len(),
            methods = model.methods.len(),
            "program model built"
        );
        model
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn type_named(&self, qualified_name: &str) -> Option<TypeId> {
        self.types_by_name.get(qualified_name).copied()
    }

    pub fn types(&self) -> &[TypeSymbol] {
        &self.types
    }

    pub fn methods(&self) -> &[MethodSymbol] {
        &self.methods
    }

    pub(crate) fn type_at(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id.0 as usize]
    }

    pub(crate) fn method_at(&self, id: MethodId) -> &MethodSymbol {
        &self.methods[id.0 as usize]
    }

    /// The type a type declaration node declares.
    pub(crate) fn declared_type(&self, document: DocumentId, node: NodeId) -> Option<TypeId> {
        self.type_declarations.get(&(document, node)).copied()
    }

    /// Transitive base types, nearest first, without `id` itself.
    pub fn all_bases(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = BTreeSet::from([id]);
        let mut result = Vec::new();
        let mut queue = std::collections::VecDeque::from(self.type_at(id).bases.clone());
        while let Some(base) = queue.pop_front() {
            if seen.insert(base) {
                result.push(base);
                queue.extend(self.type_at(base).bases.iter().copied());
            }
        }
        result
    }

    /// Methods called `name` on `id` and its bases. A base method is hidden
    /// by a more derived method with the same signature.
    pub fn methods_named(&self, id: TypeId, name: &str) -> Vec<MethodId> {
        let mut found: Vec<MethodId> = Vec::new();
        for ty in std::iter::once(id).chain(self.all_bases(id)) {
            for &method in &self.type_at(ty).methods {
                let symbol = self.method_at(method);
                if symbol.name != name {
                    continue;
                }
                let hidden = found
                    .iter()
                    .any(|&f| self.method_at(f).signature() == symbol.signature());
                if !hidden {
                    found.push(method);
                }
            }
        }
        found
    }

    /// A field or property called `name` on `id` or its bases.
    pub fn find_member(&self, id: TypeId, name: &str) -> Option<(TypeId, &MemberSymbol)> {
        std::iter::once(id)
            .chain(self.all_bases(id))
            .find_map(|ty| self.type_at(ty).member(name).map(|m| (ty, m)))
    }

    /// Look a type name up from `context`: nested types of the enclosing
    /// types, then the enclosing namespaces, then the `using` imports.
    pub fn lookup_type(&self, document: &Document, context: NodeId, name: &str) -> Option<TypeId> {
        let tree = document.tree();
        let name = name.strip_prefix("global::").unwrap_or(name);

        for ancestor in std::iter::once(context).chain(tree.ancestors(context)) {
            if let Some(enclosing) = self.declared_type(document.id(), ancestor) {
                let nested = format!("{}.{}", self.type_at(enclosing).qualified_name, name);
                if let Some(id) = self.type_named(&nested) {
                    return Some(id);
                }
            }
        }

        let namespace = namespace_of(tree, context);
        let mut prefix = namespace.as_str();
        loop {
            let candidate = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", prefix, name)
            };
            if let Some(id) = self.type_named(&candidate) {
                return Some(id);
            }
            if prefix.is_empty() {
                break;
            }
            prefix = prefix.rsplit_once('.').map(|(head, _)| head).unwrap_or("");
        }

        self.usings
            .get(&document.id())
            .into_iter()
            .flatten()
            .find_map(|namespace| self.type_named(&format!("{}.{}", namespace, name)))
    }

    /// The type written by a type syntax node.
    pub fn resolve_type(&self, document: &Document, node: NodeId) -> Type {
        let tree = document.tree();
        match tree.kind(node) {
            SyntaxKind::PredefinedType => {
                let text = tree.text(node);
                if text == "void" {
                    Type::Void
                } else {
                    Primitive::from_keyword(text)
                        .map(Type::Primitive)
                        .unwrap_or(Type::Unknown)
                }
            }
            SyntaxKind::NullableType => {
                let Some(inner) = tree.child_nodes(node).next() else {
                    return Type::Unknown;
                };
                match self.resolve_type(document, inner) {
                    Type::Primitive(p) if p.is_numeric() || p == Primitive::Bool => {
                        Type::Nullable(Box::new(Type::Primitive(p)))
                    }
                    other => other,
                }
            }
            SyntaxKind::ArrayType => {
                let Some(element) = tree.child_nodes(node).next() else {
                    return Type::Unknown;
                };
                let ranks = tree
                    .children_of_kind(node, SyntaxKind::ArrayRankSpecifier)
                    .count();
                let mut ty = self.resolve_type(document, element);
                for _ in 0..ranks {
                    ty = Type::Array(Box::new(ty));
                }
                ty
            }
            SyntaxKind::TupleType => Type::Tuple(
                tree.children_of_kind(node, SyntaxKind::TupleElement)
                    .map(|element| match tree.child_nodes(element).next() {
                        Some(ty) => self.resolve_type(document, ty),
                        None => Type::Unknown,
                    })
                    .collect(),
            ),
            SyntaxKind::IdentifierName | SyntaxKind::GenericName | SyntaxKind::QualifiedName => {
                let name = type_name_text(tree, node);
                if type_parameter_in_scope(tree, node, &name) {
                    return Type::Unknown;
                }
                if let Some(id) = self.lookup_type(document, node, &name) {
                    return Type::Named(self.type_at(id).qualified_name.clone());
                }
                if let Some(p) = Primitive::from_framework_name(&name) {
                    return Type::Primitive(p);
                }
                if tree.kind(node) == SyntaxKind::GenericName {
                    return Type::Named(compact(tree.text(node)));
                }
                Type::Named(name)
            }
            _ => Type::Unknown,
        }
    }

    pub(crate) fn document(&self, id: DocumentId) -> Option<&Document> {
        self.solution.document(id).ok().map(|d| d.as_ref())
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    fn add_type(&mut self, name: &str, qualified_name: String, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types_by_name.insert(qualified_name.clone(), id);
        self.types.push(TypeSymbol {
            id,
            name: name.to_string(),
            qualified_name,
            kind,
            bases: Vec::new(),
            methods: Vec::new(),
            members: Vec::new(),
            declarations: Vec::new(),
        });
        id
    }

    fn add_method(&mut self, mut method: MethodSymbol) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        method.id = id;
        self.types[method.containing_type.0 as usize].methods.push(id);
        if let Some(declaration) = method.declaration {
            self.method_declarations
                .insert((declaration.document, declaration.node), id);
        }
        self.methods.push(method);
        id
    }

    fn register_library_types(&mut self) {
        for library in library_types() {
            let qualified = format!("{}.{}", library.namespace, library.name);
            let containing_type = self.add_type(library.name, qualified, TypeKind::Class);
            for method in library.methods {
                let parameters = method
                    .parameters
                    .into_iter()
                    .map(|ty| ParameterSymbol {
                        name: "value".to_string(),
                        ty,
                        mode: PassMode::Value,
                        is_params: false,
                        has_default: false,
                        modifier_count: 0,
                        has_attributes: false,
                        variable: None,
                    })
                    .collect();
                self.add_method(MethodSymbol {
                    id: MethodId(0),
                    name: method.name,
                    containing_type,
                    parameters,
                    return_type: method.return_type,
                    type_parameter_count: 0,
                    modifiers: MethodModifiers {
                        is_static: true,
                        ..MethodModifiers::default()
                    },
                    accessibility: Accessibility::Public,
                    explicit_interface: None,
                    has_body: true,
                    declaration: None,
                });
            }
        }
    }

    fn register_usings(&mut self, document: &Document) {
        let tree = document.tree();
        let namespaces = tree
            .descendants(tree.root())
            .filter(|&n| tree.kind(n) == SyntaxKind::UsingDirective)
            .filter(|&n| tree.child_token(n, "static").is_none() && tree.child_token(n, "=").is_none())
            .filter_map(|n| tree.child_nodes(n).next())
            .map(|name| {
                let text = compact(tree.text(name));
                text.strip_prefix("global::").unwrap_or(&text).to_string()
            })
            .collect();
        self.usings.insert(document.id(), namespaces);
    }

    fn register_types(&mut self, document: &Document) {
        let tree = document.tree();
        // Pre-order: an enclosing type is registered before its nested types.
        for node in tree.descendants(tree.root()) {
            let kind = tree.kind(node);
            if !kind.is_type_declaration() {
                continue;
            }
            let Some(name) = type_declaration_name(tree, node) else {
                continue;
            };
            let enclosing = tree
                .ancestors(node)
                .find_map(|a| self.declared_type(document.id(), a));
            let qualified = match enclosing {
                Some(outer) => format!("{}.{}", self.type_at(outer).qualified_name, name),
                None => {
                    let namespace = namespace_of(tree, node);
                    if namespace.is_empty() {
                        name.to_string()
                    } else {
                        format!("{}.{}", namespace, name)
                    }
                }
            };
            let id = match self.type_named(&qualified) {
                Some(id) => id,
                None => self.add_type(name, qualified, type_kind(kind)),
            };
            self.types[id.0 as usize]
                .declarations
                .push((document.id(), node));
            self.type_declarations.insert((document.id(), node), id);
        }
    }

    fn index_members(&mut self, document: &Document) {
        let tree = document.tree();
        let declarations: Vec<(NodeId, TypeId)> = tree
            .descendants(tree.root())
            .filter_map(|n| self.declared_type(document.id(), n).map(|id| (n, id)))
            .collect();

        for (node, id) in declarations {
            let bases: Vec<TypeId> = tree
                .child_of_kind(node, SyntaxKind::BaseList)
                .map(|list| {
                    tree.child_nodes(list)
                        .filter(|&b| tree.kind(b).is_type())
                        .filter_map(|b| {
                            self.lookup_type(document, node, &type_name_text(tree, b))
                        })
                        .collect()
                })
                .unwrap_or_default();
            let mut members = Vec::new();
            let mut methods = Vec::new();
            let kind = self.type_at(id).kind;

            if let Some(list) = tree.child_of_kind(node, SyntaxKind::ParameterList) {
                for parameter in tree.children_of_kind(list, SyntaxKind::Parameter) {
                    if let Some(view) = ParameterView::new(tree, parameter) {
                        members.push(MemberSymbol {
                            name: view.name_text(tree).to_string(),
                            ty: self.optional_type(document, view.ty),
                            is_static: false,
                        });
                    }
                }
            }

            for child in tree.child_nodes(node) {
                match tree.kind(child) {
                    SyntaxKind::MethodDeclaration => {
                        if let Some(method) = self.method_symbol(document, child, id, kind) {
                            methods.push(method);
                        }
                    }
                    SyntaxKind::FieldDeclaration => {
                        members.extend(self.field_members(document, child));
                    }
                    SyntaxKind::PropertyDeclaration => {
                        members.extend(self.property_member(document, child));
                    }
                    _ => {}
                }
            }

            let ty = &mut self.types[id.0 as usize];
            for base in bases {
                if base != id && !ty.bases.contains(&base) {
                    ty.bases.push(base);
                }
            }
            ty.members.extend(members);
            for method in methods {
                self.add_method(method);
            }
        }
    }

    fn optional_type(&self, document: &Document, node: Option<NodeId>) -> Type {
        node.map(|n| self.resolve_type(document, n))
            .unwrap_or(Type::Unknown)
    }

    fn method_symbol(
        &self,
        document: &Document,
        node: NodeId,
        containing_type: TypeId,
        containing_kind: TypeKind,
    ) -> Option<MethodSymbol> {
        let tree = document.tree();
        let view = MethodView::new(tree, node)?;
        let parameters = view
            .parameters(tree)
            .items
            .iter()
            .filter_map(|&p| ParameterView::new(tree, p))
            .map(|p| self.parameter_symbol(document, &p))
            .collect();
        let modifier_texts: Vec<&str> = view
            .modifiers
            .iter()
            .map(|&t| tree.token(t).text.as_str())
            .collect();
        let has = |m: &str| modifier_texts.contains(&m);
        let explicit_interface = view.explicit_interface.and_then(|specifier| {
            tree.child_nodes(specifier)
                .next()
                .map(|name| type_name_text(tree, name))
        });
        let accessibility = if explicit_interface.is_some() {
            Accessibility::NotApplicable
        } else {
            let default = match containing_kind {
                TypeKind::Interface => Accessibility::Public,
                _ => Accessibility::Private,
            };
            Accessibility::from_modifiers(modifier_texts.iter().copied(), default)
        };
        let type_parameter_count = view
            .type_parameters
            .map(|list| {
                tree.child_tokens(list)
                    .filter(|&t| tree.token(t).is_identifier())
                    .count()
            })
            .unwrap_or(0);

        Some(MethodSymbol {
            id: MethodId(0),
            name: view.name_text(tree).to_string(),
            containing_type,
            parameters,
            return_type: self.resolve_type(document, view.return_type),
            type_parameter_count,
            modifiers: MethodModifiers {
                is_static: has("static"),
                is_virtual: has("virtual"),
                is_override: has("override"),
                is_abstract: has("abstract"),
                is_extern: has("extern"),
            },
            accessibility,
            explicit_interface,
            has_body: view.body.is_some() || view.arrow.is_some(),
            declaration: Some(Declaration {
                document: document.id(),
                node,
                span: tree.span(node),
            }),
        })
    }

    pub(crate) fn parameter_symbol(&self, document: &Document, view: &ParameterView) -> ParameterSymbol {
        let tree = document.tree();
        let modifiers: Vec<&str> = view
            .modifiers
            .iter()
            .map(|&t| tree.token(t).text.as_str())
            .collect();
        let mode = modifiers
            .iter()
            .find_map(|m| PassMode::from_keyword(m))
            .unwrap_or(PassMode::Value);
        ParameterSymbol {
            name: view.name_text(tree).to_string(),
            ty: self.optional_type(document, view.ty),
            mode,
            is_params: modifiers.contains(&"params"),
            has_default: view.default.is_some(),
            modifier_count: modifiers.len(),
            has_attributes: !view.attributes.is_empty(),
            variable: Some(VariableId {
                document: document.id(),
                offset: tree.token(view.name).offset,
            }),
        }
    }

    fn field_members(&self, document: &Document, field: NodeId) -> Vec<MemberSymbol> {
        let tree = document.tree();
        let is_static = tree
            .child_tokens(field)
            .any(|t| matches!(tree.token(t).text.as_str(), "static" | "const"));
        let Some(declaration) = tree.child_of_kind(field, SyntaxKind::VariableDeclaration) else {
            return Vec::new();
        };
        let ty = self.optional_type(document, tree.child_nodes(declaration).next());
        tree.children_of_kind(declaration, SyntaxKind::VariableDeclarator)
            .filter_map(|d| tree.child_tokens(d).next())
            .map(|name| MemberSymbol {
                name: tree.token(name).value_text().to_string(),
                ty: ty.clone(),
                is_static,
            })
            .collect()
    }

    fn property_member(&self, document: &Document, property: NodeId) -> Option<MemberSymbol> {
        let tree = document.tree();
        let ty = tree.child_nodes(property).find(|&n| tree.kind(n).is_type())?;
        let name = tree
            .child_tokens(property)
            .filter(|&t| tree.token(t).offset > tree.span(ty).end)
            .find(|&t| tree.token(t).is_identifier())?;
        Some(MemberSymbol {
            name: tree.token(name).value_text().to_string(),
            ty: self.resolve_type(document, ty),
            is_static: tree.child_token(property, "static").is_some(),
        })
    }

    /// Explicit implementations, and non-private methods matching a member
    /// of an interface in the containing type's transitive base list.
    fn implements_interface_member(&self, id: MethodId) -> bool {
        let method = self.method_at(id);
        if method.is_explicit_interface_implementation() {
            return true;
        }
        if matches!(
            method.accessibility,
            Accessibility::Private | Accessibility::NotApplicable
        ) {
            return false;
        }
        let signature = method.signature();
        self.all_bases(method.containing_type)
            .into_iter()
            .filter(|&base| self.type_at(base).kind == TypeKind::Interface)
            .flat_map(|base| {
                let generic = self.is_generic_type(base);
                self.type_at(base)
                    .methods
                    .iter()
                    .map(move |&m| (generic, self.method_at(m)))
            })
            .filter(|(_, m)| m.name == method.name)
            .any(|(generic, m)| {
                if generic || m.type_parameter_count > 0 {
                    // Type arguments are not tracked; pass modes must still line up.
                    m.parameters.len() == method.parameters.len()
                        && m.parameters
                            .iter()
                            .zip(&method.parameters)
                            .all(|(a, b)| a.mode == b.mode)
                } else {
                    m.signature() == signature
                }
            })
    }

    /// True if any declaration of `id` has a type parameter list.
    fn is_generic_type(&self, id: TypeId) -> bool {
        self.type_at(id)
            .declarations
            .iter()
            .any(|&(document, node)| {
                self.document(document).is_some_and(|d| {
                    d.tree()
                        .child_of_kind(node, SyntaxKind::TypeParameterList)
                        .is_some()
                })
            })
    }
}

impl SemanticModel for ProgramModel {
    fn solution(&self) -> &Solution {
        &self.solution
    }

    fn method(&self, id: MethodId) -> Option<&MethodSymbol> {
        self.methods.get(id.0 as usize)
    }

    fn type_symbol(&self, id: TypeId) -> Option<&TypeSymbol> {
        self.types.get(id.0 as usize)
    }

    fn declared_method(&self, document: DocumentId, declaration: NodeId) -> Option<&MethodSymbol> {
        self.method_declarations
            .get(&(document, declaration))
            .map(|&id| self.method_at(id))
    }

    fn referenced_symbol(&self, document: DocumentId, expression: NodeId) -> Option<Symbol> {
        let document = self.document(document)?;
        Binder::new(self, document).referenced_symbol(expression)
    }

    fn type_of(&self, document: DocumentId, expression: NodeId) -> Type {
        match self.document(document) {
            Some(document) => Binder::new(self, document).type_of(expression),
            None => Type::Unknown,
        }
    }

    fn implements_interface(&self, method: MethodId) -> bool {
        self.method(method).is_some() && self.implements_interface_member(method)
    }

    fn find_all_references(
        &self,
        method: MethodId,
        cancel: &CancellationToken,
    ) -> AnalyzerResult<Vec<SymbolReference>> {
        references::find_all_references(self, method, cancel)
    }

    fn analyze_data_flow(&self, document: DocumentId, block: NodeId) -> DataFlowAnalysis {
        match self.document(document) {
            Some(document) => dataflow::analyze(&Binder::new(self, document), block),
            None => DataFlowAnalysis::failed(),
        }
    }
}

// ----------------------------------------------------------------------
// Syntax helpers
// ----------------------------------------------------------------------

fn type_kind(kind: SyntaxKind) -> TypeKind {
    match kind {
        SyntaxKind::StructDeclaration => TypeKind::Struct,
        SyntaxKind::InterfaceDeclaration => TypeKind::Interface,
        SyntaxKind::RecordDeclaration => TypeKind::Record,
        _ => TypeKind::Class,
    }
}

/// Source text with all whitespace removed.
pub(crate) fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The identifier after `class`, `struct`, `interface` or `record`.
fn type_declaration_name(tree: &SyntaxTree, node: NodeId) -> Option<&str> {
    let mut after_keyword = false;
    for token in tree.child_tokens(node) {
        let token = tree.token(token);
        if after_keyword && token.is_identifier() {
            return Some(token.value_text());
        }
        if token.is_keyword("class")
            || token.is_keyword("struct")
            || token.is_keyword("interface")
            || token.is_contextual("record")
        {
            after_keyword = true;
        }
    }
    None
}

/// Dotted namespace enclosing `node`, outermost first.
pub(crate) fn namespace_of(tree: &SyntaxTree, node: NodeId) -> String {
    let mut parts: Vec<String> = tree
        .ancestors(node)
        .filter(|&a| {
            matches!(
                tree.kind(a),
                SyntaxKind::NamespaceDeclaration | SyntaxKind::FileScopedNamespaceDeclaration
            )
        })
        .filter_map(|a| tree.child_nodes(a).next())
        .map(|name| compact(tree.text(name)))
        .collect();
    parts.reverse();
    parts.join(".")
}

/// A type name without type arguments: `List` for `List<int>`,
/// `System.Convert` for `System.Convert`.
pub(crate) fn type_name_text(tree: &SyntaxTree, node: NodeId) -> String {
    let mut out = String::new();
    push_type_name(tree, node, &mut out);
    out.strip_prefix("global::").unwrap_or(&out).to_string()
}

fn push_type_name(tree: &SyntaxTree, node: NodeId, out: &mut String) {
    match tree.kind(node) {
        SyntaxKind::IdentifierName | SyntaxKind::GenericName => {
            out.push_str(tree.token(tree.first_token(node)).value_text());
        }
        SyntaxKind::QualifiedName => {
            for child in tree.children(node) {
                match child.as_node() {
                    Some(part) => push_type_name(tree, part, out),
                    None => {
                        if let Some(token) = child.as_token() {
                            out.push_str(&tree.token(token).text);
                        }
                    }
                }
            }
        }
        _ => out.push_str(&compact(tree.text(node))),
    }
}

/// True if a method, local function or type around `node` declares a type
/// parameter called `name`.
fn type_parameter_in_scope(tree: &SyntaxTree, node: NodeId, name: &str) -> bool {
    tree.ancestors(node)
        .filter_map(|a| tree.child_of_kind(a, SyntaxKind::TypeParameterList))
        .any(|list| {
            tree.child_tokens(list)
                .any(|t| tree.token(t).is_identifier() && tree.token(t).value_text() == name)
        })
}
