//! Name binding, expression typing and overload resolution within one
//! document.

use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree, TokenId, TokenKind};

use crate::semantic::program::{type_name_text, ProgramModel};
use crate::semantic::symbols::{
    MemberSymbol, MethodId, MethodSymbol, PassMode, Symbol, TypeId, VariableId, VariableKind,
    VariableSymbol,
};
use crate::semantic::types::{Primitive, Type};
use crate::syntax::{declared_identifier, ArgumentView, InvocationView, ParameterView};
use crate::workspace::Document;

/// What the left side of `x.M` denotes.
#[derive(Debug, Clone, PartialEq)]
enum Receiver {
    /// A value of this type.
    Instance(Type),
    /// A type name, for static access.
    Static(TypeId),
    Unknown,
}

/// An argument as overload resolution sees it.
#[derive(Debug, Clone)]
struct ArgumentInfo {
    name: Option<String>,
    mode: PassMode,
    ty: Type,
}

/// A candidate that accepts the arguments.
#[derive(Debug, Clone)]
struct Applicable {
    method: MethodId,
    /// The parameter type each argument converts to.
    targets: Vec<Type>,
    exact: usize,
}

/// Binds names and types expressions of one document.
pub struct Binder<'m> {
    model: &'m ProgramModel,
    document: &'m Document,
}

impl<'m> Binder<'m> {
    pub fn new(model: &'m ProgramModel, document: &'m Document) -> Self {
        Binder { model, document }
    }

    pub fn model(&self) -> &'m ProgramModel {
        self.model
    }

    pub fn document(&self) -> &'m Document {
        self.document
    }

    pub fn tree(&self) -> &'m SyntaxTree {
        self.document.tree()
    }

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------

    /// What an expression refers to.
    pub fn referenced_symbol(&self, node: NodeId) -> Option<Symbol> {
        let tree = self.tree();
        if let Some(invocation) = self.invocation_of_callee(node) {
            return self.resolve_invocation(invocation).map(Symbol::Method);
        }
        match tree.kind(node) {
            SyntaxKind::InvocationExpression => self.resolve_invocation(node).map(Symbol::Method),
            SyntaxKind::IdentifierName => self.bind_identifier(node),
            SyntaxKind::MemberAccessExpression => {
                let name = tree.child_nodes(node).last()?;
                let text = tree.token(tree.first_token(name)).value_text();
                let receiver = self.receiver(tree.child_nodes(node).next()?);
                if let Some((owner, member)) = self.member_on(&receiver, text) {
                    return Some(Symbol::Member { owner, member });
                }
                match self.methods_on(&receiver, text).as_slice() {
                    [only] => Some(Symbol::Method(*only)),
                    _ => None,
                }
            }
            SyntaxKind::ThisExpression => self.enclosing_type(node).map(Symbol::Type),
            _ => None,
        }
    }

    /// The invocation whose callee is `node`, if any.
    fn invocation_of_callee(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.tree();
        let parent = tree.parent(node)?;
        if tree.kind(parent) == SyntaxKind::InvocationExpression {
            return (tree.child_nodes(parent).next() == Some(node)).then_some(parent);
        }
        None
    }

    /// A simple name: variable, then member, then type, then method group.
    pub fn bind_identifier(&self, node: NodeId) -> Option<Symbol> {
        let tree = self.tree();
        let name = tree.token(tree.first_token(node)).value_text();
        if let Some(variable) = self.lookup_variable(name, node) {
            return Some(Symbol::Variable(variable));
        }
        if let Some((owner, member)) = self.lookup_member(name, node) {
            return Some(Symbol::Member { owner, member });
        }
        if let Some(ty) = self.model.lookup_type(self.document, node, name) {
            return Some(Symbol::Type(ty));
        }
        match self.methods_in_scope(name, node).as_slice() {
            [only] => Some(Symbol::Method(*only)),
            _ => None,
        }
    }

    /// The nearest enclosing type declaration's type.
    pub fn enclosing_type(&self, node: NodeId) -> Option<TypeId> {
        self.tree()
            .ancestors(node)
            .find_map(|a| self.model.declared_type(self.document.id(), a))
    }

    /// Enclosing types, innermost first.
    fn enclosing_types(&self, node: NodeId) -> Vec<TypeId> {
        self.tree()
            .ancestors(node)
            .filter_map(|a| self.model.declared_type(self.document.id(), a))
            .collect()
    }

    /// A field or property visible by simple name from `at`.
    pub fn lookup_member(&self, name: &str, at: NodeId) -> Option<(TypeId, MemberSymbol)> {
        self.enclosing_types(at).into_iter().find_map(|ty| {
            self.model
                .find_member(ty, name)
                .map(|(owner, member)| (owner, member.clone()))
        })
    }

    /// Methods callable by simple name from `at`: the enclosing types and
    /// their bases, innermost type first.
    pub fn methods_in_scope(&self, name: &str, at: NodeId) -> Vec<MethodId> {
        self.enclosing_types(at)
            .into_iter()
            .map(|ty| self.model.methods_named(ty, name))
            .find(|methods| !methods.is_empty())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// The parameter or local called `name` that is in scope at `at`.
    pub fn lookup_variable(&self, name: &str, at: NodeId) -> Option<VariableSymbol> {
        let tree = self.tree();
        let at_offset = tree.span(at).start;
        let mut from = at;
        for scope in tree.ancestors(at) {
            let found = match tree.kind(scope) {
                SyntaxKind::Block | SyntaxKind::SwitchSection => {
                    self.block_local(scope, from, name, at_offset)
                }
                SyntaxKind::ForStatement | SyntaxKind::UsingStatement => tree
                    .child_of_kind(scope, SyntaxKind::VariableDeclaration)
                    .and_then(|d| self.declarator_in(d, name, at_offset)),
                SyntaxKind::ForEachStatement => self.foreach_variable(scope, name),
                SyntaxKind::CatchClause => self.catch_variable(scope, name),
                SyntaxKind::SimpleLambdaExpression
                | SyntaxKind::ParenthesizedLambdaExpression
                | SyntaxKind::LocalFunctionStatement => self.parameter_in(scope, name),
                SyntaxKind::MethodDeclaration | SyntaxKind::ConstructorDeclaration => {
                    return self.parameter_in(scope, name);
                }
                SyntaxKind::AccessorDeclaration => return self.accessor_value(scope, name),
                SyntaxKind::PropertyDeclaration | SyntaxKind::FieldDeclaration => return None,
                kind if kind.is_type_declaration() => return None,
                _ => None,
            };
            if found.is_some() {
                return found;
            }
            from = scope;
        }
        None
    }

    /// Locals declared in a block's statements up to and including `from`.
    fn block_local(
        &self,
        block: NodeId,
        from: NodeId,
        name: &str,
        at_offset: usize,
    ) -> Option<VariableSymbol> {
        let tree = self.tree();
        for statement in tree.child_nodes(block) {
            if tree.kind(statement) == SyntaxKind::LocalDeclarationStatement {
                let declared = tree
                    .child_of_kind(statement, SyntaxKind::VariableDeclaration)
                    .and_then(|d| self.declarator_in(d, name, at_offset));
                if declared.is_some() {
                    return declared;
                }
            }
            if let Some(found) = self.designation_in(statement, name, at_offset) {
                return Some(found);
            }
            if statement == from {
                break;
            }
        }
        None
    }

    /// A declarator of a variable declaration that ends before `at_offset`.
    fn declarator_in(
        &self,
        declaration: NodeId,
        name: &str,
        at_offset: usize,
    ) -> Option<VariableSymbol> {
        let tree = self.tree();
        let type_node = tree.child_nodes(declaration).next()?;
        let declarator = tree
            .children_of_kind(declaration, SyntaxKind::VariableDeclarator)
            .find(|&d| {
                tree.span(d).end <= at_offset
                    && tree
                        .child_tokens(d)
                        .next()
                        .is_some_and(|t| tree.token(t).value_text() == name)
            })?;
        let identifier = tree.child_tokens(declarator).next()?;
        let ty = if is_var(tree, type_node) {
            tree.child_of_kind(declarator, SyntaxKind::EqualsValueClause)
                .and_then(|clause| tree.child_nodes(clause).next())
                .map(|value| match self.type_of(value) {
                    Type::Null => Type::Unknown,
                    other => other,
                })
                .unwrap_or(Type::Unknown)
        } else {
            self.model.resolve_type(self.document, type_node)
        };
        Some(self.variable(identifier, ty, VariableKind::Local))
    }

    /// `out var x`, `out int x` and `is T x` designations inside a
    /// statement, not looking into nested blocks, lambdas or local
    /// functions.
    fn designation_in(&self, statement: NodeId, name: &str, at_offset: usize) -> Option<VariableSymbol> {
        let tree = self.tree();
        if tree.kind(statement) == SyntaxKind::Block {
            return None;
        }
        let mut stack = vec![statement];
        while let Some(node) = stack.pop() {
            let kind = tree.kind(node);
            if node != statement
                && (kind == SyntaxKind::Block
                    || kind.is_lambda()
                    || kind == SyntaxKind::LocalFunctionStatement)
            {
                continue;
            }
            if kind == SyntaxKind::SingleVariableDesignation && tree.span(node).end <= at_offset {
                let identifier = tree.first_token(node);
                if tree.token(identifier).value_text() == name {
                    let ty = self.designation_type(node);
                    return Some(self.variable(identifier, ty, VariableKind::Local));
                }
            }
            stack.extend(tree.child_nodes(node));
        }
        None
    }

    fn designation_type(&self, designation: NodeId) -> Type {
        let tree = self.tree();
        let Some(parent) = tree.parent(designation) else {
            return Type::Unknown;
        };
        match tree.kind(parent) {
            SyntaxKind::DeclarationExpression | SyntaxKind::DeclarationPattern => {
                match tree.child_nodes(parent).next() {
                    Some(ty) if ty != designation && !is_var(tree, ty) => {
                        self.model.resolve_type(self.document, ty)
                    }
                    _ => Type::Unknown,
                }
            }
            _ => Type::Unknown,
        }
    }

    fn foreach_variable(&self, statement: NodeId, name: &str) -> Option<VariableSymbol> {
        let tree = self.tree();
        let identifier = declared_identifier(tree, statement)?;
        if tree.token(identifier).value_text() != name {
            return None;
        }
        let mut nodes = tree.child_nodes(statement);
        let type_node = nodes.next()?;
        let ty = if is_var(tree, type_node) {
            match nodes.next().map(|collection| self.type_of(collection)) {
                Some(Type::Array(element)) => *element,
                Some(Type::Primitive(Primitive::String)) => Type::Primitive(Primitive::Char),
                _ => Type::Unknown,
            }
        } else {
            self.model.resolve_type(self.document, type_node)
        };
        Some(self.variable(identifier, ty, VariableKind::Local))
    }

    fn catch_variable(&self, clause: NodeId, name: &str) -> Option<VariableSymbol> {
        let tree = self.tree();
        let declaration = tree.child_of_kind(clause, SyntaxKind::CatchDeclaration)?;
        let identifier = declared_identifier(tree, declaration)?;
        if tree.token(identifier).value_text() != name {
            return None;
        }
        let ty = tree
            .child_nodes(declaration)
            .next()
            .map(|t| self.model.resolve_type(self.document, t))
            .unwrap_or(Type::Unknown);
        Some(self.variable(identifier, ty, VariableKind::Local))
    }

    /// Parameters of a method, constructor, local function or lambda.
    fn parameter_in(&self, owner: NodeId, name: &str) -> Option<VariableSymbol> {
        let tree = self.tree();
        let parameters: Vec<NodeId> = match tree.child_of_kind(owner, SyntaxKind::ParameterList) {
            Some(list) => tree.children_of_kind(list, SyntaxKind::Parameter).collect(),
            None => tree.children_of_kind(owner, SyntaxKind::Parameter).collect(),
        };
        parameters
            .into_iter()
            .filter_map(|p| ParameterView::new(tree, p))
            .find(|view| view.name_text(tree) == name)
            .map(|view| {
                let ty = view
                    .ty
                    .map(|t| self.model.resolve_type(self.document, t))
                    .unwrap_or(Type::Unknown);
                self.variable(view.name, ty, VariableKind::Parameter)
            })
    }

    /// `value` inside a `set` or `init` accessor.
    fn accessor_value(&self, accessor: NodeId, name: &str) -> Option<VariableSymbol> {
        let tree = self.tree();
        if name != "value" {
            return None;
        }
        let keyword = tree
            .child_tokens(accessor)
            .find(|&t| tree.token(t).is_contextual("set") || tree.token(t).is_contextual("init"))?;
        let property = tree.ancestor_of_kind(accessor, SyntaxKind::PropertyDeclaration)?;
        let ty = tree
            .child_nodes(property)
            .find(|&n| tree.kind(n).is_type())
            .map(|t| self.model.resolve_type(self.document, t))
            .unwrap_or(Type::Unknown);
        Some(self.variable(keyword, ty, VariableKind::Parameter))
    }

    fn variable(&self, identifier: TokenId, ty: Type, kind: VariableKind) -> VariableSymbol {
        let token = self.tree().token(identifier);
        VariableSymbol {
            id: VariableId {
                document: self.document.id(),
                offset: token.offset,
            },
            name: token.value_text().to_string(),
            ty,
            kind,
        }
    }

    /// True if a local function called `name` is declared in a block
    /// around `at`.
    fn local_function_in_scope(&self, name: &str, at: NodeId) -> bool {
        let tree = self.tree();
        tree.ancestors(at)
            .filter(|&a| matches!(tree.kind(a), SyntaxKind::Block | SyntaxKind::SwitchSection))
            .flat_map(|block| tree.children_of_kind(block, SyntaxKind::LocalFunctionStatement))
            .any(|function| local_function_name(tree, function) == Some(name))
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Static type of an expression.
    pub fn type_of(&self, node: NodeId) -> Type {
        let tree = self.tree();
        let mut children = tree.child_nodes(node);
        match tree.kind(node) {
            SyntaxKind::LiteralExpression => literal_type(tree, node),
            SyntaxKind::IdentifierName => match self.bind_identifier(node) {
                Some(Symbol::Variable(variable)) => variable.ty,
                Some(Symbol::Member { member, .. }) => member.ty,
                _ => Type::Unknown,
            },
            SyntaxKind::ParenthesizedExpression | SyntaxKind::PostfixUnaryExpression => children
                .next()
                .map(|inner| self.type_of(inner))
                .unwrap_or(Type::Unknown),
            SyntaxKind::MemberAccessExpression => {
                let (Some(receiver), Some(name)) = (children.next(), children.last()) else {
                    return Type::Unknown;
                };
                let name = tree.token(tree.first_token(name)).value_text();
                self.member_type(&self.receiver(receiver), name)
            }
            SyntaxKind::MemberBindingExpression => {
                let Some(name) = children.next() else {
                    return Type::Unknown;
                };
                let name = tree.token(tree.first_token(name)).value_text();
                match self.binding_receiver(node) {
                    Some(receiver) => self.member_type(&Receiver::Instance(self.type_of(receiver)), name),
                    None => Type::Unknown,
                }
            }
            SyntaxKind::InvocationExpression => self
                .resolve_invocation(node)
                .map(|m| self.model.method_at(m).return_type.clone())
                .unwrap_or(Type::Unknown),
            SyntaxKind::BinaryExpression => self.binary_type(node),
            SyntaxKind::PrefixUnaryExpression => {
                let operator = tree.token(tree.first_token(node)).text.as_str();
                let Some(operand) = children.next() else {
                    return Type::Unknown;
                };
                let operand = self.type_of(operand);
                match operator {
                    "!" => Type::BOOL,
                    "++" | "--" => operand,
                    _ => match operand.as_primitive() {
                        Some(
                            Primitive::Byte
                            | Primitive::SByte
                            | Primitive::Short
                            | Primitive::UShort
                            | Primitive::Char,
                        ) => Type::INT,
                        _ => operand,
                    },
                }
            }
            SyntaxKind::CastExpression | SyntaxKind::DefaultExpression => children
                .find(|&n| tree.kind(n).is_type())
                .map(|t| self.model.resolve_type(self.document, t))
                .unwrap_or(Type::Unknown),
            SyntaxKind::AsExpression => children
                .nth(1)
                .map(|t| self.model.resolve_type(self.document, t))
                .unwrap_or(Type::Unknown),
            SyntaxKind::IsPatternExpression => Type::BOOL,
            SyntaxKind::ConditionalExpression => {
                let (Some(_), Some(when_true), Some(when_false)) =
                    (children.next(), children.next(), children.next())
                else {
                    return Type::Unknown;
                };
                conditional_type(self.type_of(when_true), self.type_of(when_false))
            }
            SyntaxKind::AssignmentExpression => children
                .next()
                .map(|target| self.type_of(target))
                .unwrap_or(Type::Unknown),
            SyntaxKind::ObjectCreationExpression => children
                .find(|&n| tree.kind(n).is_type())
                .map(|t| self.model.resolve_type(self.document, t))
                .unwrap_or(Type::Unknown),
            SyntaxKind::ArrayCreationExpression => children
                .find(|&n| tree.kind(n) == SyntaxKind::ArrayType)
                .map(|t| self.model.resolve_type(self.document, t))
                .unwrap_or(Type::Unknown),
            SyntaxKind::ThisExpression => self
                .enclosing_type(node)
                .map(|t| Type::Named(self.model.type_at(t).qualified_name.clone()))
                .unwrap_or(Type::Unknown),
            SyntaxKind::TupleExpression => Type::Tuple(
                tree.children_of_kind(node, SyntaxKind::Argument)
                    .map(|arg| match ArgumentView::new(tree, arg) {
                        Some(view) => self.type_of(view.expression),
                        None => Type::Unknown,
                    })
                    .collect(),
            ),
            SyntaxKind::ElementAccessExpression => match children.next().map(|r| self.type_of(r)) {
                Some(Type::Array(element)) => *element,
                Some(Type::Primitive(Primitive::String)) => Type::Primitive(Primitive::Char),
                _ => Type::Unknown,
            },
            SyntaxKind::DeclarationExpression => match children.next() {
                Some(ty) if tree.kind(ty).is_type() && !is_var(tree, ty) => {
                    self.model.resolve_type(self.document, ty)
                }
                _ => Type::Unknown,
            },
            SyntaxKind::TypeOfExpression => Type::Named("System.Type".to_string()),
            _ => Type::Unknown,
        }
    }

    fn binary_type(&self, node: NodeId) -> Type {
        let tree = self.tree();
        let operator: String = tree
            .child_tokens(node)
            .map(|t| tree.token(t).text.as_str())
            .collect();
        let mut operands = tree.child_nodes(node);
        let (Some(left), Some(right)) = (operands.next(), operands.next()) else {
            return Type::Unknown;
        };
        let left = self.type_of(left);
        let right = self.type_of(right);
        match operator.as_str() {
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => Type::BOOL,
            "??" => match left {
                Type::Null => right,
                Type::Nullable(inner) if *inner == right => right,
                other => other,
            },
            "+" if left == Type::STRING || right == Type::STRING => Type::STRING,
            "&" | "|" | "^" if left == Type::BOOL && right == Type::BOOL => Type::BOOL,
            "<<" | ">>" => match left.as_primitive() {
                Some(p) if p.is_numeric() => left.binary_numeric_promotion(&Type::INT),
                _ => Type::Unknown,
            },
            _ => left.binary_numeric_promotion(&right),
        }
    }

    fn member_type(&self, receiver: &Receiver, name: &str) -> Type {
        if let Some((_, member)) = self.member_on(receiver, name) {
            return member.ty;
        }
        match (receiver, name) {
            (Receiver::Instance(Type::Array(_)), "Length")
            | (Receiver::Instance(Type::Primitive(Primitive::String)), "Length") => Type::INT,
            _ => Type::Unknown,
        }
    }

    fn member_on(&self, receiver: &Receiver, name: &str) -> Option<(TypeId, MemberSymbol)> {
        let ty = self.receiver_type_id(receiver)?;
        self.model
            .find_member(ty, name)
            .map(|(owner, member)| (owner, member.clone()))
    }

    fn methods_on(&self, receiver: &Receiver, name: &str) -> Vec<MethodId> {
        match self.receiver_type_id(receiver) {
            Some(ty) => self.model.methods_named(ty, name),
            None => Vec::new(),
        }
    }

    fn receiver_type_id(&self, receiver: &Receiver) -> Option<TypeId> {
        match receiver {
            Receiver::Instance(Type::Named(name)) => self.model.type_named(name),
            Receiver::Static(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Classify the left side of a member access.
    fn receiver(&self, node: NodeId) -> Receiver {
        let tree = self.tree();
        match tree.kind(node) {
            SyntaxKind::ThisExpression => match self.enclosing_type(node) {
                Some(ty) => Receiver::Instance(Type::Named(self.model.type_at(ty).qualified_name.clone())),
                None => Receiver::Unknown,
            },
            SyntaxKind::PredefinedType => Receiver::Unknown,
            SyntaxKind::IdentifierName => match self.bind_identifier(node) {
                Some(Symbol::Variable(variable)) => Receiver::Instance(variable.ty),
                Some(Symbol::Member { member, .. }) => Receiver::Instance(member.ty),
                Some(Symbol::Type(ty)) => Receiver::Static(ty),
                _ => Receiver::Unknown,
            },
            SyntaxKind::MemberAccessExpression => {
                let value_root = dotted_root(tree, node)
                    .is_some_and(|root| self.binds_as_value(root));
                if !value_root {
                    if let Some(name) = dotted_name(tree, node) {
                        if let Some(ty) = self.model.lookup_type(self.document, node, &name) {
                            return Receiver::Static(ty);
                        }
                    }
                }
                Receiver::Instance(self.type_of(node))
            }
            _ => Receiver::Instance(self.type_of(node)),
        }
    }

    fn binds_as_value(&self, identifier: NodeId) -> bool {
        matches!(
            self.bind_identifier(identifier),
            Some(Symbol::Variable(_)) | Some(Symbol::Member { .. })
        )
    }

    /// The receiver of a `?.` member binding.
    fn binding_receiver(&self, binding: NodeId) -> Option<NodeId> {
        let tree = self.tree();
        tree.ancestors(binding)
            .filter(|&a| tree.kind(a) == SyntaxKind::ConditionalAccessExpression)
            .find_map(|access| {
                let receiver = tree.child_nodes(access).next()?;
                let inside_receiver =
                    receiver == binding || tree.is_ancestor_of(receiver, binding);
                (!inside_receiver).then_some(receiver)
            })
    }

    // ------------------------------------------------------------------
    // Invocations
    // ------------------------------------------------------------------

    /// Candidate methods for a callee by name, before looking at arguments.
    pub fn callee_candidates(&self, callee: NodeId) -> Vec<MethodId> {
        let tree = self.tree();
        match tree.kind(callee) {
            SyntaxKind::IdentifierName | SyntaxKind::GenericName => {
                let name = tree.token(tree.first_token(callee)).value_text();
                if self.local_function_in_scope(name, callee) {
                    return Vec::new();
                }
                self.methods_in_scope(name, callee)
            }
            SyntaxKind::MemberAccessExpression => {
                let mut children = tree.child_nodes(callee);
                let (Some(receiver), Some(name)) = (children.next(), children.last()) else {
                    return Vec::new();
                };
                let name = tree.token(tree.first_token(name)).value_text();
                match tree.kind(receiver) {
                    SyntaxKind::BaseExpression => self
                        .enclosing_type(callee)
                        .map(|ty| {
                            self.model
                                .type_at(ty)
                                .bases
                                .iter()
                                .flat_map(|&base| self.model.methods_named(base, name))
                                .collect()
                        })
                        .unwrap_or_default(),
                    _ => self.methods_on(&self.receiver(receiver), name),
                }
            }
            SyntaxKind::MemberBindingExpression => {
                let Some(name) = tree.child_nodes(callee).next() else {
                    return Vec::new();
                };
                let name = tree.token(tree.first_token(name)).value_text();
                match self.binding_receiver(callee) {
                    Some(receiver) => {
                        self.methods_on(&Receiver::Instance(self.type_of(receiver)), name)
                    }
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    /// The method an invocation calls, if exactly one candidate fits best.
    pub fn resolve_invocation(&self, invocation: NodeId) -> Option<MethodId> {
        let tree = self.tree();
        let view = InvocationView::new(tree, invocation)?;
        let candidates = self.callee_candidates(view.callee);
        if candidates.is_empty() {
            return None;
        }
        let type_arguments = generic_arity(tree, view.callee);
        let arguments: Vec<ArgumentInfo> = view
            .argument_views(tree)
            .iter()
            .map(|arg| self.argument_info(arg))
            .collect();
        let applicable: Vec<Applicable> = candidates
            .into_iter()
            .map(|id| self.model.method_at(id))
            .filter(|m| match type_arguments {
                Some(count) => m.type_parameter_count == count,
                None => true,
            })
            .filter_map(|m| applicability(m, &arguments))
            .collect();
        best_candidate(applicable)
    }

    fn argument_info(&self, argument: &ArgumentView) -> ArgumentInfo {
        let tree = self.tree();
        let mode = argument
            .ref_kind_text(tree)
            .and_then(PassMode::from_keyword)
            .unwrap_or(PassMode::Value);
        ArgumentInfo {
            name: argument.name(tree).map(str::to_string),
            mode,
            ty: self.type_of(argument.expression),
        }
    }
}

/// Map arguments to parameters and check pass modes and conversions.
fn applicability(method: &MethodSymbol, arguments: &[ArgumentInfo]) -> Option<Applicable> {
    let parameters = &method.parameters;
    let mut filled = vec![false; parameters.len()];
    let mut targets = Vec::with_capacity(arguments.len());
    let mut exact = 0;
    let mut named_seen = false;

    for (position, argument) in arguments.iter().enumerate() {
        let index = match &argument.name {
            Some(name) => {
                named_seen = true;
                parameters.iter().position(|p| &p.name == name)?
            }
            None if named_seen => return None,
            None if position < parameters.len() => position,
            None => match parameters.last() {
                Some(last) if last.is_params => parameters.len() - 1,
                _ => return None,
            },
        };
        let parameter = &parameters[index];
        if filled[index] && !parameter.is_params {
            return None;
        }
        filled[index] = true;

        let mode_matches = match parameter.mode {
            PassMode::In => matches!(argument.mode, PassMode::Value | PassMode::In),
            mode => mode == argument.mode,
        };
        if !mode_matches {
            return None;
        }

        let target = match parameter.mode {
            PassMode::Ref | PassMode::Out => {
                let compatible = argument.ty == parameter.ty
                    || !argument.ty.is_known()
                    || !parameter.ty.is_known();
                if !compatible {
                    return None;
                }
                parameter.ty.clone()
            }
            _ => match (&parameter.ty, parameter.is_params) {
                (Type::Array(element), true) if !argument.ty.converts_to(&parameter.ty) => {
                    if !argument.ty.converts_to(element) {
                        return None;
                    }
                    (**element).clone()
                }
                (ty, _) => {
                    if !argument.ty.converts_to(ty) {
                        return None;
                    }
                    ty.clone()
                }
            },
        };
        if argument.ty.is_known() && argument.ty == target {
            exact += 1;
        }
        targets.push(target);
    }

    let complete = parameters
        .iter()
        .zip(&filled)
        .all(|(p, &f)| f || p.has_default || p.is_params);
    complete.then_some(Applicable {
        method: method.id,
        targets,
        exact,
    })
}

/// The candidate with the most exact matches; ties go to the candidate
/// whose parameter types all convert to every other tied candidate's.
fn best_candidate(applicable: Vec<Applicable>) -> Option<MethodId> {
    let best = applicable.iter().map(|a| a.exact).max()?;
    let tied: Vec<&Applicable> = applicable.iter().filter(|a| a.exact == best).collect();
    if let [only] = tied.as_slice() {
        return Some(only.method);
    }
    let dominates = |a: &Applicable, b: &Applicable| {
        a.targets
            .iter()
            .zip(&b.targets)
            .all(|(x, y)| x.is_known() && y.is_known() && x.converts_to(y))
    };
    let winners: Vec<&&Applicable> = tied
        .iter()
        .filter(|a| {
            tied.iter()
                .all(|b| a.method == b.method || (dominates(a, b) && !dominates(b, a)))
        })
        .collect();
    match winners.as_slice() {
        [only] => Some(only.method),
        _ => None,
    }
}

fn conditional_type(when_true: Type, when_false: Type) -> Type {
    if when_true == when_false {
        return when_true;
    }
    if !when_true.is_known() || !when_false.is_known() {
        return Type::Unknown;
    }
    match (
        when_true.converts_to(&when_false),
        when_false.converts_to(&when_true),
    ) {
        (true, false) => when_false,
        (false, true) => when_true,
        _ => Type::Unknown,
    }
}

fn literal_type(tree: &SyntaxTree, node: NodeId) -> Type {
    let token = tree.token(tree.first_token(node));
    let lower = token.text.to_ascii_lowercase();
    match token.kind {
        TokenKind::IntegerLiteral => {
            let primitive = if lower.ends_with("ul") || lower.ends_with("lu") {
                Primitive::ULong
            } else if lower.ends_with('u') {
                Primitive::UInt
            } else if lower.ends_with('l') {
                Primitive::Long
            } else {
                Primitive::Int
            };
            Type::Primitive(primitive)
        }
        TokenKind::RealLiteral => {
            let primitive = if lower.ends_with('f') {
                Primitive::Float
            } else if lower.ends_with('m') {
                Primitive::Decimal
            } else {
                Primitive::Double
            };
            Type::Primitive(primitive)
        }
        TokenKind::StringLiteral => Type::STRING,
        TokenKind::CharacterLiteral => Type::Primitive(Primitive::Char),
        TokenKind::Keyword => match token.text.as_str() {
            "true" | "false" => Type::BOOL,
            "null" => Type::Null,
            _ => Type::Unknown,
        },
        _ => Type::Unknown,
    }
}

/// True for the contextual `var` type.
pub(crate) fn is_var(tree: &SyntaxTree, type_node: NodeId) -> bool {
    tree.kind(type_node) == SyntaxKind::IdentifierName && tree.text(type_node) == "var"
}

/// Number of explicit type arguments on a callee name.
fn generic_arity(tree: &SyntaxTree, callee: NodeId) -> Option<usize> {
    let name = match tree.kind(callee) {
        SyntaxKind::GenericName => callee,
        SyntaxKind::MemberAccessExpression | SyntaxKind::MemberBindingExpression => {
            tree.child_nodes(callee).last()?
        }
        _ => return None,
    };
    if tree.kind(name) != SyntaxKind::GenericName {
        return None;
    }
    let list = tree.child_of_kind(name, SyntaxKind::TypeArgumentList)?;
    Some(tree.child_nodes(list).count())
}

/// `A.B.C` for a member access chain of simple names.
fn dotted_name(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        SyntaxKind::IdentifierName => Some(type_name_text(tree, node)),
        SyntaxKind::MemberAccessExpression => {
            let mut children = tree.child_nodes(node);
            let (receiver, name) = (children.next()?, children.last()?);
            if tree.kind(name) != SyntaxKind::IdentifierName {
                return None;
            }
            Some(format!(
                "{}.{}",
                dotted_name(tree, receiver)?,
                tree.token(tree.first_token(name)).value_text()
            ))
        }
        _ => None,
    }
}

/// The leftmost simple name of a member access chain.
fn dotted_root(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    match tree.kind(node) {
        SyntaxKind::IdentifierName => Some(node),
        SyntaxKind::MemberAccessExpression => dotted_root(tree, tree.child_nodes(node).next()?),
        _ => None,
    }
}

/// Name of a local function statement.
fn local_function_name(tree: &SyntaxTree, function: NodeId) -> Option<&str> {
    let return_type = tree.child_nodes(function).next()?;
    let after = tree.span(return_type).end;
    tree.child_tokens(function)
        .map(|t| tree.token(t))
        .find(|t| t.offset >= after && t.is_identifier())
        .map(|t| t.value_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Solution;

    fn with_binder<R>(source: &str, f: impl FnOnce(&Binder) -> R) -> R {
        let solution = Solution::from_sources([("A.cs", source)]).unwrap();
        let model = ProgramModel::build(&solution);
        let document = solution.documents().next().unwrap();
        let binder = Binder::new(&model, document);
        f(&binder)
    }

    /// The n-th node of `kind` whose text is `text`.
    fn node(binder: &Binder, kind: SyntaxKind, text: &str, n: usize) -> NodeId {
        let tree = binder.tree();
        tree.descendants(tree.root())
            .filter(|&x| tree.kind(x) == kind && tree.text(x) == text)
            .nth(n)
            .unwrap()
    }

    fn method_name(binder: &Binder, id: MethodId) -> String {
        let m = binder.model().method_at(id);
        let params: Vec<String> = m.parameters.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", m.name, params.join(", "))
    }

    mod variables {
        use super::*;

        #[test]
        fn parameters_and_locals() {
            let source = "class C { void M(ref int a) { long b = 1; var c = b; Use(a, b, c); } void Use(int x, long y, long z) { } }";
            with_binder(source, |binder| {
                let a = node(binder, SyntaxKind::IdentifierName, "a", 0);
                let var = binder.lookup_variable("a", a).unwrap();
                assert_eq!(var.kind, VariableKind::Parameter);
                assert_eq!(var.ty, Type::INT);

                let c = node(binder, SyntaxKind::IdentifierName, "c", 0);
                let var = binder.lookup_variable("c", c).unwrap();
                assert_eq!(var.kind, VariableKind::Local);
                assert_eq!(var.ty, Type::Primitive(Primitive::Long));
            });
        }

        #[test]
        fn locals_are_not_visible_before_their_declaration() {
            let source = "class C { void M() { F(x); int x = 1; } void F(int v) { } }";
            with_binder(source, |binder| {
                let use_site = node(binder, SyntaxKind::IdentifierName, "x", 0);
                assert!(binder.lookup_variable("x", use_site).is_none());
            });
        }

        #[test]
        fn out_var_designations_are_in_scope_after_the_call() {
            let source = "class C { void M() { G(out var x); F(x); } void G(out int v) { v = 1; } void F(int v) { } }";
            with_binder(source, |binder| {
                let use_site = node(binder, SyntaxKind::IdentifierName, "x", 0);
                let var = binder.lookup_variable("x", use_site).unwrap();
                assert_eq!(var.kind, VariableKind::Local);
            });
        }

        #[test]
        fn fields_bind_as_members() {
            let source = "class B { protected string s; } class C : B { void M() { F(s); } void F(string v) { } }";
            with_binder(source, |binder| {
                let s = node(binder, SyntaxKind::IdentifierName, "s", 0);
                assert_eq!(binder.type_of(s), Type::STRING);
            });
        }
    }

    mod typing {
        use super::*;

        fn type_of_initializer(body: &str, name: &str) -> Type {
            let source = format!("class C {{ int f; void M(int p, double d) {{ {} }} }}", body);
            with_binder(&source, |binder| {
                let tree = binder.tree();
                let declarator = tree
                    .descendants(tree.root())
                    .find(|&n| {
                        tree.kind(n) == SyntaxKind::VariableDeclarator
                            && tree.token(tree.first_token(n)).text == name
                    })
                    .unwrap();
                let clause = tree.child_of_kind(declarator, SyntaxKind::EqualsValueClause).unwrap();
                binder.type_of(tree.child_nodes(clause).next().unwrap())
            })
        }

        #[test]
        fn literals() {
            assert_eq!(type_of_initializer("var x = 4;", "x"), Type::INT);
            assert_eq!(
                type_of_initializer("var x = 4L;", "x"),
                Type::Primitive(Primitive::Long)
            );
            assert_eq!(
                type_of_initializer("var x = 4u;", "x"),
                Type::Primitive(Primitive::UInt)
            );
            assert_eq!(
                type_of_initializer("var x = 1.5f;", "x"),
                Type::Primitive(Primitive::Float)
            );
            assert_eq!(
                type_of_initializer("var x = 1.5m;", "x"),
                Type::Primitive(Primitive::Decimal)
            );
            assert_eq!(type_of_initializer("var x = \"s\";", "x"), Type::STRING);
            assert_eq!(
                type_of_initializer("var x = 'c';", "x"),
                Type::Primitive(Primitive::Char)
            );
        }

        #[test]
        fn operators() {
            assert_eq!(
                type_of_initializer("var x = p + d;", "x"),
                Type::Primitive(Primitive::Double)
            );
            assert_eq!(type_of_initializer("var x = p < 2 && true;", "x"), Type::BOOL);
            assert_eq!(type_of_initializer("var x = \"a\" + p;", "x"), Type::STRING);
            assert_eq!(type_of_initializer("var x = (p);", "x"), Type::INT);
            assert_eq!(type_of_initializer("var x = p > 0 ? p : f;", "x"), Type::INT);
            assert_eq!(
                type_of_initializer("var x = (long)p;", "x"),
                Type::Primitive(Primitive::Long)
            );
            assert_eq!(type_of_initializer("var x = -p;", "x"), Type::INT);
            assert_eq!(type_of_initializer("var x = this.f;", "x"), Type::INT);
        }
    }

    mod overloads {
        use super::*;

        fn resolved(source: &str, call: &str) -> Option<String> {
            with_binder(source, |binder| {
                let invocation = node(binder, SyntaxKind::InvocationExpression, call, 0);
                binder
                    .resolve_invocation(invocation)
                    .map(|id| method_name(binder, id))
            })
        }

        #[test]
        fn convert_picks_the_exact_overload() {
            let source = "using System; class C { void M(short s) { var a = Convert.ToInt32(4); var b = Convert.ToInt32(s); } }";
            assert_eq!(
                resolved(source, "Convert.ToInt32(4)"),
                Some("ToInt32(int)".to_string())
            );
            assert_eq!(
                resolved(source, "Convert.ToInt32(s)"),
                Some("ToInt32(short)".to_string())
            );
        }

        #[test]
        fn convert_needs_an_import_or_qualification() {
            let source = "class C { void M() { var a = Convert.ToInt32(4); var b = System.Convert.ToInt32(4); } }";
            assert_eq!(resolved(source, "Convert.ToInt32(4)"), None);
            assert_eq!(
                resolved(source, "System.Convert.ToInt32(4)"),
                Some("ToInt32(int)".to_string())
            );
        }

        #[test]
        fn null_prefers_the_more_specific_overload() {
            let source = "using System; class C { void M() { var a = Convert.ToString(null); } }";
            assert_eq!(
                resolved(source, "Convert.ToString(null)"),
                Some("ToString(string)".to_string())
            );
        }

        #[test]
        fn overloads_are_told_apart_by_type_and_pass_mode() {
            let source = "class C {
                void A(int x) { }
                void A(string x) { }
                void B(ref int x) { }
                void B(int x) { }
                void M(int i) { A(i); A(\"s\"); B(ref i); B(i); }
            }";
            assert_eq!(resolved(source, "A(i)"), Some("A(int)".to_string()));
            assert_eq!(resolved(source, "A(\"s\")"), Some("A(string)".to_string()));
            with_binder(source, |binder| {
                let by_ref = node(binder, SyntaxKind::InvocationExpression, "B(ref i)", 0);
                let by_value = node(binder, SyntaxKind::InvocationExpression, "B(i)", 0);
                let by_ref = binder.resolve_invocation(by_ref).unwrap();
                let by_value = binder.resolve_invocation(by_value).unwrap();
                assert_ne!(by_ref, by_value);
                assert_eq!(
                    binder.model().method_at(by_ref).parameters[0].mode,
                    PassMode::Ref
                );
            });
        }

        #[test]
        fn optional_params_and_named_arguments() {
            let source = "class C {
                void D(int a, int b = 2) { }
                void P(params int[] xs) { }
                void M() { D(1); D(b: 3, a: 1); P(1, 2, 3); P(); }
            }";
            assert!(resolved(source, "D(1)").is_some());
            assert!(resolved(source, "D(b: 3, a: 1)").is_some());
            assert!(resolved(source, "P(1, 2, 3)").is_some());
            assert!(resolved(source, "P()").is_some());
        }

        #[test]
        fn local_functions_shadow_methods() {
            let source = "class C { void F() { } void M() { F(); void F() { } } }";
            assert_eq!(resolved(source, "F()"), None);
        }

        #[test]
        fn instance_calls_use_the_receiver_type() {
            let source = "class W { public void Go(int a) { } }
                class C { W w; void M(W local) { w.Go(1); local.Go(2); } }";
            assert_eq!(resolved(source, "w.Go(1)"), Some("Go(int)".to_string()));
            assert_eq!(resolved(source, "local.Go(2)"), Some("Go(int)".to_string()));
        }
    }
}
