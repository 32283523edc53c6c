// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node kinds of the C# syntax tree.

use serde::Serialize;

/// Kind of a syntax node.
///
/// Tokens are not nodes; they hang off nodes as [`crate::tree::Element::Token`]
/// children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SyntaxKind {
    // Top level
    CompilationUnit,
    UsingDirective,
    NamespaceDeclaration,
    FileScopedNamespaceDeclaration,

    // Types and members
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    RecordDeclaration,
    BaseList,
    AttributeList,
    TypeParameterList,
    TypeParameterConstraintClause,
    MethodDeclaration,
    ConstructorDeclaration,
    ConstructorInitializer,
    FieldDeclaration,
    PropertyDeclaration,
    AccessorList,
    AccessorDeclaration,
    ArrowExpressionClause,
    ExplicitInterfaceSpecifier,
    ParameterList,
    Parameter,
    EqualsValueClause,
    /// enum, delegate, event, operator, indexer, destructor: kept as tokens.
    UnknownMember,

    // Type syntax
    PredefinedType,
    IdentifierName,
    GenericName,
    TypeArgumentList,
    QualifiedName,
    ArrayType,
    ArrayRankSpecifier,
    NullableType,
    TupleType,
    TupleElement,

    // Statements
    Block,
    LocalDeclarationStatement,
    LocalFunctionStatement,
    VariableDeclaration,
    VariableDeclarator,
    ExpressionStatement,
    IfStatement,
    ElseClause,
    ReturnStatement,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForEachStatement,
    ThrowStatement,
    BreakStatement,
    ContinueStatement,
    YieldReturnStatement,
    YieldBreakStatement,
    EmptyStatement,
    TryStatement,
    CatchClause,
    CatchDeclaration,
    FinallyClause,
    SwitchStatement,
    SwitchSection,
    CaseSwitchLabel,
    DefaultSwitchLabel,
    UsingStatement,
    LockStatement,

    // Expressions
    LiteralExpression,
    ThisExpression,
    BaseExpression,
    MemberAccessExpression,
    InvocationExpression,
    ArgumentList,
    BracketedArgumentList,
    Argument,
    NameColon,
    ParenthesizedExpression,
    TupleExpression,
    DeclarationExpression,
    SingleVariableDesignation,
    ParenthesizedVariableDesignation,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    AwaitExpression,
    BinaryExpression,
    AsExpression,
    IsPatternExpression,
    ConstantPattern,
    DeclarationPattern,
    TypePattern,
    NotPattern,
    CastExpression,
    AssignmentExpression,
    ConditionalExpression,
    ConditionalAccessExpression,
    MemberBindingExpression,
    ElementBindingExpression,
    ElementAccessExpression,
    ObjectCreationExpression,
    ImplicitObjectCreationExpression,
    InitializerExpression,
    ArrayCreationExpression,
    ImplicitArrayCreationExpression,
    TypeOfExpression,
    DefaultExpression,
    SimpleLambdaExpression,
    ParenthesizedLambdaExpression,
    ThrowExpression,
}

impl SyntaxKind {
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::RecordDeclaration
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::LocalDeclarationStatement
                | SyntaxKind::LocalFunctionStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::IfStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::ForEachStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::BreakStatement
                | SyntaxKind::ContinueStatement
                | SyntaxKind::YieldReturnStatement
                | SyntaxKind::YieldBreakStatement
                | SyntaxKind::EmptyStatement
                | SyntaxKind::TryStatement
                | SyntaxKind::SwitchStatement
                | SyntaxKind::UsingStatement
                | SyntaxKind::LockStatement
        )
    }

    /// Kinds that can appear where a type is expected.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::PredefinedType
                | SyntaxKind::IdentifierName
                | SyntaxKind::GenericName
                | SyntaxKind::QualifiedName
                | SyntaxKind::ArrayType
                | SyntaxKind::NullableType
                | SyntaxKind::TupleType
        )
    }

    pub fn is_lambda(self) -> bool {
        matches!(
            self,
            SyntaxKind::SimpleLambdaExpression | SyntaxKind::ParenthesizedLambdaExpression
        )
    }

    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            SyntaxKind::ConstantPattern
                | SyntaxKind::DeclarationPattern
                | SyntaxKind::TypePattern
                | SyntaxKind::NotPattern
        )
    }
}
