// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Compilation units, namespaces, type declarations and members.

use super::{ParseResult, Parser};
use crate::kind::SyntaxKind;
use crate::tokenizer::TokenKind;
use crate::tree::Checkpoint;

/// Keyword modifiers on types and members.
const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "virtual", "override", "abstract",
    "sealed", "readonly", "extern", "unsafe", "new", "const", "volatile", "fixed",
];

/// Identifier modifiers, recognised when followed by another modifier or a
/// declaration.
const CONTEXTUAL_MODIFIERS: &[&str] = &["async", "partial", "required", "file"];

/// Parameter modifiers.
pub(super) const PARAMETER_MODIFIERS: &[&str] = &["ref", "out", "in", "params", "this"];

impl Parser<'_> {
    pub(super) fn compilation_unit(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::CompilationUnit);
        while !self.at_eof() {
            self.namespace_member()?;
        }
        // The end-of-file token carries the trailing trivia of the file.
        self.builder.token(self.pos);
        self.finish();
        Ok(())
    }

    fn namespace_member(&mut self) -> ParseResult<()> {
        if self.at_kw("using") || (self.at_contextual("global") && self.nth(1).is_keyword("using"))
        {
            return self.using_directive();
        }
        if self.at_kw("namespace") {
            return self.namespace_declaration();
        }
        self.member()
    }

    fn using_directive(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::UsingDirective);
        if self.at_contextual("global") {
            self.bump();
        }
        self.expect_kw("using")?;
        if self.at_kw("static") {
            self.bump();
        }
        if self.at_identifier() && self.nth(1).is_punct("=") {
            self.bump();
            self.bump();
        }
        self.type_name()?;
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    fn namespace_declaration(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        self.expect_kw("namespace")?;
        self.type_name()?;
        if self.at(";") {
            self.bump();
            self.start_at(cp, SyntaxKind::FileScopedNamespaceDeclaration);
            while !self.at_eof() {
                self.namespace_member()?;
            }
            self.finish();
            return Ok(());
        }
        self.start_at(cp, SyntaxKind::NamespaceDeclaration);
        self.expect("{")?;
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            self.namespace_member()?;
        }
        self.bump();
        if self.at(";") {
            self.bump();
        }
        self.finish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes and modifiers
    // ------------------------------------------------------------------

    /// `[...]` lists, kept as balanced tokens.
    pub(super) fn attribute_lists(&mut self) -> ParseResult<()> {
        while self.at("[") {
            let Some(end) = self.scan_balanced(self.pos) else {
                return Err(self.unexpected("']'"));
            };
            self.start(SyntaxKind::AttributeList);
            while self.pos < end {
                self.bump();
            }
            self.finish();
        }
        Ok(())
    }

    fn at_modifier(&self) -> bool {
        let token = self.current();
        if token.kind == TokenKind::Keyword {
            return MODIFIERS.contains(&token.text.as_str());
        }
        if token.kind == TokenKind::Identifier && CONTEXTUAL_MODIFIERS.contains(&token.text.as_str())
        {
            let next = self.nth(1);
            return next.kind == TokenKind::Keyword
                || (next.kind == TokenKind::Identifier && !self.nth(2).is_punct("("));
        }
        false
    }

    fn modifiers(&mut self) {
        while self.at_modifier() {
            self.bump();
        }
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Any type or member declaration.
    pub(super) fn member(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        let start = self.pos;
        self.attribute_lists()?;
        self.modifiers();

        let token = self.current();
        if token.is_keyword("class") {
            return self.type_declaration(cp, SyntaxKind::ClassDeclaration);
        }
        if token.is_keyword("struct") {
            return self.type_declaration(cp, SyntaxKind::StructDeclaration);
        }
        if token.is_keyword("interface") {
            return self.type_declaration(cp, SyntaxKind::InterfaceDeclaration);
        }
        if token.is_contextual("record")
            && (self.nth(1).is_identifier()
                || self.nth(1).is_keyword("class")
                || self.nth(1).is_keyword("struct"))
        {
            return self.type_declaration(cp, SyntaxKind::RecordDeclaration);
        }
        if token.is_keyword("enum")
            || token.is_keyword("delegate")
            || token.is_keyword("event")
            || token.is_keyword("implicit")
            || token.is_keyword("explicit")
            || token.is_punct("~")
        {
            return self.unknown_member(cp);
        }
        if token.is_identifier() && self.nth(1).is_punct("(") {
            return self.constructor(cp);
        }

        let type_cp = self.checkpoint();
        if self.scan_type(self.pos, true).is_none() {
            if self.pos == start {
                return Err(self.unexpected("member declaration"));
            }
            return self.unknown_member(cp);
        }
        self.ty()?;

        if self.at_kw("this") || self.at_kw("operator") {
            return self.unknown_member(cp);
        }
        if !self.at_identifier() {
            return self.unknown_member(cp);
        }

        let name_cp = self.checkpoint();
        // `I.M(` or `I<T>.M(`: everything before the last segment names the
        // interface.
        if let Some(end) = self.scan_name(self.pos) {
            let dots = self.count_dots(self.pos, end);
            if dots > 0 {
                self.explicit_interface_specifier(dots)?;
            }
        }

        self.expect_identifier()?;
        if self.at("(") || self.at("<") {
            return self.method_rest(cp);
        }
        if self.at("{") || self.at("=>") {
            return self.property_rest(cp);
        }
        if self.at("=") || self.at(";") || self.at(",") {
            return self.field_rest(cp, type_cp, name_cp);
        }
        self.unknown_member(cp)
    }

    /// Dots between `start` and `end` outside of type argument lists.
    fn count_dots(&self, start: usize, end: usize) -> usize {
        let mut depth = 0usize;
        let mut dots = 0;
        for i in start..end {
            let token = self.token_at(i);
            if token.is_punct("<") {
                depth += 1;
            } else if token.is_punct(">") {
                depth = depth.saturating_sub(1);
            } else if token.is_punct(".") && depth == 0 {
                dots += 1;
            }
        }
        dots
    }

    fn explicit_interface_specifier(&mut self, dots: usize) -> ParseResult<()> {
        self.start(SyntaxKind::ExplicitInterfaceSpecifier);
        let cp = self.checkpoint();
        self.simple_type_name()?;
        for _ in 1..dots {
            self.start_at(cp, SyntaxKind::QualifiedName);
            self.expect(".")?;
            self.simple_type_name()?;
            self.finish();
        }
        self.expect(".")?;
        self.finish();
        Ok(())
    }

    fn type_declaration(&mut self, cp: Checkpoint, kind: SyntaxKind) -> ParseResult<()> {
        self.start_at(cp, kind);
        // `class`, `struct`, `interface`, or `record [class|struct]`
        self.bump();
        if kind == SyntaxKind::RecordDeclaration && (self.at_kw("class") || self.at_kw("struct")) {
            self.bump();
        }
        self.expect_identifier()?;
        if self.at("<") {
            self.type_parameter_list()?;
        }
        if self.at("(") {
            self.parameter_list()?;
        }
        if self.at(":") {
            self.start(SyntaxKind::BaseList);
            self.bump();
            self.base_type()?;
            while self.at(",") {
                self.bump();
                self.base_type()?;
            }
            self.finish();
        }
        self.constraint_clauses();
        if self.at(";") {
            self.bump();
            self.finish();
            return Ok(());
        }
        self.expect("{")?;
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            self.member()?;
        }
        self.bump();
        if self.at(";") {
            self.bump();
        }
        self.finish();
        Ok(())
    }

    /// Base type, with primary constructor arguments for records.
    fn base_type(&mut self) -> ParseResult<()> {
        self.ty()?;
        if self.at("(") {
            self.argument_list()?;
        }
        Ok(())
    }

    /// `<T, U>` on a declaration, kept as tokens.
    fn type_parameter_list(&mut self) -> ParseResult<()> {
        let Some(end) = self.scan_balanced(self.pos) else {
            return Err(self.unexpected("'>'"));
        };
        self.start(SyntaxKind::TypeParameterList);
        while self.pos < end {
            self.bump();
        }
        self.finish();
        Ok(())
    }

    /// `where T : ...` clauses, kept as tokens.
    fn constraint_clauses(&mut self) {
        while self.at_contextual("where") && self.nth(1).is_identifier() {
            self.start(SyntaxKind::TypeParameterConstraintClause);
            self.bump();
            let mut depth = 0usize;
            loop {
                let token = self.current();
                if token.kind == TokenKind::EndOfFile {
                    break;
                }
                if depth == 0
                    && (token.is_punct("{")
                        || token.is_punct(";")
                        || token.is_punct("=>")
                        || token.is_contextual("where"))
                {
                    break;
                }
                if token.is_punct("(") || token.is_punct("<") {
                    depth += 1;
                } else if (token.is_punct(")") || token.is_punct(">")) && depth > 0 {
                    depth -= 1;
                }
                self.bump();
            }
            self.finish();
        }
    }

    fn constructor(&mut self, cp: Checkpoint) -> ParseResult<()> {
        self.start_at(cp, SyntaxKind::ConstructorDeclaration);
        self.expect_identifier()?;
        self.parameter_list()?;
        if self.at(":") {
            self.start(SyntaxKind::ConstructorInitializer);
            self.bump();
            if self.at_kw("base") || self.at_kw("this") {
                self.bump();
            } else {
                return Err(self.unexpected("'base' or 'this'"));
            }
            self.argument_list()?;
            self.finish();
        }
        self.member_body()?;
        self.finish();
        Ok(())
    }

    fn method_rest(&mut self, cp: Checkpoint) -> ParseResult<()> {
        self.start_at(cp, SyntaxKind::MethodDeclaration);
        if self.at("<") {
            self.type_parameter_list()?;
        }
        self.parameter_list()?;
        self.constraint_clauses();
        self.member_body()?;
        self.finish();
        Ok(())
    }

    /// Block, `=> expr;` or `;`.
    pub(super) fn member_body(&mut self) -> ParseResult<()> {
        if self.at("{") {
            return self.block();
        }
        if self.at("=>") {
            self.arrow_expression_clause()?;
            return self.expect(";");
        }
        self.expect(";")
    }

    fn arrow_expression_clause(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::ArrowExpressionClause);
        self.expect("=>")?;
        self.expression()?;
        self.finish();
        Ok(())
    }

    fn property_rest(&mut self, cp: Checkpoint) -> ParseResult<()> {
        self.start_at(cp, SyntaxKind::PropertyDeclaration);
        if self.at("=>") {
            self.arrow_expression_clause()?;
            self.expect(";")?;
            self.finish();
            return Ok(());
        }
        self.start(SyntaxKind::AccessorList);
        self.expect("{")?;
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            self.accessor()?;
        }
        self.bump();
        self.finish();
        if self.at("=") {
            self.equals_value_clause()?;
            self.expect(";")?;
        }
        self.finish();
        Ok(())
    }

    fn accessor(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::AccessorDeclaration);
        self.attribute_lists()?;
        self.modifiers();
        let token = self.current();
        let is_accessor_keyword = matches!(
            token.text.as_str(),
            "get" | "set" | "init" | "add" | "remove"
        ) && token.kind == TokenKind::Identifier;
        if !is_accessor_keyword {
            return Err(self.unexpected("accessor"));
        }
        self.bump();
        self.member_body()?;
        self.finish();
        Ok(())
    }

    /// Fields: the type and the first name are already in the tree.
    fn field_rest(
        &mut self,
        cp: Checkpoint,
        type_cp: Checkpoint,
        name_cp: Checkpoint,
    ) -> ParseResult<()> {
        self.start_at(name_cp, SyntaxKind::VariableDeclarator);
        if self.at("=") {
            self.equals_value_clause()?;
        }
        self.finish();
        self.more_declarators()?;
        self.wrap(type_cp, SyntaxKind::VariableDeclaration);
        self.expect(";")?;
        self.wrap(cp, SyntaxKind::FieldDeclaration);
        Ok(())
    }

    /// `, name [= value]` repeated.
    pub(super) fn more_declarators(&mut self) -> ParseResult<()> {
        while self.at(",") {
            self.bump();
            self.start(SyntaxKind::VariableDeclarator);
            self.expect_identifier()?;
            if self.at("=") {
                self.equals_value_clause()?;
            }
            self.finish();
        }
        Ok(())
    }

    /// Unrecognised member: tokens up to `;` or a closing `}` at depth zero.
    fn unknown_member(&mut self, cp: Checkpoint) -> ParseResult<()> {
        self.start_at(cp, SyntaxKind::UnknownMember);
        let mut depth = 0usize;
        let mut expression_bodied = false;
        loop {
            let token = self.current();
            if token.kind == TokenKind::EndOfFile {
                return Err(self.unexpected("';' or '}'"));
            }
            let closer = token.is_punct(")") || token.is_punct("]") || token.is_punct("}");
            if depth == 0 && closer {
                return Err(self.unexpected("member declaration"));
            }
            if token.is_punct("(") || token.is_punct("[") || token.is_punct("{") {
                depth += 1;
            } else if closer {
                depth -= 1;
            } else if depth == 0 && (token.is_punct("=>") || token.is_punct("=")) {
                expression_bodied = true;
            }
            let closes_body = depth == 0 && token.is_punct("}") && !expression_bodied;
            let ends_statement = depth == 0 && token.is_punct(";");
            self.bump();
            if ends_statement {
                break;
            }
            if closes_body {
                if self.at(";") {
                    self.bump();
                }
                break;
            }
        }
        self.finish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    pub(super) fn parameter_list(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::ParameterList);
        self.expect("(")?;
        if !self.at(")") {
            self.parameter()?;
            while self.at(",") {
                self.bump();
                self.parameter()?;
            }
        }
        self.expect(")")?;
        self.finish();
        Ok(())
    }

    fn parameter(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::Parameter);
        self.attribute_lists()?;
        loop {
            let token = self.current();
            let keyword = token.kind == TokenKind::Keyword
                && (PARAMETER_MODIFIERS.contains(&token.text.as_str())
                    || token.text == "readonly");
            let scoped = token.is_contextual("scoped") && self.nth(1).kind != TokenKind::Punctuation;
            if keyword || scoped {
                self.bump();
            } else {
                break;
            }
        }
        self.ty()?;
        self.expect_identifier()?;
        if self.at("=") {
            self.equals_value_clause()?;
        }
        self.finish();
        Ok(())
    }

    pub(super) fn equals_value_clause(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::EqualsValueClause);
        self.expect("=")?;
        if self.at("{") {
            self.initializer()?;
        } else {
            self.expression()?;
        }
        self.finish();
        Ok(())
    }
}
