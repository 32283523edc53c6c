// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Expressions, arguments, initializers and patterns.
//!
//! Precedence, loosest first: lambda/assignment, conditional, `??`, then the
//! binary levels in [`BINARY_LEVELS`], then unary and postfix.

use super::{ParseResult, Parser, PREDEFINED_TYPES};
use crate::kind::SyntaxKind;
use crate::tokenizer::TokenKind;
use crate::tree::Checkpoint;

/// Binary operator levels, loosest first. `is`/`as` share the relational
/// level; shifts are matched from adjacent `>` tokens.
const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "!="],
    &["<", ">", "<=", ">="],
    &["<<"],
    &["+", "-"],
    &["*", "/", "%"],
];

const RELATIONAL_LEVEL: usize = 6;
const SHIFT_LEVEL: usize = 7;

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", "??=",
];

const PREFIX_OPERATORS: &[&str] = &["+", "-", "!", "~", "++", "--"];

/// Tokens that may follow `Name<T>` for it to be read as a generic name.
const GENERIC_FOLLOW: &[&str] = &[
    "(", ")", "]", "}", ":", ";", ",", ".", "?", "?.", "==", "!=", "|", "^", "&&", "||", "&", "[",
];

#[derive(Debug, Clone, Copy)]
enum LambdaShape {
    Simple,
    Parenthesized,
}

impl Parser<'_> {
    /// Any expression, including assignments and lambdas.
    pub(super) fn expression(&mut self) -> ParseResult<()> {
        if let Some(shape) = self.lambda_at() {
            return self.lambda(shape);
        }
        let cp = self.checkpoint();
        self.conditional()?;
        if let Some(len) = self.assignment_operator() {
            self.start_at(cp, SyntaxKind::AssignmentExpression);
            for _ in 0..len {
                self.bump();
            }
            self.expression()?;
            self.finish();
        }
        Ok(())
    }

    /// Token count of the assignment operator at the cursor.
    fn assignment_operator(&self) -> Option<usize> {
        let token = self.current();
        if ASSIGNMENT_OPERATORS.iter().any(|op| token.is_punct(op)) {
            return Some(1);
        }
        // `>>=` arrives as `>` `>=`.
        (token.is_punct(">") && self.nth(1).is_punct(">=") && self.adjacent_at(self.pos + 1))
            .then_some(2)
    }

    fn conditional(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        self.coalesce()?;
        if self.at("?") {
            self.start_at(cp, SyntaxKind::ConditionalExpression);
            self.bump();
            self.expression()?;
            self.expect(":")?;
            self.expression()?;
            self.finish();
        }
        Ok(())
    }

    fn coalesce(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        self.binary(0)?;
        if self.at("??") {
            self.start_at(cp, SyntaxKind::BinaryExpression);
            self.bump();
            self.coalesce()?;
            self.finish();
        }
        Ok(())
    }

    fn binary(&mut self, level: usize) -> ParseResult<()> {
        if level == BINARY_LEVELS.len() {
            return self.unary();
        }
        let cp = self.checkpoint();
        self.binary(level + 1)?;
        loop {
            if level == RELATIONAL_LEVEL && self.at_kw("is") {
                self.start_at(cp, SyntaxKind::IsPatternExpression);
                self.bump();
                self.pattern()?;
                self.finish();
                continue;
            }
            if level == RELATIONAL_LEVEL && self.at_kw("as") {
                self.start_at(cp, SyntaxKind::AsExpression);
                self.bump();
                self.ty_without_nullable()?;
                self.finish();
                continue;
            }
            let Some(len) = self.binary_operator(level) else {
                break;
            };
            self.start_at(cp, SyntaxKind::BinaryExpression);
            for _ in 0..len {
                self.bump();
            }
            self.binary(level + 1)?;
            self.finish();
        }
        Ok(())
    }

    /// Token count of a binary operator of `level` at the cursor.
    fn binary_operator(&self, level: usize) -> Option<usize> {
        let token = self.current();
        let glued_next = |text: &str| self.nth(1).is_punct(text) && self.adjacent_at(self.pos + 1);
        if token.is_punct(">") {
            let shift = glued_next(">");
            let shift_assign = glued_next(">=");
            return match level {
                SHIFT_LEVEL if shift => Some(2),
                RELATIONAL_LEVEL if !shift && !shift_assign => Some(1),
                _ => None,
            };
        }
        BINARY_LEVELS[level]
            .iter()
            .any(|op| token.is_punct(op))
            .then_some(1)
    }

    fn unary(&mut self) -> ParseResult<()> {
        let token = self.current();
        if PREFIX_OPERATORS.iter().any(|op| token.is_punct(op)) {
            self.start(SyntaxKind::PrefixUnaryExpression);
            self.bump();
            self.unary()?;
            self.finish();
            return Ok(());
        }
        if token.is_contextual("await") && self.starts_operand(self.pos + 1) {
            self.start(SyntaxKind::AwaitExpression);
            self.bump();
            self.unary()?;
            self.finish();
            return Ok(());
        }
        if token.is_keyword("throw") {
            self.start(SyntaxKind::ThrowExpression);
            self.bump();
            self.expression()?;
            self.finish();
            return Ok(());
        }
        if token.is_punct("(") && self.is_cast_at(self.pos) {
            self.start(SyntaxKind::CastExpression);
            self.bump();
            self.ty()?;
            self.expect(")")?;
            self.unary()?;
            self.finish();
            return Ok(());
        }
        self.postfix()
    }

    /// True if the token at `index` can begin an operand of a unary operator.
    fn starts_operand(&self, index: usize) -> bool {
        let token = self.token_at(index);
        match token.kind {
            TokenKind::Identifier
            | TokenKind::IntegerLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharacterLiteral => true,
            TokenKind::Keyword => matches!(
                token.text.as_str(),
                "this" | "base" | "new" | "typeof" | "default" | "true" | "false" | "null"
            ) || PREDEFINED_TYPES.contains(&token.text.as_str()),
            TokenKind::Punctuation => {
                token.is_punct("(") || token.is_punct("!") || token.is_punct("~")
            }
            TokenKind::EndOfFile => false,
        }
    }

    /// `(Type)operand`.
    fn is_cast_at(&self, index: usize) -> bool {
        let Some(end) = self.scan_type(index + 1, true) else {
            return false;
        };
        if !self.is_punct_at(end, ")") {
            return false;
        }
        let inner = self.token_at(index + 1);
        let predefined = inner.kind == TokenKind::Keyword;
        let next = self.token_at(end + 1);
        if predefined
            && (next.is_punct("-") || next.is_punct("+") || next.is_punct("++") || next.is_punct("--"))
        {
            return true;
        }
        self.starts_operand(end + 1)
    }

    fn postfix(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        self.primary()?;
        self.postfix_operators(cp)
    }

    fn postfix_operators(&mut self, cp: Checkpoint) -> ParseResult<()> {
        loop {
            if self.at(".") || self.at("::") {
                self.start_at(cp, SyntaxKind::MemberAccessExpression);
                self.bump();
                self.simple_name()?;
                self.finish();
            } else if self.at("?.") {
                self.start_at(cp, SyntaxKind::ConditionalAccessExpression);
                self.bump();
                let inner = self.checkpoint();
                self.start(SyntaxKind::MemberBindingExpression);
                self.simple_name()?;
                self.finish();
                self.postfix_operators(inner)?;
                self.finish();
                return Ok(());
            } else if self.at("?") && self.nth(1).is_punct("[") && self.adjacent_at(self.pos + 1) {
                self.start_at(cp, SyntaxKind::ConditionalAccessExpression);
                self.bump();
                let inner = self.checkpoint();
                self.start(SyntaxKind::ElementBindingExpression);
                self.bracketed_argument_list()?;
                self.finish();
                self.postfix_operators(inner)?;
                self.finish();
                return Ok(());
            } else if self.at("(") {
                self.start_at(cp, SyntaxKind::InvocationExpression);
                self.argument_list()?;
                self.finish();
            } else if self.at("[") {
                self.start_at(cp, SyntaxKind::ElementAccessExpression);
                self.bracketed_argument_list()?;
                self.finish();
            } else if self.at("++") || self.at("--") || self.at_null_forgiving() {
                self.start_at(cp, SyntaxKind::PostfixUnaryExpression);
                self.bump();
                self.finish();
            } else {
                return Ok(());
            }
        }
    }

    fn at_null_forgiving(&self) -> bool {
        self.at("!")
            && [".", "?.", ")", ";", ",", "]", "[", "}"]
                .iter()
                .any(|p| self.nth(1).is_punct(p))
    }

    /// Identifier or generic name in expression position.
    fn simple_name(&mut self) -> ParseResult<()> {
        if !self.at_identifier() {
            return Err(self.unexpected("identifier"));
        }
        if let Some(end) = self.scan_type_args(self.pos + 1) {
            let follow = self.token_at(end);
            if follow.kind == TokenKind::EndOfFile
                || GENERIC_FOLLOW.iter().any(|p| follow.is_punct(p))
            {
                self.start(SyntaxKind::GenericName);
                self.bump();
                self.type_argument_list()?;
                self.finish();
                return Ok(());
            }
        }
        self.start(SyntaxKind::IdentifierName);
        self.bump();
        self.finish();
        Ok(())
    }

    fn primary(&mut self) -> ParseResult<()> {
        let token = self.current();
        match token.kind {
            TokenKind::IntegerLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharacterLiteral => return self.literal(),
            TokenKind::Identifier => {
                if token.is_contextual("var") && self.is_deconstruction_at(self.pos) {
                    return self.deconstruction_declaration();
                }
                return self.simple_name();
            }
            TokenKind::Keyword => match token.text.as_str() {
                "true" | "false" | "null" => return self.literal(),
                "this" => return self.single(SyntaxKind::ThisExpression),
                "base" => return self.single(SyntaxKind::BaseExpression),
                "new" => return self.creation(),
                "typeof" => return self.type_operator(SyntaxKind::TypeOfExpression),
                "default" if self.nth(1).is_punct("(") => {
                    return self.type_operator(SyntaxKind::DefaultExpression)
                }
                "default" => return self.literal(),
                text if PREDEFINED_TYPES.contains(&text) => {
                    return self.single(SyntaxKind::PredefinedType)
                }
                _ => {}
            },
            TokenKind::Punctuation if token.is_punct("(") => return self.parenthesized_or_tuple(),
            _ => {}
        }
        Err(self.unexpected("expression"))
    }

    fn single(&mut self, kind: SyntaxKind) -> ParseResult<()> {
        self.start(kind);
        self.bump();
        self.finish();
        Ok(())
    }

    fn literal(&mut self) -> ParseResult<()> {
        self.single(SyntaxKind::LiteralExpression)
    }

    /// `typeof(T)` or `default(T)`.
    fn type_operator(&mut self, kind: SyntaxKind) -> ParseResult<()> {
        self.start(kind);
        self.bump();
        self.expect("(")?;
        self.ty()?;
        self.expect(")")?;
        self.finish();
        Ok(())
    }

    fn parenthesized_or_tuple(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        self.expect("(")?;
        let first = self.checkpoint();
        let forced_tuple = self.tuple_element()?;
        if self.at(",") || forced_tuple {
            self.wrap(first, SyntaxKind::Argument);
            while self.at(",") {
                self.bump();
                self.start(SyntaxKind::Argument);
                self.tuple_element()?;
                self.finish();
            }
            self.expect(")")?;
            self.wrap(cp, SyntaxKind::TupleExpression);
        } else {
            self.expect(")")?;
            self.wrap(cp, SyntaxKind::ParenthesizedExpression);
        }
        Ok(())
    }

    /// One tuple element; returns true if it can only be a tuple element
    /// (named or declaring).
    fn tuple_element(&mut self) -> ParseResult<bool> {
        let mut forced = false;
        if self.at_name_colon() {
            self.name_colon();
            forced = true;
        }
        if self.scan_typed_name(self.pos, &[",", ")"]).is_some() {
            self.declaration_expression()?;
            forced = true;
        } else {
            self.expression()?;
        }
        Ok(forced)
    }

    fn at_name_colon(&self) -> bool {
        self.at_identifier() && self.nth(1).is_punct(":")
    }

    fn name_colon(&mut self) {
        self.start(SyntaxKind::NameColon);
        self.start(SyntaxKind::IdentifierName);
        self.bump();
        self.finish();
        self.bump();
        self.finish();
    }

    /// `Type name` as an expression (`out var x`, `(int a, int b) = ...`).
    fn declaration_expression(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::DeclarationExpression);
        self.ty()?;
        self.single_variable_designation()?;
        self.finish();
        Ok(())
    }

    fn single_variable_designation(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::SingleVariableDesignation);
        self.expect_identifier()?;
        self.finish();
        Ok(())
    }

    /// `var (a, b) =`
    fn is_deconstruction_at(&self, index: usize) -> bool {
        if !self.is_punct_at(index + 1, "(") {
            return false;
        }
        let mut i = index + 2;
        loop {
            if !self.token_at(i).is_identifier() {
                return false;
            }
            i += 1;
            if self.is_punct_at(i, ",") {
                i += 1;
                continue;
            }
            return self.is_punct_at(i, ")") && self.is_punct_at(i + 1, "=");
        }
    }

    fn deconstruction_declaration(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::DeclarationExpression);
        self.single(SyntaxKind::IdentifierName)?;
        self.start(SyntaxKind::ParenthesizedVariableDesignation);
        self.expect("(")?;
        self.single_variable_designation()?;
        while self.at(",") {
            self.bump();
            self.single_variable_designation()?;
        }
        self.expect(")")?;
        self.finish();
        self.finish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Object and array creation
    // ------------------------------------------------------------------

    fn creation(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        self.expect_kw("new")?;
        if self.at("(") || self.at("{") {
            if self.at("(") {
                self.argument_list()?;
            }
            if self.at("{") {
                self.initializer()?;
            }
            self.wrap(cp, SyntaxKind::ImplicitObjectCreationExpression);
            return Ok(());
        }
        if self.at("[") {
            self.bump();
            while self.at(",") {
                self.bump();
            }
            self.expect("]")?;
            self.initializer()?;
            self.wrap(cp, SyntaxKind::ImplicitArrayCreationExpression);
            return Ok(());
        }

        let type_cp = self.checkpoint();
        self.ty()?;
        if self.at("[") {
            // `new int[n]` and `new int[n][]`: sized ranks.
            self.start_at(type_cp, SyntaxKind::ArrayType);
            while self.at("[") {
                self.start(SyntaxKind::ArrayRankSpecifier);
                self.bump();
                while !self.at("]") {
                    if self.at(",") {
                        self.bump();
                    } else {
                        self.expression()?;
                    }
                }
                self.bump();
                self.finish();
            }
            self.finish();
            if self.at("{") {
                self.initializer()?;
            }
            self.wrap(cp, SyntaxKind::ArrayCreationExpression);
            return Ok(());
        }
        if self.tokens[self.pos - 1].is_punct("]") {
            self.initializer()?;
            self.wrap(cp, SyntaxKind::ArrayCreationExpression);
            return Ok(());
        }
        if self.at("(") {
            self.argument_list()?;
        }
        if self.at("{") {
            self.initializer()?;
        }
        self.wrap(cp, SyntaxKind::ObjectCreationExpression);
        Ok(())
    }

    /// `{ a, b }`, `{ A = 1 }` or nested `{ { 1, 2 } }`.
    pub(super) fn initializer(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::InitializerExpression);
        self.expect("{")?;
        while !self.at("}") {
            if self.at("{") {
                self.initializer()?;
            } else {
                self.expression()?;
            }
            if self.at(",") {
                self.bump();
            } else {
                break;
            }
        }
        self.expect("}")?;
        self.finish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Arguments
    // ------------------------------------------------------------------

    pub(super) fn argument_list(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::ArgumentList);
        self.arguments("(", ")")?;
        self.finish();
        Ok(())
    }

    fn bracketed_argument_list(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::BracketedArgumentList);
        self.arguments("[", "]")?;
        self.finish();
        Ok(())
    }

    fn arguments(&mut self, open: &str, close: &str) -> ParseResult<()> {
        self.expect(open)?;
        if !self.at(close) {
            self.argument(close)?;
            while self.at(",") {
                self.bump();
                self.argument(close)?;
            }
        }
        self.expect(close)
    }

    fn argument(&mut self, close: &str) -> ParseResult<()> {
        self.start(SyntaxKind::Argument);
        if self.at_name_colon() {
            self.name_colon();
        }
        if self.at_kw("ref") || self.at_kw("out") || self.at_kw("in") {
            self.bump();
        }
        if self.scan_typed_name(self.pos, &[",", close]).is_some() {
            self.declaration_expression()?;
        } else {
            self.expression()?;
        }
        self.finish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------

    /// Pattern after `is`.
    fn pattern(&mut self) -> ParseResult<()> {
        if self.at_contextual("not") && self.nth(1).kind != TokenKind::Punctuation {
            self.start(SyntaxKind::NotPattern);
            self.bump();
            self.pattern()?;
            self.finish();
            return Ok(());
        }
        let token = self.current();
        let constant = token.is_literal()
            || token.is_keyword("null")
            || token.is_keyword("true")
            || token.is_keyword("false")
            || token.is_punct("-");
        if !constant {
            if let Some(end) = self.scan_type(self.pos, false) {
                let next = self.token_at(end);
                let designation = next.is_identifier()
                    && !["and", "or", "when"].contains(&next.text.as_str());
                if designation {
                    return self.declaration_pattern_with(false);
                }
                self.start(SyntaxKind::TypePattern);
                self.ty_without_nullable()?;
                self.finish();
                return Ok(());
            }
        }
        self.start(SyntaxKind::ConstantPattern);
        self.binary(SHIFT_LEVEL)?;
        self.finish();
        Ok(())
    }

    /// `Type name` in a `case` label.
    pub(super) fn declaration_pattern(&mut self) -> ParseResult<()> {
        self.declaration_pattern_with(true)
    }

    fn declaration_pattern_with(&mut self, nullable: bool) -> ParseResult<()> {
        self.start(SyntaxKind::DeclarationPattern);
        if nullable {
            self.ty()?;
        } else {
            self.ty_without_nullable()?;
        }
        self.single_variable_designation()?;
        self.finish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lambdas
    // ------------------------------------------------------------------

    fn lambda_at(&self) -> Option<LambdaShape> {
        let mut i = self.pos;
        if self.token_at(i).is_contextual("async")
            && (self.token_at(i + 1).is_identifier() || self.is_punct_at(i + 1, "("))
        {
            i += 1;
        }
        if self.token_at(i).is_identifier() && self.is_punct_at(i + 1, "=>") {
            return Some(LambdaShape::Simple);
        }
        if self.is_punct_at(i, "(") {
            let end = self.scan_balanced(i)?;
            if self.is_punct_at(end, "=>") {
                return Some(LambdaShape::Parenthesized);
            }
        }
        None
    }

    fn lambda(&mut self, shape: LambdaShape) -> ParseResult<()> {
        match shape {
            LambdaShape::Simple => {
                self.start(SyntaxKind::SimpleLambdaExpression);
                if self.at_contextual("async") && !self.nth(1).is_punct("=>") {
                    self.bump();
                }
                self.start(SyntaxKind::Parameter);
                self.expect_identifier()?;
                self.finish();
            }
            LambdaShape::Parenthesized => {
                self.start(SyntaxKind::ParenthesizedLambdaExpression);
                if self.at_contextual("async") {
                    self.bump();
                }
                self.lambda_parameter_list()?;
            }
        }
        self.expect("=>")?;
        if self.at("{") {
            self.block()?;
        } else {
            self.expression()?;
        }
        self.finish();
        Ok(())
    }

    fn lambda_parameter_list(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::ParameterList);
        self.expect("(")?;
        while !self.at(")") {
            self.start(SyntaxKind::Parameter);
            while self.at_kw("ref") || self.at_kw("out") || self.at_kw("in") {
                self.bump();
            }
            if self.scan_typed_name(self.pos, &[",", ")"]).is_some() {
                self.ty()?;
            }
            self.expect_identifier()?;
            self.finish();
            if self.at(",") {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(")")?;
        self.finish();
        Ok(())
    }
}
