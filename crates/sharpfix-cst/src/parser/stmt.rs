// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Statements and blocks.

use super::{ParseResult, Parser};
use crate::kind::SyntaxKind;
use crate::tokenizer::TokenKind;

impl Parser<'_> {
    pub(super) fn block(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::Block);
        self.expect("{")?;
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            self.statement()?;
        }
        self.bump();
        self.finish();
        Ok(())
    }

    pub(super) fn statement(&mut self) -> ParseResult<()> {
        let token = self.current();
        match token.kind {
            TokenKind::Punctuation => match token.text.as_str() {
                "{" => return self.block(),
                ";" => return self.simple(SyntaxKind::EmptyStatement),
                _ => {}
            },
            TokenKind::Keyword => match token.text.as_str() {
                "if" => return self.if_statement(),
                "while" => return self.while_statement(),
                "do" => return self.do_statement(),
                "for" => return self.for_statement(),
                "foreach" => return self.foreach_statement(),
                "return" => return self.return_like(SyntaxKind::ReturnStatement),
                "throw" => return self.return_like(SyntaxKind::ThrowStatement),
                "break" => return self.simple(SyntaxKind::BreakStatement),
                "continue" => return self.simple(SyntaxKind::ContinueStatement),
                "try" => return self.try_statement(),
                "switch" => return self.switch_statement(),
                "lock" => return self.lock_statement(),
                "using" => return self.using_statement(),
                "const" => return self.local_declaration(),
                "static" => return self.local_function(),
                _ => {}
            },
            TokenKind::Identifier => {
                if token.text == "yield" {
                    if self.nth(1).is_keyword("return") {
                        return self.yield_return();
                    }
                    if self.nth(1).is_keyword("break") {
                        return self.yield_break();
                    }
                }
                if token.text == "async" && self.is_local_function_at(self.pos + 1) {
                    return self.local_function();
                }
            }
            _ => {}
        }

        if self.is_local_declaration_at(self.pos) {
            return self.local_declaration();
        }
        if self.is_local_function_at(self.pos) {
            return self.local_function();
        }
        self.expression_statement()
    }

    /// `Type name =`, `Type name;` or `Type name,`.
    fn is_local_declaration_at(&self, index: usize) -> bool {
        let token = self.token_at(index);
        // `await x;` and `yield x` read as expressions, not declarations.
        if token.is_contextual("await") || token.is_contextual("yield") {
            return false;
        }
        self.scan_typed_name(index, &["=", ";", ","]).is_some()
    }

    /// `Type Name(...) {` or `Type Name(...) =>`.
    fn is_local_function_at(&self, index: usize) -> bool {
        let token = self.token_at(index);
        if token.is_contextual("await") {
            return false;
        }
        let Some(after_type) = self.scan_type(index, true) else {
            return false;
        };
        if !self.token_at(after_type).is_identifier() {
            return false;
        }
        let mut i = after_type + 1;
        if self.is_punct_at(i, "<") {
            let Some(end) = self.scan_balanced(i) else {
                return false;
            };
            i = end;
        }
        if !self.is_punct_at(i, "(") {
            return false;
        }
        let Some(end) = self.scan_balanced(i) else {
            return false;
        };
        let next = self.token_at(end);
        next.is_punct("{") || next.is_punct("=>") || next.is_contextual("where")
    }

    fn simple(&mut self, kind: SyntaxKind) -> ParseResult<()> {
        self.start(kind);
        self.bump();
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    fn return_like(&mut self, kind: SyntaxKind) -> ParseResult<()> {
        self.start(kind);
        self.bump();
        if !self.at(";") {
            self.expression()?;
        }
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    fn yield_return(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::YieldReturnStatement);
        self.bump();
        self.bump();
        self.expression()?;
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    fn yield_break(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::YieldBreakStatement);
        self.bump();
        self.bump();
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    fn expression_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::ExpressionStatement);
        self.expression()?;
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    /// `(expr)` as used by `if`, `while`, `switch` and `lock`.
    fn parenthesized_condition(&mut self) -> ParseResult<()> {
        self.expect("(")?;
        self.expression()?;
        self.expect(")")
    }

    fn if_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::IfStatement);
        self.bump();
        self.parenthesized_condition()?;
        self.statement()?;
        if self.at_kw("else") {
            self.start(SyntaxKind::ElseClause);
            self.bump();
            self.statement()?;
            self.finish();
        }
        self.finish();
        Ok(())
    }

    fn while_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::WhileStatement);
        self.bump();
        self.parenthesized_condition()?;
        self.statement()?;
        self.finish();
        Ok(())
    }

    fn do_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::DoStatement);
        self.bump();
        self.statement()?;
        self.expect_kw("while")?;
        self.parenthesized_condition()?;
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    fn for_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::ForStatement);
        self.bump();
        self.expect("(")?;
        if self.is_local_declaration_at(self.pos) {
            self.variable_declaration()?;
        } else if !self.at(";") {
            self.expression_list()?;
        }
        self.expect(";")?;
        if !self.at(";") {
            self.expression()?;
        }
        self.expect(";")?;
        if !self.at(")") {
            self.expression_list()?;
        }
        self.expect(")")?;
        self.statement()?;
        self.finish();
        Ok(())
    }

    fn expression_list(&mut self) -> ParseResult<()> {
        self.expression()?;
        while self.at(",") {
            self.bump();
            self.expression()?;
        }
        Ok(())
    }

    fn foreach_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::ForEachStatement);
        self.bump();
        self.expect("(")?;
        self.ty()?;
        self.expect_identifier()?;
        self.expect_kw("in")?;
        self.expression()?;
        self.expect(")")?;
        self.statement()?;
        self.finish();
        Ok(())
    }

    fn try_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::TryStatement);
        self.bump();
        self.block()?;
        while self.at_kw("catch") {
            self.start(SyntaxKind::CatchClause);
            self.bump();
            if self.at("(") {
                self.start(SyntaxKind::CatchDeclaration);
                self.bump();
                self.ty()?;
                if self.at_identifier() {
                    self.bump();
                }
                self.expect(")")?;
                self.finish();
            }
            if self.at_contextual("when") {
                self.bump();
                self.parenthesized_condition()?;
            }
            self.block()?;
            self.finish();
        }
        if self.at_kw("finally") {
            self.start(SyntaxKind::FinallyClause);
            self.bump();
            self.block()?;
            self.finish();
        }
        self.finish();
        Ok(())
    }

    fn switch_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::SwitchStatement);
        self.bump();
        self.parenthesized_condition()?;
        self.expect("{")?;
        while !self.at("}") {
            if !(self.at_kw("case") || (self.at_kw("default") && self.nth(1).is_punct(":"))) {
                return Err(self.unexpected("'case' or 'default'"));
            }
            self.switch_section()?;
        }
        self.bump();
        self.finish();
        Ok(())
    }

    fn switch_section(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::SwitchSection);
        while self.at_kw("case") || (self.at_kw("default") && self.nth(1).is_punct(":")) {
            if self.at_kw("default") {
                self.start(SyntaxKind::DefaultSwitchLabel);
                self.bump();
                self.bump();
                self.finish();
                continue;
            }
            self.start(SyntaxKind::CaseSwitchLabel);
            self.bump();
            if self.scan_typed_name(self.pos, &[":", "when"]).is_some() {
                self.declaration_pattern()?;
            } else {
                self.expression()?;
            }
            if self.at_contextual("when") {
                self.bump();
                self.expression()?;
            }
            self.expect(":")?;
            self.finish();
        }
        while !(self.at("}") || self.at_kw("case") || self.at_kw("default") || self.at_eof()) {
            self.statement()?;
        }
        self.finish();
        Ok(())
    }

    fn lock_statement(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::LockStatement);
        self.bump();
        self.parenthesized_condition()?;
        self.statement()?;
        self.finish();
        Ok(())
    }

    /// `using (...) stmt` or `using var x = ...;`.
    fn using_statement(&mut self) -> ParseResult<()> {
        if !self.nth(1).is_punct("(") {
            return self.local_declaration();
        }
        self.start(SyntaxKind::UsingStatement);
        self.bump();
        self.expect("(")?;
        if self.is_local_declaration_at(self.pos) {
            self.variable_declaration()?;
        } else {
            self.expression()?;
        }
        self.expect(")")?;
        self.statement()?;
        self.finish();
        Ok(())
    }

    /// `[using] [const] Type a = 1, b;`
    fn local_declaration(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::LocalDeclarationStatement);
        if self.at_kw("using") {
            self.bump();
        }
        if self.at_kw("const") {
            self.bump();
        }
        self.variable_declaration()?;
        self.expect(";")?;
        self.finish();
        Ok(())
    }

    pub(super) fn variable_declaration(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::VariableDeclaration);
        self.ty()?;
        self.start(SyntaxKind::VariableDeclarator);
        self.expect_identifier()?;
        if self.at("=") {
            self.equals_value_clause()?;
        }
        self.finish();
        self.more_declarators()?;
        self.finish();
        Ok(())
    }

    fn local_function(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::LocalFunctionStatement);
        while self.at_kw("static") || self.at_contextual("async") || self.at_kw("unsafe") {
            self.bump();
        }
        self.ty()?;
        self.expect_identifier()?;
        if self.at("<") {
            let Some(end) = self.scan_balanced(self.pos) else {
                return Err(self.unexpected("'>'"));
            };
            self.start(SyntaxKind::TypeParameterList);
            while self.pos < end {
                self.bump();
            }
            self.finish();
        }
        self.parameter_list()?;
        while self.at_contextual("where") {
            self.start(SyntaxKind::TypeParameterConstraintClause);
            while !(self.at("{") || self.at("=>") || self.at_eof()) {
                self.bump();
            }
            self.finish();
        }
        self.member_body()?;
        self.finish();
        Ok(())
    }
}
