// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Type syntax: predefined, named, generic, qualified, array, nullable and
//! tuple types.

use super::{ParseResult, Parser, PREDEFINED_TYPES};
use crate::kind::SyntaxKind;
use crate::tokenizer::TokenKind;
use crate::tree::Checkpoint;

impl Parser<'_> {
    /// A type, with `?` read as nullable.
    pub(super) fn ty(&mut self) -> ParseResult<()> {
        self.ty_with(true)
    }

    /// A type after `is`/`as`, where a trailing `?` is left alone.
    pub(super) fn ty_without_nullable(&mut self) -> ParseResult<()> {
        self.ty_with(false)
    }

    fn ty_with(&mut self, nullable: bool) -> ParseResult<()> {
        let cp = self.checkpoint();
        let token = self.current();
        if token.is_punct("(") {
            self.tuple_type()?;
        } else if token.kind == TokenKind::Keyword
            && PREDEFINED_TYPES.contains(&token.text.as_str())
        {
            self.start(SyntaxKind::PredefinedType);
            self.bump();
            self.finish();
        } else {
            self.type_name()?;
        }
        self.type_suffixes(cp, nullable)
    }

    /// Trailing `?` and `[]` rank specifiers.
    fn type_suffixes(&mut self, cp: Checkpoint, nullable: bool) -> ParseResult<()> {
        loop {
            if nullable && self.at("?") {
                self.start_at(cp, SyntaxKind::NullableType);
                self.bump();
                self.finish();
            } else if self.at("[") && self.is_empty_rank(self.pos) {
                self.start_at(cp, SyntaxKind::ArrayType);
                while self.at("[") && self.is_empty_rank(self.pos) {
                    self.start(SyntaxKind::ArrayRankSpecifier);
                    self.bump();
                    while self.at(",") {
                        self.bump();
                    }
                    self.expect("]")?;
                    self.finish();
                }
                self.finish();
            } else {
                return Ok(());
            }
        }
    }

    /// `[]` or `[,,]` starting at `index`.
    fn is_empty_rank(&self, index: usize) -> bool {
        let mut i = index + 1;
        while self.is_punct_at(i, ",") {
            i += 1;
        }
        self.is_punct_at(i, "]")
    }

    fn tuple_type(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::TupleType);
        self.expect("(")?;
        loop {
            self.start(SyntaxKind::TupleElement);
            self.ty()?;
            if self.at_identifier() {
                self.bump();
            }
            self.finish();
            if self.at(",") {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(")")?;
        self.finish();
        Ok(())
    }

    /// `A.B<T>.C` or `global::A.B`.
    pub(super) fn type_name(&mut self) -> ParseResult<()> {
        let cp = self.checkpoint();
        self.simple_type_name()?;
        while (self.at(".") || self.at("::")) && self.nth(1).is_identifier() {
            self.start_at(cp, SyntaxKind::QualifiedName);
            self.bump();
            self.simple_type_name()?;
            self.finish();
        }
        Ok(())
    }

    /// `Name` or `Name<T, U>`.
    pub(super) fn simple_type_name(&mut self) -> ParseResult<()> {
        if !self.at_identifier() {
            return Err(self.unexpected("type name"));
        }
        if self.scan_type_args(self.pos + 1).is_some() {
            self.start(SyntaxKind::GenericName);
            self.bump();
            self.type_argument_list()?;
            self.finish();
        } else {
            self.start(SyntaxKind::IdentifierName);
            self.bump();
            self.finish();
        }
        Ok(())
    }

    pub(super) fn type_argument_list(&mut self) -> ParseResult<()> {
        self.start(SyntaxKind::TypeArgumentList);
        self.expect("<")?;
        self.ty()?;
        while self.at(",") {
            self.bump();
            self.ty()?;
        }
        self.expect(">")?;
        self.finish();
        Ok(())
    }
}
