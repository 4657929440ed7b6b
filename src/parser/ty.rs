//! Type-expression grammar (§4.C "Type expressions"): named paths, pointers, slices/arrays,
//! and parenthesized types. `var`/`val` qualifiers on a pointee or element default to read-only
//! (`val`) when omitted (§3 "Pointer"/"Slice" — `read_only` defaults true).

use crate::ast::ty::{TypeExpr, TypeExprKind};
use crate::parser::{PResult, Parser, Recover};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_type(&mut self) -> PResult<TypeExpr> {
        let start = self.cur.location;
        match self.cur.kind {
            TokenKind::Amp => {
                self.bump();
                let read_only = !self.bump_if_mut_qualifier();
                let pointee = Box::new(self.parse_type()?);
                let end = pointee.location;
                Ok(TypeExpr::new(
                    TypeExprKind::Pointer { read_only, pointee },
                    start.covering(&end),
                ))
            }
            TokenKind::AmpAmp => {
                // `&&T` unpacks into two nested pointer nodes sharing the same source range
                // (§4.C).
                self.bump();
                let read_only = !self.bump_if_mut_qualifier();
                let inner_pointee = Box::new(self.parse_type()?);
                let end = inner_pointee.location;
                let inner = TypeExpr::new(
                    TypeExprKind::Pointer {
                        read_only,
                        pointee: inner_pointee,
                    },
                    start.covering(&end),
                );
                Ok(TypeExpr::new(
                    TypeExprKind::Pointer {
                        read_only: true,
                        pointee: Box::new(inner),
                    },
                    start.covering(&end),
                ))
            }
            TokenKind::LBrack => {
                self.bump();
                let read_only = !self.bump_if_mut_qualifier();
                let elem = Box::new(self.parse_type()?);
                if self.at(TokenKind::Colon) {
                    self.bump();
                    let size = Box::new(self.parse_expr()?);
                    let end = self.expect(TokenKind::RBrack, "`]` after array size")?.location;
                    Ok(TypeExpr::new(
                        TypeExprKind::Array { elem, size },
                        start.covering(&end),
                    ))
                } else {
                    let end = self.expect(TokenKind::RBrack, "`]` after slice element type")?.location;
                    Ok(TypeExpr::new(
                        TypeExprKind::Slice { read_only, elem },
                        start.covering(&end),
                    ))
                }
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_type()?;
                let end = self.expect(TokenKind::RParen, "`)` after parenthesized type")?.location;
                Ok(TypeExpr::new(
                    TypeExprKind::Paren(Box::new(inner)),
                    start.covering(&end),
                ))
            }
            TokenKind::ColonColon => {
                self.bump();
                let segments = self.parse_scope_path()?;
                Ok(TypeExpr::new(
                    TypeExprKind::Named {
                        segments,
                        absolute: true,
                    },
                    start,
                ))
            }
            TokenKind::Ident => {
                let segments = self.parse_scope_path()?;
                Ok(TypeExpr::new(
                    TypeExprKind::Named {
                        segments,
                        absolute: false,
                    },
                    start,
                ))
            }
            _ => {
                let got = self.text(self.cur.literal).to_string();
                self.error(format!("expected a type, found `{got}`"), start);
                Err(Recover)
            }
        }
    }

    fn bump_if_mut_qualifier(&mut self) -> bool {
        if self.at(TokenKind::Var) {
            self.bump();
            true
        } else {
            if self.at(TokenKind::Val) {
                self.bump();
            }
            false
        }
    }

    /// True when the current token can begin a type expression (§4.C). A declared type follows
    /// its name by bare juxtaposition with no separator token, so every caller that needs to
    /// decide "is there a type here, or did we go straight to `=`/`;`/`{`" checks this first.
    pub(super) fn at_type_start(&self) -> bool {
        matches!(
            self.cur.kind,
            TokenKind::Amp | TokenKind::AmpAmp | TokenKind::LBrack | TokenKind::LParen | TokenKind::ColonColon | TokenKind::Ident
        )
    }
}
