//! Expression grammar (§4.C): precedence climbing over [`TokenKind::binary_precedence`], then
//! prefix and postfix layers, bottoming out at primaries.

use crate::ast::decl::{FuncDecl, Param, TopDecl, Visibility};
use crate::ast::expr::{BasicLit, Expr, ExprKind, LitKind};
use crate::parser::{PResult, Parser, Recover};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: i32) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = self.cur.kind;
            let prec = op.binary_precedence();
            if prec < min_prec || prec == crate::token::LOWEST_PRECEDENCE {
                break;
            }
            self.bump();
            let rhs = self.parse_binary(prec + 1)?;
            let loc = lhs.location.covering(&rhs.location);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.cur.location;
        match self.cur.kind {
            TokenKind::Sub | TokenKind::Bang | TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = self.bump().kind;
                let operand = self.parse_unary()?;
                let loc = start.covering(&operand.location);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::Star => {
                self.bump();
                let operand = self.parse_unary()?;
                let loc = start.covering(&operand.location);
                Ok(Expr::new(ExprKind::Deref(Box::new(operand)), loc))
            }
            TokenKind::Amp => {
                self.bump();
                let read_only = if self.at(TokenKind::Var) {
                    self.bump();
                    false
                } else {
                    if self.at(TokenKind::Val) {
                        self.bump();
                    }
                    true
                };
                let operand = self.parse_unary()?;
                let loc = start.covering(&operand.location);
                Ok(Expr::new(
                    ExprKind::AddressOf {
                        read_only,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::Lenof => {
                self.bump();
                self.expect(TokenKind::LParen, "`(` after `lenof`")?;
                let operand = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen, "`)` after `lenof` operand")?.location;
                Ok(Expr::new(ExprKind::Lenof(Box::new(operand)), start.covering(&end)))
            }
            TokenKind::Sizeof => {
                self.bump();
                self.expect(TokenKind::LParen, "`(` after `sizeof`")?;
                let ty = self.parse_type()?;
                let end = self.expect(TokenKind::RParen, "`)` after `sizeof` operand")?.location;
                Ok(Expr::new(ExprKind::Sizeof(Box::new(ty)), start.covering(&end)))
            }
            TokenKind::Typeof => {
                self.bump();
                self.expect(TokenKind::LParen, "`(` after `typeof`")?;
                let operand = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen, "`)` after `typeof` operand")?.location;
                Ok(Expr::new(ExprKind::Typeof(Box::new(operand)), start.covering(&end)))
            }
            TokenKind::Fun => self.parse_func_literal(),
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.cur.kind {
                TokenKind::Dot => {
                    self.bump();
                    let end = self.cur.location;
                    let field = self.expect_ident()?;
                    let loc = expr.location.covering(&end);
                    expr = Expr::new(
                        ExprKind::Dot {
                            base: Box::new(expr),
                            field,
                            symbol: None,
                        },
                        loc,
                    );
                }
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.at(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.at(TokenKind::Comma) {
                                self.bump();
                            } else {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenKind::RParen, "`)` after call arguments")?.location;
                    let loc = expr.location.covering(&end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        loc,
                    );
                }
                TokenKind::LBrack => {
                    self.bump();
                    if self.at(TokenKind::Colon) {
                        self.bump();
                        let high = if self.at(TokenKind::RBrack) {
                            None
                        } else {
                            Some(Box::new(self.parse_expr()?))
                        };
                        let end = self.expect(TokenKind::RBrack, "`]` after slice")?.location;
                        let loc = expr.location.covering(&end);
                        expr = Expr::new(
                            ExprKind::Slice {
                                base: Box::new(expr),
                                low: None,
                                high,
                            },
                            loc,
                        );
                        continue;
                    }
                    let first = self.parse_expr()?;
                    if self.at(TokenKind::Colon) {
                        self.bump();
                        let high = if self.at(TokenKind::RBrack) {
                            None
                        } else {
                            Some(Box::new(self.parse_expr()?))
                        };
                        let end = self.expect(TokenKind::RBrack, "`]` after slice")?.location;
                        let loc = expr.location.covering(&end);
                        expr = Expr::new(
                            ExprKind::Slice {
                                base: Box::new(expr),
                                low: Some(Box::new(first)),
                                high,
                            },
                            loc,
                        );
                    } else {
                        let end = self.expect(TokenKind::RBrack, "`]` after index")?.location;
                        let loc = expr.location.covering(&end);
                        expr = Expr::new(
                            ExprKind::Index {
                                base: Box::new(expr),
                                index: Box::new(first),
                            },
                            loc,
                        );
                    }
                }
                TokenKind::As => {
                    self.bump();
                    let ty = self.parse_type()?;
                    let loc = expr.location.covering(&ty.location);
                    expr = Expr::new(
                        ExprKind::Cast {
                            expr: Box::new(expr),
                            ty: Box::new(ty),
                        },
                        loc,
                    );
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = self.bump().kind;
                    let loc = expr.location;
                    expr = Expr::new(
                        ExprKind::Unary {
                            op,
                            operand: Box::new(expr),
                        },
                        loc,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.cur.location;
        match self.cur.kind {
            TokenKind::Integer => {
                let tok = self.bump();
                let raw = self.text(tok.literal).to_string();
                Ok(Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind: LitKind::Int,
                        raw,
                    }),
                    start,
                ))
            }
            TokenKind::Float => {
                let tok = self.bump();
                let raw = self.text(tok.literal).to_string();
                Ok(Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind: LitKind::Float,
                        raw,
                    }),
                    start,
                ))
            }
            TokenKind::Char => {
                let tok = self.bump();
                let raw = self.text(tok.literal).to_string();
                Ok(Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind: LitKind::Char,
                        raw,
                    }),
                    start,
                ))
            }
            TokenKind::String => {
                let tok = self.bump();
                let raw = self.text(tok.literal).to_string();
                Ok(Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind: LitKind::Str,
                        raw,
                    }),
                    start,
                ))
            }
            TokenKind::True => {
                self.bump();
                Ok(Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind: LitKind::True,
                        raw: "true".into(),
                    }),
                    start,
                ))
            }
            TokenKind::False => {
                self.bump();
                Ok(Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind: LitKind::False,
                        raw: "false".into(),
                    }),
                    start,
                ))
            }
            TokenKind::Null => {
                self.bump();
                Ok(Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind: LitKind::Null,
                        raw: "null".into(),
                    }),
                    start,
                ))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)` after parenthesized expression")?;
                Ok(inner)
            }
            TokenKind::LBrack => {
                self.bump();
                let mut elems = Vec::new();
                if !self.at(TokenKind::RBrack) {
                    loop {
                        elems.push(self.parse_expr()?);
                        if self.at(TokenKind::Comma) {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RBrack, "`]` after array literal")?.location;
                Ok(Expr::new(ExprKind::ArrayLit(elems), start.covering(&end)))
            }
            TokenKind::ColonColon => {
                self.bump();
                let segments = self.parse_scope_path()?;
                Ok(Expr::new(
                    ExprKind::ScopeLookup {
                        segments,
                        absolute: true,
                        symbol: None,
                    },
                    start,
                ))
            }
            TokenKind::Ident | TokenKind::Underscore => {
                let name = self.bump().literal;
                if self.at(TokenKind::ColonColon) {
                    let mut segments = vec![name];
                    while self.at(TokenKind::ColonColon) {
                        self.bump();
                        segments.push(self.expect_ident()?);
                    }
                    return Ok(Expr::new(
                        ExprKind::ScopeLookup {
                            segments,
                            absolute: false,
                            symbol: None,
                        },
                        start,
                    ));
                }
                if self.at(TokenKind::LBrace) && !self.no_struct_lit {
                    return self.parse_struct_lit(Expr::new(
                        ExprKind::Ident { name, symbol: None },
                        start,
                    ));
                }
                Ok(Expr::new(ExprKind::Ident { name, symbol: None }, start))
            }
            _ => {
                let got = self.text(self.cur.literal).to_string();
                self.error(format!("expected an expression, found `{got}`"), start);
                Err(Recover)
            }
        }
    }

    fn parse_struct_lit(&mut self, name: Expr) -> PResult<Expr> {
        let start = name.location;
        self.expect(TokenKind::LBrace, "`{` to start a struct literal")?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let field_name = self.expect_ident()?;
            self.expect(TokenKind::Colon, "`:` after struct field name")?;
            let value = self.parse_expr()?;
            fields.push((field_name, value));
            if self.at(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace, "`}` to close struct literal")?.location;
        Ok(Expr::new(
            ExprKind::StructLit {
                name: Box::new(name),
                fields,
                symbol: None,
            },
            start.covering(&end),
        ))
    }

    /// `fun (params) -> Ret { body }` in expression position (§4.C). Hoisted into a
    /// `$<enclosing>_anon<n>` top-level private `FuncDecl`; the expression itself becomes a
    /// plain `Ident` referencing that synthetic name, so ordinary name resolution wires it up
    /// like any other function reference (§4.F/§4.H).
    fn parse_func_literal(&mut self) -> PResult<Expr> {
        let start = self.cur.location;
        self.bump(); // `fun`
        let name = self.next_anon_name();
        let (params, param_scope) = self.parse_param_list()?;
        if self.at(TokenKind::Arrow) {
            self.bump();
        }
        let return_type = if self.at_type_start() { Some(self.parse_type()?) } else { None };
        let body = self.parse_block()?;
        let end = body.location;
        let decl = TopDecl {
            kind: crate::ast::decl::DeclKind::Func(FuncDecl {
                name,
                params,
                return_type,
                body: Some(body),
                param_scope,
                extern_abi: None,
                symbol: None,
                location: start.covering(&end),
            }),
            visibility: Visibility::Private,
            location: start.covering(&end),
            symbol: None,
            module: crate::ast::decl::ModuleId(0),
            cu_id: self.cu_id,
            id: self.next_decl_id(),
            deps: Vec::new(),
            color: crate::ast::decl::Color::White,
        };
        self.pending_anon_decls.push(decl);
        Ok(Expr::new(ExprKind::Ident { name, symbol: None }, start))
    }

    pub(super) fn parse_param_list(&mut self) -> PResult<(Vec<Param>, crate::symbol::ScopeId)> {
        self.expect(TokenKind::LParen, "`(` to start parameter list")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let p_start = self.cur.location;
                let name = self.expect_ident()?;
                if self.at(TokenKind::Colon) {
                    self.bump();
                }
                let ty = self.parse_type()?;
                let end = ty.location;
                params.push(Param {
                    name,
                    ty,
                    symbol: None,
                    location: p_start.covering(&end),
                });
                if self.at(TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)` after parameter list")?;
        // The real scope is allocated by the symbol walk (§4.F), which owns the `ScopeArena`;
        // the parser has no arena access and leaves a placeholder id for it to overwrite.
        Ok((params, crate::symbol::ScopeId(0)))
    }

    /// Disable struct-literal parsing for exactly the duration of `f` (§4.C condition-position
    /// ambiguity, mirrored from the lexer's existing Go-style-ASI decision).
    pub(super) fn without_struct_lit<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let prev = self.no_struct_lit;
        self.no_struct_lit = true;
        let result = f(self);
        self.no_struct_lit = prev;
        result
    }
}
