//! Statement grammar (§4.C, §3). `while cond { body }` lowers directly into `StmtKind::For` with
//! no init/inc, matching the AST's note that `while` has no dedicated node.

use crate::ast::decl::Mutability;
use crate::ast::stmt::{Block, Stmt, StmtKind};
use crate::parser::{PResult, Parser, Recover};
use crate::symbol::ScopeId;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_block(&mut self) -> PResult<Block> {
        let start = self.expect(TokenKind::LBrace, "`{` to start a block")?.location;
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(Recover) => {
                    let loc = self.cur.location;
                    stmts.push(Stmt::bad(loc));
                    self.synchronize();
                }
            }
        }
        let end = self.expect(TokenKind::RBrace, "`}` to close block")?.location;
        Ok(Block {
            stmts,
            // Placeholder; the symbol walk (§4.F) allocates the real block scope and patches
            // this once it owns the `ScopeArena`.
            scope: placeholder_scope(),
            location: start.covering(&end),
        })
    }

    pub fn parse_stmt(&mut self) -> PResult<Stmt> {
        let start = self.cur.location;
        match self.cur.kind {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let loc = block.location;
                Ok(Stmt::new(StmtKind::Block(block), loc))
            }
            TokenKind::Var | TokenKind::Val | TokenKind::Const => {
                let decl = self.parse_local_decl()?;
                let end_semi = self.expect(TokenKind::Semicolon, "`;` after declaration")?.location;
                Ok(Stmt::new(StmtKind::Decl(decl), start.covering(&end_semi)))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                self.bump();
                let value = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.expect(TokenKind::Semicolon, "`;` after return")?.location;
                Ok(Stmt::new(StmtKind::Return(value), start.covering(&end)))
            }
            TokenKind::Break => {
                self.bump();
                let end = self.expect(TokenKind::Semicolon, "`;` after break")?.location;
                Ok(Stmt::new(StmtKind::Break, start.covering(&end)))
            }
            TokenKind::Continue => {
                self.bump();
                let end = self.expect(TokenKind::Semicolon, "`;` after continue")?.location;
                Ok(Stmt::new(StmtKind::Continue, start.covering(&end)))
            }
            TokenKind::Defer => {
                self.bump();
                let expr = self.parse_expr()?;
                let end = self.expect(TokenKind::Semicolon, "`;` after defer")?.location;
                Ok(Stmt::new(StmtKind::Defer(expr), start.covering(&end)))
            }
            _ => self.parse_simple_stmt(),
        }
    }

    /// An expression statement or an assignment (`target = value`, `target += value`, ...).
    fn parse_simple_stmt(&mut self) -> PResult<Stmt> {
        let start = self.cur.location;
        let expr = self.parse_expr()?;
        if self.cur.kind.is_assign_op() {
            let op = self.bump().kind;
            let value = self.parse_expr()?;
            let end = self.expect(TokenKind::Semicolon, "`;` after assignment")?.location;
            return Ok(Stmt::new(
                StmtKind::Assign {
                    target: expr,
                    op,
                    value,
                },
                start.covering(&end),
            ));
        }
        let end = self.expect(TokenKind::Semicolon, "`;` after expression statement")?.location;
        Ok(Stmt::new(StmtKind::ExprStmt(expr), start.covering(&end)))
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.cur.location;
        let mut branches = Vec::new();
        self.bump(); // `if`
        let cond = self.without_struct_lit(|p| p.parse_expr())?;
        let body = self.parse_block()?;
        branches.push((cond, body));
        loop {
            if self.at(TokenKind::Elif) {
                self.bump();
                let cond = self.without_struct_lit(|p| p.parse_expr())?;
                let body = self.parse_block()?;
                branches.push((cond, body));
            } else {
                break;
            }
        }
        let otherwise = if self.at(TokenKind::Else) {
            self.bump();
            Some(self.parse_block()?)
        } else {
            None
        };
        let end = otherwise
            .as_ref()
            .map(|b| b.location)
            .unwrap_or_else(|| branches.last().unwrap().1.location);
        Ok(Stmt::new(
            StmtKind::If { branches, otherwise },
            start.covering(&end),
        ))
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let start = self.cur.location;
        self.bump(); // `while`
        let cond = self.without_struct_lit(|p| p.parse_expr())?;
        let body = self.parse_block()?;
        let end = body.location;
        Ok(Stmt::new(
            StmtKind::For {
                init: None,
                cond: Some(cond),
                inc: None,
                body,
                scope: placeholder_scope(),
            },
            start.covering(&end),
        ))
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let start = self.cur.location;
        self.bump(); // `for`
        self.expect(TokenKind::LParen, "`(` after `for`")?;
        let init = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_for_clause_stmt()?))
        };
        self.expect(TokenKind::Semicolon, "`;` after `for` init clause")?;
        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.without_struct_lit(|p| p.parse_expr())?)
        };
        self.expect(TokenKind::Semicolon, "`;` after `for` condition clause")?;
        let inc = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_for_clause_stmt()?))
        };
        self.expect(TokenKind::RParen, "`)` after `for` clauses")?;
        let body = self.parse_block()?;
        let end = body.location;
        Ok(Stmt::new(
            StmtKind::For {
                init,
                cond,
                inc,
                body,
                scope: placeholder_scope(),
            },
            start.covering(&end),
        ))
    }

    /// A bare `for`-clause statement, i.e. one without its own trailing `;` (the surrounding
    /// `for (...)` grammar supplies the separators instead).
    fn parse_for_clause_stmt(&mut self) -> PResult<Stmt> {
        let start = self.cur.location;
        if matches!(self.cur.kind, TokenKind::Var | TokenKind::Val | TokenKind::Const) {
            let decl = self.parse_local_decl()?;
            let loc = decl.location;
            return Ok(Stmt::new(StmtKind::Decl(decl), loc));
        }
        let expr = self.parse_expr()?;
        if self.cur.kind.is_assign_op() {
            let op = self.bump().kind;
            let value = self.parse_expr()?;
            let loc = start.covering(&value.location);
            return Ok(Stmt::new(
                StmtKind::Assign {
                    target: expr,
                    op,
                    value,
                },
                loc,
            ));
        }
        let loc = expr.location;
        Ok(Stmt::new(StmtKind::ExprStmt(expr), loc))
    }

    fn parse_local_decl(&mut self) -> PResult<crate::ast::decl::LocalDecl> {
        let start = self.cur.location;
        let mutability = match self.bump().kind {
            TokenKind::Var => Mutability::Var,
            TokenKind::Val => Mutability::Val,
            _ => Mutability::Const,
        };
        let name = self.expect_ident()?;
        if self.at(TokenKind::Colon) {
            self.bump();
        }
        let declared_type = if self.at_type_start() { Some(self.parse_type()?) } else { None };
        let initializer = if self.at(TokenKind::Assign) {
            self.bump();
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = initializer
            .as_ref()
            .map(|e| e.location)
            .or_else(|| declared_type.as_ref().map(|t| t.location))
            .unwrap_or(start);
        Ok(crate::ast::decl::ValDecl {
            mutability,
            name,
            declared_type,
            initializer,
            extern_abi: None,
            symbol: None,
            location: start.covering(&end),
        })
    }
}

/// Placeholder block/for-scope id, patched to a real allocation by the symbol walk (§4.F),
/// which owns the `ScopeArena` the parser has no access to.
fn placeholder_scope() -> ScopeId {
    ScopeId(0)
}
