//! Statement AST nodes (§3 "Statements"). `while` has no dedicated node — the parser lowers it
//! straight into `StmtKind::For` with an empty init/inc (§4.C grammar note, §3).

use crate::ast::decl::LocalDecl;
use crate::ast::expr::Expr;
use crate::symbol::ScopeId;
use crate::token::{TextLocation, TokenKind};

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub scope: ScopeId,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Block),
    Decl(LocalDecl),
    /// The full `if`/`elif`/`else` chain: one `(condition, body)` pair per `if`/`elif`
    /// branch, taken in order, plus an optional trailing `else` body.
    If {
        branches: Vec<(Expr, Block)>,
        otherwise: Option<Block>,
    },
    /// `for (init; cond; inc) body`; `while cond { body }` lowers to `init = None, inc = None`.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        inc: Option<Box<Stmt>>,
        body: Block,
        scope: ScopeId,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Assign {
        target: Expr,
        op: TokenKind,
        value: Expr,
    },
    ExprStmt(Expr),
    Defer(Expr),
    /// Parse-recovery placeholder (§4.C "A `BadStmt` placeholder is inserted for a failed
    /// statement so later stages do not see partial trees").
    Bad,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: TextLocation,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: TextLocation) -> Self {
        Self { kind, location }
    }

    pub fn bad(location: TextLocation) -> Self {
        Self::new(StmtKind::Bad, location)
    }
}
