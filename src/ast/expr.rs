//! Expression AST nodes (§3 "Expressions"). A tagged union dispatched by `match` rather than a
//! double-dispatch visitor (§9); child expressions are owned directly (`Box<Expr>`) since an
//! `Expr`'s only references to the symbol/type arenas are by copyable id, so no ownership cycle
//! can form through the tree itself (§9's arena note applies to `Symbol`/`Type`, which really do
//! reference each other; the AST just borrows their ids).

use crate::ast::ty::TypeExpr;
use crate::bignum::BigNum;
use crate::string_interning::StringId;
use crate::symbol::SymbolId;
use crate::token::{TextLocation, TokenKind};
use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Char,
    Str,
    True,
    False,
    Null,
}

/// A literal as parsed. `raw` is the literal's textual form (§4.B "integer and float literals
/// preserve their textual form") for int/float; it is rewritten in place by constant folding to
/// the `(L op R)` form used in diagnostics (§4.H), but only on a literal that is *itself* being
/// folded in-place rather than replaced by a [`ExprKind::Const`] wrapper — see the type checker
/// for which path a given fold takes.
#[derive(Debug, Clone)]
pub struct BasicLit {
    pub kind: LitKind,
    pub raw: String,
}

/// A folded numeric constant (§3 "a post-resolution `ConstExpr` wrapper"). Produced by the type
/// checker when a literal-only arithmetic expression folds successfully (§4.H); `display` is the
/// `(L op R)`-style rewritten text used in subsequent diagnostics about this value.
#[derive(Debug, Clone)]
pub struct ConstValue {
    pub value: BigNum,
    pub display: String,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Ident {
        name: StringId,
        symbol: Option<SymbolId>,
    },
    /// `A::B::C` (or relative `A.B.C` equivalent in scope-lookup position, §4.H).
    ScopeLookup {
        segments: Vec<StringId>,
        absolute: bool,
        symbol: Option<SymbolId>,
    },
    Dot {
        base: Box<Expr>,
        field: StringId,
        symbol: Option<SymbolId>,
    },
    BasicLit(BasicLit),
    StructLit {
        name: Box<Expr>,
        fields: Vec<(StringId, Expr)>,
        symbol: Option<SymbolId>,
    },
    ArrayLit(Vec<Expr>),
    Binary {
        op: TokenKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: TokenKind,
        operand: Box<Expr>,
    },
    AddressOf {
        read_only: bool,
        operand: Box<Expr>,
    },
    Deref(Box<Expr>),
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        base: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Cast {
        expr: Box<Expr>,
        ty: Box<TypeExpr>,
    },
    Lenof(Box<Expr>),
    Sizeof(Box<TypeExpr>),
    Typeof(Box<Expr>),
    /// Set by the type checker once a literal-only arithmetic sub-tree folds to a value
    /// (§4.H); never produced by the parser.
    Const(ConstValue),
    /// Parse-recovery placeholder for an expression position that failed to parse, analogous
    /// to `BadStmt` (§4.C).
    Bad,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: TextLocation,
    pub ty: TypeId,
}

impl Expr {
    pub fn new(kind: ExprKind, location: TextLocation) -> Self {
        Self {
            kind,
            location,
            ty: TypeId(0), // patched to `Type::Untyped` once the arena exists
        }
    }

    pub fn bad(location: TextLocation) -> Self {
        Self::new(ExprKind::Bad, location)
    }

    /// §3 "Lvalue is true for: identifiers bound to value symbols, deref of a pointer, index
    /// and dot on an lvalue." Needs no arena access — whether a name was bound to a value
    /// symbol at all (as opposed to a type/module) is already rejected during resolution, so
    /// by the time this runs every resolved `Ident`/`Dot`/`ScopeLookup` denotes a value.
    pub fn is_lvalue(&self) -> bool {
        match &self.kind {
            ExprKind::Ident { symbol, .. } => symbol.is_some(),
            ExprKind::ScopeLookup { symbol, .. } => symbol.is_some(),
            ExprKind::Dot { base, .. } => base.is_lvalue(),
            ExprKind::Deref(_) => true,
            ExprKind::Index { base, .. } => base.is_lvalue(),
            _ => false,
        }
    }
}
