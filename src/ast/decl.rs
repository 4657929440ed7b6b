//! Declaration AST nodes (§3 "Declarations"). Top-level declarations carry the extra
//! bookkeeping §3's invariants describe — a symbol back-pointer, an owning module, a
//! dependency list, and a cycle-detection color — wrapped around the same per-kind payload a
//! local declaration uses.

use crate::ast::expr::Expr;
use crate::ast::stmt::Block;
use crate::ast::ty::TypeExpr;
use crate::string_interning::StringId;
use crate::symbol::{CuId, ScopeId, SymbolId};
use crate::token::TextLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Var,
    Val,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A `val`/`var`/`const` declaration. Used both at top level (wrapped in [`TopDecl`]) and
/// locally inside a block (as [`LocalDecl`], a plain alias) — the two share a shape; only the
/// top-level wrapper adds dependency/ordering bookkeeping.
#[derive(Debug, Clone)]
pub struct ValDecl {
    pub mutability: Mutability,
    pub name: StringId,
    pub declared_type: Option<TypeExpr>,
    pub initializer: Option<Expr>,
    /// Present when this value is wrapped in `extern` (§4.C); defaults to the interned string
    /// `"c"` at parse time.
    pub extern_abi: Option<StringId>,
    pub symbol: Option<SymbolId>,
    pub location: TextLocation,
}

pub type LocalDecl = ValDecl;

#[derive(Debug, Clone)]
pub struct Param {
    pub name: StringId,
    pub ty: TypeExpr,
    pub symbol: Option<SymbolId>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: StringId,
    pub params: Vec<Param>,
    /// `None` means a `void` return type.
    pub return_type: Option<TypeExpr>,
    /// `None` for a signature-only declaration (forward declaration or `extern` import).
    pub body: Option<Block>,
    pub param_scope: ScopeId,
    pub extern_abi: Option<StringId>,
    pub symbol: Option<SymbolId>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: StringId,
    pub ty: TypeExpr,
    pub symbol: Option<SymbolId>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: StringId,
    /// `None` for an opaque struct (fields unknown, declared but not defined).
    pub fields: Option<Vec<FieldDecl>>,
    pub scope: ScopeId,
    pub symbol: Option<SymbolId>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: StringId,
    pub target: TypeExpr,
    pub symbol: Option<SymbolId>,
    pub location: TextLocation,
}

/// Covers both `ImportDecl` and `UseDecl` of §3's declaration list: the same `import path [as
/// alias]` grammar production (§4.C) produces this node either way, distinguished only by
/// whether `alias` is present — an aliased import binds a local name (`ImportDecl` role), a
/// bare one re-exports the target path's own name under this module (`UseDecl` role). See
/// DESIGN.md for why these share one AST node instead of two.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub path: Vec<StringId>,
    pub alias: Option<StringId>,
    pub visibility: Visibility,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Val(ValDecl),
    Func(FuncDecl),
    Struct(StructDecl),
    TypeAlias(TypeAliasDecl),
    Import(ImportDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Gray,
    Black,
}

/// Unique id of a top-level declaration within the module that owns it — its stable index at
/// the time it was appended to `Module::decls`, independent of later reordering by the
/// topological sort (§4.I), which produces a new ordered `Vec` rather than mutating indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

#[derive(Debug, Clone)]
pub struct TopDecl {
    pub kind: DeclKind,
    pub visibility: Visibility,
    pub location: TextLocation,
    pub symbol: Option<SymbolId>,
    pub module: ModuleId,
    /// Compilation unit this declaration was parsed from (§4.F "Accessing a private symbol
    /// from a different CU"). Assigned by the module loader when it merges a file's
    /// declarations into their owning module (§4.E); a placeholder until then.
    pub cu_id: CuId,
    pub id: DeclId,
    /// Edges to other top-level declarations this one references (§4.G), function→function
    /// edges already omitted. Cross-module edges point at declarations in an already-loaded,
    /// already-sorted module and are not considered by this module's cycle detector (§4.I).
    pub deps: Vec<(ModuleId, DeclId)>,
    pub color: Color,
}

impl TopDecl {
    pub fn name(&self) -> StringId {
        match &self.kind {
            DeclKind::Val(v) => v.name,
            DeclKind::Func(f) => f.name,
            DeclKind::Struct(s) => s.name,
            DeclKind::TypeAlias(t) => t.name,
            DeclKind::Import(i) => i.alias.unwrap_or_else(|| *i.path.last().expect(
                "parser never produces an ImportDecl with an empty path",
            )),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclKind::Func(_))
    }
}
