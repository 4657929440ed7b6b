//! Resolved type family (§3 "Types"). Distinct from the *type expression* AST nodes parsed
//! from source (`ast::expr::TypeExpr`); those are resolved into entries of this arena during
//! type checking (§4.H). Arena-indexed so that `Type::Struct`/`Type::Alias` can reference a
//! `Symbol` and a `Symbol`'s own type can reference back into this arena without forming an
//! ownership cycle (§9).

use crate::string_interning::StringId;
use crate::symbol::{ScopeId, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    pub fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
        }
    }

    pub fn lookup(name: &str) -> Option<IntKind> {
        Some(match name {
            "i8" => IntKind::I8,
            "i16" => IntKind::I16,
            "i32" => IntKind::I32,
            "i64" => IntKind::I64,
            "u8" => IntKind::U8,
            "u16" => IntKind::U16,
            "u32" => IntKind::U32,
            "u64" => IntKind::U64,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

impl FloatKind {
    pub fn name(self) -> &'static str {
        match self {
            FloatKind::F32 => "f32",
            FloatKind::F64 => "f64",
        }
    }

    pub fn lookup(name: &str) -> Option<FloatKind> {
        Some(match name {
            "f32" => FloatKind::F32,
            "f64" => FloatKind::F64,
            _ => return None,
        })
    }
}

/// A struct type's fields, kept here (rather than only on the declaration) so `Type::Struct`
/// equality and field lookup don't need to walk back to the AST.
#[derive(Debug, Clone)]
pub struct StructField {
    pub name: StringId,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub c_abi: bool,
}

#[derive(Debug, Clone)]
pub enum Type {
    Void,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    /// Untyped numeric literal type, arbitrary precision; only ever appears on an
    /// unfinalized `BasicLit` expression, never survives to a finalized program (§8).
    BigInt,
    BigFloat,
    Pointer {
        pointee: TypeId,
        read_only: bool,
    },
    Slice {
        elem: TypeId,
        read_only: bool,
    },
    Array {
        elem: TypeId,
        size: u64,
    },
    Struct {
        symbol: SymbolId,
        fields: Vec<StructField>,
        scope: ScopeId,
        /// False while any field's declared type is still unresolved (§4.H "struct completion").
        fully_typed: bool,
    },
    Function(FunctionSig),
    Module {
        symbol: SymbolId,
        scope: ScopeId,
    },
    Alias {
        name: StringId,
        target: TypeId,
    },
    /// Not yet finalized — the initial state of every literal and the state of an expression
    /// the checker has not yet visited.
    Untyped,
    /// A type that could not be determined because of a prior diagnostic; suppresses
    /// cascading errors from the same root cause.
    Invalid,
}

#[derive(Debug)]
pub struct TypeArena {
    types: Vec<Type>,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    /// Every `Expr`/`TypeExpr` is constructed with `TypeId(0)` before an arena exists to patch
    /// it against (§3 "initially untyped"); seeding `Untyped` and `Invalid` first, in this
    /// order, makes that placeholder already correct instead of needing a second pass.
    pub const UNTYPED: TypeId = TypeId(0);
    pub const INVALID: TypeId = TypeId(1);

    pub fn new() -> Self {
        let mut types = Vec::new();
        types.push(Type::Untyped);
        types.push(Type::Invalid);
        Self { types }
    }

    pub fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }
}

impl Type {
    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Untyped | Type::BigInt | Type::BigFloat)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Int(_) | Type::Float(_) | Type::BigInt | Type::BigFloat
        )
    }

    pub fn is_untyped_numeric_literal(&self) -> bool {
        matches!(self, Type::BigInt | Type::BigFloat)
    }
}

/// Structural equality, except for named structs (nominal via symbol identity) and aliases
/// (transparent: equality unwraps to the target) — this needs the arena to chase through
/// `Alias`, so it lives here rather than as a plain `PartialEq` derive.
pub fn types_equal(arena: &TypeArena, a: TypeId, b: TypeId) -> bool {
    let ra = resolve_alias(arena, a);
    let rb = resolve_alias(arena, b);
    if ra == rb {
        return true;
    }
    match (arena.get(ra), arena.get(rb)) {
        (Type::Void, Type::Void) => true,
        (Type::Bool, Type::Bool) => true,
        (Type::Int(x), Type::Int(y)) => x == y,
        (Type::Float(x), Type::Float(y)) => x == y,
        (Type::BigInt, Type::BigInt) => true,
        (Type::BigFloat, Type::BigFloat) => true,
        (
            Type::Pointer {
                pointee: p1,
                read_only: r1,
            },
            Type::Pointer {
                pointee: p2,
                read_only: r2,
            },
        ) => r1 == r2 && types_equal(arena, *p1, *p2),
        (
            Type::Slice {
                elem: e1,
                read_only: r1,
            },
            Type::Slice {
                elem: e2,
                read_only: r2,
            },
        ) => r1 == r2 && types_equal(arena, *e1, *e2),
        (Type::Array { elem: e1, size: s1 }, Type::Array { elem: e2, size: s2 }) => {
            s1 == s2 && types_equal(arena, *e1, *e2)
        }
        (Type::Struct { symbol: s1, .. }, Type::Struct { symbol: s2, .. }) => s1 == s2,
        (Type::Function(f1), Type::Function(f2)) => {
            f1.c_abi == f2.c_abi
                && f1.params.len() == f2.params.len()
                && f1
                    .params
                    .iter()
                    .zip(f2.params.iter())
                    .all(|(a, b)| types_equal(arena, *a, *b))
                && types_equal(arena, f1.ret, f2.ret)
        }
        (Type::Module { symbol: s1, .. }, Type::Module { symbol: s2, .. }) => s1 == s2,
        (Type::Untyped, Type::Untyped) => true,
        (Type::Invalid, Type::Invalid) => true,
        _ => false,
    }
}

fn resolve_alias(arena: &TypeArena, mut id: TypeId) -> TypeId {
    while let Type::Alias { target, .. } = arena.get(id) {
        id = *target;
    }
    id
}
