//! Type expression resolution (§4.H). Walks a parsed [`TypeExpr`] tree and fills in its
//! `resolved` field, producing the corresponding entry in [`crate::types::TypeArena`].

use crate::ast::expr::{BasicLit, Expr, ExprKind, LitKind};
use crate::ast::ty::{TypeExpr, TypeExprKind};
use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::module_set::ModuleSet;
use crate::symbol::{CuId, ScopeId, SymbolKind};
use crate::types::{IntKind, Type, TypeArena, TypeId};

use super::literal;
use super::resolve_path;

pub fn resolve_type_expr(
    ty: &mut TypeExpr,
    scope: ScopeId,
    cu_id: CuId,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    let loc = ty.location.to_source_location(&ms.string_table);
    let resolved = match &mut ty.kind {
        TypeExprKind::Named { segments, absolute } => {
            match resolve_path(segments, *absolute, scope, cu_id, ms, &loc, errors) {
                Some(sym_id) => {
                    let sym = ms.symbols.get(sym_id);
                    if sym.kind != SymbolKind::Type {
                        let name = ms.string_table.resolve(sym.name).to_string();
                        errors.push(CompileError::type_error(format!("`{name}` is not a type"), loc));
                        TypeArena::INVALID
                    } else {
                        sym.ty
                    }
                }
                None => TypeArena::INVALID,
            }
        }
        TypeExprKind::Pointer { read_only, pointee } => {
            let pointee_ty = resolve_type_expr(pointee, scope, cu_id, ms, errors);
            ms.types.alloc(Type::Pointer {
                pointee: pointee_ty,
                read_only: *read_only,
            })
        }
        TypeExprKind::Slice { read_only, elem } => {
            let elem_ty = resolve_type_expr(elem, scope, cu_id, ms, errors);
            ms.types.alloc(Type::Slice {
                elem: elem_ty,
                read_only: *read_only,
            })
        }
        TypeExprKind::Array { elem, size } => {
            let elem_ty = resolve_type_expr(elem, scope, cu_id, ms, errors);
            let size_val = eval_const_array_size(size, scope, cu_id, ms, errors);
            ms.types.alloc(Type::Array { elem: elem_ty, size: size_val })
        }
        TypeExprKind::Paren(inner) => resolve_type_expr(inner, scope, cu_id, ms, errors),
    };
    ty.resolved = resolved;
    resolved
}

/// Array sizes are finalized against the same `u64` stand-in used for `lenof`/`sizeof` (§4.H,
/// "finalized against `usize`" — this closed `Type` family has no dedicated `usize`, so `u64`
/// plays that role everywhere a pointer-width unsigned result is needed). Only a literal or a
/// folded literal-only constant is accepted; anything else is a type error.
fn eval_const_array_size(
    size: &mut Expr,
    scope: ScopeId,
    cu_id: CuId,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> u64 {
    let u64_ty = ms.types.alloc(Type::Int(IntKind::U64));
    let ty = super::expr::check_expr(size, scope, cu_id, Some(u64_ty), ms, errors);
    if ms.types.get(ty).is_invalid() {
        return 0;
    }
    let loc = size.location.to_source_location(&ms.string_table);
    let value = match &size.kind {
        ExprKind::BasicLit(BasicLit { kind: LitKind::Int, raw }) => literal::int_literal_value(raw).map(|(v, _)| v),
        ExprKind::Const(c) => Some(c.value.clone()),
        _ => None,
    };
    match value.and_then(|v| v.to_i64()) {
        Some(n) if n >= 0 => n as u64,
        _ => {
            errors.push(CompileError::type_error(
                "array size must be a non-negative constant integer",
                loc,
            ));
            0
        }
    }
}
