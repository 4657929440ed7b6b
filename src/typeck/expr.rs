//! Expression checking (§4.H). One entry point, [`check_expr`], dispatched by `ExprKind`;
//! `Binary`/`Unary` get their own functions since folding a literal-only operation replaces the
//! node's own `kind`, which needs ownership of its former children rather than a borrow of them.

use std::collections::{HashMap, HashSet};

use num_bigint::BigInt;

use crate::ast::expr::{BasicLit, ConstValue, Expr, ExprKind, LitKind};
use crate::bignum::BigNum;
use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::diagnostics::location::SourceLocation;
use crate::module_set::ModuleSet;
use crate::string_interning::StringId;
use crate::symbol::{CuId, ScopeId, SymbolId};
use crate::token::{TextLocation, TokenKind};
use crate::types::{types_equal, FloatKind, IntKind, Type, TypeArena, TypeId};

use super::literal;
use super::types::resolve_type_expr;

pub fn check_expr(
    expr: &mut Expr,
    scope: ScopeId,
    cu_id: CuId,
    expected: Option<TypeId>,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    if matches!(expr.kind, ExprKind::Const(_)) {
        return expr.ty;
    }
    if matches!(expr.kind, ExprKind::Binary { .. }) {
        return check_binary(expr, scope, cu_id, expected, ms, errors);
    }
    if matches!(expr.kind, ExprKind::Unary { .. }) {
        return check_unary(expr, scope, cu_id, expected, ms, errors);
    }

    let loc = expr.location.to_source_location(&ms.string_table);
    let ty = match &mut expr.kind {
        ExprKind::Ident { name, symbol } => {
            let segs = [*name];
            match super::resolve_path(&segs, false, scope, cu_id, ms, &loc, errors) {
                Some(sid) => {
                    *symbol = Some(sid);
                    ms.symbols.get(sid).ty
                }
                None => TypeArena::INVALID,
            }
        }
        ExprKind::ScopeLookup {
            segments,
            absolute,
            symbol,
        } => match super::resolve_path(segments.as_slice(), *absolute, scope, cu_id, ms, &loc, errors) {
            Some(sid) => {
                *symbol = Some(sid);
                ms.symbols.get(sid).ty
            }
            None => TypeArena::INVALID,
        },
        ExprKind::Dot { base, field, symbol } => {
            let base_ty = check_expr(base, scope, cu_id, None, ms, errors);
            let resolved = super::underlying(ms, base_ty);
            match ms.types.get(resolved) {
                Type::Struct {
                    fields,
                    scope: struct_scope,
                    ..
                } => {
                    let struct_scope = *struct_scope;
                    match fields.iter().find(|f| f.name == *field) {
                        Some(sf) => {
                            let fty = sf.ty;
                            *symbol = ms.scopes.get(struct_scope).local(*field);
                            fty
                        }
                        None => {
                            let fname = ms.string_table.resolve(*field).to_string();
                            errors.push(CompileError::type_error(format!("struct has no field `{fname}`"), loc.clone()));
                            TypeArena::INVALID
                        }
                    }
                }
                _ if ms.types.get(base_ty).is_invalid() => TypeArena::INVALID,
                _ => {
                    errors.push(CompileError::type_error("`.` requires a struct value", loc.clone()));
                    TypeArena::INVALID
                }
            }
        }
        ExprKind::BasicLit(lit) => check_basic_lit(lit, expected, &loc, ms, errors),
        ExprKind::StructLit { name, fields, .. } => check_struct_lit(name, fields, scope, cu_id, ms, errors),
        ExprKind::ArrayLit(items) => check_array_lit(items, scope, cu_id, ms, errors, &loc),
        ExprKind::AddressOf { read_only, operand } => {
            let oty = check_expr(operand, scope, cu_id, None, ms, errors);
            if !operand.is_lvalue() {
                if !ms.types.get(oty).is_invalid() {
                    errors.push(CompileError::type_error("cannot take the address of a non-lvalue", loc.clone()));
                }
                TypeArena::INVALID
            } else if !*read_only && super::is_read_only_lvalue(operand, ms) {
                errors.push(CompileError::type_error(
                    "cannot take a mutable address of a read-only value",
                    loc.clone(),
                ));
                TypeArena::INVALID
            } else {
                ms.types.alloc(Type::Pointer {
                    pointee: oty,
                    read_only: *read_only,
                })
            }
        }
        ExprKind::Deref(operand) => {
            let oty = check_expr(operand, scope, cu_id, None, ms, errors);
            let resolved = super::underlying(ms, oty);
            match ms.types.get(resolved) {
                Type::Pointer { pointee, .. } => *pointee,
                _ if ms.types.get(oty).is_invalid() => TypeArena::INVALID,
                _ => {
                    errors.push(CompileError::type_error("`*` requires a pointer operand", loc.clone()));
                    TypeArena::INVALID
                }
            }
        }
        ExprKind::Index { base, index } => {
            let bty = check_expr(base, scope, cu_id, None, ms, errors);
            let u64_ty = ms.types.alloc(Type::Int(IntKind::U64));
            let ity = check_expr(index, scope, cu_id, Some(u64_ty), ms, errors);
            let resolved = super::underlying(ms, bty);
            let elem = match ms.types.get(resolved) {
                Type::Slice { elem, .. } => Some(*elem),
                Type::Array { elem, .. } => Some(*elem),
                _ => None,
            };
            if !matches!(ms.types.get(ity), Type::Int(_)) && !ms.types.get(ity).is_invalid() {
                errors.push(CompileError::type_error("array/slice index must be an integer", loc.clone()));
            }
            match elem {
                Some(e) => e,
                None if ms.types.get(bty).is_invalid() => TypeArena::INVALID,
                None => {
                    errors.push(CompileError::type_error("`[]` requires a slice or array value", loc.clone()));
                    TypeArena::INVALID
                }
            }
        }
        ExprKind::Slice { base, low, high } => {
            let bty = check_expr(base, scope, cu_id, None, ms, errors);
            let u64_ty = ms.types.alloc(Type::Int(IntKind::U64));
            if let Some(l) = low {
                check_expr(l, scope, cu_id, Some(u64_ty), ms, errors);
            }
            if let Some(h) = high {
                check_expr(h, scope, cu_id, Some(u64_ty), ms, errors);
            }
            let resolved = super::underlying(ms, bty);
            match ms.types.get(resolved) {
                Type::Slice { elem, read_only } => {
                    let (elem, read_only) = (*elem, *read_only);
                    ms.types.alloc(Type::Slice { elem, read_only })
                }
                Type::Array { elem, .. } => {
                    let elem = *elem;
                    ms.types.alloc(Type::Slice { elem, read_only: false })
                }
                _ if ms.types.get(bty).is_invalid() => TypeArena::INVALID,
                _ => {
                    errors.push(CompileError::type_error("slicing requires a slice or array value", loc.clone()));
                    TypeArena::INVALID
                }
            }
        }
        ExprKind::Call { callee, args } => {
            let cty = check_expr(callee, scope, cu_id, None, ms, errors);
            let resolved = super::underlying(ms, cty);
            let sig = match ms.types.get(resolved) {
                Type::Function(sig) => Some(sig.clone()),
                _ => None,
            };
            match sig {
                Some(sig) if args.len() == sig.params.len() => {
                    let mut ok = true;
                    for (arg, &param_ty) in args.iter_mut().zip(sig.params.iter()) {
                        let aty = check_expr(arg, scope, cu_id, Some(param_ty), ms, errors);
                        if !types_equal(&ms.types, aty, param_ty) && !ms.types.get(aty).is_invalid() {
                            errors.push(CompileError::type_error(
                                "argument type does not match parameter type",
                                arg.location.to_source_location(&ms.string_table),
                            ));
                            ok = false;
                        }
                    }
                    if ok {
                        sig.ret
                    } else {
                        TypeArena::INVALID
                    }
                }
                Some(sig) => {
                    errors.push(CompileError::type_error(
                        format!("expected {} argument(s), found {}", sig.params.len(), args.len()),
                        loc.clone(),
                    ));
                    for a in args.iter_mut() {
                        check_expr(a, scope, cu_id, None, ms, errors);
                    }
                    TypeArena::INVALID
                }
                None => {
                    for a in args.iter_mut() {
                        check_expr(a, scope, cu_id, None, ms, errors);
                    }
                    if !ms.types.get(cty).is_invalid() {
                        errors.push(CompileError::type_error("call target is not a function", loc.clone()));
                    }
                    TypeArena::INVALID
                }
            }
        }
        ExprKind::Cast { expr: inner, ty } => {
            let target = resolve_type_expr(ty, scope, cu_id, ms, errors);
            if is_adoptable_literal(inner) {
                check_expr(inner, scope, cu_id, Some(target), ms, errors)
            } else {
                let ity = check_expr(inner, scope, cu_id, None, ms, errors);
                if ms.types.get(ity).is_invalid() || ms.types.get(target).is_invalid() {
                    TypeArena::INVALID
                } else if is_valid_cast(ms.types.get(ity), ms.types.get(target)) {
                    target
                } else {
                    errors.push(CompileError::type_error("invalid cast between these two types", loc.clone()));
                    TypeArena::INVALID
                }
            }
        }
        ExprKind::Lenof(operand) => {
            let oty = check_expr(operand, scope, cu_id, None, ms, errors);
            let resolved = super::underlying(ms, oty);
            if matches!(ms.types.get(resolved), Type::Slice { .. } | Type::Array { .. }) {
                ms.types.alloc(Type::Int(IntKind::U64))
            } else if ms.types.get(oty).is_invalid() {
                TypeArena::INVALID
            } else {
                errors.push(CompileError::type_error("`lenof` requires a slice or array operand", loc.clone()));
                TypeArena::INVALID
            }
        }
        ExprKind::Sizeof(ty) => {
            let resolved = resolve_type_expr(ty, scope, cu_id, ms, errors);
            if ms.types.get(resolved).is_invalid() {
                TypeArena::INVALID
            } else {
                ms.types.alloc(Type::Int(IntKind::U64))
            }
        }
        ExprKind::Typeof(operand) => check_expr(operand, scope, cu_id, None, ms, errors),
        ExprKind::Bad => TypeArena::INVALID,
        ExprKind::Binary { .. } | ExprKind::Unary { .. } | ExprKind::Const(_) => {
            unreachable!("handled above before the arena borrow")
        }
    };
    expr.ty = ty;
    ty
}

fn check_binary(
    expr: &mut Expr,
    scope: ScopeId,
    cu_id: CuId,
    expected: Option<TypeId>,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    let loc = expr.location.to_source_location(&ms.string_table);
    let (op, mut lhs, mut rhs) = match std::mem::replace(&mut expr.kind, ExprKind::Bad) {
        ExprKind::Binary { op, lhs, rhs } => (op, lhs, rhs),
        _ => unreachable!(),
    };

    let is_arith = matches!(
        op,
        TokenKind::Add | TokenKind::Sub | TokenKind::Star | TokenKind::Slash | TokenKind::Percent
    );

    if is_arith {
        if let (Some(a), Some(b)) = (foldable_value(&lhs), foldable_value(&rhs)) {
            if op == TokenKind::Percent && (a.is_float() || b.is_float()) {
                errors.push(CompileError::type_error("`%` is not supported on floats", loc.clone()));
                expr.kind = ExprKind::Binary { op, lhs, rhs };
                expr.ty = TypeArena::INVALID;
                return TypeArena::INVALID;
            }
            match fold_binary(op, &a, &b) {
                Some(value) => {
                    let display = format!("({} {} {})", literal_display(&lhs), op_symbol(op), literal_display(&rhs));
                    let target = expected.filter(|t| matches!(ms.types.get(*t), Type::Int(_) | Type::Float(_)));
                    let ty = match target {
                        Some(t) => finalize_literal_to(&value, t, &loc, ms, errors),
                        None => default_finalize(&value, &loc, ms, errors),
                    };
                    expr.kind = ExprKind::Const(ConstValue { value, display });
                    expr.ty = ty;
                    return ty;
                }
                None => {
                    errors.push(CompileError::type_error("division by zero in constant folding", loc.clone()));
                    expr.kind = ExprKind::Binary { op, lhs, rhs };
                    expr.ty = TypeArena::INVALID;
                    return TypeArena::INVALID;
                }
            }
        }
    }

    if matches!(op, TokenKind::PipePipe | TokenKind::AmpAmp) {
        let bool_ty = ms.types.alloc(Type::Bool);
        let lty = check_expr(&mut lhs, scope, cu_id, Some(bool_ty), ms, errors);
        let rty = check_expr(&mut rhs, scope, cu_id, Some(bool_ty), ms, errors);
        let ty = if matches!(ms.types.get(lty), Type::Bool) && matches!(ms.types.get(rty), Type::Bool) {
            bool_ty
        } else if ms.types.get(lty).is_invalid() || ms.types.get(rty).is_invalid() {
            TypeArena::INVALID
        } else {
            errors.push(CompileError::type_error("`&&`/`||` operands must be `bool`", loc.clone()));
            TypeArena::INVALID
        };
        expr.kind = ExprKind::Binary { op, lhs, rhs };
        expr.ty = ty;
        return ty;
    }

    let pair_expected = if is_arith { expected } else { None };
    let (lty, rty) = check_operand_pair(&mut lhs, &mut rhs, pair_expected, scope, cu_id, ms, errors);
    let both_invalid = ms.types.get(lty).is_invalid() || ms.types.get(rty).is_invalid();

    let ty = if both_invalid {
        TypeArena::INVALID
    } else {
        match op {
            TokenKind::EqEq | TokenKind::NotEq => {
                if types_equal(&ms.types, lty, rty) {
                    ms.types.alloc(Type::Bool)
                } else {
                    errors.push(CompileError::type_error("operands of `==`/`!=` must be the same type", loc.clone()));
                    TypeArena::INVALID
                }
            }
            TokenKind::Gt | TokenKind::GtEq | TokenKind::Lt | TokenKind::LtEq => {
                if matches!(ms.types.get(lty), Type::Bool) || matches!(ms.types.get(rty), Type::Bool) {
                    errors.push(CompileError::type_error("relational operators require numeric operands", loc.clone()));
                    TypeArena::INVALID
                } else if types_equal(&ms.types, lty, rty) {
                    ms.types.alloc(Type::Bool)
                } else {
                    errors.push(CompileError::type_error("relational operands must be the same type", loc.clone()));
                    TypeArena::INVALID
                }
            }
            TokenKind::Add | TokenKind::Sub | TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
                if !ms.types.get(lty).is_numeric() {
                    errors.push(CompileError::type_error("arithmetic operands must be numeric", loc.clone()));
                    TypeArena::INVALID
                } else if op == TokenKind::Percent && matches!(ms.types.get(lty), Type::Float(_)) {
                    errors.push(CompileError::type_error("`%` is not supported on floats", loc.clone()));
                    TypeArena::INVALID
                } else if !types_equal(&ms.types, lty, rty) {
                    errors.push(CompileError::type_error("arithmetic operands must be the same type", loc.clone()));
                    TypeArena::INVALID
                } else {
                    lty
                }
            }
            _ => unreachable!("every binary-op kind is handled above"),
        }
    };

    expr.kind = ExprKind::Binary { op, lhs, rhs };
    expr.ty = ty;
    ty
}

fn check_unary(
    expr: &mut Expr,
    scope: ScopeId,
    cu_id: CuId,
    expected: Option<TypeId>,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    let loc = expr.location.to_source_location(&ms.string_table);
    let (op, mut operand) = match std::mem::replace(&mut expr.kind, ExprKind::Bad) {
        ExprKind::Unary { op, operand } => (op, operand),
        _ => unreachable!(),
    };

    let ty = match op {
        TokenKind::Sub => {
            if let Some(value) = foldable_value(&operand) {
                let neg = value.neg();
                let new_raw = format!("-{}", literal_display(&operand));
                let target = expected.filter(|t| matches!(ms.types.get(*t), Type::Int(_) | Type::Float(_)));
                let ty = match target {
                    Some(t) => finalize_literal_to(&neg, t, &loc, ms, errors),
                    None => default_finalize(&neg, &loc, ms, errors),
                };
                operand = Box::new(Expr::new(
                    if neg.is_float() {
                        ExprKind::BasicLit(BasicLit {
                            kind: LitKind::Float,
                            raw: new_raw,
                        })
                    } else {
                        ExprKind::BasicLit(BasicLit {
                            kind: LitKind::Int,
                            raw: new_raw,
                        })
                    },
                    operand.location,
                ));
                let folded = *operand;
                expr.kind = folded.kind;
                expr.ty = ty;
                return ty;
            }
            let oty = check_expr(&mut operand, scope, cu_id, expected, ms, errors);
            if ms.types.get(oty).is_invalid() {
                TypeArena::INVALID
            } else if ms.types.get(oty).is_numeric() {
                oty
            } else {
                errors.push(CompileError::type_error("`-` requires a numeric operand", loc.clone()));
                TypeArena::INVALID
            }
        }
        TokenKind::Bang => {
            let bool_ty = ms.types.alloc(Type::Bool);
            let oty = check_expr(&mut operand, scope, cu_id, Some(bool_ty), ms, errors);
            if matches!(ms.types.get(oty), Type::Bool) {
                bool_ty
            } else if ms.types.get(oty).is_invalid() {
                TypeArena::INVALID
            } else {
                errors.push(CompileError::type_error("`!` requires a `bool` operand", loc.clone()));
                TypeArena::INVALID
            }
        }
        TokenKind::PlusPlus | TokenKind::MinusMinus => {
            let oty = check_expr(&mut operand, scope, cu_id, None, ms, errors);
            if ms.types.get(oty).is_invalid() {
                TypeArena::INVALID
            } else if !ms.types.get(oty).is_numeric() {
                errors.push(CompileError::type_error("`++`/`--` require a numeric operand", loc.clone()));
                TypeArena::INVALID
            } else if !operand.is_lvalue() {
                errors.push(CompileError::type_error("`++`/`--` require an lvalue operand", loc.clone()));
                TypeArena::INVALID
            } else if super::is_read_only_lvalue(&operand, ms) {
                errors.push(CompileError::type_error(
                    "cannot increment/decrement a read-only value",
                    loc.clone(),
                ));
                TypeArena::INVALID
            } else {
                oty
            }
        }
        _ => unreachable!("no other operator reaches ExprKind::Unary"),
    };

    expr.kind = ExprKind::Unary { op, operand };
    expr.ty = ty;
    ty
}

/// Which side is checked first when one operand is a typed concrete value and the other a bare
/// literal: the concrete side is checked first, then the literal is checked again with that
/// side's resolved type as `expected` so it adopts it (§4.H).
fn check_operand_pair(
    lhs: &mut Expr,
    rhs: &mut Expr,
    outer_expected: Option<TypeId>,
    scope: ScopeId,
    cu_id: CuId,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> (TypeId, TypeId) {
    let lhs_adoptable = is_adoptable_literal(lhs);
    let rhs_adoptable = is_adoptable_literal(rhs);

    if lhs_adoptable && !rhs_adoptable {
        let rty = check_expr(rhs, scope, cu_id, outer_expected, ms, errors);
        let lty = check_expr(lhs, scope, cu_id, Some(rty), ms, errors);
        (lty, rty)
    } else if rhs_adoptable && !lhs_adoptable {
        let lty = check_expr(lhs, scope, cu_id, outer_expected, ms, errors);
        let rty = check_expr(rhs, scope, cu_id, Some(lty), ms, errors);
        (lty, rty)
    } else {
        let lty = check_expr(lhs, scope, cu_id, outer_expected, ms, errors);
        let rty = check_expr(rhs, scope, cu_id, outer_expected, ms, errors);
        (lty, rty)
    }
}

fn check_basic_lit(
    lit: &mut BasicLit,
    expected: Option<TypeId>,
    loc: &SourceLocation,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    match lit.kind {
        LitKind::Int => match literal::int_literal_value(&lit.raw) {
            Some((value, suffix)) => {
                let target = suffix
                    .map(|k| ms.types.alloc(Type::Int(k)))
                    .or_else(|| expected.filter(|t| matches!(ms.types.get(*t), Type::Int(_) | Type::Float(_))));
                match target {
                    Some(t) => finalize_literal_to(&value, t, loc, ms, errors),
                    None => default_finalize(&value, loc, ms, errors),
                }
            }
            None => {
                errors.push(CompileError::type_error("invalid integer literal", loc.clone()));
                TypeArena::INVALID
            }
        },
        LitKind::Float => match literal::float_literal_value(&lit.raw) {
            Some((value, suffix)) => {
                let target = suffix
                    .map(|k| ms.types.alloc(Type::Float(k)))
                    .or_else(|| expected.filter(|t| matches!(ms.types.get(*t), Type::Int(_) | Type::Float(_))));
                match target {
                    Some(t) => finalize_literal_to(&value, t, loc, ms, errors),
                    None => default_finalize(&value, loc, ms, errors),
                }
            }
            None => {
                errors.push(CompileError::type_error("invalid float literal", loc.clone()));
                TypeArena::INVALID
            }
        },
        LitKind::Char => match literal::char_literal_bignum(&lit.raw) {
            Some(value) => {
                let target = expected.filter(|t| matches!(ms.types.get(*t), Type::Int(_) | Type::Float(_)));
                match target {
                    Some(t) => finalize_literal_to(&value, t, loc, ms, errors),
                    None => default_finalize(&value, loc, ms, errors),
                }
            }
            None => {
                errors.push(CompileError::type_error("invalid character literal", loc.clone()));
                TypeArena::INVALID
            }
        },
        LitKind::True | LitKind::False => ms.types.alloc(Type::Bool),
        LitKind::Null => match expected.map(|t| (t, super::underlying(ms, t))) {
            Some((t, resolved)) if matches!(ms.types.get(resolved), Type::Pointer { .. } | Type::Slice { .. }) => t,
            _ => {
                errors.push(CompileError::type_error("cannot infer the type of `null` here", loc.clone()));
                TypeArena::INVALID
            }
        },
        LitKind::Str => {
            let u8_ty = ms.types.alloc(Type::Int(IntKind::U8));
            ms.types.alloc(Type::Slice {
                elem: u8_ty,
                read_only: true,
            })
        }
    }
}

fn check_array_lit(
    items: &mut [Expr],
    scope: ScopeId,
    cu_id: CuId,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
    loc: &SourceLocation,
) -> TypeId {
    if items.is_empty() {
        errors.push(CompileError::type_error("array literal cannot be empty", loc.clone()));
        return TypeArena::INVALID;
    }

    let first_concrete = items.iter().position(|e| !is_adoptable_literal(e));
    let anchor = first_concrete.unwrap_or(0);
    let target = check_expr(&mut items[anchor], scope, cu_id, None, ms, errors);

    for (i, item) in items.iter_mut().enumerate() {
        if i == anchor {
            continue;
        }
        let ity = check_expr(item, scope, cu_id, Some(target), ms, errors);
        if !types_equal(&ms.types, ity, target) && !ms.types.get(ity).is_invalid() && !ms.types.get(target).is_invalid() {
            errors.push(CompileError::type_error(
                "array literal elements must share a single type",
                item.location.to_source_location(&ms.string_table),
            ));
        }
    }

    if ms.types.get(target).is_invalid() {
        TypeArena::INVALID
    } else {
        ms.types.alloc(Type::Array {
            elem: target,
            size: items.len() as u64,
        })
    }
}

fn check_struct_lit(
    name: &mut Expr,
    fields: &mut Vec<(StringId, Expr)>,
    scope: ScopeId,
    cu_id: CuId,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    let struct_ty = resolve_struct_name(name, scope, cu_id, ms, errors);
    if ms.types.get(struct_ty).is_invalid() {
        for (_, v) in fields.iter_mut() {
            check_expr(v, scope, cu_id, None, ms, errors);
        }
        return TypeArena::INVALID;
    }

    let (struct_fields, _struct_scope) = match ms.types.get(struct_ty) {
        Type::Struct { fields, scope, .. } => (fields.clone(), *scope),
        _ => unreachable!("resolve_struct_name only returns a Struct type or Invalid"),
    };

    let name_loc = name.location;
    let mut seen = HashSet::new();
    let mut provided: HashMap<StringId, Expr> = HashMap::new();
    for (fname, fexpr) in std::mem::take(fields) {
        if !seen.insert(fname) {
            errors.push(CompileError::type_error(
                "duplicate field in struct literal",
                fexpr.location.to_source_location(&ms.string_table),
            ));
            continue;
        }
        provided.insert(fname, fexpr);
    }

    let mut normalized = Vec::with_capacity(struct_fields.len());
    for sf in &struct_fields {
        if let Some(mut fexpr) = provided.remove(&sf.name) {
            let fty = check_expr(&mut fexpr, scope, cu_id, Some(sf.ty), ms, errors);
            if !types_equal(&ms.types, fty, sf.ty) && !ms.types.get(fty).is_invalid() {
                errors.push(CompileError::type_error(
                    "struct field initializer type mismatch",
                    fexpr.location.to_source_location(&ms.string_table),
                ));
            }
            normalized.push((sf.name, fexpr));
        } else {
            normalized.push((sf.name, default_value_expr(sf.ty, name_loc, ms)));
        }
    }

    for (extra_name, mut extra_expr) in provided {
        let extra_name_str = ms.string_table.resolve(extra_name).to_string();
        errors.push(CompileError::type_error(
            format!("struct has no field `{extra_name_str}`"),
            extra_expr.location.to_source_location(&ms.string_table),
        ));
        check_expr(&mut extra_expr, scope, cu_id, None, ms, errors);
    }

    *fields = normalized;
    struct_ty
}

fn resolve_struct_name(
    name_expr: &mut Expr,
    scope: ScopeId,
    cu_id: CuId,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    let loc = name_expr.location.to_source_location(&ms.string_table);
    let (segments, absolute): (Vec<StringId>, bool) = match &name_expr.kind {
        ExprKind::Ident { name, .. } => (vec![*name], false),
        ExprKind::ScopeLookup { segments, absolute, .. } => (segments.clone(), *absolute),
        _ => {
            errors.push(CompileError::type_error("struct literal name must be a type identifier", loc));
            return TypeArena::INVALID;
        }
    };

    match super::resolve_path(&segments, absolute, scope, cu_id, ms, &loc, errors) {
        Some(sym_id) => {
            match &mut name_expr.kind {
                ExprKind::Ident { symbol, .. } => *symbol = Some(sym_id),
                ExprKind::ScopeLookup { symbol, .. } => *symbol = Some(sym_id),
                _ => {}
            }
            let sym_ty = ms.symbols.get(sym_id).ty;
            name_expr.ty = sym_ty;
            if matches!(ms.types.get(sym_ty), Type::Struct { .. }) {
                sym_ty
            } else {
                errors.push(CompileError::type_error("struct literal name must resolve to a struct type", loc));
                TypeArena::INVALID
            }
        }
        None => TypeArena::INVALID,
    }
}

/// Build a zero-value expression for a missing struct literal field (§4.H "missing fields are
/// defaulted"). Recurses for nested structs and arrays rather than delegating to `check_expr`,
/// since there is no source text to check — the value is synthesized directly at its final type.
fn default_value_expr(ty: TypeId, loc: TextLocation, ms: &mut ModuleSet) -> Expr {
    let kind = match ms.types.get(ty) {
        Type::Bool => ExprKind::BasicLit(BasicLit {
            kind: LitKind::False,
            raw: "false".into(),
        }),
        Type::Int(_) => ExprKind::Const(ConstValue {
            value: BigNum::Int(BigInt::from(0)),
            display: "0".into(),
        }),
        Type::Float(_) => ExprKind::Const(ConstValue {
            value: BigNum::Int(BigInt::from(0)).int_to_float().expect("int always promotes to float"),
            display: "0.0".into(),
        }),
        Type::Pointer { .. } | Type::Slice { .. } => ExprKind::BasicLit(BasicLit {
            kind: LitKind::Null,
            raw: "null".into(),
        }),
        Type::Array { elem, size } => {
            let (elem, size) = (*elem, *size);
            let items = (0..size).map(|_| default_value_expr(elem, loc, ms)).collect();
            ExprKind::ArrayLit(items)
        }
        Type::Struct { fields, .. } => {
            let fields = fields.clone();
            let built = fields.iter().map(|f| (f.name, default_value_expr(f.ty, loc, ms))).collect();
            ExprKind::StructLit {
                name: Box::new(Expr::new(ExprKind::Bad, loc)),
                fields: built,
                symbol: None,
            }
        }
        _ => ExprKind::Bad,
    };
    let mut e = Expr::new(kind, loc);
    e.ty = ty;
    e
}

/// A top-level `val`/`var`/`const` initializer must be one of: basic literals, const-marked
/// symbols, default-init, array/struct literals built entirely of constants, or function
/// references (§4.H). `default_value_expr` only ever produces literal/const/array/struct nodes,
/// so defaulted fields satisfy this recursively without special-casing.
pub(super) fn is_compile_time_constant(expr: &Expr, ms: &ModuleSet) -> bool {
    match &expr.kind {
        ExprKind::BasicLit(_) | ExprKind::Const(_) => true,
        ExprKind::Ident { symbol: Some(sid), .. } | ExprKind::ScopeLookup { symbol: Some(sid), .. } => {
            let sym = ms.symbols.get(*sid);
            sym.flags.is_const || sym.kind == crate::symbol::SymbolKind::Func
        }
        ExprKind::ArrayLit(items) => items.iter().all(|i| is_compile_time_constant(i, ms)),
        ExprKind::StructLit { fields, .. } => fields.iter().all(|(_, v)| is_compile_time_constant(v, ms)),
        _ => false,
    }
}

fn is_valid_cast(from: &Type, to: &Type) -> bool {
    match (from, to) {
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (Type::Pointer { .. }, Type::Pointer { .. }) => true,
        (Type::Pointer { .. }, Type::Int(IntKind::U64)) | (Type::Int(IntKind::U64), Type::Pointer { .. }) => true,
        (Type::Bool, Type::Int(_)) | (Type::Int(_), Type::Bool) => true,
        _ => false,
    }
}

fn is_adoptable_literal(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::BasicLit(BasicLit { kind: LitKind::Null, .. })) || foldable_value(expr).is_some()
}

fn foldable_value(expr: &Expr) -> Option<BigNum> {
    match &expr.kind {
        ExprKind::Const(c) => Some(c.value.clone()),
        ExprKind::BasicLit(BasicLit { kind: LitKind::Int, raw }) => {
            literal::int_literal_value(raw).filter(|(_, s)| s.is_none()).map(|(v, _)| v)
        }
        ExprKind::BasicLit(BasicLit { kind: LitKind::Float, raw }) => {
            literal::float_literal_value(raw).filter(|(_, s)| s.is_none()).map(|(v, _)| v)
        }
        _ => None,
    }
}

fn literal_display(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::BasicLit(b) => b.raw.clone(),
        ExprKind::Const(c) => c.display.clone(),
        _ => "?".to_string(),
    }
}

fn op_symbol(op: TokenKind) -> &'static str {
    match op {
        TokenKind::Add => "+",
        TokenKind::Sub => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Percent => "%",
        _ => "?",
    }
}

fn promote_pair(a: &BigNum, b: &BigNum) -> Option<(BigNum, BigNum)> {
    match (a.is_float(), b.is_float()) {
        (false, false) | (true, true) => Some((a.clone(), b.clone())),
        (true, false) => Some((a.clone(), b.int_to_float()?)),
        (false, true) => Some((a.int_to_float()?, b.clone())),
    }
}

fn fold_binary(op: TokenKind, a: &BigNum, b: &BigNum) -> Option<BigNum> {
    let (a, b) = promote_pair(a, b)?;
    match op {
        TokenKind::Add => a.add(&b),
        TokenKind::Sub => a.sub(&b),
        TokenKind::Star => a.mul(&b),
        TokenKind::Slash => a.div(&b),
        TokenKind::Percent => a.rem(&b),
        _ => None,
    }
}

/// Finalize an untyped literal's value against a concrete numeric target, checking overflow
/// (§4.H "finalize", §8 scenario 3). Used both for ordinary literal finalization and for the
/// result of constant folding.
pub(super) fn finalize_literal_to(
    value: &BigNum,
    target: TypeId,
    loc: &SourceLocation,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> TypeId {
    let int_kind = match ms.types.get(target) {
        Type::Int(k) => Some(*k),
        _ => None,
    };
    if let Some(kind) = int_kind {
        let as_int = if value.is_float() {
            value.float_to_int_if_integral()
        } else {
            Some(value.clone())
        };
        return match as_int {
            Some(v) if v.fits_in(kind) => target,
            Some(_) => {
                errors.push(CompileError::type_error(
                    format!("literal overflows `{}`", kind.name()),
                    loc.clone(),
                ));
                TypeArena::INVALID
            }
            None => {
                errors.push(CompileError::type_error(
                    "literal has a fractional part and cannot fit an integer type",
                    loc.clone(),
                ));
                TypeArena::INVALID
            }
        };
    }
    if matches!(ms.types.get(target), Type::Float(_)) {
        return target;
    }
    errors.push(CompileError::type_error(
        "numeric literal used where a non-numeric type is expected",
        loc.clone(),
    ));
    TypeArena::INVALID
}

/// Finalize a literal with no surrounding context: integers default to `i32`, floats to `f64`
/// (§4.H).
pub(super) fn default_finalize(value: &BigNum, loc: &SourceLocation, ms: &mut ModuleSet, errors: &mut ErrorList) -> TypeId {
    let target = if value.is_float() {
        ms.types.alloc(Type::Float(FloatKind::F64))
    } else {
        ms.types.alloc(Type::Int(IntKind::I32))
    };
    finalize_literal_to(value, target, loc, ms, errors)
}
