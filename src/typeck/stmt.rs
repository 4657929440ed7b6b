//! Statement checking (§4.H). Threaded through a block's statements is an [`FnCtx`] (the
//! enclosing function's return type) and an `in_loop` flag for `break`/`continue` validation.

use crate::ast::decl::LocalDecl;
use crate::ast::stmt::{Block, Stmt, StmtKind};
use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::module_set::ModuleSet;
use crate::symbol::{CuId, ScopeId};
use crate::token::TokenKind;
use crate::types::{types_equal, Type, TypeArena, TypeId};

use super::expr::check_expr;
use super::types::resolve_type_expr;

pub struct FnCtx {
    pub return_type: TypeId,
}

pub fn check_block(block: &mut Block, cu_id: CuId, fn_ctx: &FnCtx, in_loop: bool, ms: &mut ModuleSet, errors: &mut ErrorList) {
    for stmt in &mut block.stmts {
        check_stmt(stmt, block.scope, cu_id, fn_ctx, in_loop, ms, errors);
    }
}

pub fn check_stmt(
    stmt: &mut Stmt,
    scope: ScopeId,
    cu_id: CuId,
    fn_ctx: &FnCtx,
    in_loop: bool,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) {
    let loc = stmt.location.to_source_location(&ms.string_table);
    match &mut stmt.kind {
        StmtKind::Block(b) => check_block(b, cu_id, fn_ctx, in_loop, ms, errors),
        StmtKind::Decl(decl) => check_local_decl(decl, scope, cu_id, ms, errors),
        StmtKind::If { branches, otherwise } => {
            let bool_ty = ms.types.alloc(Type::Bool);
            for (cond, body) in branches.iter_mut() {
                let cty = check_expr(cond, scope, cu_id, Some(bool_ty), ms, errors);
                if !matches!(ms.types.get(cty), Type::Bool) && !ms.types.get(cty).is_invalid() {
                    errors.push(CompileError::type_error(
                        "`if` condition must be `bool`",
                        cond.location.to_source_location(&ms.string_table),
                    ));
                }
                check_block(body, cu_id, fn_ctx, in_loop, ms, errors);
            }
            if let Some(body) = otherwise {
                check_block(body, cu_id, fn_ctx, in_loop, ms, errors);
            }
        }
        StmtKind::For {
            init,
            cond,
            inc,
            body,
            scope: for_scope,
        } => {
            if let Some(init) = init {
                check_stmt(init, *for_scope, cu_id, fn_ctx, in_loop, ms, errors);
            }
            if let Some(cond) = cond {
                let bool_ty = ms.types.alloc(Type::Bool);
                let cty = check_expr(cond, *for_scope, cu_id, Some(bool_ty), ms, errors);
                if !matches!(ms.types.get(cty), Type::Bool) && !ms.types.get(cty).is_invalid() {
                    errors.push(CompileError::type_error(
                        "loop condition must be `bool`",
                        cond.location.to_source_location(&ms.string_table),
                    ));
                }
            }
            if let Some(inc) = inc {
                check_stmt(inc, *for_scope, cu_id, fn_ctx, in_loop, ms, errors);
            }
            check_block(body, cu_id, fn_ctx, true, ms, errors);
        }
        StmtKind::Return(value) => match value {
            Some(e) => {
                let ty = check_expr(e, scope, cu_id, Some(fn_ctx.return_type), ms, errors);
                if ms.types.get(fn_ctx.return_type).is_invalid() {
                    // unannotated/invalid return type: nothing more to check
                } else if matches!(ms.types.get(fn_ctx.return_type), Type::Void) {
                    errors.push(CompileError::type_error(
                        "cannot return a value from a function with no return type",
                        loc,
                    ));
                } else if !types_equal(&ms.types, ty, fn_ctx.return_type) && !ms.types.get(ty).is_invalid() {
                    errors.push(CompileError::type_error(
                        "returned value does not match the function's return type",
                        loc,
                    ));
                }
            }
            None => {
                if !matches!(ms.types.get(fn_ctx.return_type), Type::Void) && !ms.types.get(fn_ctx.return_type).is_invalid() {
                    errors.push(CompileError::type_error("missing return value", loc));
                }
            }
        },
        StmtKind::Break => {
            if !in_loop {
                errors.push(CompileError::type_error("`break` outside of a loop", loc));
            }
        }
        StmtKind::Continue => {
            if !in_loop {
                errors.push(CompileError::type_error("`continue` outside of a loop", loc));
            }
        }
        StmtKind::Assign { target, op, value } => {
            let tty = check_expr(target, scope, cu_id, None, ms, errors);
            if !target.is_lvalue() {
                if !ms.types.get(tty).is_invalid() {
                    errors.push(CompileError::type_error(
                        "assignment target must be an lvalue",
                        target.location.to_source_location(&ms.string_table),
                    ));
                }
            } else if super::is_read_only_lvalue(target, ms) {
                errors.push(CompileError::type_error(
                    "cannot assign to a read-only value",
                    target.location.to_source_location(&ms.string_table),
                ));
            }
            let is_compound = !matches!(*op, TokenKind::Assign);
            if is_compound && !ms.types.get(tty).is_invalid() && !ms.types.get(tty).is_numeric() {
                errors.push(CompileError::type_error(
                    "compound assignment requires a numeric target",
                    loc.clone(),
                ));
            }
            let vty = check_expr(value, scope, cu_id, Some(tty), ms, errors);
            if !types_equal(&ms.types, vty, tty) && !ms.types.get(vty).is_invalid() && !ms.types.get(tty).is_invalid() {
                errors.push(CompileError::type_error("assigned value does not match the target's type", loc));
            }
        }
        StmtKind::ExprStmt(e) => {
            check_expr(e, scope, cu_id, None, ms, errors);
        }
        StmtKind::Defer(e) => {
            check_expr(e, scope, cu_id, None, ms, errors);
        }
        StmtKind::Bad => {}
    }
}

/// Shared by local declarations (here) and the top-level `Val` wrapper in `typeck/mod.rs`, which
/// additionally enforces that the initializer is a compile-time constant.
pub(super) fn check_val_core(decl: &mut LocalDecl, scope: ScopeId, cu_id: CuId, ms: &mut ModuleSet, errors: &mut ErrorList) -> TypeId {
    let loc = decl.location.to_source_location(&ms.string_table);
    let declared_ty = decl.declared_type.as_mut().map(|te| resolve_type_expr(te, scope, cu_id, ms, errors));

    let final_ty = match (&mut decl.initializer, declared_ty) {
        (Some(init), Some(dty)) => {
            let ity = check_expr(init, scope, cu_id, Some(dty), ms, errors);
            if !types_equal(&ms.types, ity, dty) && !ms.types.get(ity).is_invalid() && !ms.types.get(dty).is_invalid() {
                errors.push(CompileError::type_error(
                    "initializer does not match the declared type",
                    init.location.to_source_location(&ms.string_table),
                ));
            }
            dty
        }
        (Some(init), None) => check_expr(init, scope, cu_id, None, ms, errors),
        (None, Some(dty)) => dty,
        (None, None) => {
            errors.push(CompileError::type_error("declaration needs either a type or an initializer", loc));
            TypeArena::INVALID
        }
    };

    if let Some(sym_id) = decl.symbol {
        ms.symbols.get_mut(sym_id).ty = final_ty;
    }
    final_ty
}

fn check_local_decl(decl: &mut LocalDecl, scope: ScopeId, cu_id: CuId, ms: &mut ModuleSet, errors: &mut ErrorList) {
    check_val_core(decl, scope, cu_id, ms, errors);
}
