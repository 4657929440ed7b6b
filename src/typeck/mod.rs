//! Type checking (§4.H). Entry point is [`type_check`], which flattens every module's
//! declarations, resolves each one in dependency order, and fills in the type arena.
//!
//! `resolve_path`, `underlying`, and `is_read_only_lvalue` below are shared by `expr`, `stmt`,
//! and `types` — kept here rather than in any one of them since all three need them.

mod expr;
mod literal;
mod stmt;
mod types;

use crate::ast::decl::{DeclId, DeclKind, FuncDecl, ImportDecl, ModuleId, StructDecl, TopDecl, TypeAliasDecl};
use crate::ast::expr::{Expr, ExprKind};
use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::diagnostics::location::SourceLocation;
use crate::interned_path::InternedPath;
use crate::module_set::ModuleSet;
use crate::string_interning::StringId;
use crate::symbol::{CuId, ScopeId, SymbolId, SymbolKind};
use crate::types::{FunctionSig, StructField, Type, TypeArena, TypeId};

use types::resolve_type_expr;

/// Resolve a (possibly qualified) identifier or type path (§4.H). Shared by value-position
/// `Ident`/`ScopeLookup`, struct-literal names, and `TypeExprKind::Named`.
pub(super) fn resolve_path(
    segments: &[StringId],
    absolute: bool,
    scope: ScopeId,
    cu_id: CuId,
    ms: &mut ModuleSet,
    loc: &SourceLocation,
    errors: &mut ErrorList,
) -> Option<SymbolId> {
    let start = if absolute { ms.global_scope } else { scope };
    let mut sym_id = match ms.scopes.lookup(start, segments[0]) {
        Some(id) => id,
        None => {
            let name = ms.string_table.resolve(segments[0]).to_string();
            errors.push(CompileError::name_resolution(format!("cannot find `{name}` in this scope"), loc.clone()));
            return None;
        }
    };
    if !check_cu_visibility(sym_id, cu_id, ms, loc, errors) {
        return None;
    }

    for &seg in &segments[1..] {
        let sym = ms.symbols.get(sym_id);
        let resolved_ty = underlying(ms, sym.ty);
        let next_scope = match ms.types.get(resolved_ty) {
            Type::Module { scope, .. } => *scope,
            Type::Struct { scope, .. } => *scope,
            _ => {
                let name = ms.string_table.resolve(sym.name).to_string();
                errors.push(CompileError::name_resolution(format!("`{name}` cannot be qualified with `::`"), loc.clone()));
                return None;
            }
        };
        sym_id = match ms.scopes.get(next_scope).local(seg) {
            Some(id) => id,
            None => {
                let name = ms.string_table.resolve(seg).to_string();
                errors.push(CompileError::name_resolution(format!("no member named `{name}`"), loc.clone()));
                return None;
            }
        };
        if !check_cu_visibility(sym_id, cu_id, ms, loc, errors) {
            return None;
        }
    }

    let final_sym = ms.symbols.get(sym_id);
    if final_sym.kind == SymbolKind::Field {
        errors.push(CompileError::name_resolution(
            "a field cannot be referenced without a base expression",
            loc.clone(),
        ));
        return None;
    }

    Some(sym_id)
}

/// Builtin and global-scope symbols are seeded with the `CuId(u32::MAX)` sentinel and are
/// exempt from CU-privacy (§4.E.5, §4.F).
fn check_cu_visibility(
    sym_id: SymbolId,
    cu_id: CuId,
    ms: &ModuleSet,
    loc: &SourceLocation,
    errors: &mut ErrorList,
) -> bool {
    let sym = ms.symbols.get(sym_id);
    if sym.cu_id != cu_id && sym.cu_id.0 != u32::MAX && !sym.flags.public {
        let name = ms.string_table.resolve(sym.name).to_string();
        errors.push(CompileError::name_resolution(
            format!("`{name}` is private to its compilation unit"),
            loc.clone(),
        ));
        false
    } else {
        true
    }
}

/// Chase an `Alias` chain down to its underlying type (§4.H). `crate::types`'s own
/// `resolve_alias` does the same thing but is private to that module.
pub(super) fn underlying(ms: &ModuleSet, id: TypeId) -> TypeId {
    let mut current = id;
    while let Type::Alias { target, .. } = ms.types.get(current) {
        current = *target;
    }
    current
}

/// §3 "a read-only lvalue cannot be assigned to, `&mut`'d, or `++`/`--`'d". Arrays have no
/// intrinsic read-only flag of their own, so indexing into one defers to the base's own
/// lvalue read-only-ness.
pub(super) fn is_read_only_lvalue(expr: &Expr, ms: &ModuleSet) -> bool {
    match &expr.kind {
        ExprKind::Ident { symbol: Some(sid), .. } | ExprKind::ScopeLookup { symbol: Some(sid), .. } => {
            ms.symbols.get(*sid).flags.read_only
        }
        ExprKind::Dot { base, .. } => is_read_only_lvalue(base, ms),
        ExprKind::Deref(inner) => {
            let resolved = underlying(ms, inner.ty);
            matches!(ms.types.get(resolved), Type::Pointer { read_only: true, .. })
        }
        ExprKind::Index { base, .. } => {
            let resolved = underlying(ms, base.ty);
            match ms.types.get(resolved) {
                Type::Slice { read_only, .. } => *read_only,
                _ => is_read_only_lvalue(base, ms),
            }
        }
        _ => false,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visited {
    White,
    Gray,
    Black,
}

/// Type-check every module's declarations (§4.H). Declarations are visited in a DFS over
/// `TopDecl.deps` so a forward reference is resolved before the declaration that needs it;
/// this pass keeps its own local coloring grid rather than `TopDecl.color`, which belongs to
/// the later topological sort (§4.I) and must start the program untouched.
pub fn type_check(ms: &mut ModuleSet) -> ErrorList {
    let mut errors = ErrorList::new();
    let module_count = ms.modules.len();
    let mut all: Vec<Vec<TopDecl>> = (0..module_count).map(|i| std::mem::take(&mut ms.modules[i].decls)).collect();
    let mut visited: Vec<Vec<Visited>> = all.iter().map(|decls| vec![Visited::White; decls.len()]).collect();

    for mod_idx in 0..all.len() {
        for decl_idx in 0..all[mod_idx].len() {
            ensure_checked(ModuleId(mod_idx as u32), DeclId(decl_idx as u32), &mut all, &mut visited, ms, &mut errors);
        }
    }

    for (i, decls) in all.into_iter().enumerate() {
        ms.modules[i].decls = decls;
    }

    errors
}

fn ensure_checked(
    module: ModuleId,
    decl: DeclId,
    all: &mut [Vec<TopDecl>],
    visited: &mut [Vec<Visited>],
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) {
    let (m, d) = (module.0 as usize, decl.0 as usize);
    match visited[m][d] {
        Visited::Black => return,
        // A genuine cycle would only reach here for a non-function edge (function-to-function
        // edges are never recorded, §4.G); `topo.rs`'s later pass over the real `TopDecl.color`
        // reports it, so just stop recursing rather than double-diagnosing.
        Visited::Gray => return,
        Visited::White => {}
    }
    visited[m][d] = Visited::Gray;

    let deps = all[m][d].deps.clone();
    for (dep_mod, dep_decl) in deps {
        ensure_checked(dep_mod, dep_decl, all, visited, ms, errors);
    }

    check_decl(&mut all[m][d], ms, errors);
    visited[m][d] = Visited::Black;
}

fn check_decl(decl: &mut TopDecl, ms: &mut ModuleSet, errors: &mut ErrorList) {
    let module_scope = ms.module(decl.module).module_scope;
    let cu_id = decl.cu_id;
    match &mut decl.kind {
        DeclKind::Val(v) => {
            stmt::check_val_core(v, module_scope, cu_id, ms, errors);
            if let Some(init) = &v.initializer {
                if !expr::is_compile_time_constant(init, ms) {
                    errors.push(CompileError::type_error(
                        "top-level initializer must be a compile-time constant",
                        init.location.to_source_location(&ms.string_table),
                    ));
                }
            }
        }
        DeclKind::Func(f) => check_func_decl(f, cu_id, ms, errors),
        DeclKind::Struct(s) => check_struct_decl(s, cu_id, ms, errors),
        DeclKind::TypeAlias(t) => check_type_alias_decl(t, module_scope, cu_id, ms, errors),
        DeclKind::Import(i) => check_import_decl(decl.symbol, i, ms, errors),
    }
}

fn check_func_decl(f: &mut FuncDecl, cu_id: CuId, ms: &mut ModuleSet, errors: &mut ErrorList) {
    let mut param_tys = Vec::with_capacity(f.params.len());
    for param in f.params.iter_mut() {
        let pty = resolve_type_expr(&mut param.ty, f.param_scope, cu_id, ms, errors);
        if let Some(sym_id) = param.symbol {
            ms.symbols.get_mut(sym_id).ty = pty;
        }
        param_tys.push(pty);
    }
    let ret_ty = match &mut f.return_type {
        Some(te) => resolve_type_expr(te, f.param_scope, cu_id, ms, errors),
        None => ms.types.alloc(Type::Void),
    };

    let sig = FunctionSig {
        params: param_tys,
        ret: ret_ty,
        c_abi: f.extern_abi.is_some(),
    };
    let fn_ty = ms.types.alloc(Type::Function(sig));
    if let Some(sym_id) = f.symbol {
        ms.symbols.get_mut(sym_id).ty = fn_ty;
    }

    if let Some(body) = &mut f.body {
        let fn_ctx = stmt::FnCtx { return_type: ret_ty };
        stmt::check_block(body, cu_id, &fn_ctx, false, ms, errors);
    }
}

/// Allocates the `Type::Struct` entry and back-patches the declaration's own symbol before
/// resolving field types, so a field referencing this struct through a pointer or slice
/// indirection sees an already-bound (if not yet complete) type instead of an unresolved name
/// (§4.H "struct completion").
fn check_struct_decl(s: &mut StructDecl, cu_id: CuId, ms: &mut ModuleSet, errors: &mut ErrorList) {
    let sym_id = s.symbol.expect("struct declarations always have a symbol after the symbol walk");
    match &mut s.fields {
        None => {
            let ty = ms.types.alloc(Type::Struct {
                symbol: sym_id,
                fields: Vec::new(),
                scope: s.scope,
                fully_typed: true,
            });
            ms.symbols.get_mut(sym_id).ty = ty;
        }
        Some(field_decls) => {
            let placeholder = ms.types.alloc(Type::Struct {
                symbol: sym_id,
                fields: Vec::new(),
                scope: s.scope,
                fully_typed: false,
            });
            ms.symbols.get_mut(sym_id).ty = placeholder;

            let mut fields = Vec::with_capacity(field_decls.len());
            for fd in field_decls.iter_mut() {
                let fty = resolve_type_expr(&mut fd.ty, s.scope, cu_id, ms, errors);
                if let Some(fsym) = fd.symbol {
                    ms.symbols.get_mut(fsym).ty = fty;
                }
                fields.push(StructField { name: fd.name, ty: fty });
            }

            *ms.types.get_mut(placeholder) = Type::Struct {
                symbol: sym_id,
                fields,
                scope: s.scope,
                fully_typed: true,
            };
        }
    }
}

fn check_type_alias_decl(t: &mut TypeAliasDecl, module_scope: ScopeId, cu_id: CuId, ms: &mut ModuleSet, errors: &mut ErrorList) {
    let sym_id = t.symbol.expect("type alias declarations always have a symbol after the symbol walk");
    let placeholder = ms.types.alloc(Type::Alias {
        name: t.name,
        target: TypeArena::INVALID,
    });
    ms.symbols.get_mut(sym_id).ty = placeholder;

    let target_ty = resolve_type_expr(&mut t.target, module_scope, cu_id, ms, errors);
    if let Type::Alias { target, .. } = ms.types.get_mut(placeholder) {
        *target = target_ty;
    }
}

fn check_import_decl(symbol: Option<SymbolId>, i: &mut ImportDecl, ms: &mut ModuleSet, errors: &mut ErrorList) {
    let sym_id = match symbol {
        Some(id) => id,
        None => return,
    };
    let loc = i.location.to_source_location(&ms.string_table);
    let path = InternedPath::from_components(i.path.clone());
    match ms.find_by_fqn(&path) {
        Some(target_mod) => {
            let target_sym = ms
                .module(target_mod)
                .symbol
                .expect("a loaded module always has a symbol by the time typeck runs");
            let target_ty = ms.symbols.get(target_sym).ty;
            ms.symbols.get_mut(sym_id).ty = target_ty;
        }
        None => {
            let joined = i
                .path
                .iter()
                .map(|s| ms.string_table.resolve(*s))
                .collect::<Vec<_>>()
                .join("::");
            errors.push(CompileError::name_resolution(format!("cannot find module `{joined}`"), loc));
            ms.symbols.get_mut(sym_id).ty = TypeArena::INVALID;
        }
    }
}
