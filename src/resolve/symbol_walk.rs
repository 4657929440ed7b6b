//! §4.F Symbol Walk. Responsibility: insert every declaration into its owning scope and attach
//! the resulting symbol to the declaration node. Blocks, for-statements, function parameter
//! lists, and struct bodies each get a freshly allocated child scope, replacing the `ScopeId(0)`
//! placeholders the parser left behind (it has no access to the shared `ScopeArena`). This pass
//! only assigns symbol identity and kind; types stay `TypeArena::UNTYPED` until §4.H.

use crate::ast::decl::{DeclKind, FuncDecl, Mutability, StructDecl, TopDecl, Visibility};
use crate::ast::stmt::{Block, Stmt, StmtKind};
use crate::diagnostics::errors::CompileError;
use crate::diagnostics::errors::ErrorList;
use crate::interned_path::InternedPath;
use crate::module_set::ModuleSet;
use crate::string_interning::StringId;
use crate::symbol::{CuId, Scope, ScopeId, ScopeKind, Symbol, SymbolFlags, SymbolId, SymbolKind};
use crate::types::TypeArena;

pub fn symbol_walk(ms: &mut ModuleSet) -> ErrorList {
    let mut errors = ErrorList::new();
    for i in 0..ms.modules.len() {
        let module_scope = ms.modules[i].module_scope;
        let module_fqn = ms.modules[i].fqn.clone();
        let mut decls = std::mem::take(&mut ms.modules[i].decls);
        for decl in &mut decls {
            walk_top_decl(decl, module_scope, &module_fqn, ms, &mut errors);
        }
        ms.modules[i].decls = decls;
    }
    errors
}

fn symbol_kind_for(kind: &DeclKind) -> SymbolKind {
    match kind {
        DeclKind::Val(_) => SymbolKind::Val,
        DeclKind::Func(_) => SymbolKind::Func,
        DeclKind::Struct(_) => SymbolKind::Type,
        DeclKind::TypeAlias(_) => SymbolKind::Type,
        DeclKind::Import(_) => SymbolKind::Module,
    }
}

fn flags_for(kind: &DeclKind, visibility: Visibility) -> SymbolFlags {
    let public = visibility == Visibility::Public;
    let defined = match kind {
        DeclKind::Val(v) => !(v.extern_abi.is_some() && v.initializer.is_none()),
        DeclKind::Func(f) => f.body.is_some(),
        DeclKind::Struct(s) => s.fields.is_some(),
        DeclKind::TypeAlias(_) => true,
        DeclKind::Import(_) => true,
    };
    let read_only = match kind {
        DeclKind::Val(v) => !matches!(v.mutability, Mutability::Var),
        _ => true,
    };
    let is_const = matches!(kind, DeclKind::Val(v) if v.mutability == Mutability::Const);
    SymbolFlags {
        defined,
        public,
        read_only,
        is_const,
        builtin: false,
        dep_cycle: false,
    }
}

fn extern_abi_for(kind: &DeclKind) -> Option<StringId> {
    match kind {
        DeclKind::Val(v) => v.extern_abi,
        DeclKind::Func(f) => f.extern_abi,
        _ => None,
    }
}

/// Bind `key` to a freshly-allocated symbol in `scope`, reporting a redeclaration diagnostic
/// against the previous binding (if any) and, when `check_type_shadow` is set, a separate
/// diagnostic if `key` already names a type visible through an outer scope (§4.F "rejects using
/// a type name as a value name"). Returns the new symbol's id either way — the new binding wins,
/// matching [`crate::symbol::ScopeArena::define`]'s failure-isolation policy.
fn define_checked(
    scope: ScopeId,
    key: StringId,
    sym: Symbol,
    check_type_shadow: bool,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) -> SymbolId {
    let name_str = ms.string_table.resolve(key).to_string();
    let loc = sym.location;

    if check_type_shadow && ms.scopes.get(scope).local(key).is_none() {
        if let Some(outer_id) = ms.scopes.lookup(scope, key) {
            if ms.symbols.get(outer_id).kind == SymbolKind::Type {
                errors.push(CompileError::name_resolution(
                    format!("cannot use type name `{name_str}` as a value name"),
                    loc.to_source_location(&ms.string_table),
                ));
            }
        }
    }

    let sym_id = ms.symbols.alloc(sym);
    if let Some(prev_id) = ms.scopes.define(scope, key, sym_id) {
        let prev_loc = ms.symbols.get(prev_id).location.to_source_location(&ms.string_table);
        errors.push(
            CompileError::name_resolution(
                format!("`{name_str}` is already declared in this scope"),
                loc.to_source_location(&ms.string_table),
            )
            .with_trace(
                "previously declared at",
                vec![format!("{}:{}", prev_loc.file.display(), prev_loc.start.line)],
            ),
        );
    }
    sym_id
}

fn walk_top_decl(
    decl: &mut TopDecl,
    module_scope: ScopeId,
    module_fqn: &InternedPath,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) {
    let cu_id = decl.cu_id;
    let key = decl.name();
    let loc = decl.location;
    let kind = symbol_kind_for(&decl.kind);
    let check_shadow = !matches!(kind, SymbolKind::Type | SymbolKind::Module);

    let mut sym = Symbol::new(kind, key, cu_id, module_fqn.clone(), key, loc, TypeArena::UNTYPED);
    sym.flags = flags_for(&decl.kind, decl.visibility);
    sym.abi = extern_abi_for(&decl.kind);

    let sym_id = define_checked(module_scope, key, sym, check_shadow, ms, errors);
    decl.symbol = Some(sym_id);

    match &mut decl.kind {
        DeclKind::Func(f) => walk_func(f, module_scope, cu_id, module_fqn, ms, errors),
        DeclKind::Struct(s) => walk_struct(s, module_scope, cu_id, module_fqn, ms, errors),
        DeclKind::Val(_) | DeclKind::TypeAlias(_) | DeclKind::Import(_) => {}
    }
}

fn walk_func(
    f: &mut FuncDecl,
    module_scope: ScopeId,
    cu_id: CuId,
    module_fqn: &InternedPath,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) {
    f.param_scope = ms.scopes.alloc(Scope::new(Some(module_scope), ScopeKind::Block, cu_id));
    for param in &mut f.params {
        let sym = Symbol::new(
            SymbolKind::Val,
            param.name,
            cu_id,
            module_fqn.clone(),
            param.name,
            param.location,
            TypeArena::UNTYPED,
        );
        let sym_id = define_checked(f.param_scope, param.name, sym, false, ms, errors);
        param.symbol = Some(sym_id);
    }
    if let Some(body) = &mut f.body {
        walk_block(body, f.param_scope, cu_id, module_fqn, ms, errors);
    }
}

fn walk_struct(
    s: &mut StructDecl,
    module_scope: ScopeId,
    cu_id: CuId,
    module_fqn: &InternedPath,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) {
    s.scope = ms.scopes.alloc(Scope::new(Some(module_scope), ScopeKind::Field, cu_id));
    if let Some(fields) = &mut s.fields {
        for field in fields {
            let sym = Symbol::new(
                SymbolKind::Field,
                field.name,
                cu_id,
                module_fqn.clone(),
                field.name,
                field.location,
                TypeArena::UNTYPED,
            );
            let sym_id = define_checked(s.scope, field.name, sym, false, ms, errors);
            field.symbol = Some(sym_id);
        }
    }
}

fn walk_block(
    block: &mut Block,
    outer_scope: ScopeId,
    cu_id: CuId,
    module_fqn: &InternedPath,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) {
    block.scope = ms.scopes.alloc(Scope::new(Some(outer_scope), ScopeKind::Block, cu_id));
    for stmt in &mut block.stmts {
        walk_stmt(stmt, block.scope, cu_id, module_fqn, ms, errors);
    }
}

fn walk_stmt(
    stmt: &mut Stmt,
    scope: ScopeId,
    cu_id: CuId,
    module_fqn: &InternedPath,
    ms: &mut ModuleSet,
    errors: &mut ErrorList,
) {
    match &mut stmt.kind {
        StmtKind::Block(b) => walk_block(b, scope, cu_id, module_fqn, ms, errors),
        StmtKind::Decl(local) => {
            let mut sym = Symbol::new(
                SymbolKind::Val,
                local.name,
                cu_id,
                module_fqn.clone(),
                local.name,
                local.location,
                TypeArena::UNTYPED,
            );
            sym.flags = SymbolFlags {
                defined: true,
                public: false,
                read_only: !matches!(local.mutability, Mutability::Var),
                is_const: local.mutability == Mutability::Const,
                builtin: false,
                dep_cycle: false,
            };
            let sym_id = define_checked(scope, local.name, sym, true, ms, errors);
            local.symbol = Some(sym_id);
        }
        StmtKind::If { branches, otherwise } => {
            for (_cond, body) in branches {
                walk_block(body, scope, cu_id, module_fqn, ms, errors);
            }
            if let Some(otherwise) = otherwise {
                walk_block(otherwise, scope, cu_id, module_fqn, ms, errors);
            }
        }
        StmtKind::For {
            init,
            cond: _,
            inc,
            body,
            scope: for_scope,
        } => {
            *for_scope = ms.scopes.alloc(Scope::new(Some(scope), ScopeKind::For, cu_id));
            if let Some(init) = init {
                walk_stmt(init, *for_scope, cu_id, module_fqn, ms, errors);
            }
            if let Some(inc) = inc {
                walk_stmt(inc, *for_scope, cu_id, module_fqn, ms, errors);
            }
            walk_block(body, *for_scope, cu_id, module_fqn, ms, errors);
        }
        StmtKind::Return(_)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Assign { .. }
        | StmtKind::ExprStmt(_)
        | StmtKind::Defer(_)
        | StmtKind::Bad => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Config;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn function_and_params_get_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "fun add(a: i32, b: i32) -> i32 { return a + b }");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());

        let errors = symbol_walk(&mut set);
        assert!(!errors.is_error(), "{:?}", errors.iter().collect::<Vec<_>>());

        let module_id = set.main_module.unwrap();
        let decl = &set.module(module_id).decls[0];
        assert!(decl.symbol.is_some());
        if let DeclKind::Func(f) = &decl.kind {
            assert_ne!(f.param_scope.0, 0);
            for p in &f.params {
                assert!(p.symbol.is_some());
            }
            let body = f.body.as_ref().unwrap();
            assert_ne!(body.scope.0, 0);
        } else {
            panic!("expected a function declaration");
        }
    }

    #[test]
    fn redeclaration_in_same_scope_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "val x: i32 = 1;\nval x: i32 = 2;");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());

        let errors = symbol_walk(&mut set);
        assert!(errors.is_error());
    }

    #[test]
    fn value_cannot_shadow_a_builtin_type_name() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "val i32: bool = true;");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());

        let errors = symbol_walk(&mut set);
        assert!(errors.is_error());
    }

    #[test]
    fn struct_fields_get_symbols_in_a_dedicated_scope() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "struct Point { x: i32, y: i32 }");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());

        let errors = symbol_walk(&mut set);
        assert!(!errors.is_error(), "{:?}", errors.iter().collect::<Vec<_>>());

        let module_id = set.main_module.unwrap();
        let decl = &set.module(module_id).decls[0];
        if let DeclKind::Struct(s) = &decl.kind {
            assert_ne!(s.scope.0, 0);
            let fields = s.fields.as_ref().unwrap();
            for f in fields {
                assert!(f.symbol.is_some());
            }
        } else {
            panic!("expected a struct declaration");
        }
    }

    #[test]
    fn nested_for_loop_variable_is_visible_inside_its_own_body() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(
            &dir,
            "main.kl",
            "fun main() -> i32 { for (var i: i32 = 0; i < 10; i = i + 1) { val j: i32 = i; } return 0 }",
        );
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());

        let errors = symbol_walk(&mut set);
        assert!(!errors.is_error(), "{:?}", errors.iter().collect::<Vec<_>>());
    }
}
