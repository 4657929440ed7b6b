//! §4.G Dependency Walk. A read-only pass over the already symbol-walked tree: for every
//! top-level declaration, look up each identifier it references through the same scope chain
//! the symbol walk built, and record an edge to the other top-level declaration that binding
//! belongs to (if any — references to locals, params, and fields never produce an edge, only
//! references to *other module-level declarations* do). Function-to-function edges are dropped
//! so ordinary mutual recursion between functions never registers as a dependency cycle (§4.I
//! only needs to order value/type/struct initialization, not call graphs).
//!
//! This pass never reports a diagnostic of its own: an identifier that fails to resolve here is
//! simply not recorded as a dependency — §4.H's expression checker is the one that reports
//! undefined-name errors.

use crate::ast::decl::{DeclId, DeclKind, ModuleId, TopDecl};
use crate::ast::expr::{Expr, ExprKind};
use crate::ast::stmt::{Block, Stmt, StmtKind};
use crate::ast::ty::{TypeExpr, TypeExprKind};
use crate::module_set::ModuleSet;
use crate::symbol::{ScopeId, SymbolId};
use std::collections::{HashMap, HashSet};

struct DeclInfo {
    module: ModuleId,
    decl: DeclId,
    is_function: bool,
}

pub fn dependency_walk(ms: &mut ModuleSet) {
    let mut symbol_to_decl: HashMap<SymbolId, DeclInfo> = HashMap::new();
    for module in &ms.modules {
        for decl in &module.decls {
            if let Some(sym_id) = decl.symbol {
                symbol_to_decl.insert(
                    sym_id,
                    DeclInfo {
                        module: module.id,
                        decl: decl.id,
                        is_function: decl.is_function(),
                    },
                );
            }
        }
    }

    for i in 0..ms.modules.len() {
        let module_scope = ms.modules[i].module_scope;
        let mut decls = std::mem::take(&mut ms.modules[i].decls);
        for decl in &mut decls {
            walk_top_decl(decl, module_scope, ms, &symbol_to_decl);
        }
        ms.modules[i].decls = decls;
    }
}

fn add_edge(
    sym_id: SymbolId,
    current_is_function: bool,
    edges: &mut HashSet<(ModuleId, DeclId)>,
    symbol_to_decl: &HashMap<SymbolId, DeclInfo>,
) {
    if let Some(info) = symbol_to_decl.get(&sym_id) {
        if current_is_function && info.is_function {
            return;
        }
        edges.insert((info.module, info.decl));
    }
}

fn walk_top_decl(
    decl: &mut TopDecl,
    module_scope: ScopeId,
    ms: &ModuleSet,
    symbol_to_decl: &HashMap<SymbolId, DeclInfo>,
) {
    let is_function = decl.is_function();
    let mut edges = HashSet::new();

    match &decl.kind {
        DeclKind::Val(v) => {
            if let Some(dt) = &v.declared_type {
                walk_type_expr(dt, module_scope, ms, is_function, &mut edges, symbol_to_decl);
            }
            if let Some(init) = &v.initializer {
                walk_expr(init, module_scope, ms, is_function, &mut edges, symbol_to_decl);
            }
        }
        DeclKind::Func(f) => {
            for param in &f.params {
                walk_type_expr(&param.ty, module_scope, ms, is_function, &mut edges, symbol_to_decl);
            }
            if let Some(rt) = &f.return_type {
                walk_type_expr(rt, module_scope, ms, is_function, &mut edges, symbol_to_decl);
            }
            if let Some(body) = &f.body {
                walk_block(body, ms, is_function, &mut edges, symbol_to_decl);
            }
        }
        DeclKind::Struct(s) => {
            if let Some(fields) = &s.fields {
                for field in fields {
                    walk_type_expr(&field.ty, module_scope, ms, is_function, &mut edges, symbol_to_decl);
                }
            }
        }
        DeclKind::TypeAlias(t) => {
            walk_type_expr(&t.target, module_scope, ms, is_function, &mut edges, symbol_to_decl);
        }
        DeclKind::Import(_) => {}
    }

    decl.deps = edges.into_iter().collect();
}

/// `scope` is the scope that directly contains `block`'s statements — for a function body this
/// is the param scope; for a nested block or loop body it's whatever scope its parent statement
/// opened. Statements themselves carry no `scope` field (only `Block`/`For` do), so it is
/// threaded down explicitly here rather than looked up from the node.
fn walk_block(
    block: &Block,
    ms: &ModuleSet,
    is_function: bool,
    edges: &mut HashSet<(ModuleId, DeclId)>,
    symbol_to_decl: &HashMap<SymbolId, DeclInfo>,
) {
    for stmt in &block.stmts {
        walk_stmt(stmt, block.scope, ms, is_function, edges, symbol_to_decl);
    }
}

fn walk_stmt(
    stmt: &Stmt,
    scope: ScopeId,
    ms: &ModuleSet,
    is_function: bool,
    edges: &mut HashSet<(ModuleId, DeclId)>,
    symbol_to_decl: &HashMap<SymbolId, DeclInfo>,
) {
    match &stmt.kind {
        StmtKind::Block(b) => walk_block(b, ms, is_function, edges, symbol_to_decl),
        StmtKind::Decl(local) => {
            if let Some(dt) = &local.declared_type {
                walk_type_expr(dt, scope, ms, is_function, edges, symbol_to_decl);
            }
            if let Some(init) = &local.initializer {
                walk_expr(init, scope, ms, is_function, edges, symbol_to_decl);
            }
        }
        StmtKind::If { branches, otherwise } => {
            for (cond, body) in branches {
                walk_expr(cond, scope, ms, is_function, edges, symbol_to_decl);
                walk_block(body, ms, is_function, edges, symbol_to_decl);
            }
            if let Some(otherwise) = otherwise {
                walk_block(otherwise, ms, is_function, edges, symbol_to_decl);
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
                walk_stmt(init, *for_scope, ms, is_function, edges, symbol_to_decl);
            }
            if let Some(cond) = cond {
                walk_expr(cond, *for_scope, ms, is_function, edges, symbol_to_decl);
            }
            if let Some(inc) = inc {
                walk_stmt(inc, *for_scope, ms, is_function, edges, symbol_to_decl);
            }
            walk_block(body, ms, is_function, edges, symbol_to_decl);
        }
        StmtKind::Return(Some(e)) => walk_expr(e, scope, ms, is_function, edges, symbol_to_decl),
        StmtKind::Assign { target, value, .. } => {
            walk_expr(target, scope, ms, is_function, edges, symbol_to_decl);
            walk_expr(value, scope, ms, is_function, edges, symbol_to_decl);
        }
        StmtKind::ExprStmt(e) | StmtKind::Defer(e) => walk_expr(e, scope, ms, is_function, edges, symbol_to_decl),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Bad => {}
    }
}

fn walk_expr(
    expr: &Expr,
    scope: ScopeId,
    ms: &ModuleSet,
    is_function: bool,
    edges: &mut HashSet<(ModuleId, DeclId)>,
    symbol_to_decl: &HashMap<SymbolId, DeclInfo>,
) {
    match &expr.kind {
        ExprKind::Ident { name, .. } => {
            if let Some(sym_id) = ms.scopes.lookup(scope, *name) {
                add_edge(sym_id, is_function, edges, symbol_to_decl);
            }
        }
        ExprKind::ScopeLookup { segments, absolute, .. } => {
            let start = if *absolute { ms.global_scope } else { scope };
            if let Some(first) = segments.first() {
                if let Some(sym_id) = ms.scopes.lookup(start, *first) {
                    add_edge(sym_id, is_function, edges, symbol_to_decl);
                }
            }
        }
        ExprKind::Dot { base, .. } => walk_expr(base, scope, ms, is_function, edges, symbol_to_decl),
        ExprKind::BasicLit(_) | ExprKind::Const(_) | ExprKind::Bad => {}
        ExprKind::StructLit { name, fields, .. } => {
            walk_expr(name, scope, ms, is_function, edges, symbol_to_decl);
            for (_, value) in fields {
                walk_expr(value, scope, ms, is_function, edges, symbol_to_decl);
            }
        }
        ExprKind::ArrayLit(items) => {
            for item in items {
                walk_expr(item, scope, ms, is_function, edges, symbol_to_decl);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, scope, ms, is_function, edges, symbol_to_decl);
            walk_expr(rhs, scope, ms, is_function, edges, symbol_to_decl);
        }
        ExprKind::Unary { operand, .. }
        | ExprKind::AddressOf { operand, .. }
        | ExprKind::Deref(operand)
        | ExprKind::Lenof(operand)
        | ExprKind::Typeof(operand) => walk_expr(operand, scope, ms, is_function, edges, symbol_to_decl),
        ExprKind::Index { base, index } => {
            walk_expr(base, scope, ms, is_function, edges, symbol_to_decl);
            walk_expr(index, scope, ms, is_function, edges, symbol_to_decl);
        }
        ExprKind::Slice { base, low, high } => {
            walk_expr(base, scope, ms, is_function, edges, symbol_to_decl);
            if let Some(low) = low {
                walk_expr(low, scope, ms, is_function, edges, symbol_to_decl);
            }
            if let Some(high) = high {
                walk_expr(high, scope, ms, is_function, edges, symbol_to_decl);
            }
        }
        ExprKind::Call { callee, args } => {
            walk_expr(callee, scope, ms, is_function, edges, symbol_to_decl);
            for arg in args {
                walk_expr(arg, scope, ms, is_function, edges, symbol_to_decl);
            }
        }
        ExprKind::Cast { expr, ty } => {
            walk_expr(expr, scope, ms, is_function, edges, symbol_to_decl);
            walk_type_expr(ty, scope, ms, is_function, edges, symbol_to_decl);
        }
        ExprKind::Sizeof(ty) => walk_type_expr(ty, scope, ms, is_function, edges, symbol_to_decl),
    }
}

fn walk_type_expr(
    ty: &TypeExpr,
    scope: ScopeId,
    ms: &ModuleSet,
    is_function: bool,
    edges: &mut HashSet<(ModuleId, DeclId)>,
    symbol_to_decl: &HashMap<SymbolId, DeclInfo>,
) {
    match &ty.kind {
        TypeExprKind::Named { segments, absolute } => {
            let start = if *absolute { ms.global_scope } else { scope };
            if let Some(first) = segments.first() {
                if let Some(sym_id) = ms.scopes.lookup(start, *first) {
                    add_edge(sym_id, is_function, edges, symbol_to_decl);
                }
            }
        }
        // Indirection breaks the ordering requirement: codegen stores a pointer/slice descriptor
        // without needing the pointee's layout resolved first, so `struct Node { next: &Node }`
        // must not register a self-edge the way direct embedding does.
        TypeExprKind::Pointer { .. } | TypeExprKind::Slice { .. } => {}
        TypeExprKind::Array { elem, size } => {
            walk_type_expr(elem, scope, ms, is_function, edges, symbol_to_decl);
            walk_expr(size, scope, ms, is_function, edges, symbol_to_decl);
        }
        TypeExprKind::Paren(inner) => walk_type_expr(inner, scope, ms, is_function, edges, symbol_to_decl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::symbol_walk;
    use crate::settings::Config;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn value_initializer_referencing_another_value_produces_an_edge() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "val a: i32 = 1;\nval b: i32 = a + 1;");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());
        let sym_errors = symbol_walk(&mut set);
        assert!(!sym_errors.is_error());

        dependency_walk(&mut set);

        let module_id = set.main_module.unwrap();
        let b_decl = &set.module(module_id).decls[1];
        assert_eq!(b_decl.deps.len(), 1);
    }

    #[test]
    fn mutually_recursive_functions_produce_no_edges() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(
            &dir,
            "main.kl",
            "fun is_even(n: i32) -> bool { return is_odd(n); }\nfun is_odd(n: i32) -> bool { return is_even(n); }",
        );
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());
        let sym_errors = symbol_walk(&mut set);
        assert!(!sym_errors.is_error());

        dependency_walk(&mut set);

        let module_id = set.main_module.unwrap();
        for decl in &set.module(module_id).decls {
            assert!(decl.deps.is_empty());
        }
    }

    #[test]
    fn local_variable_reference_does_not_produce_an_edge() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "fun main() -> i32 { val x: i32 = 1; return x; }");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());
        let sym_errors = symbol_walk(&mut set);
        assert!(!sym_errors.is_error());

        dependency_walk(&mut set);

        let module_id = set.main_module.unwrap();
        assert!(set.module(module_id).decls[0].deps.is_empty());
    }
}
