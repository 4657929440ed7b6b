//! Topological sort / cycle detection (§4.I). Runs after the type checker: each module's
//! declarations are reordered into a dependency-respecting sequence via the same white/gray/
//! black DFS coloring the type checker uses internally, except this pass is the one that owns
//! the real [`crate::ast::decl::Color`] on `TopDecl` and is the one that reports cycles.
//!
//! Cross-module edges are not followed here — by the time a module is loaded, every module it
//! imports has already been fully ordered (§4.E), so only same-module edges can still form a
//! cycle this pass needs to detect.

use std::collections::HashSet;

use crate::ast::decl::{Color, DeclId, ModuleId, TopDecl};
use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::module_set::ModuleSet;
use crate::symbol::SymbolId;

pub fn topo_sort(ms: &mut ModuleSet) -> ErrorList {
    let mut errors = ErrorList::new();
    for i in 0..ms.modules.len() {
        sort_module(ModuleId(i as u32), ms, &mut errors);
    }
    errors
}

struct Ctx<'a> {
    order: Vec<usize>,
    path: Vec<usize>,
    reported: HashSet<usize>,
    decls: &'a mut [TopDecl],
}

fn sort_module(module: ModuleId, ms: &mut ModuleSet, errors: &mut ErrorList) {
    let mut decls = std::mem::take(&mut ms.module_mut(module).decls);
    let len = decls.len();

    let mut ctx = Ctx {
        order: Vec::with_capacity(len),
        path: Vec::new(),
        reported: HashSet::new(),
        decls: &mut decls,
    };
    for i in 0..len {
        visit(module, i, &mut ctx, ms, errors);
    }
    let Ctx { order, .. } = ctx;

    let mut slots: Vec<Option<TopDecl>> = decls.into_iter().map(Some).collect();
    let reordered: Vec<TopDecl> = order.into_iter().map(|i| slots[i].take().expect("each index visited exactly once")).collect();
    ms.module_mut(module).decls = reordered;
}

fn visit(module: ModuleId, i: usize, ctx: &mut Ctx, ms: &mut ModuleSet, errors: &mut ErrorList) {
    match ctx.decls[i].color {
        Color::Black => return,
        Color::Gray => {
            report_cycle(i, ctx, ms, errors);
            return;
        }
        Color::White => {}
    }

    ctx.decls[i].color = Color::Gray;
    ctx.path.push(i);

    let deps: Vec<(ModuleId, DeclId)> = ctx.decls[i].deps.clone();
    for (dep_mod, dep_decl) in deps {
        if dep_mod != module {
            continue;
        }
        visit(module, dep_decl.0 as usize, ctx, ms, errors);
    }

    ctx.path.pop();
    ctx.decls[i].color = Color::Black;
    ctx.order.push(i);
}

fn report_cycle(target: usize, ctx: &mut Ctx, ms: &mut ModuleSet, errors: &mut ErrorList) {
    let start = match ctx.path.iter().position(|&d| d == target) {
        Some(pos) => pos,
        None => return,
    };
    let cycle: Vec<usize> = ctx.path[start..].to_vec();

    if cycle.iter().all(|d| ctx.reported.contains(d)) {
        return;
    }

    let mut sym_ids: Vec<SymbolId> = Vec::new();
    for &d in &cycle {
        ctx.reported.insert(d);
        if let Some(sym_id) = ctx.decls[d].symbol {
            sym_ids.push(sym_id);
        }
    }
    for sym_id in sym_ids {
        ms.symbols.get_mut(sym_id).flags.dep_cycle = true;
    }

    let lines: Vec<String> = cycle
        .iter()
        .map(|&d| {
            let name = ms.string_table.resolve(ctx.decls[d].name()).to_string();
            let loc = ctx.decls[d].location.to_source_location(&ms.string_table);
            format!("{name} at {}:{}", loc.start.line, loc.start.column)
        })
        .collect();

    let first = cycle[0];
    let loc = ctx.decls[first].location.to_source_location(&ms.string_table);
    let name = ms.string_table.resolve(ctx.decls[first].name()).to_string();
    errors.push(CompileError::dependency_cycle(
        format!("dependency cycle involving `{name}`"),
        loc,
        "cycle",
        lines,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{dependency_walk, symbol_walk};
    use crate::settings::Config;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn forward_referenced_value_is_reordered_before_its_dependent() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "val b: i32 = a + 1;\nval a: i32 = 1;");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());
        symbol_walk(&mut set);
        dependency_walk(&mut set);
        let errors = topo_sort(&mut set);
        assert!(!errors.is_error());

        let module_id = set.main_module.unwrap();
        let names: Vec<_> = set
            .module(module_id)
            .decls
            .iter()
            .map(|d| set.string_table.resolve(d.name()).to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn mutually_recursive_functions_are_not_flagged_as_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(
            &dir,
            "main.kl",
            "fun is_even(n: i32) -> bool { return is_odd(n); }\nfun is_odd(n: i32) -> bool { return is_even(n); }",
        );
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());
        symbol_walk(&mut set);
        dependency_walk(&mut set);
        let errors = topo_sort(&mut set);
        assert!(!errors.is_error());
    }

    #[test]
    fn cyclic_value_initializers_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "val a: i32 = b;\nval b: i32 = a;");
        let config = Config::new(entry);
        let (mut set, load_errors) = crate::module_set::load(&config);
        assert!(!load_errors.is_error());
        symbol_walk(&mut set);
        dependency_walk(&mut set);
        let errors = topo_sort(&mut set);
        assert!(errors.is_error());
    }
}
