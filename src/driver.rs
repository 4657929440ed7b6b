//! Pipeline driver (§2.1.O). Composes the module loader, the two resolve passes, the type
//! checker, and the topological sort into one staged entry point, then validates the main
//! module's entry-point signature against the back-end contract.

use crate::ast::decl::DeclKind;
use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::diagnostics::location::SourceLocation;
use crate::module_set::{self, ModuleSet};
use crate::resolve::{dependency_walk, symbol_walk};
use crate::settings::Config;
use crate::types::{IntKind, Type};
use crate::{symbol_log, topo_log, typeck_log};

/// Result of running the full pipeline. `module_set` is always populated, even on failure, so
/// callers can still inspect partially-checked state for diagnostics or tooling purposes.
pub struct CompileOutput {
    pub module_set: ModuleSet,
    pub errors: ErrorList,
}

impl CompileOutput {
    /// Matches §5's "a program is rejected if any non-warning error is present".
    pub fn is_ready_for_backend(&self) -> bool {
        !self.errors.is_error()
    }
}

pub fn compile(config: &Config) -> CompileOutput {
    let (mut module_set, mut errors) = module_set::load(config);
    if errors.is_error() {
        return CompileOutput { module_set, errors };
    }

    let symbol_errors = symbol_walk(&mut module_set);
    symbol_log!("symbol walk produced {} error(s)", symbol_errors.len());
    errors.extend(symbol_errors);
    if errors.is_error() {
        return CompileOutput { module_set, errors };
    }

    dependency_walk(&mut module_set);

    let typeck_errors = crate::typeck::type_check(&mut module_set);
    typeck_log!("type check produced {} error(s)", typeck_errors.len());
    errors.extend(typeck_errors);

    let topo_errors = crate::topo::topo_sort(&mut module_set);
    topo_log!("topological sort produced {} error(s)", topo_errors.len());
    errors.extend(topo_errors);

    if !errors.is_error() {
        if let Some(main_errors) = validate_main(&module_set) {
            errors.extend(main_errors);
        }
    }

    CompileOutput { module_set, errors }
}

/// Back-end contract (§6): if a main module exists, it must contain a C-ABI `main` function
/// with one of the allowed parameter shapes and an `i32` return type. Returns `None` when
/// there is no main module to validate (a library compiled on its own is not required to have
/// one).
fn validate_main(ms: &ModuleSet) -> Option<ErrorList> {
    let main_module = ms.main_module?;
    let mut errors = ErrorList::new();
    let module = ms.module(main_module);

    let main_fn = module.decls.iter().find_map(|decl| match &decl.kind {
        DeclKind::Func(f) if ms.string_table.resolve(f.name) == "main" => Some((f, decl)),
        _ => None,
    });

    let Some((func, decl)) = main_fn else {
        errors.push(CompileError::name_resolution(
            "main module must define a function named `main`",
            SourceLocation::none(),
        ));
        return Some(errors);
    };

    let loc = decl.location.to_source_location(&ms.string_table);

    if func.extern_abi.is_none() {
        errors.push(CompileError::type_error("`main` must use C-ABI linkage (`extern`)", loc.clone()));
    }

    if !matches!(func.return_type.as_ref().map(|t| t.resolved), Some(ty) if matches!(ms.types.get(ty), Type::Int(IntKind::I32))) {
        errors.push(CompileError::type_error("`main` must return `i32`", loc.clone()));
    }

    if !is_allowed_main_shape(func, ms) {
        errors.push(CompileError::type_error(
            "`main` must take `()`, `(i32)`, or `(i32, &&i8)`",
            loc,
        ));
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

fn is_allowed_main_shape(func: &crate::ast::decl::FuncDecl, ms: &ModuleSet) -> bool {
    let param_tys: Vec<_> = func.params.iter().map(|p| ms.types.get(p.ty.resolved)).collect();
    match param_tys.as_slice() {
        [] => true,
        [Type::Int(IntKind::I32)] => true,
        [Type::Int(IntKind::I32), Type::Pointer { pointee, read_only: false }] => {
            matches!(
                ms.types.get(*pointee),
                Type::Pointer {
                    pointee: inner,
                    read_only: false,
                } if matches!(ms.types.get(*inner), Type::Int(IntKind::I8))
            )
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn well_formed_main_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "extern fun main() i32 { return 0; }");
        let config = Config::new(entry);
        let output = compile(&config);
        assert!(output.is_ready_for_backend(), "{:?}", output.errors.iter().map(|e| &e.msg).collect::<Vec<_>>());
    }

    #[test]
    fn missing_main_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "val x i32 = 1;");
        let config = Config::new(entry);
        let output = compile(&config);
        assert!(!output.is_ready_for_backend());
    }

    #[test]
    fn non_c_abi_main_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "fun main() i32 { return 0; }");
        let config = Config::new(entry);
        let output = compile(&config);
        assert!(!output.is_ready_for_backend());
    }

    #[test]
    fn cyclic_program_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "extern fun main() i32 { return 0; }\nval a i32 = b;\nval b i32 = a;");
        let config = Config::new(entry);
        let output = compile(&config);
        assert!(!output.is_ready_for_backend());
    }
}
