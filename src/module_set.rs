//! Module loader (§4.E): turns a [`crate::settings::Config`]'s entry file plus library
//! directories into a [`ModuleSet`] whose modules carry stable FQNs and scopes. Three passes:
//! (1) recursively parse each root file and its `include` closure, merging declarations into
//! the module the nesting chain identifies; (2) resolve every `import` against the resulting
//! FQN index, including transitive `pub import` re-exports; (3) identify the main module.
//!
//! Mirrors the teacher's `module_dependencies.rs` in spirit (one pass builds a dependency/FQN
//! index before anything downstream runs), rewritten against this crate's arena types.

use crate::ast::decl::ModuleId;
use crate::ast::{File, Module};
use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::diagnostics::location::SourceLocation;
use crate::interned_path::InternedPath;
use crate::settings::Config;
use crate::string_interning::StringTable;
use crate::symbol::{CuId, Scope, ScopeArena, ScopeId, ScopeKind, Symbol, SymbolArena, SymbolFlags, SymbolKind};
use crate::token::CharPosition;
use crate::types::{FloatKind, IntKind, Type, TypeArena};
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Owns every file, module, scope, symbol, and type produced by loading a program (§5: "the
/// `ModuleSet` exclusively owns all files, modules, declarations, scopes, and symbols").
pub struct ModuleSet {
    pub string_table: StringTable,
    pub scopes: ScopeArena,
    pub symbols: SymbolArena,
    pub types: TypeArena,
    /// Parent of every module's `builtin` scope; holds the built-in type symbols (§6) shared
    /// by the whole program.
    pub global_scope: ScopeId,
    pub modules: Vec<Module>,
    pub main_module: Option<ModuleId>,
    pub files: Vec<File>,
}

impl ModuleSet {
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0 as usize]
    }

    pub fn find_by_fqn(&self, fqn: &InternedPath) -> Option<ModuleId> {
        self.modules.iter().find(|m| &m.fqn == fqn).map(|m| m.id)
    }
}

const BUILTIN_INTS: [(&str, IntKind); 8] = [
    ("i8", IntKind::I8),
    ("i16", IntKind::I16),
    ("i32", IntKind::I32),
    ("i64", IntKind::I64),
    ("u8", IntKind::U8),
    ("u16", IntKind::U16),
    ("u32", IntKind::U32),
    ("u64", IntKind::U64),
];

const BUILTIN_FLOATS: [(&str, FloatKind); 2] = [("f32", FloatKind::F32), ("f64", FloatKind::F64)];

fn seed_builtins(
    scope: ScopeId,
    scopes: &mut ScopeArena,
    symbols: &mut SymbolArena,
    types: &mut TypeArena,
    table: &mut StringTable,
) {
    let loc = crate::token::TextLocation::default();
    let mut define = |name: &str, ty: Type, symbols: &mut SymbolArena, table: &mut StringTable| {
        let ty_id = types.alloc(ty);
        let key = table.intern(name);
        let mut sym = Symbol::new(
            SymbolKind::Type,
            key,
            CuId(u32::MAX),
            InternedPath::new(),
            key,
            loc,
            ty_id,
        );
        sym.flags = SymbolFlags {
            defined: true,
            public: true,
            read_only: true,
            is_const: false,
            builtin: true,
            dep_cycle: false,
        };
        let id = symbols.alloc(sym);
        scopes.define(scope, key, id);
    };

    define("void", Type::Void, symbols, table);
    define("bool", Type::Bool, symbols, table);
    for (name, kind) in BUILTIN_INTS {
        define(name, Type::Int(kind), symbols, table);
    }
    for (name, kind) in BUILTIN_FLOATS {
        define(name, Type::Float(kind), symbols, table);
    }
}

/// Recursively descend `dir` collecting every file with the language's extension
/// (§2.1.M) as an additional, independently-rooted compilation unit.
fn collect_source_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_source_files(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some(crate::settings::LANGUAGE_FILE_EXTENSION) {
            out.push(path);
        }
    }
}

struct Loader {
    table: StringTable,
    scopes: ScopeArena,
    symbols: SymbolArena,
    types: TypeArena,
    global_scope: ScopeId,
    modules: Vec<Module>,
    files: Vec<File>,
    errors: ErrorList,
    fqn_to_module: FxHashMap<InternedPath, ModuleId>,
    /// First file whose own `module` header declared a given FQN, for the duplicate-local-FQN
    /// diagnostic (§4.E.4).
    local_fqn_origin: FxHashMap<InternedPath, SourceLocation>,
}

impl Loader {
    fn ensure_module(&mut self, fqn: InternedPath, cu_id: CuId) -> ModuleId {
        if let Some(&id) = self.fqn_to_module.get(&fqn) {
            return id;
        }
        let builtin_scope = self
            .scopes
            .alloc(Scope::new(Some(self.global_scope), ScopeKind::Builtin, cu_id));
        let module_scope = self
            .scopes
            .alloc(Scope::new(Some(builtin_scope), ScopeKind::ModuleRoot, cu_id));
        let id = ModuleId(self.modules.len() as u32);

        // Bind the parent module's own symbol into this module's builtin scope under its
        // last path segment (§4.E.5 "an auto-inserted parent-module symbol bound to the
        // containing module"), if a module already claims the parent FQN.
        if let Some(parent_fqn) = fqn.parent() {
            if let Some(&parent_id) = self.fqn_to_module.get(&parent_fqn) {
                if let (Some(name), Some(sym)) = (parent_fqn.name(), self.modules[parent_id.0 as usize].symbol) {
                    self.scopes.define(builtin_scope, name, sym);
                }
            }
        }

        self.modules.push(Module {
            id,
            fqn: fqn.clone(),
            builtin_scope,
            module_scope,
            decls: Vec::new(),
            is_main: false,
            symbol: None,
        });

        let module_ty = self.types.alloc(Type::Module { symbol: crate::symbol::SymbolId(0), scope: module_scope });
        let name = fqn.name().unwrap_or_else(|| self.table.intern(""));
        let mut sym = Symbol::new(SymbolKind::Module, name, cu_id, fqn.clone(), name, crate::token::TextLocation::default(), module_ty);
        sym.flags.defined = true;
        sym.flags.public = true;
        let sym_id = self.symbols.alloc(sym);
        if let Type::Module { symbol, .. } = self.types.get_mut(module_ty) {
            *symbol = sym_id;
        }
        self.modules[id.0 as usize].symbol = Some(sym_id);

        self.fqn_to_module.insert(fqn, id);
        id
    }

    /// Parse `path` and every file it (transitively) `include`s, merging declarations into the
    /// module the nesting chain identifies. Returns that file's own (possibly inherited) FQN.
    fn load_file_tree(
        &mut self,
        path: &Path,
        parent_fqn: InternedPath,
        cu_id: CuId,
        in_progress: &mut HashSet<PathBuf>,
    ) -> Option<InternedPath> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !in_progress.insert(canonical.clone()) {
            self.errors.push(CompileError::name_resolution(
                format!("cyclic include involving `{}`", path.display()),
                SourceLocation::new(path.to_path_buf(), CharPosition::NONE, CharPosition::NONE),
            ));
            return None;
        }

        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                self.errors.push(CompileError::io(
                    format!("cannot read `{}`: {e}", path.display()),
                    SourceLocation::new(path.to_path_buf(), CharPosition::NONE, CharPosition::NONE),
                ));
                in_progress.remove(&canonical);
                return None;
            }
        };

        let (mut file, parse_errors) = crate::parser::parse_file(&source, path.to_path_buf(), cu_id, &mut self.table);
        self.errors.extend(parse_errors);

        let own_fqn = match &file.module_name {
            Some(segments) => {
                let mut fqn = parent_fqn.clone();
                for seg in segments {
                    fqn.push(*seg);
                }
                fqn
            }
            None => parent_fqn.clone(),
        };

        if file.module_name.is_some() {
            let loc = file
                .module_header_location
                .map(|l| l.to_source_location(&self.table))
                .unwrap_or_else(SourceLocation::none);
            if let Some(prior) = self.local_fqn_origin.get(&own_fqn) {
                self.errors.push(CompileError::name_resolution(
                    format!(
                        "module `{}` is declared by more than one file",
                        own_fqn.to_fqn_string(&self.table)
                    ),
                    loc.clone(),
                ).with_trace(
                    "also declared at",
                    vec![format!("{}:{}", prior.file.display(), prior.start.line)],
                ));
            } else {
                self.local_fqn_origin.insert(own_fqn.clone(), loc);
            }
        }

        let module_id = self.ensure_module(own_fqn.clone(), cu_id);

        for mut decl in std::mem::take(&mut file.decls) {
            decl.module = module_id;
            let module = &mut self.modules[module_id.0 as usize];
            decl.id = crate::ast::decl::DeclId(module.decls.len() as u32);
            module.decls.push(decl);
        }

        file.module_id = module_id;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        for rel in file.file_deps.clone() {
            let child_path = dir.join(&rel);
            if !child_path.exists() {
                self.errors.push(CompileError::io(
                    format!("include path not found: `{}`", child_path.display()),
                    SourceLocation::new(path.to_path_buf(), CharPosition::NONE, CharPosition::NONE),
                ));
                continue;
            }
            self.load_file_tree(&child_path, own_fqn.clone(), cu_id, in_progress);
        }

        in_progress.remove(&canonical);
        self.files.push(file);
        Some(own_fqn)
    }

    /// Pass 2 (§4.E.3): resolve every `import`/`use` against the FQN index built by pass 1,
    /// propagating `pub import` as a re-export so a third module can import *through* this
    /// one. Re-exports can chain, so this runs to a fixed point before reporting failures.
    fn resolve_imports(&mut self) {
        loop {
            let mut added = false;
            for file in &self.files {
                let importing_fqn = self.modules[file.module_id.0 as usize].fqn.clone();
                for dep in &file.mod_deps {
                    if dep.visibility != crate::ast::decl::Visibility::Public {
                        continue;
                    }
                    let path = InternedPath::from_components(dep.path.clone());
                    let Some(&target_id) = self.fqn_to_module.get(&path) else {
                        continue;
                    };
                    let bound_name = dep.alias.unwrap_or_else(|| *dep.path.last().unwrap());
                    let reexported_fqn = importing_fqn.append(bound_name);
                    if !self.fqn_to_module.contains_key(&reexported_fqn) {
                        self.fqn_to_module.insert(reexported_fqn, target_id);
                        added = true;
                    }
                }
            }
            if !added {
                break;
            }
        }

        for file in &self.files {
            let importing_module_scope = self.modules[file.module_id.0 as usize].module_scope;
            let importing_cu = file.cu_id;
            let importing_fqn = self.modules[file.module_id.0 as usize].fqn.clone();
            for dep in &file.mod_deps {
                let path = InternedPath::from_components(dep.path.clone());
                let Some(&target_id) = self.fqn_to_module.get(&path) else {
                    self.errors.push(CompileError::name_resolution(
                        format!("unresolved import `{}`", path.to_fqn_string(&self.table)),
                        dep.location.to_source_location(&self.table),
                    ));
                    continue;
                };
                let bound_name = dep.alias.unwrap_or_else(|| *dep.path.last().unwrap());
                let target_scope = self.modules[target_id.0 as usize].module_scope;
                let module_ty = self.types.alloc(Type::Module {
                    symbol: crate::symbol::SymbolId(0),
                    scope: target_scope,
                });
                let mut sym = Symbol::new(
                    SymbolKind::Module,
                    bound_name,
                    importing_cu,
                    importing_fqn.clone(),
                    bound_name,
                    dep.location,
                    module_ty,
                );
                sym.flags.defined = true;
                sym.flags.public = dep.visibility == crate::ast::decl::Visibility::Public;
                let sym_id = self.symbols.alloc(sym);
                if let Type::Module { symbol, .. } = self.types.get_mut(module_ty) {
                    *symbol = sym_id;
                }
                if let Some(prev) = self.scopes.define(importing_module_scope, bound_name, sym_id) {
                    let prev_loc = self.symbols.get(prev).location.to_source_location(&self.table);
                    self.errors.push(
                        CompileError::name_resolution(
                            "import shadows an existing binding in this module",
                            dep.location.to_source_location(&self.table),
                        )
                        .with_trace("previously bound at", vec![format!("{}:{}", prev_loc.file.display(), prev_loc.start.line)]),
                    );
                }
            }
        }
    }
}

/// Load a whole program (§4.E): the config's entry file plus every source file recursively
/// found under its library directories, each an independent compilation unit.
pub fn load(config: &Config) -> (ModuleSet, ErrorList) {
    let mut table = StringTable::new();
    let mut scopes = ScopeArena::new();
    let mut symbols = SymbolArena::new();
    let mut types = TypeArena::new();
    let global_scope = scopes.alloc(Scope::new(None, ScopeKind::Root, CuId(u32::MAX)));
    seed_builtins(global_scope, &mut scopes, &mut symbols, &mut types, &mut table);

    let mut root_paths = vec![config.entry_file.clone()];
    for dir in &config.library_dirs {
        collect_source_files(dir, &mut root_paths);
    }

    let mut loader = Loader {
        table,
        scopes,
        symbols,
        types,
        global_scope,
        modules: Vec::new(),
        files: Vec::new(),
        errors: ErrorList::new(),
        fqn_to_module: FxHashMap::default(),
        local_fqn_origin: FxHashMap::default(),
    };

    let mut main_fqn = None;
    for (i, root_path) in root_paths.iter().enumerate() {
        let cu_id = CuId(i as u32);
        let mut in_progress = HashSet::new();
        let fqn = loader.load_file_tree(root_path, InternedPath::new(), cu_id, &mut in_progress);
        if i == 0 {
            main_fqn = fqn;
        }
    }

    loader.resolve_imports();

    let main_module = main_fqn.and_then(|fqn| loader.fqn_to_module.get(&fqn).copied());
    if let Some(id) = main_module {
        loader.modules[id.0 as usize].is_main = true;
    }

    let module_set = ModuleSet {
        string_table: loader.table,
        scopes: loader.scopes,
        symbols: loader.symbols,
        types: loader.types,
        global_scope,
        modules: loader.modules,
        main_module,
        files: loader.files,
    };
    (module_set, loader.errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn single_file_with_no_module_header_is_the_root_module() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "fun main() -> i32 { return 0; }");
        let config = Config::new(entry);
        let (set, errors) = load(&config);
        assert!(!errors.is_error(), "{:?}", errors.iter().collect::<Vec<_>>());
        assert_eq!(set.modules.len(), 1);
        assert!(set.main_module.is_some());
        assert_eq!(set.module(set.main_module.unwrap()).decls.len(), 1);
    }

    #[test]
    fn include_merges_declarations_into_the_including_module() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(&dir, "helper.kl", "val y: i32 = 2;");
        let entry = write_temp(&dir, "main.kl", "include \"helper.kl\";\nval x: i32 = 1;");
        let config = Config::new(entry);
        let (set, errors) = load(&config);
        assert!(!errors.is_error(), "{:?}", errors.iter().collect::<Vec<_>>());
        assert_eq!(set.modules.len(), 1);
        assert_eq!(set.module(set.main_module.unwrap()).decls.len(), 2);
    }

    #[test]
    fn unknown_include_path_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "include \"missing.kl\";");
        let config = Config::new(entry);
        let (_set, errors) = load(&config);
        assert!(errors.is_error());
    }

    #[test]
    fn unresolved_import_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write_temp(&dir, "main.kl", "import nowhere::thing;");
        let config = Config::new(entry);
        let (_set, errors) = load(&config);
        assert!(errors.is_error());
    }

    #[test]
    fn library_dir_module_is_importable() {
        let dir = tempfile::tempdir().unwrap();
        let lib_dir = dir.path().join("lib");
        std::fs::create_dir(&lib_dir).unwrap();
        write_temp(&dir, "lib/math.kl", "module math;\npub fun square() -> i32 { return 0; }");
        let entry = write_temp(&dir, "main.kl", "import math;");
        let mut config = Config::new(entry);
        config.library_dirs.push(lib_dir);
        let (_set, errors) = load(&config);
        assert!(!errors.is_error(), "{:?}", errors.iter().collect::<Vec<_>>());
    }
}
