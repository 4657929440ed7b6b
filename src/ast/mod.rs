pub mod decl;
pub mod expr;
pub mod stmt;
pub mod ty;

use crate::string_interning::StringId;
use crate::symbol::ScopeId;
use decl::TopDecl;

/// A line comment captured verbatim, used downstream to recover the `// expect-dgc:` /
/// `// expect-exe:` test-directive channel (§6) without re-scanning source text.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub location: crate::token::TextLocation,
}

impl Comment {
    /// Strips the directive prefix and leading whitespace, e.g. `"// expect-dgc: foo"` ->
    /// `Some("foo")` for `prefix = "expect-dgc:"`.
    pub fn directive(&self, prefix: &str) -> Option<&str> {
        let body = self.text.trim_start_matches('/').trim_start();
        body.strip_prefix(prefix).map(|rest| rest.trim())
    }
}

#[derive(Debug, Clone)]
pub struct ModDep {
    pub path: Vec<StringId>,
    pub alias: Option<StringId>,
    pub visibility: decl::Visibility,
    pub location: crate::token::TextLocation,
}

/// One parsed source file (§4.C "Outputs"), before the module loader (§4.E) merges its
/// declarations into the module tree addressed by its `module_name` / include chain.
#[derive(Debug, Clone)]
pub struct File {
    pub filename: std::path::PathBuf,
    pub module_name: Option<Vec<StringId>>,
    /// Range of the `module ...;` header, if present; used to point a duplicate-FQN
    /// diagnostic (§4.E.4) at both declaring files.
    pub module_header_location: Option<crate::token::TextLocation>,
    /// Literal `include "path"` strings, relative to this file, in source order.
    pub file_deps: Vec<String>,
    pub mod_deps: Vec<ModDep>,
    pub comments: Vec<Comment>,
    pub decls: Vec<TopDecl>,
    /// Set once this file's compilation unit id is assigned by the loader (§4.E); every
    /// declaration parsed from this file shares it.
    pub cu_id: crate::symbol::CuId,
    /// The module this file's declarations were merged into; placeholder `ModuleId(0)` until
    /// the loader assigns it.
    pub module_id: decl::ModuleId,
}

impl File {
    pub fn new(filename: std::path::PathBuf, cu_id: crate::symbol::CuId) -> Self {
        Self {
            filename,
            module_name: None,
            module_header_location: None,
            file_deps: Vec::new(),
            mod_deps: Vec::new(),
            comments: Vec::new(),
            decls: Vec::new(),
            cu_id,
            module_id: decl::ModuleId(0),
        }
    }
}

/// A resolved module: its fully-qualified name, its two nested scopes (§4.E.5), and its
/// (eventually dependency-ordered, §4.I) top-level declarations.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: decl::ModuleId,
    pub fqn: crate::interned_path::InternedPath,
    pub builtin_scope: ScopeId,
    pub module_scope: ScopeId,
    pub decls: Vec<TopDecl>,
    pub is_main: bool,
    /// Module-kind symbol representing this module as a value usable in scope-lookup
    /// position (`A::B`) and bound into a nested child's builtin scope as its "parent module"
    /// symbol (§4.E.5). `None` only while the module is still under construction.
    pub symbol: Option<crate::symbol::SymbolId>,
}
