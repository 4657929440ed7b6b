//! Symbol and scope model (§3 "Symbol"/"Scope", §4.F). Symbols and scopes live in their own
//! arenas, keyed by small integer ids, for the same reason types do (§9): a `Symbol`'s type can
//! point into the type arena, a `Type::Struct`/`Type::Module` can point back at the symbol that
//! owns its scope, and a `Scope` holds symbol ids — none of that can be expressed with direct
//! ownership pointers without a cycle.

use crate::interned_path::InternedPath;
use crate::string_interning::StringId;
use crate::token::TextLocation;
use crate::types::TypeId;
use rustc_hash::FxHashMap;

/// Compilation-unit id. Each source file loaded at the top level of the module loader gets its
/// own `CuId`; it is the boundary `priv` visibility is checked against (§4.H "Accessing a
/// private symbol from a different CU is an error").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CuId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Val,
    Func,
    Type,
    Module,
    Field,
}

/// Boolean-valued properties a symbol may carry (§3). Kept as discrete `bool`s rather than a
/// bitflags crate: there are few enough of them, and each is read independently by a different
/// pass (visibility by the symbol walk, `read_only` by the type checker's lvalue rules,
/// `dep_cycle` by the topological sort).
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolFlags {
    pub defined: bool,
    pub public: bool,
    pub read_only: bool,
    pub is_const: bool,
    pub builtin: bool,
    pub dep_cycle: bool,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// The name this symbol is bound under in its owning scope's table. Equal to `name` for
    /// every symbol except synthetic anonymous-function declarations (§4.C), whose `key` is the
    /// generated `$enclosing_anon<n>` identifier while `name` may be empty for display purposes.
    pub key: StringId,
    pub cu_id: CuId,
    pub module_fqn: InternedPath,
    pub name: StringId,
    pub location: TextLocation,
    pub ty: TypeId,
    pub flags: SymbolFlags,
    /// ABI string for `extern` declarations (defaults to `"c"` at parse time, §4.C).
    pub abi: Option<StringId>,
}

impl Symbol {
    pub fn new(
        kind: SymbolKind,
        key: StringId,
        cu_id: CuId,
        module_fqn: InternedPath,
        name: StringId,
        location: TextLocation,
        ty: TypeId,
    ) -> Self {
        Self {
            kind,
            key,
            cu_id,
            module_fqn,
            name,
            location,
            ty,
            flags: SymbolFlags::default(),
            abi: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
        }
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Scope kind, used only for diagnostics and debugging — lookup semantics don't branch on it
/// except for `ModuleRoot`, whose parent is always the module's `Builtin` scope (§4.E.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Builtin,
    ModuleRoot,
    Block,
    For,
    Field,
}

#[derive(Debug)]
pub struct Scope {
    pub outer: Option<ScopeId>,
    pub kind: ScopeKind,
    pub cu_id: CuId,
    names: FxHashMap<StringId, SymbolId>,
}

impl Scope {
    pub fn new(outer: Option<ScopeId>, kind: ScopeKind, cu_id: CuId) -> Self {
        Self {
            outer,
            kind,
            cu_id,
            names: FxHashMap::default(),
        }
    }

    pub fn local(&self, name: StringId) -> Option<SymbolId> {
        self.names.get(&name).copied()
    }
}

#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn alloc(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// Bind `name` in `scope` to `symbol`. Returns the previously-bound symbol on a
    /// redeclaration (§4.F "Redeclarations in the same scope yield a diagnostic pointing at
    /// both positions") so the caller can build that diagnostic; the new binding still wins,
    /// matching the rest of the pipeline's failure-isolation policy of continuing past
    /// individual errors (§5).
    pub fn define(&mut self, scope: ScopeId, name: StringId, symbol: SymbolId) -> Option<SymbolId> {
        let scope = self.get_mut(scope);
        scope.names.insert(name, symbol)
    }

    /// Walk the scope chain starting at `scope`, returning the first binding found.
    pub fn lookup(&self, scope: ScopeId, name: StringId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.get(id);
            if let Some(sym) = s.local(name) {
                return Some(sym);
            }
            current = s.outer;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> TextLocation {
        TextLocation::default()
    }

    #[test]
    fn lookup_walks_outer_chain() {
        let mut scopes = ScopeArena::new();
        let mut symbols = SymbolArena::new();
        let root = scopes.alloc(Scope::new(None, ScopeKind::Root, CuId(0)));
        let block = scopes.alloc(Scope::new(Some(root), ScopeKind::Block, CuId(0)));

        let name = StringId::from_u32(1);
        let sym = symbols.alloc(Symbol::new(
            SymbolKind::Val,
            name,
            CuId(0),
            InternedPath::new(),
            name,
            loc(),
            TypeId(0),
        ));
        scopes.define(root, name, sym);

        assert_eq!(scopes.lookup(block, name), Some(sym));
        assert_eq!(scopes.lookup(root, name), Some(sym));
    }

    #[test]
    fn redeclaration_returns_previous_binding() {
        let mut scopes = ScopeArena::new();
        let root = scopes.alloc(Scope::new(None, ScopeKind::Root, CuId(0)));
        let name = StringId::from_u32(1);
        let first = SymbolId(0);
        let second = SymbolId(1);
        assert_eq!(scopes.define(root, name, first), None);
        assert_eq!(scopes.define(root, name, second), Some(first));
    }
}
