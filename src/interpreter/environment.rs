//! Scope records for name resolution.
//!
//! Scopes live in an arena and refer to their parent by index. A scope's
//! parent is fixed when the scope is created and always points at a scope
//! that already exists, so the chain only ever leads back towards the root.

use std::collections::HashMap;

use super::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

/// The session's root scope plus the stack of call scopes active on top of it.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            current: ScopeId::ROOT,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of scopes held in the arena, the root included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Resolves `name` starting at the current scope and walking outwards.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut id = Some(self.current);
        while let Some(scope) = id.map(|id| self.scope(id)) {
            if let Some(value) = scope.bindings.get(name) {
                return Some(value);
            }
            id = scope.parent;
        }
        None
    }

    /// Binds `name` in the current scope. Ancestors are never written; a
    /// binding there is shadowed instead.
    pub fn assign(&mut self, name: &str, value: Value) {
        let current = self.current.0;
        self.scopes[current].bindings.insert(name.to_string(), value);
    }

    /// Bindings owned by the current scope alone.
    pub fn local_bindings(&self) -> &HashMap<String, Value> {
        &self.scope(self.current).bindings
    }

    pub fn local(&self, name: &str) -> Option<&Value> {
        self.local_bindings().get(name)
    }

    /// Bindings of the current scope's parent, if it has one.
    pub fn parent_bindings(&self) -> Option<&HashMap<String, Value>> {
        self.scope(self.current)
            .parent
            .map(|parent| &self.scope(parent).bindings)
    }

    /// Opens a child of the current scope and makes it current. Returns the
    /// scope that was current before, to hand back to [`Environment::leave`].
    pub fn enter(&mut self) -> ScopeId {
        let caller = self.current;
        self.scopes.push(Scope {
            bindings: HashMap::new(),
            parent: Some(caller),
        });
        self.current = ScopeId(self.scopes.len() - 1);
        caller
    }

    /// Discards the innermost scope and makes `caller` current again. The
    /// root scope is never discarded.
    pub fn leave(&mut self, caller: ScopeId) {
        debug_assert_eq!(self.current.0, self.scopes.len() - 1);
        debug_assert_eq!(self.scope(self.current).parent, Some(caller));
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        self.current = caller;
    }
}

impl<K, const N: usize> From<[(K, Value); N]> for Environment
where
    K: Into<String>,
{
    fn from(bindings: [(K, Value); N]) -> Self {
        let mut environment = Self::new();
        for (name, value) in bindings {
            environment.scopes[0].bindings.insert(name.into(), value);
        }
        environment
    }
}
