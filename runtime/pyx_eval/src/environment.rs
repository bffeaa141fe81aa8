//! Function-local scopes.
//!
//! Module-level code binds names straight into the module's globals dict.
//! Function calls and comprehensions get a [`Scope`]; a scope's parent is
//! the scope of the enclosing function, so nested functions and lambdas
//! can read (not rebind) the names of the function that created them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Value;

/// Shared handle to a [`Scope`].
///
/// Closures keep their defining scope alive through this handle, so it is
/// shared (`Arc`) and lockable rather than owned by the call frame.
#[repr(transparent)]
pub struct LocalScope(Arc<RwLock<Scope>>);

impl LocalScope {
    pub fn new(scope: Scope) -> Self {
        LocalScope(Arc::new(RwLock::new(scope)))
    }

    /// Look `name` up in this scope and its parents.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let scope = self.0.read();
        if let Some(value) = scope.bindings.get(name) {
            return Some(value.clone());
        }
        let parent = scope.parent.clone();
        drop(scope);
        parent.and_then(|p| p.lookup(name))
    }

    /// Bind `name` in this scope only.
    pub fn define(&self, name: &str, value: Value) {
        self.0.write().bindings.insert(name.to_string(), value);
    }

    /// Unbind `name` from this scope; returns whether it was bound.
    pub fn remove(&self, name: &str) -> bool {
        self.0.write().bindings.remove(name).is_some()
    }

    /// Snapshot of this scope's own bindings, for `locals()`.
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let scope = self.0.read();
        let mut pairs: Vec<_> = scope
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Move the bindings into `out` when this is the last handle to the
    /// scope; a scope still shared by another closure is left alone.
    pub(crate) fn reclaim_unshared(&mut self, out: &mut Vec<Value>) {
        if let Some(scope) = Arc::get_mut(&mut self.0) {
            out.extend(scope.get_mut().bindings.drain().map(|(_, value)| value));
        }
    }

    /// Drop every binding, releasing what the scope kept alive.
    pub fn clear(&self) {
        let mut scope = self.0.write();
        scope.bindings.clear();
        scope.parent = None;
    }
}

impl Clone for LocalScope {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Arc::clone(&self.0))
    }
}

impl fmt::Debug for LocalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").finish_non_exhaustive()
    }
}

/// Bindings of one function activation.
#[derive(Default)]
pub struct Scope {
    bindings: FxHashMap<String, Value>,
    parent: Option<LocalScope>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn with_parent(parent: Option<LocalScope>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_through_to_parent() {
        let outer = LocalScope::new(Scope::new());
        outer.define("x", Value::Int(1));
        let inner = LocalScope::new(Scope::with_parent(Some(outer.clone())));
        inner.define("y", Value::Int(2));

        assert_eq!(inner.lookup("x"), Some(Value::Int(1)));
        assert_eq!(inner.lookup("y"), Some(Value::Int(2)));
        assert_eq!(outer.lookup("y"), None);
    }

    #[test]
    fn define_shadows_parent() {
        let outer = LocalScope::new(Scope::new());
        outer.define("x", Value::Int(1));
        let inner = LocalScope::new(Scope::with_parent(Some(outer.clone())));
        inner.define("x", Value::Int(5));
        assert_eq!(inner.lookup("x"), Some(Value::Int(5)));
        assert_eq!(outer.lookup("x"), Some(Value::Int(1)));
        assert!(inner.remove("x"));
        assert_eq!(inner.lookup("x"), Some(Value::Int(1)));
    }
}
