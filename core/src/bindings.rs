//! Lexical scopes for template variables.
//!
//! A [`Bindings`] store maps names to [`Value`]s for one scope and reads
//! through to a chain of parent scopes for names it does not bind itself:
//!
//! ```text
//! {% for item in items %}      child scope: binds `item`, `forloop`
//!   {{ item }} {{ title }}     `title` resolves in the parent
//! {% endfor %}
//! ```
//!
//! Writes always go to the local map, never to a parent. Parents are captured
//! as immutable snapshots when a child is created, so later writes to the
//! parent are not visible to existing children either. Local maps are shared
//! copy-on-write: creating a child scope does not copy anything, and the
//! parent only copies its local map on its next write.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::value::Value;

type Frame = HashMap<String, Value>;

/// Frozen view of a scope, shared by all children created from it.
#[derive(Debug)]
struct Snapshot {
    vars: Rc<Frame>,
    parent: Option<Rc<Snapshot>>,
}

/// Variable bindings for one lexical scope.
#[derive(Debug, Default)]
pub struct Bindings {
    vars: Rc<Frame>,
    parent: Option<Rc<Snapshot>>,
}

impl Bindings {
    /// Create an empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a name, searching this scope first and then its ancestors.
    ///
    /// Returns `None` if no scope in the chain binds the name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.vars.get(name) {
            return Some(value);
        }
        let mut scope = self.parent.as_deref();
        while let Some(snapshot) = scope {
            if let Some(value) = snapshot.vars.get(name) {
                return Some(value);
            }
            scope = snapshot.parent.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bind `name` in this scope, replacing any previous local binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        Rc::make_mut(&mut self.vars).insert(name.into(), value.into());
    }

    /// Bind every pair in this scope.
    pub fn update<I, K, V>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let vars = Rc::make_mut(&mut self.vars);
        for (name, value) in bindings {
            vars.insert(name.into(), value.into());
        }
    }

    /// Create a child scope.
    ///
    /// The child sees every binding visible here at the time of the call.
    /// Its own writes stay in the child.
    pub fn clone_scope(&self) -> Self {
        let snapshot = Snapshot {
            vars: Rc::clone(&self.vars),
            parent: self.parent.clone(),
        };
        Self {
            vars: Rc::default(),
            parent: Some(Rc::new(snapshot)),
        }
    }

    /// Number of ancestor scopes.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.parent.as_deref();
        while let Some(snapshot) = scope {
            depth += 1;
            scope = snapshot.parent.as_deref();
        }
        depth
    }

    /// Names bound directly in this scope, in no particular order.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        bindings.update(iter);
        bindings
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Bindings {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.update(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_unbound_is_none() {
        let bindings = Bindings::new();
        assert_eq!(bindings.get("missing"), None);

        let child = bindings.clone_scope().clone_scope();
        assert_eq!(child.get("missing"), None);
    }

    #[test]
    fn test_set_then_get() {
        let mut bindings = Bindings::new();
        bindings.set("a", 1);
        assert_eq!(bindings.get("a"), Some(&Value::Int(1)));

        bindings.set("a", "two");
        assert_eq!(bindings.get("a"), Some(&Value::from("two")));
    }

    #[test]
    fn test_child_reads_through_to_parent() {
        let mut parent: Bindings = [("a", 1), ("b", 2)].into_iter().collect();
        parent.set("c", 3);

        let child = parent.clone_scope();
        assert_eq!(child.get("a"), Some(&Value::Int(1)));
        assert_eq!(child.get("c"), Some(&Value::Int(3)));
        assert_eq!(child.depth(), 1);
    }

    #[test]
    fn test_child_writes_are_isolated() {
        let mut parent = Bindings::new();
        parent.set("a", 1);

        let mut child = parent.clone_scope();
        child.set("a", 10);
        child.set("b", 20);

        assert_eq!(child.get("a"), Some(&Value::Int(10)));
        assert_eq!(parent.get("a"), Some(&Value::Int(1)));
        assert_eq!(parent.get("b"), None);
    }

    #[test]
    fn test_parent_writes_after_clone_are_invisible() {
        let mut parent = Bindings::new();
        parent.set("a", 1);

        let sibling = parent.clone_scope();
        parent.set("a", 2);
        parent.set("v", "new");

        assert_eq!(parent.get("v"), Some(&Value::from("new")));
        assert_eq!(sibling.get("v"), None);
        assert_eq!(sibling.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_deep_chain_shadowing() {
        let mut root = Bindings::new();
        root.set("x", "root");
        root.set("y", "root");

        let mut middle = root.clone_scope();
        middle.set("x", "middle");

        let leaf = middle.clone_scope();
        assert_eq!(leaf.get("x"), Some(&Value::from("middle")));
        assert_eq!(leaf.get("y"), Some(&Value::from("root")));
        assert_eq!(leaf.depth(), 2);
    }

    #[test]
    fn test_update_merges_locally() {
        let mut parent = Bindings::new();
        parent.set("keep", true);

        let mut child = parent.clone_scope();
        child.update([("keep", false), ("new", true)]);

        assert_eq!(child.get("keep"), Some(&Value::Bool(false)));
        let mut names: Vec<_> = child.local_names().collect();
        names.sort_unstable();
        assert_eq!(names, ["keep", "new"]);
        assert_eq!(parent.get("keep"), Some(&Value::Bool(true)));
    }
}
