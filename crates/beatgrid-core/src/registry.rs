//! Name-keyed listener storage that iterates in registration order.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::listener::Listener;

/// Prefix of generated names for listeners registered without one.
pub const AUTO_NAME_PREFIX: &str = "_b";

/// Counter for generated listener names, shared by a tempo and its handles.
#[derive(Clone, Debug, Default)]
pub(crate) struct AutoIds(Rc<Cell<u64>>);

impl AutoIds {
    pub fn next_name(&self) -> String {
        let id = self.0.get();
        self.0.set(id + 1);
        format!("{AUTO_NAME_PREFIX}{id}")
    }
}

/// Listeners keyed by name.
///
/// Overwriting a name keeps its original slot in the iteration order.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    listeners: HashMap<String, Listener>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a listener, returning the one it replaced.
    pub fn insert(&mut self, listener: Listener) -> Option<Listener> {
        let name = listener.name().to_string();
        let replaced = self.listeners.insert(name.clone(), listener);
        if replaced.is_none() {
            self.order.push(name);
        }
        replaced
    }

    pub fn remove(&mut self, name: &str) -> Option<Listener> {
        let removed = self.listeners.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Listener> {
        self.listeners.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Listener> {
        self.listeners.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.listeners.contains_key(name)
    }

    /// Names in registration order; a stable snapshot for one evaluation pass.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
        self.order.clear();
    }
}
