//! TypeRegistry - Arena of immutable type descriptors
//!
//! Descriptors are keyed by id and handed out as `Arc`, so an entity can
//! keep its descriptor alive even after the id is unregistered.

use planner_domain::Descriptor;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of descriptors of one kind
#[derive(Debug)]
pub struct TypeRegistry<T> {
    /// All registered descriptors, by id
    types: BTreeMap<String, Arc<T>>,
}

impl<T: Descriptor> TypeRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Register a descriptor.
    ///
    /// First registration wins: returns `false` and keeps the existing
    /// descriptor if the id is already taken.
    pub fn register(&mut self, descriptor: Arc<T>) -> bool {
        if self.types.contains_key(descriptor.id()) {
            return false;
        }
        self.types.insert(descriptor.id().to_string(), descriptor);
        true
    }

    /// Remove a descriptor, returning it
    pub fn unregister(&mut self, id: &str) -> Option<Arc<T>> {
        self.types.remove(id)
    }

    /// Get a descriptor by id
    pub fn lookup(&self, id: &str) -> Option<Arc<T>> {
        self.types.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn all(&self) -> Vec<Arc<T>> {
        self.types.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<T: Descriptor> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
