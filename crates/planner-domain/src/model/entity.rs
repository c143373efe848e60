//! Entity capability and shared handles
//!
//! Live entities are shared between the repositories and their callers
//! through `Shared<T>`. The handle is what the caches hold; the id inside
//! it is what the caches are keyed by.

use super::id::EntityId;
use shared::{EntityKind, Row};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Capability set every persisted entity implements
pub trait Entity {
    fn id(&self) -> &EntityId;

    fn kind(&self) -> EntityKind;

    /// Serialize into a row for the entity's table
    fn to_row(&self) -> Row;

    /// Refresh mutable fields from a stored row. The id never changes.
    fn apply_row(&mut self, row: &Row);
}

/// Shared, lockable handle to a live entity
pub type Shared<T> = Arc<RwLock<T>>;

pub fn share<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Lock access that shrugs off poisoning
///
/// Entities hold plain data; a panic while one was locked cannot leave it
/// half-linked, so the value is still usable.
pub trait SharedExt<T> {
    fn read_entity(&self) -> RwLockReadGuard<'_, T>;
    fn write_entity(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> SharedExt<T> for RwLock<T> {
    fn read_entity(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entity(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(PoisonError::into_inner)
    }
}
