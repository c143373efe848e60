//! Entity identity
//!
//! Identity, not attribute equality, decides cache membership.
//! An id is assigned once at construction and never changes.

use serde::{Deserialize, Serialize};
use shared::Value;

/// Globally unique identifier of an entity
///
/// The empty id is the "null" id: entities read from incomplete rows carry
/// it, and the repositories refuse to save, remove or restore them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The null id
    pub fn null() -> Self {
        Self(String::new())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an id from a row value; numbers are accepted and stringified
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(s.clone()),
            Value::Number(n) => Self(n.to_string()),
            _ => Self::null(),
        }
    }

    pub fn to_value(&self) -> Value {
        if self.is_null() {
            Value::Null
        } else {
            Value::String(self.0.clone())
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("<null>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
