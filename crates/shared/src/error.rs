//! Error types for the mission planner

use crate::kind::EntityKind;
use thiserror::Error;

/// Fault raised by a store adapter (one table)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Row '{id}' not found in table '{table}'")]
    RowNotFound { table: String, id: String },

    #[error("Row '{id}' already exists in table '{table}'")]
    DuplicateId { table: String, id: String },

    #[error("Table '{table}' is unavailable: {reason}")]
    Unavailable { table: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the routes and missions repositories
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The entity handed to a save/remove/restore call has no id
    #[error("Invalid {kind}: {reason}")]
    InvalidEntity { kind: EntityKind, reason: String },

    /// A stored row references a type id that is not registered
    #[error("Unknown {kind} type '{type_id}'")]
    UnresolvedType { kind: EntityKind, type_id: String },

    /// A mission already has an operation running
    #[error("Mission '{mission}' already has an operation in progress")]
    OperationInProgress { mission: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    /// Missing/null id on an entity of the given kind
    pub fn null_id(kind: EntityKind) -> Self {
        RepositoryError::InvalidEntity {
            kind,
            reason: "entity has no id".to_string(),
        }
    }

    /// Errors scoped to a single entity; the caller may carry on with other work
    pub fn is_entity_scoped(&self) -> bool {
        matches!(
            self,
            RepositoryError::InvalidEntity { .. }
                | RepositoryError::UnresolvedType { .. }
                | RepositoryError::OperationInProgress { .. }
        )
    }
}

/// General planner error type
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Type catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<StoreError> for PlannerError {
    fn from(err: StoreError) -> Self {
        PlannerError::Repository(RepositoryError::Store(err))
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
