//! # Mission Planner Shared
//!
//! Common types used across all mission planner crates: the row vocabulary
//! exchanged with store adapters, entity kinds, errors and configuration.

pub mod config;
pub mod error;
pub mod kind;
pub mod row;

// Re-exports
pub use config::*;
pub use error::*;
pub use kind::*;
pub use row::*;
