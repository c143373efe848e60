//! # Mission Planner Store Adapters
//!
//! Implementations of the `Table` port from `planner-domain`.
//!
//! ## Structure
//!
//! - `in_memory` - Ordered, thread-safe row storage
//! - `database`  - Named tables with JSON snapshot persistence

pub mod database;
pub mod in_memory;

pub use database::{Database, DatabaseSnapshot};
pub use in_memory::InMemoryTable;
