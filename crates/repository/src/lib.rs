//! # Mission Planner Repository
//!
//! Keeps the live mission/route/waypoint graph and the table store in sync.
//!
//! ## Structure
//!
//! - `registry`            - Type descriptor arena (`TypeRegistry`)
//! - `cache`               - `EntityCache` and the route/waypoint `RelationIndex`
//! - `notifier`            - Synchronous change observers
//! - `journal`             - Bounded event history
//! - `routes_repository`   - `TableRoutesRepository`
//! - `missions_repository` - `TableMissionsRepository`
//! - `catalog`             - YAML type catalogs
//!
//! ## Locking
//!
//! Each repository is a monitor. The missions repository calls into the
//! routes repository while holding its own lock; the reverse never happens.

pub mod cache;
pub mod catalog;
pub mod journal;
pub mod missions_repository;
pub mod notifier;
pub mod registry;
pub mod routes_repository;

#[cfg(test)]
mod test_support;

pub use cache::{EntityCache, RelationIndex};
pub use catalog::{CatalogTypes, MissionTypeDef, RouteTypeDef, TypeCatalog};
pub use journal::{EventJournal, JournalEntry, JournalStats};
pub use missions_repository::TableMissionsRepository;
pub use notifier::{channel_observer, ChangeNotifier};
pub use registry::TypeRegistry;
pub use routes_repository::TableRoutesRepository;
