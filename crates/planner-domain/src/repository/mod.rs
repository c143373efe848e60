//! Repository Traits - The "Ports" of Hexagonal Architecture
//!
//! These traits define HOW the domain wants to persist data,
//! but NOT how it's actually done. That's the adapter's job.
//!
//! ```text
//! Domain Layer            │  Adapter Layer
//! ────────────────────────┼──────────────────────────
//! trait Table             │  InMemoryTable (planner-store)
//! trait RoutesRepository  │  TableRoutesRepository (repository)
//! trait MissionsRepository│  TableMissionsRepository (repository)
//! ```

pub mod missions_repository;
pub mod routes_repository;
pub mod table;
