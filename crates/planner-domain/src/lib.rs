//! # Mission Planner Domain Layer
//!
//! Entities, type descriptors and the ports the rest of the planner is
//! built against.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (This Crate)                    │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │  model/     - Entities, descriptors, attributes, patterns   ││
//! │  │  repository/- Port traits (Table, Routes/MissionsRepository)││
//! │  │  event      - Change events and observer handles            ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! A mission owns its route and home point. A route does NOT own its
//! waypoints: they are shared by relation and live until the last route
//! referencing them lets go.

pub mod event;
pub mod model;
pub mod repository;

// Re-export commonly used types
pub use model::{
    attribute::{AttributeDef, AttributeKind, Attributes},
    entity::{share, Entity, Shared, SharedExt},
    id::EntityId,
    mission::Mission,
    operation::{MissionOperation, OperationKind, OperationState},
    pattern::{DefaultPatternFactory, RoutePattern, RoutePatternFactory},
    route::Route,
    types::{Descriptor, MissionType, Positioned, RoutePatternType, RouteType, WaypointType},
    waypoint::{Position, Waypoint},
};

pub use repository::{
    missions_repository::MissionsRepository, routes_repository::RoutesRepository, table::Table,
};

pub use event::{ChangeEvent, ChangeKind, MissionEvent, Observer, RouteEvent, SubscriptionId};
