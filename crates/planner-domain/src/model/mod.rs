//! Domain Models - The vocabulary of mission planning
//!
//! Entities (`Mission`, `Route`, `Waypoint`), the operations run on
//! missions, and the immutable type descriptors that define which kinds of
//! them exist.

pub mod attribute;
pub mod entity;
pub mod id;
pub mod mission;
pub mod operation;
pub mod pattern;
pub mod route;
pub mod types;
pub mod waypoint;
