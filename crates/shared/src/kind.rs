//! Entity kinds handled by the repositories

use serde::{Deserialize, Serialize};

/// Closed set of entity kinds that participate in cache/store synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Mission,
    Route,
    Waypoint,
    HomePoint,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Mission => "mission",
            EntityKind::Route => "route",
            EntityKind::Waypoint => "waypoint",
            EntityKind::HomePoint => "home point",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
