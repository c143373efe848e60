//! Type descriptors - immutable definitions of entity kinds
//!
//! Descriptors are owned by the type registry and shared with entities
//! through `Arc`. An entity never outlives the descriptor it points to,
//! and no descriptor is ever mutated after construction.

use super::attribute::{default_attributes, AttributeDef, Attributes};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Common surface of every descriptor
pub trait Descriptor {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn attributes(&self) -> &[AttributeDef];

    fn attribute(&self, id: &str) -> Option<&AttributeDef> {
        self.attributes().iter().find(|a| a.id == id)
    }

    fn default_attributes(&self) -> Attributes {
        default_attributes(self.attributes())
    }
}

/// Whether a waypoint of some type carries a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positioned {
    No,
    #[default]
    Required,
    Optional,
}

/// Kind of waypoint / route item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub positioned: Positioned,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

impl WaypointType {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        short_name: impl Into<String>,
        positioned: Positioned,
        attributes: Vec<AttributeDef>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            short_name: short_name.into(),
            positioned,
            attributes,
        }
    }
}

impl Descriptor for WaypointType {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }
}

/// Kind of route, with the waypoint types legal inside it
#[derive(Debug, Clone, PartialEq)]
pub struct RouteType {
    pub id: String,
    pub name: String,
    pub attributes: Vec<AttributeDef>,
    pub waypoint_types: Vec<Arc<WaypointType>>,
}

impl RouteType {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        waypoint_types: Vec<Arc<WaypointType>>,
        attributes: Vec<AttributeDef>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes,
            waypoint_types,
        }
    }

    pub fn waypoint_type(&self, id: &str) -> Option<&Arc<WaypointType>> {
        self.waypoint_types.iter().find(|t| t.id == id)
    }

    /// Check whether waypoints of the given type may appear in routes of this type
    pub fn permits(&self, waypoint_type_id: &str) -> bool {
        self.waypoint_type(waypoint_type_id).is_some()
    }
}

impl Descriptor for RouteType {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }
}

/// Kind of mission: one route type plus the type of its home point
#[derive(Debug, Clone, PartialEq)]
pub struct MissionType {
    pub id: String,
    pub name: String,
    pub route_type: Arc<RouteType>,
    pub home_waypoint_type: Arc<WaypointType>,
}

impl MissionType {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        route_type: Arc<RouteType>,
        home_waypoint_type: Arc<WaypointType>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            route_type,
            home_waypoint_type,
        }
    }
}

impl Descriptor for MissionType {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &[AttributeDef] {
        &[]
    }
}

/// Kind of route pattern (survey grid, loiter, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePatternType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

impl Descriptor for RoutePatternType {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_type_permits_nested_types() {
        let waypoint = Arc::new(WaypointType::new(
            "waypoint",
            "Waypoint",
            "WPT",
            Positioned::Required,
            vec![AttributeDef::boolean("passthrough", "Passthrough", true)],
        ));
        let route_type = RouteType::new("test_route", "Test Route", vec![waypoint], vec![]);

        assert!(route_type.permits("waypoint"));
        assert!(!route_type.permits("circle"));
    }

    #[test]
    fn test_default_attributes() {
        let circle = WaypointType::new(
            "circle",
            "Circle",
            "CRL",
            Positioned::Required,
            vec![AttributeDef::real("radius", "Radius", 100.0).with_bounds(0.0, 5000.0)],
        );

        let defaults = circle.default_attributes();
        assert_eq!(defaults["radius"], json!(100.0));
        assert!(circle.attribute("radius").is_some());
        assert!(circle.attribute("altitude").is_none());
    }
}
