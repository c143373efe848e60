//! Waypoint - one item of a route's navigation sequence
//!
//! Waypoints double as generic route items: every waypoint carries a
//! position payload and `current`/`reached` progress flags. A waypoint may
//! be shared by several routes; routes reference it by relation, not by
//! ownership.

use super::attribute::{attributes_from_row, attributes_to_value, sync_attributes, Attributes};
use super::entity::Entity;
use super::id::EntityId;
use super::types::{Descriptor, WaypointType};
use serde::{Deserialize, Serialize};
use shared::{params, EntityKind, Row, RowExt, Value};
use std::sync::Arc;

/// Geodetic position (degrees, metres above mean sea level)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Waypoint {
    id: EntityId,
    name: String,
    waypoint_type: Arc<WaypointType>,
    position: Position,
    attributes: Attributes,
    current: bool,
    reached: bool,
}

impl Waypoint {
    /// Create a waypoint with a fresh id and the type's default attributes
    pub fn new(waypoint_type: Arc<WaypointType>, name: impl Into<String>) -> Self {
        Self::with_id(EntityId::generate(), waypoint_type, name)
    }

    pub fn with_id(id: EntityId, waypoint_type: Arc<WaypointType>, name: impl Into<String>) -> Self {
        let attributes = waypoint_type.default_attributes();
        Self {
            id,
            name: name.into(),
            waypoint_type,
            position: Position::default(),
            attributes,
            current: false,
            reached: false,
        }
    }

    /// Reconstruct a waypoint from its stored row
    pub fn from_row(waypoint_type: Arc<WaypointType>, row: &Row) -> Self {
        let id = row.get(params::ID).map(EntityId::from_value).unwrap_or_default();
        let mut waypoint = Self::with_id(id, waypoint_type, "");
        waypoint.apply_row(row);
        waypoint
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    // ========== Getters ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waypoint_type(&self) -> &Arc<WaypointType> {
        &self.waypoint_type
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn is_reached(&self) -> bool {
        self.reached
    }

    // ========== Mutations ==========

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn set_current(&mut self, current: bool) {
        self.current = current;
    }

    pub fn set_reached(&mut self, reached: bool) {
        self.reached = reached;
    }

    /// Change the type; attributes are re-synced against the new type
    pub fn set_type(&mut self, waypoint_type: Arc<WaypointType>) {
        self.waypoint_type = waypoint_type;
        self.sync_attributes();
    }

    /// Set an attribute if the type permits it, coerced and clamped.
    ///
    /// Returns `false` (and changes nothing) for unknown keys or
    /// values of the wrong kind.
    pub fn set_and_check_attribute(&mut self, key: &str, value: Value) -> bool {
        let coerced = match self.waypoint_type.attribute(key) {
            Some(def) => def.coerce(&value),
            None => None,
        };

        match coerced {
            Some(v) => {
                self.attributes.insert(key.to_string(), v);
                true
            }
            None => false,
        }
    }

    /// Restore one attribute to its type default
    pub fn reset_attribute(&mut self, key: &str) {
        if let Some(def) = self.waypoint_type.attribute(key) {
            self.attributes.insert(key.to_string(), def.default.clone());
        }
    }

    pub fn reset_attributes(&mut self) {
        self.attributes = self.waypoint_type.default_attributes();
    }

    /// Drop attributes the type does not permit and add missing defaults
    pub fn sync_attributes(&mut self) {
        self.attributes = sync_attributes(&self.waypoint_type.attributes, &self.attributes);
    }
}

impl Entity for Waypoint {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Waypoint
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert(params::ID.to_string(), self.id.to_value());
        row.insert(params::TYPE.to_string(), Value::from(self.waypoint_type.id.clone()));
        row.insert(params::NAME.to_string(), Value::from(self.name.clone()));
        row.insert(params::LATITUDE.to_string(), Value::from(self.position.latitude));
        row.insert(params::LONGITUDE.to_string(), Value::from(self.position.longitude));
        row.insert(params::ALTITUDE.to_string(), Value::from(self.position.altitude));
        row.insert(params::PARAMS.to_string(), attributes_to_value(&self.attributes));
        row.insert(params::CURRENT.to_string(), Value::from(self.current));
        row.insert(params::REACHED.to_string(), Value::from(self.reached));
        row
    }

    fn apply_row(&mut self, row: &Row) {
        if let Some(name) = row.str_value(params::NAME) {
            self.name = name.to_string();
        }
        self.position = Position {
            latitude: row.f64_value(params::LATITUDE).unwrap_or(self.position.latitude),
            longitude: row.f64_value(params::LONGITUDE).unwrap_or(self.position.longitude),
            altitude: row.f64_value(params::ALTITUDE).unwrap_or(self.position.altitude),
        };
        if row.contains_key(params::PARAMS) {
            let stored = attributes_from_row(row.object_value(params::PARAMS));
            self.attributes = sync_attributes(&self.waypoint_type.attributes, &stored);
        }
        self.current = row.bool_value(params::CURRENT).unwrap_or(false);
        self.reached = row.bool_value(params::REACHED).unwrap_or(false);
    }
}
