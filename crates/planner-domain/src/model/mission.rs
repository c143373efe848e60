//! Mission - what a vehicle is asked to fly
//!
//! A Mission is an Entity (has identity that persists through changes).
//! It exclusively owns one route and one home point; both go away with it.

use super::entity::{share, Entity, Shared, SharedExt};
use super::id::EntityId;
use super::route::Route;
use super::types::MissionType;
use super::waypoint::Waypoint;
use shared::{params, EntityKind, Row, RowExt, Value};
use std::sync::Arc;

const HOME_NAME: &str = "HOME";

#[derive(Debug)]
pub struct Mission {
    /// Unique identifier (Entity identity)
    id: EntityId,
    name: String,
    mission_type: Arc<MissionType>,
    /// Vehicle this mission is planned for
    vehicle_id: Option<String>,
    /// Owned route, created together with the mission
    route: Option<Shared<Route>>,
    /// Owned home point, stored in its own table
    home_point: Waypoint,
}

impl Mission {
    /// Create a mission with a fresh id, an empty route and a default home point
    pub fn new(mission_type: Arc<MissionType>, name: impl Into<String>, vehicle_id: Option<String>) -> Self {
        Self::with_id(EntityId::generate(), mission_type, name, vehicle_id)
    }

    pub fn with_id(
        id: EntityId,
        mission_type: Arc<MissionType>,
        name: impl Into<String>,
        vehicle_id: Option<String>,
    ) -> Self {
        let name = name.into();
        let route = Route::new(mission_type.route_type.clone(), name.clone());
        let home_point = Waypoint::new(mission_type.home_waypoint_type.clone(), HOME_NAME);

        Self {
            id,
            name,
            mission_type,
            vehicle_id,
            route: Some(share(route)),
            home_point,
        }
    }

    /// Reconstruct a mission from its row.
    ///
    /// The `home` column may hold either the home point id or the inlined
    /// home point row. The route is not resolved here; it is assigned by
    /// whoever owns the route cache.
    pub fn from_row(mission_type: Arc<MissionType>, row: &Row) -> Self {
        let id = row.get(params::ID).map(EntityId::from_value).unwrap_or_default();
        let home_type = mission_type.home_waypoint_type.clone();

        let home_point = match row.get(params::HOME) {
            Some(Value::Object(home_row)) => Waypoint::from_row(home_type, home_row),
            Some(value) => Waypoint::with_id(EntityId::from_value(value), home_type, HOME_NAME),
            None => Waypoint::new(home_type, HOME_NAME),
        };

        let mut mission = Self {
            id,
            name: String::new(),
            mission_type,
            vehicle_id: None,
            route: None,
            home_point,
        };
        mission.apply_row(row);
        mission
    }

    // ========== Getters ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mission_type(&self) -> &Arc<MissionType> {
        &self.mission_type
    }

    pub fn vehicle_id(&self) -> Option<&str> {
        self.vehicle_id.as_deref()
    }

    pub fn route(&self) -> Option<&Shared<Route>> {
        self.route.as_ref()
    }

    pub fn route_id(&self) -> Option<EntityId> {
        self.route.as_ref().map(|r| r.read_entity().id().clone())
    }

    pub fn home_point(&self) -> &Waypoint {
        &self.home_point
    }

    pub fn home_point_mut(&mut self) -> &mut Waypoint {
        &mut self.home_point
    }

    // ========== Mutations ==========

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_vehicle_id(&mut self, vehicle_id: Option<String>) {
        self.vehicle_id = vehicle_id;
    }

    /// Attach a route (or detach with `None`), returning the previous one
    pub fn assign_route(&mut self, route: Option<Shared<Route>>) -> Option<Shared<Route>> {
        std::mem::replace(&mut self.route, route)
    }
}

impl Entity for Mission {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Mission
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert(params::ID.to_string(), self.id.to_value());
        row.insert(params::TYPE.to_string(), Value::from(self.mission_type.id.clone()));
        row.insert(params::NAME.to_string(), Value::from(self.name.clone()));
        row.insert(
            params::VEHICLE.to_string(),
            self.vehicle_id.clone().map(Value::from).unwrap_or(Value::Null),
        );
        row.insert(
            params::ROUTE.to_string(),
            self.route_id().map(|id| id.to_value()).unwrap_or(Value::Null),
        );
        row.insert(params::HOME.to_string(), self.home_point.id().to_value());
        row
    }

    fn apply_row(&mut self, row: &Row) {
        if let Some(name) = row.str_value(params::NAME) {
            self.name = name.to_string();
        }
        self.vehicle_id = match row.get(params::VEHICLE) {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Positioned, RouteType, WaypointType};
    use serde_json::json;

    fn mission_type() -> Arc<MissionType> {
        let wpt = Arc::new(WaypointType::new("waypoint", "Waypoint", "WPT", Positioned::Required, vec![]));
        let route_type = Arc::new(RouteType::new("test_route", "Test Route", vec![wpt.clone()], vec![]));
        Arc::new(MissionType::new("test_mission", "Test Mission", route_type, wpt))
    }

    #[test]
    fn test_new_mission_owns_route_and_home() {
        let mission = Mission::new(mission_type(), "Patrol", Some("uav-1".to_string()));

        let route = mission.route().unwrap();
        assert_eq!(route.read_entity().name(), "Patrol");
        assert_eq!(route.read_entity().route_type().id, "test_route");
        assert_eq!(mission.home_point().name(), "HOME");
        assert_eq!(mission.vehicle_id(), Some("uav-1"));
    }

    #[test]
    fn test_row_links_route_and_home() {
        let mission = Mission::new(mission_type(), "Patrol", None);
        let row = mission.to_row();

        assert_eq!(row.get(params::ROUTE), Some(&mission.route_id().unwrap().to_value()));
        assert_eq!(row.get(params::HOME), Some(&mission.home_point().id().to_value()));
        assert_eq!(row.get(params::VEHICLE), Some(&Value::Null));
    }

    #[test]
    fn test_from_row_with_inlined_home() {
        let row = json!({
            "id": "m-1",
            "type": "test_mission",
            "name": "Survey",
            "vehicle": 7,
            "route": "r-1",
            "home": { "id": "h-1", "name": "Base", "latitude": 55.0, "longitude": 37.0, "altitude": 0.0 }
        });

        let mission = Mission::from_row(mission_type(), row.as_object().unwrap());
        assert_eq!(mission.id().as_str(), "m-1");
        assert_eq!(mission.vehicle_id(), Some("7"));
        assert!(mission.route().is_none());
        assert_eq!(mission.home_point().id().as_str(), "h-1");
        assert_eq!(mission.home_point().name(), "Base");
    }
}
