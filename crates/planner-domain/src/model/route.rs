//! Route - an ordered sequence of waypoints
//!
//! Index order is navigation order and is part of persisted state.
//! The route holds shared handles; the same waypoint may sit in other
//! routes as well.

use super::attribute::{attributes_from_row, attributes_to_value, sync_attributes, Attributes};
use super::entity::{Entity, Shared, SharedExt};
use super::id::EntityId;
use super::types::{Descriptor, RouteType};
use super::waypoint::Waypoint;
use shared::{params, EntityKind, Row, RowExt, Value};
use std::sync::Arc;

#[derive(Debug)]
pub struct Route {
    id: EntityId,
    name: String,
    route_type: Arc<RouteType>,
    attributes: Attributes,
    waypoints: Vec<Shared<Waypoint>>,
}

impl Route {
    /// Create an empty route with a fresh id
    pub fn new(route_type: Arc<RouteType>, name: impl Into<String>) -> Self {
        Self::with_id(EntityId::generate(), route_type, name)
    }

    pub fn with_id(id: EntityId, route_type: Arc<RouteType>, name: impl Into<String>) -> Self {
        let attributes = route_type.default_attributes();
        Self {
            id,
            name: name.into(),
            route_type,
            attributes,
            waypoints: Vec::new(),
        }
    }

    /// Reconstruct a route (without waypoints) from its stored row
    pub fn from_row(route_type: Arc<RouteType>, row: &Row) -> Self {
        let id = row.get(params::ID).map(EntityId::from_value).unwrap_or_default();
        let mut route = Self::with_id(id, route_type, "");
        route.apply_row(row);
        route
    }

    // ========== Getters ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route_type(&self) -> &Arc<RouteType> {
        &self.route_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn waypoints(&self) -> &[Shared<Waypoint>] {
        &self.waypoints
    }

    pub fn waypoint(&self, index: usize) -> Option<&Shared<Waypoint>> {
        self.waypoints.get(index)
    }

    pub fn waypoints_count(&self) -> usize {
        self.waypoints.len()
    }

    /// Ids of the waypoints, in navigation order
    pub fn waypoint_ids(&self) -> Vec<EntityId> {
        self.waypoints
            .iter()
            .map(|w| w.read_entity().id().clone())
            .collect()
    }

    /// Position of a waypoint in the route
    pub fn index_of(&self, waypoint_id: &EntityId) -> Option<usize> {
        self.waypoints
            .iter()
            .position(|w| w.read_entity().id() == waypoint_id)
    }

    pub fn contains(&self, waypoint_id: &EntityId) -> bool {
        self.index_of(waypoint_id).is_some()
    }

    pub fn first_waypoint(&self) -> Option<&Shared<Waypoint>> {
        self.waypoints.first()
    }

    pub fn last_waypoint(&self) -> Option<&Shared<Waypoint>> {
        self.waypoints.last()
    }

    // ========== Progress ==========

    /// Index of the waypoint the vehicle is heading to
    pub fn current_index(&self) -> Option<usize> {
        self.waypoints.iter().position(|w| w.read_entity().is_current())
    }

    pub fn current_waypoint(&self) -> Option<&Shared<Waypoint>> {
        self.current_index().and_then(|index| self.waypoints.get(index))
    }

    /// Make the waypoint at `index` the only current one; `None` clears it.
    ///
    /// Returns `false` and changes nothing when `index` is out of range.
    pub fn set_current(&mut self, index: Option<usize>) -> bool {
        if index.is_some_and(|index| index >= self.waypoints.len()) {
            return false;
        }
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            waypoint.write_entity().set_current(Some(i) == index);
        }
        true
    }

    /// Mark the waypoint at `index` as reached
    pub fn set_reached(&mut self, index: usize) -> bool {
        match self.waypoints.get(index) {
            Some(waypoint) => {
                waypoint.write_entity().set_reached(true);
                true
            }
            None => false,
        }
    }

    /// Clear the current and reached flags of every waypoint
    pub fn reset_progress(&mut self) {
        for waypoint in &self.waypoints {
            let mut guard = waypoint.write_entity();
            guard.set_current(false);
            guard.set_reached(false);
        }
    }

    // ========== Mutations ==========

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_attribute(&mut self, key: &str, value: Value) -> bool {
        match self.route_type.attribute(key).and_then(|def| def.coerce(&value)) {
            Some(v) => {
                self.attributes.insert(key.to_string(), v);
                true
            }
            None => false,
        }
    }

    /// Replace the whole sequence.
    ///
    /// Returns the waypoints that were in the route and are not in the new
    /// sequence, in their old order.
    pub fn set_waypoints(&mut self, waypoints: Vec<Shared<Waypoint>>) -> Vec<Shared<Waypoint>> {
        let new_ids: Vec<EntityId> = waypoints
            .iter()
            .map(|w| w.read_entity().id().clone())
            .collect();

        let old = std::mem::replace(&mut self.waypoints, waypoints);
        old.into_iter()
            .filter(|w| !new_ids.contains(w.read_entity().id()))
            .collect()
    }

    pub fn add_waypoint(&mut self, waypoint: Shared<Waypoint>) {
        self.waypoints.push(waypoint);
    }

    pub fn insert_waypoint(&mut self, index: usize, waypoint: Shared<Waypoint>) {
        let index = index.min(self.waypoints.len());
        self.waypoints.insert(index, waypoint);
    }

    /// Take a waypoint out of the sequence
    pub fn remove_waypoint(&mut self, waypoint_id: &EntityId) -> Option<Shared<Waypoint>> {
        let index = self.index_of(waypoint_id)?;
        Some(self.waypoints.remove(index))
    }

    pub fn clear(&mut self) -> Vec<Shared<Waypoint>> {
        std::mem::take(&mut self.waypoints)
    }
}

impl Entity for Route {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Route
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert(params::ID.to_string(), self.id.to_value());
        row.insert(params::TYPE.to_string(), Value::from(self.route_type.id.clone()));
        row.insert(params::NAME.to_string(), Value::from(self.name.clone()));
        row.insert(params::PARAMS.to_string(), attributes_to_value(&self.attributes));
        row
    }

    fn apply_row(&mut self, row: &Row) {
        if let Some(name) = row.str_value(params::NAME) {
            self.name = name.to_string();
        }
        if row.contains_key(params::PARAMS) {
            let stored = attributes_from_row(row.object_value(params::PARAMS));
            self.attributes = sync_attributes(&self.route_type.attributes, &stored);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::share;
    use crate::model::types::{Positioned, WaypointType};

    fn fixtures() -> (Arc<RouteType>, Arc<WaypointType>) {
        let wpt_type = Arc::new(WaypointType::new("waypoint", "Waypoint", "WPT", Positioned::Required, vec![]));
        let route_type = Arc::new(RouteType::new("test_route", "Test Route", vec![wpt_type.clone()], vec![]));
        (route_type, wpt_type)
    }

    #[test]
    fn test_waypoint_order() {
        let (route_type, wpt_type) = fixtures();
        let mut route = Route::new(route_type, "Route 1");

        let a = share(Waypoint::new(wpt_type.clone(), "A"));
        let b = share(Waypoint::new(wpt_type.clone(), "B"));
        let c = share(Waypoint::new(wpt_type, "C"));
        let (a_id, b_id, c_id) = (
            a.read_entity().id().clone(),
            b.read_entity().id().clone(),
            c.read_entity().id().clone(),
        );

        route.add_waypoint(a);
        route.add_waypoint(c);
        route.insert_waypoint(1, b);

        assert_eq!(route.waypoint_ids(), vec![a_id.clone(), b_id.clone(), c_id.clone()]);
        assert_eq!(route.index_of(&c_id), Some(2));

        let removed = route.remove_waypoint(&b_id).unwrap();
        assert_eq!(removed.read_entity().name(), "B");
        assert_eq!(route.waypoints_count(), 2);
        assert!(!route.contains(&b_id));
    }

    #[test]
    fn test_set_waypoints_returns_displaced() {
        let (route_type, wpt_type) = fixtures();
        let mut route = Route::new(route_type, "Route 1");

        let a = share(Waypoint::new(wpt_type.clone(), "A"));
        let b = share(Waypoint::new(wpt_type.clone(), "B"));
        let c = share(Waypoint::new(wpt_type, "C"));
        route.set_waypoints(vec![a.clone(), b.clone(), c.clone()]);

        let displaced = route.set_waypoints(vec![c, a]);
        assert_eq!(displaced.len(), 1);
        assert!(Arc::ptr_eq(&displaced[0], &b));
        assert_eq!(route.waypoint(0).unwrap().read_entity().name(), "C");
    }

    #[test]
    fn test_progress() {
        let (route_type, wpt_type) = fixtures();
        let mut route = Route::new(route_type, "Route 1");
        assert!(route.current_waypoint().is_none());
        assert!(route.first_waypoint().is_none());

        for name in ["A", "B", "C"] {
            route.add_waypoint(share(Waypoint::new(wpt_type.clone(), name)));
        }
        assert_eq!(route.first_waypoint().unwrap().read_entity().name(), "A");
        assert_eq!(route.last_waypoint().unwrap().read_entity().name(), "C");

        assert!(route.set_current(Some(1)));
        assert!(route.set_current(Some(2)));
        assert_eq!(route.current_index(), Some(2));
        let current: Vec<_> = route.waypoints().iter().map(|w| w.read_entity().is_current()).collect();
        assert_eq!(current, vec![false, false, true]);

        assert!(!route.set_current(Some(3)));
        assert_eq!(route.current_index(), Some(2));

        assert!(route.set_reached(0));
        assert!(!route.set_reached(5));
        assert!(route.waypoint(0).unwrap().read_entity().is_reached());

        assert!(route.set_current(None));
        assert_eq!(route.current_index(), None);

        route.reset_progress();
        assert!(!route.waypoint(0).unwrap().read_entity().is_reached());
    }

    #[test]
    fn test_row_round_trip() {
        let (route_type, _) = fixtures();
        let route = Route::new(route_type.clone(), "Survey");

        let restored = Route::from_row(route_type, &route.to_row());
        assert_eq!(restored.id(), route.id());
        assert_eq!(restored.name(), "Survey");
        assert_eq!(restored.waypoints_count(), 0);
    }
}
