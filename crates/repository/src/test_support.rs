//! Fixtures shared by the repository tests

use crate::{TableMissionsRepository, TableRoutesRepository};
use planner_domain::{
    share, AttributeDef, EntityId, MissionType, Positioned, Position, RouteType, Shared,
    Waypoint, WaypointType,
};
use planner_store::InMemoryTable;
use shared::RepositoryOptions;
use std::sync::Arc;

pub fn waypoint_type() -> Arc<WaypointType> {
    Arc::new(WaypointType::new(
        "waypoint",
        "Waypoint",
        "WPT",
        Positioned::Required,
        vec![
            AttributeDef::boolean("passthrough", "Passthrough", true),
            AttributeDef::real("acceptance", "Acceptance radius", 5.0).with_bounds(0.0, 100.0),
        ],
    ))
}

pub fn takeoff_type() -> Arc<WaypointType> {
    Arc::new(WaypointType::new(
        "takeoff",
        "Takeoff",
        "TKF",
        Positioned::Optional,
        vec![AttributeDef::real("pitch", "Pitch", 15.0)],
    ))
}

pub fn route_type() -> Arc<RouteType> {
    Arc::new(RouteType::new(
        "survey",
        "Survey",
        vec![waypoint_type(), takeoff_type()],
        vec![AttributeDef::integer("speed", "Speed", 10)],
    ))
}

pub fn mission_type() -> Arc<MissionType> {
    let route_type = route_type();
    let home_type = route_type.waypoint_types[0].clone();
    Arc::new(MissionType::new("survey_mission", "Survey mission", route_type, home_type))
}

pub fn waypoint(route_type: &RouteType, id: &str) -> Shared<Waypoint> {
    let position = Position::new(55.0, 37.0, 120.0);
    share(
        Waypoint::with_id(EntityId::new(id), route_type.waypoint_types[0].clone(), id)
            .with_position(position),
    )
}

/// One in-memory table per stored relation
#[derive(Clone)]
pub struct Tables {
    pub routes: Arc<InMemoryTable>,
    pub waypoints: Arc<InMemoryTable>,
    pub route_waypoints: Arc<InMemoryTable>,
    pub missions: Arc<InMemoryTable>,
    pub home_waypoints: Arc<InMemoryTable>,
}

impl Tables {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(InMemoryTable::new("routes")),
            waypoints: Arc::new(InMemoryTable::new("waypoints")),
            route_waypoints: Arc::new(InMemoryTable::new("route_waypoints")),
            missions: Arc::new(InMemoryTable::new("missions")),
            home_waypoints: Arc::new(InMemoryTable::new("home_waypoints")),
        }
    }

    pub fn routes_repository(&self) -> TableRoutesRepository {
        TableRoutesRepository::new(
            self.routes.clone(),
            self.waypoints.clone(),
            self.route_waypoints.clone(),
        )
    }

    /// Missions repository on top of a fresh routes repository
    pub fn missions_repository(
        &self,
        options: RepositoryOptions,
    ) -> (Arc<TableRoutesRepository>, TableMissionsRepository) {
        let routes = Arc::new(self.routes_repository());
        let missions = TableMissionsRepository::new(
            routes.clone(),
            self.missions.clone(),
            self.home_waypoints.clone(),
            options,
        );
        (routes, missions)
    }
}
