//! planner types command

use clap::Args;
use planner_domain::{Descriptor, MissionsRepository, RoutesRepository};

use crate::context::Planner;

#[derive(Debug, Args)]
pub struct TypesCommand {}

impl TypesCommand {
    pub fn run(&self, planner: &Planner) -> anyhow::Result<()> {
        let missions = planner.missions();
        let routes = planner.routes();

        println!("Mission types:");
        for mission_type in missions.mission_types() {
            println!(
                "  {:<20} {} (route: {}, home: {})",
                mission_type.id,
                mission_type.name,
                mission_type.route_type.id,
                mission_type.home_waypoint_type.id
            );
        }

        println!("Route types:");
        for route_type in routes.route_types() {
            let waypoint_types: Vec<&str> =
                route_type.waypoint_types.iter().map(|t| t.id.as_str()).collect();
            println!(
                "  {:<20} {} [{}]",
                route_type.id,
                route_type.name,
                waypoint_types.join(", ")
            );
        }

        println!("Waypoint types:");
        for waypoint_type in routes.waypoint_types() {
            let attributes: Vec<&str> =
                waypoint_type.attributes().iter().map(|a| a.id.as_str()).collect();
            println!(
                "  {:<20} {} ({}) {}",
                waypoint_type.id,
                waypoint_type.name,
                waypoint_type.short_name,
                attributes.join(", ")
            );
        }

        println!("Route patterns:");
        for pattern_id in missions.route_pattern_ids() {
            println!("  {}", pattern_id);
        }
        Ok(())
    }
}
