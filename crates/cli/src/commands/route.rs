//! planner route command

use anyhow::{anyhow, bail};
use clap::{Args, Subcommand};
use planner_domain::{
    share, Entity, EntityId, Position, Route, RoutesRepository, Shared, SharedExt, Waypoint,
};

use crate::context::Planner;

#[derive(Debug, Args)]
pub struct RouteCommand {
    #[command(subcommand)]
    pub command: RouteSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum RouteSubcommand {
    /// List all routes
    List,
    /// Append a waypoint to a route
    AddWaypoint {
        /// Route id
        route: String,
        /// Waypoint type id
        #[arg(short = 't', long = "type")]
        waypoint_type: String,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Altitude in meters
        #[arg(long, default_value_t = 0.0)]
        alt: f64,
        /// Waypoint name (defaults to the type's short name and index)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Take a waypoint out of a route
    RemoveWaypoint {
        /// Route id
        route: String,
        /// Waypoint id
        waypoint: String,
    },
}

impl RouteCommand {
    pub fn run(&self, planner: &Planner) -> anyhow::Result<()> {
        let routes = planner.routes();

        match &self.command {
            RouteSubcommand::List => {
                if routes.count() == 0 {
                    println!("No routes");
                }
                for route in routes.routes() {
                    let route = route.read_entity();
                    println!(
                        "{}  {:<24} {:<12} {} waypoints",
                        route.id(),
                        route.name(),
                        route.route_type().id,
                        route.waypoints_count()
                    );
                }
            }
            RouteSubcommand::AddWaypoint {
                route,
                waypoint_type,
                lat,
                lon,
                alt,
                name,
            } => {
                let route = find_route(planner, route)?;
                let waypoint = {
                    let guard = route.read_entity();
                    let waypoint_type = match guard.route_type().waypoint_type(waypoint_type) {
                        Some(t) => t.clone(),
                        None => bail!(
                            "Waypoint type '{}' is not permitted in {} routes",
                            waypoint_type,
                            guard.route_type().id
                        ),
                    };
                    let name = name.clone().unwrap_or_else(|| {
                        format!("{} {}", waypoint_type.short_name, guard.waypoints_count() + 1)
                    });
                    Waypoint::new(waypoint_type, name).with_position(Position::new(*lat, *lon, *alt))
                };
                let waypoint_id = waypoint.id().clone();
                route.write_entity().add_waypoint(share(waypoint));
                routes.save_route(&route)?;

                println!("Added waypoint {}", waypoint_id);
                planner.commit_and_report()?;
            }
            RouteSubcommand::RemoveWaypoint { route, waypoint } => {
                let route = find_route(planner, route)?;
                let removed = route
                    .write_entity()
                    .remove_waypoint(&EntityId::new(waypoint.as_str()));
                if removed.is_none() {
                    bail!("Waypoint '{}' is not in the route", waypoint);
                }
                routes.save_route(&route)?;

                println!("Removed waypoint {}", waypoint);
                planner.commit_and_report()?;
            }
        }
        Ok(())
    }
}

fn find_route(planner: &Planner, id: &str) -> anyhow::Result<Shared<Route>> {
    planner
        .routes()
        .route(&EntityId::new(id))
        .ok_or_else(|| anyhow!("Route '{}' not found", id))
}
