//! planner mission command

use anyhow::{anyhow, bail};
use clap::{Args, Subcommand};
use planner_domain::{share, Entity, EntityId, Mission, MissionsRepository, SharedExt};

use crate::context::Planner;

#[derive(Debug, Args)]
pub struct MissionCommand {
    #[command(subcommand)]
    pub command: MissionSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum MissionSubcommand {
    /// List all missions
    List,
    /// Show a mission with its route
    Show {
        /// Mission id
        id: String,
    },
    /// Create a mission
    Create {
        /// Mission type id
        #[arg(short = 't', long = "type")]
        mission_type: String,
        /// Mission name
        #[arg(short, long)]
        name: String,
        /// Vehicle the mission is planned for
        #[arg(long)]
        vehicle: Option<String>,
    },
    /// Remove a mission
    Remove {
        /// Mission id
        id: String,
    },
}

impl MissionCommand {
    pub fn run(&self, planner: &Planner) -> anyhow::Result<()> {
        let missions = planner.missions();

        match &self.command {
            MissionSubcommand::List => {
                if missions.count() == 0 {
                    println!("No missions");
                }
                for mission in missions.missions() {
                    let mission = mission.read_entity();
                    println!(
                        "{}  {:<24} {:<16} vehicle: {}",
                        mission.id(),
                        mission.name(),
                        mission.mission_type().id,
                        mission.vehicle_id().unwrap_or("-")
                    );
                }
            }
            MissionSubcommand::Show { id } => {
                let mission = missions
                    .mission(&EntityId::new(id.as_str()))
                    .ok_or_else(|| anyhow!("Mission '{}' not found", id))?;
                print_mission(&mission.read_entity());
            }
            MissionSubcommand::Create {
                mission_type,
                name,
                vehicle,
            } => {
                let mission_type = match missions.mission_type(mission_type) {
                    Some(t) => t,
                    None => bail!("Unknown mission type '{}'", mission_type),
                };
                let mission = share(Mission::new(mission_type, name.as_str(), vehicle.clone()));
                missions.save_mission(&mission)?;

                println!("Created mission {}", mission.read_entity().id());
                planner.commit_and_report()?;
            }
            MissionSubcommand::Remove { id } => {
                let mission = missions
                    .mission(&EntityId::new(id.as_str()))
                    .ok_or_else(|| anyhow!("Mission '{}' not found", id))?;
                missions.remove_mission(&mission)?;

                println!("Removed mission {}", id);
                planner.commit_and_report()?;
            }
        }
        Ok(())
    }
}

/// Print a mission, its home point and its route's waypoints
pub(crate) fn print_mission(mission: &Mission) {
    println!("Mission {} ({})", mission.name(), mission.id());
    println!("  type:    {}", mission.mission_type().name);
    println!("  vehicle: {}", mission.vehicle_id().unwrap_or("-"));

    let home = mission.home_point().position();
    println!(
        "  home:    {:.6}, {:.6} @ {:.1} m",
        home.latitude, home.longitude, home.altitude
    );

    match mission.route() {
        Some(route) => {
            let route = route.read_entity();
            println!("  route:   {} ({} waypoints)", route.id(), route.waypoints_count());
            for (index, waypoint) in route.waypoints().iter().enumerate() {
                let waypoint = waypoint.read_entity();
                let position = waypoint.position();
                println!(
                    "    {:>3}. {:<12} {:<10} {:.6}, {:.6} @ {:.1} m  [{}]",
                    index + 1,
                    waypoint.name(),
                    waypoint.waypoint_type().short_name,
                    position.latitude,
                    position.longitude,
                    position.altitude,
                    waypoint.id()
                );
            }
        }
        None => println!("  route:   -"),
    }
}
