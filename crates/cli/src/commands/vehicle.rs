//! planner vehicle command

use clap::Args;
use planner_domain::{MissionsRepository, SharedExt};

use super::mission::print_mission;
use crate::context::Planner;

#[derive(Debug, Args)]
pub struct VehicleCommand {
    /// Vehicle id
    pub vehicle_id: String,
}

impl VehicleCommand {
    pub fn run(&self, planner: &Planner) -> anyhow::Result<()> {
        match planner.missions().mission_for_vehicle(&self.vehicle_id) {
            Some(mission) => print_mission(&mission.read_entity()),
            None => println!("No mission planned for vehicle {}", self.vehicle_id),
        }
        Ok(())
    }
}
