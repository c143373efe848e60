//! Mission Planner CLI
//!
//! Usage:
//!   planner init [dir]                        - Write planner.json and example types
//!   planner types                             - List registered types
//!   planner mission list|show|create|remove   - Manage missions
//!   planner route list|add-waypoint|remove-waypoint
//!   planner vehicle <id>                      - Mission planned for a vehicle

use clap::{Parser, Subcommand};
use cli::commands::{InitCommand, MissionCommand, RouteCommand, TypesCommand, VehicleCommand};
use cli::context::Planner;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Mission planner - missions, routes and waypoints over a snapshot database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./planner.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log repository activity
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a planner project
    Init(InitCommand),
    /// List mission, route and waypoint types
    Types(TypesCommand),
    /// Manage missions
    Mission(MissionCommand),
    /// Manage routes and their waypoints
    Route(RouteCommand),
    /// Find the mission planned for a vehicle
    Vehicle(VehicleCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Init(cmd) = &cli.command {
        return cmd.run();
    }

    let config = Planner::load_config(cli.config.as_deref())?;
    let planner = Planner::open(config)?;

    match &cli.command {
        Commands::Init(_) => Ok(()),
        Commands::Types(cmd) => cmd.run(&planner),
        Commands::Mission(cmd) => cmd.run(&planner),
        Commands::Route(cmd) => cmd.run(&planner),
        Commands::Vehicle(cmd) => cmd.run(&planner),
    }
}
