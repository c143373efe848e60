//! Configuration types for the mission planner

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Table names used by the repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableNames {
    pub routes: String,
    pub waypoints: String,
    pub route_waypoints: String,
    pub missions: String,
    pub home_waypoints: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            routes: "routes".to_string(),
            waypoints: "waypoints".to_string(),
            route_waypoints: "route_waypoints".to_string(),
            missions: "missions".to_string(),
            home_waypoints: "home_waypoints".to_string(),
        }
    }
}

impl TableNames {
    /// All table names, in creation order
    pub fn all(&self) -> [&str; 5] {
        [
            &self.routes,
            &self.waypoints,
            &self.route_waypoints,
            &self.missions,
            &self.home_waypoints,
        ]
    }
}

/// Behaviour switches for the repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryOptions {
    /// Remove a mission's route (and its unshared waypoints) together with the mission
    pub cascade_mission_route: bool,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            cascade_mission_route: true,
        }
    }
}

/// Planner configuration (planner.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    /// JSON snapshot holding every table
    pub database: PathBuf,

    /// Directory scanned for `*.yaml` type catalogs
    pub types_dir: PathBuf,

    /// Table names
    pub tables: TableNames,

    /// Repository behaviour
    pub repository: RepositoryOptions,

    /// Maximum number of entries kept by the event journal
    pub journal_capacity: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("planner-db.json"),
            types_dir: PathBuf::from("types"),
            tables: TableNames::default(),
            repository: RepositoryOptions::default(),
            journal_capacity: 1000,
        }
    }
}

impl PlannerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;

        // Relative paths are resolved against the config file's directory
        if let Some(base) = path.parent() {
            if config.database.is_relative() {
                config.database = base.join(&config.database);
            }
            if config.types_dir.is_relative() {
                config.types_dir = base.join(&config.types_dir);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the repositories cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let names = self.tables.all();
        if names.iter().any(|n| n.is_empty()) {
            return Err(crate::PlannerError::Config(
                "table names must not be empty".to_string(),
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(crate::PlannerError::Config(format!(
                    "table name '{}' is used twice",
                    name
                )));
            }
        }
        if self.journal_capacity == 0 {
            return Err(crate::PlannerError::Config(
                "journalCapacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
