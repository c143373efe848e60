//! planner init command

use clap::Args;
use shared::PlannerConfig;
use std::path::{Path, PathBuf};

use crate::context::CONFIG_FILE;

const EXAMPLE_TYPES: &str = r#"waypointTypes:
  - id: waypoint
    name: Waypoint
    shortName: WPT
    positioned: required
    attributes:
      - { id: passthrough, name: Passthrough, kind: boolean, default: true }
      - { id: acceptance, name: Acceptance radius, kind: real, default: 5.0, min: 0.0, max: 500.0 }
  - id: takeoff
    name: Takeoff
    shortName: TKF
    positioned: optional
    attributes:
      - { id: pitch, name: Pitch, kind: real, default: 15.0, min: -90.0, max: 90.0 }
  - id: circle
    name: Circle
    shortName: CRL
    attributes:
      - { id: radius, name: Radius, kind: real, default: 100.0, min: 0.0 }
      - { id: clockwise, name: Clockwise, kind: boolean, default: true }
      - { id: turns, name: Turns, kind: integer, default: 1, min: 0 }
  - id: landing
    name: Landing
    shortName: LND

routeTypes:
  - id: survey
    name: Survey route
    waypointTypes: [takeoff, waypoint, circle, landing]
    attributes:
      - { id: speed, name: Cruise speed, kind: real, default: 15.0, min: 0.0 }

missionTypes:
  - id: survey_mission
    name: Survey mission
    routeType: survey
    homeWaypointType: waypoint

routePatterns:
  - id: grid
    name: Survey grid
    icon: grid.svg
    attributes:
      - { id: spacing, name: Line spacing, kind: real, default: 50.0, min: 1.0 }
      - { id: heading, name: Heading, kind: real, default: 0.0, min: 0.0, max: 360.0 }
"#;

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to initialize
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Create minimal project without example types
    #[arg(long)]
    pub minimal: bool,
}

impl InitCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        println!("Initializing planner project in {:?}", self.directory);

        let config = PlannerConfig::default();
        std::fs::create_dir_all(self.directory.join(&config.types_dir))?;
        std::fs::write(
            self.directory.join(CONFIG_FILE),
            serde_json::to_string_pretty(&config)?,
        )?;

        if !self.minimal {
            write_example_types(&self.directory.join(&config.types_dir))?;
        }

        println!("✓ Planner project initialized");
        Ok(())
    }
}

/// Write `default.yaml` with a survey mission type into a types directory
pub fn write_example_types(types_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(types_dir)?;
    std::fs::write(types_dir.join("default.yaml"), EXAMPLE_TYPES)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::TypeCatalog;

    #[test]
    fn test_example_types_build() {
        let types = TypeCatalog::from_yaml_str(EXAMPLE_TYPES).unwrap().build().unwrap();
        assert_eq!(types.mission_types.len(), 1);
        assert_eq!(types.route_types[0].waypoint_types.len(), 4);
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        InitCommand {
            directory: dir.path().to_path_buf(),
            minimal: false,
        }
        .run()
        .unwrap();

        let config = PlannerConfig::from_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.types_dir, dir.path().join("types"));
        assert!(dir.path().join("types").join("default.yaml").exists());
    }
}
