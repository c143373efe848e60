//! TypeCatalog - Type descriptors loaded from YAML
//!
//! A catalog names its descriptors by id; `build` links those ids into the
//! shared `Arc` descriptors the repositories register.
//!
//! ```yaml
//! waypointTypes:
//!   - id: waypoint
//!     name: Waypoint
//!     shortName: WPT
//!     positioned: required
//!     attributes:
//!       - { id: passthrough, name: Passthrough, kind: boolean, default: true }
//! routeTypes:
//!   - id: survey
//!     name: Survey
//!     waypointTypes: [waypoint]
//! missionTypes:
//!   - id: survey_mission
//!     name: Survey mission
//!     routeType: survey
//!     homeWaypointType: waypoint
//! routePatterns:
//!   - { id: grid, name: Grid, icon: grid.svg }
//! ```

use planner_domain::{
    AttributeDef, DefaultPatternFactory, MissionType, MissionsRepository, RoutePatternType,
    RouteType, RoutesRepository, WaypointType,
};
use serde::{Deserialize, Serialize};
use shared::{PlannerError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Route type as written in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTypeDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    /// Waypoint type ids permitted in the route
    #[serde(default)]
    pub waypoint_types: Vec<String>,
}

/// Mission type as written in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionTypeDef {
    pub id: String,
    pub name: String,
    pub route_type: String,
    pub home_waypoint_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCatalog {
    #[serde(default)]
    pub waypoint_types: Vec<WaypointType>,
    #[serde(default)]
    pub route_types: Vec<RouteTypeDef>,
    #[serde(default)]
    pub mission_types: Vec<MissionTypeDef>,
    #[serde(default)]
    pub route_patterns: Vec<RoutePatternType>,
}

/// Linked descriptors, ready to register
#[derive(Debug, Clone, Default)]
pub struct CatalogTypes {
    pub waypoint_types: Vec<Arc<WaypointType>>,
    pub route_types: Vec<Arc<RouteType>>,
    pub mission_types: Vec<Arc<MissionType>>,
    pub route_patterns: Vec<Arc<RoutePatternType>>,
}

impl TypeCatalog {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
            .map_err(|e| PlannerError::Catalog(format!("{}: {}", path.display(), e)))
    }

    /// Load and merge every `*.yaml` / `*.yml` file of a directory, in name order.
    ///
    /// A missing directory is an empty catalog.
    pub fn load_from_directory(dir: &Path) -> Result<Self> {
        let mut catalog = Self::default();
        if !dir.exists() {
            debug!(dir = %dir.display(), "no type catalog directory");
            return Ok(catalog);
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for extension in ["yaml", "yml"] {
            let pattern = dir.join(format!("*.{}", extension));
            let entries = glob::glob(&pattern.to_string_lossy())
                .map_err(|e| PlannerError::Catalog(format!("bad catalog pattern: {}", e)))?;
            for entry in entries {
                paths.push(entry.map_err(|e| PlannerError::Io(e.into_error()))?);
            }
        }
        paths.sort();

        for path in &paths {
            debug!(path = %path.display(), "loading type catalog");
            catalog.merge(Self::from_file(path)?);
        }
        info!(files = paths.len(), dir = %dir.display(), "loaded type catalogs");
        Ok(catalog)
    }

    pub fn merge(&mut self, other: TypeCatalog) {
        self.waypoint_types.extend(other.waypoint_types);
        self.route_types.extend(other.route_types);
        self.mission_types.extend(other.mission_types);
        self.route_patterns.extend(other.route_patterns);
    }

    pub fn is_empty(&self) -> bool {
        self.waypoint_types.is_empty()
            && self.route_types.is_empty()
            && self.mission_types.is_empty()
            && self.route_patterns.is_empty()
    }

    /// Resolve id references into linked descriptors
    pub fn build(&self) -> Result<CatalogTypes> {
        let mut waypoint_types = BTreeMap::new();
        for waypoint_type in &self.waypoint_types {
            check_unique(&waypoint_types, "waypoint", &waypoint_type.id)?;
            waypoint_types.insert(waypoint_type.id.clone(), Arc::new(waypoint_type.clone()));
        }

        let mut route_types = BTreeMap::new();
        for def in &self.route_types {
            check_unique(&route_types, "route", &def.id)?;
            let nested = def
                .waypoint_types
                .iter()
                .map(|id| lookup(&waypoint_types, "route", &def.id, "waypoint", id))
                .collect::<Result<Vec<_>>>()?;
            let route_type = RouteType::new(&def.id, &def.name, nested, def.attributes.clone());
            route_types.insert(def.id.clone(), Arc::new(route_type));
        }

        let mut mission_types = BTreeMap::new();
        for def in &self.mission_types {
            check_unique(&mission_types, "mission", &def.id)?;
            let route_type = lookup(&route_types, "mission", &def.id, "route", &def.route_type)?;
            let home_type = lookup(
                &waypoint_types,
                "mission",
                &def.id,
                "waypoint",
                &def.home_waypoint_type,
            )?;
            let mission_type = MissionType::new(&def.id, &def.name, route_type, home_type);
            mission_types.insert(def.id.clone(), Arc::new(mission_type));
        }

        let mut seen = BTreeSet::new();
        let mut route_patterns = Vec::new();
        for pattern in &self.route_patterns {
            if !seen.insert(pattern.id.clone()) {
                return Err(PlannerError::Catalog(format!(
                    "duplicate route pattern '{}'",
                    pattern.id
                )));
            }
            route_patterns.push(Arc::new(pattern.clone()));
        }

        let types = CatalogTypes {
            waypoint_types: waypoint_types.into_values().collect(),
            route_types: route_types.into_values().collect(),
            mission_types: mission_types.into_values().collect(),
            route_patterns,
        };
        for id in types.unreachable_waypoint_types() {
            warn!(waypoint_type = %id, "waypoint type is not listed by any route or mission type");
        }
        Ok(types)
    }
}

impl CatalogTypes {
    /// Waypoint types neither a route type nor a mission home point uses.
    ///
    /// Only route and mission types are registered, so these never reach
    /// the repositories.
    pub fn unreachable_waypoint_types(&self) -> Vec<String> {
        self.waypoint_types
            .iter()
            .filter(|waypoint_type| {
                let id = &waypoint_type.id;
                !self.route_types.iter().any(|rt| rt.permits(id))
                    && !self
                        .mission_types
                        .iter()
                        .any(|mt| &mt.home_waypoint_type.id == id)
            })
            .map(|waypoint_type| waypoint_type.id.clone())
            .collect()
    }

    /// Register everything with the repositories.
    ///
    /// Returns the number of descriptors that were not registered before.
    pub fn register(&self, routes: &dyn RoutesRepository, missions: &dyn MissionsRepository) -> usize {
        let mut registered = 0;
        for route_type in &self.route_types {
            registered += usize::from(routes.register_route_type(route_type.clone()));
        }
        for mission_type in &self.mission_types {
            registered += usize::from(missions.register_mission_type(mission_type.clone()));
        }
        for pattern in &self.route_patterns {
            let factory = Arc::new(DefaultPatternFactory::new(pattern.clone()));
            registered += usize::from(missions.register_route_pattern_factory(&pattern.id, factory));
        }
        registered
    }
}

fn check_unique<T>(types: &BTreeMap<String, T>, kind: &str, id: &str) -> Result<()> {
    if types.contains_key(id) {
        return Err(PlannerError::Catalog(format!("duplicate {} type '{}'", kind, id)));
    }
    Ok(())
}

fn lookup<T>(
    types: &BTreeMap<String, Arc<T>>,
    owner_kind: &str,
    owner_id: &str,
    kind: &str,
    id: &str,
) -> Result<Arc<T>> {
    types.get(id).cloned().ok_or_else(|| {
        PlannerError::Catalog(format!(
            "{} type '{}' references unknown {} type '{}'",
            owner_kind, owner_id, kind, id
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Tables;
    use planner_domain::{AttributeKind, Positioned};
    use shared::RepositoryOptions;

    const CATALOG: &str = r#"
waypointTypes:
  - id: waypoint
    name: Waypoint
    shortName: WPT
    attributes:
      - id: passthrough
        name: Passthrough
        kind: boolean
        default: true
  - id: takeoff
    name: Takeoff
    positioned: optional
routeTypes:
  - id: survey
    name: Survey
    waypointTypes: [waypoint, takeoff]
missionTypes:
  - id: survey_mission
    name: Survey mission
    routeType: survey
    homeWaypointType: waypoint
routePatterns:
  - id: grid
    name: Grid
    attributes:
      - { id: spacing, kind: real, default: 50.0, min: 1.0 }
"#;

    #[test]
    fn test_build_links_descriptors() {
        let types = TypeCatalog::from_yaml_str(CATALOG).unwrap().build().unwrap();

        let mission_type = &types.mission_types[0];
        let route_type = &types.route_types[0];
        assert!(Arc::ptr_eq(&mission_type.route_type, route_type));
        assert!(Arc::ptr_eq(&mission_type.home_waypoint_type, &route_type.waypoint_types[0]));
        assert_eq!(route_type.waypoint_types[1].positioned, Positioned::Optional);
        assert_eq!(route_type.waypoint_types[0].attributes[0].kind, AttributeKind::Boolean);
        assert_eq!(types.route_patterns[0].attributes[0].min, Some(1.0));
    }

    #[test]
    fn test_unlisted_waypoint_types_are_reported() {
        let mut catalog = TypeCatalog::from_yaml_str(CATALOG).unwrap();
        let mut loiter = catalog.waypoint_types[1].clone();
        loiter.id = "loiter".to_string();
        catalog.waypoint_types.push(loiter);

        let types = catalog.build().unwrap();
        assert_eq!(types.waypoint_types.len(), 3);
        assert_eq!(types.unreachable_waypoint_types(), vec!["loiter".to_string()]);

        let (routes, missions) = Tables::new().missions_repository(RepositoryOptions::default());
        types.register(&*routes, &missions);
        assert!(routes.waypoint_type("loiter").is_none());
    }

    #[test]
    fn test_dangling_reference_fails() {
        let yaml = r#"
routeTypes:
  - id: survey
    name: Survey
    waypointTypes: [missing]
"#;
        let err = TypeCatalog::from_yaml_str(yaml).unwrap().build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type catalog error: route type 'survey' references unknown waypoint type 'missing'"
        );
    }

    #[test]
    fn test_load_directory_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        let (first, second) = CATALOG.split_at(CATALOG.find("routeTypes:").unwrap());
        std::fs::write(dir.path().join("10-waypoints.yaml"), first).unwrap();
        std::fs::write(dir.path().join("20-routes.yml"), second).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a catalog").unwrap();

        let catalog = TypeCatalog::load_from_directory(dir.path()).unwrap();
        assert_eq!(catalog.waypoint_types.len(), 2);
        assert_eq!(catalog.mission_types.len(), 1);
        assert!(catalog.build().is_ok());

        let missing = TypeCatalog::load_from_directory(&dir.path().join("nope")).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_register_with_repositories() {
        let types = TypeCatalog::from_yaml_str(CATALOG).unwrap().build().unwrap();
        let (routes, missions) = Tables::new().missions_repository(RepositoryOptions::default());

        assert_eq!(types.register(&*routes, &missions), 3);
        assert_eq!(types.register(&*routes, &missions), 0);
        assert!(missions.create_route_pattern("grid").is_some());
        assert!(routes.waypoint_type("takeoff").is_some());
    }
}
