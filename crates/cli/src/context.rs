//! Planner - wires the snapshot database, the repositories, the type
//! catalogs and the event journal together for one CLI invocation.

use anyhow::Context;
use planner_domain::{MissionsRepository, RoutesRepository};
use planner_store::Database;
use repository::{EventJournal, JournalEntry, TableMissionsRepository, TableRoutesRepository, TypeCatalog};
use shared::PlannerConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "planner.json";

pub struct Planner {
    config: PlannerConfig,
    database: Database,
    routes: Arc<TableRoutesRepository>,
    missions: Arc<TableMissionsRepository>,
    journal: Arc<EventJournal>,
}

impl Planner {
    /// Explicit config file, else `./planner.json`, else defaults
    pub fn load_config(path: Option<&Path>) -> anyhow::Result<PlannerConfig> {
        let config = match path {
            Some(path) => PlannerConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None if Path::new(CONFIG_FILE).exists() => PlannerConfig::from_file(Path::new(CONFIG_FILE))?,
            None => PlannerConfig::default(),
        };
        Ok(config)
    }

    /// Open the database, register catalog types and load every stored entity
    pub fn open(config: PlannerConfig) -> anyhow::Result<Self> {
        let database = Database::open(&config.database)
            .with_context(|| format!("Failed to open database {}", config.database.display()))?;

        let tables = &config.tables;
        let routes = Arc::new(TableRoutesRepository::new(
            database.table(&tables.routes),
            database.table(&tables.waypoints),
            database.table(&tables.route_waypoints),
        ));
        let missions = Arc::new(TableMissionsRepository::new(
            routes.clone(),
            database.table(&tables.missions),
            database.table(&tables.home_waypoints),
            config.repository.clone(),
        ));

        let types = TypeCatalog::load_from_directory(&config.types_dir)?.build()?;
        let registered = types.register(&*routes, &*missions);
        debug!(registered, "registered catalog types");

        missions.read_all()?;

        // Only changes made by the command itself are journaled
        let journal = Arc::new(EventJournal::new(config.journal_capacity));
        routes.subscribe(journal.observer());
        missions.subscribe(journal.observer());

        Ok(Self {
            config,
            database,
            routes,
            missions,
            journal,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn routes(&self) -> &TableRoutesRepository {
        &self.routes
    }

    pub fn missions(&self) -> &TableMissionsRepository {
        &self.missions
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// Save the snapshot and hand back the changes made since the last commit
    pub fn commit(&self) -> anyhow::Result<Vec<JournalEntry>> {
        self.database.save().context("Failed to save database")?;
        let entries = self.journal.entries();
        self.journal.clear();
        Ok(entries)
    }

    /// Commit and print what changed
    pub fn commit_and_report(&self) -> anyhow::Result<()> {
        for entry in self.commit()? {
            println!("  {}", entry);
        }
        Ok(())
    }
}
