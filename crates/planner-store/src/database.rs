//! Database - a named set of in-memory tables with snapshot persistence
//!
//! The snapshot is a single JSON document. Saving writes to a temporary
//! file next to the target and renames it into place.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use shared::{Row, StoreError};
use tracing::{debug, info};

use crate::in_memory::InMemoryTable;

const SNAPSHOT_VERSION: u32 = 1;

/// On-disk snapshot document
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: u32,
    pub tables: BTreeMap<String, Vec<Row>>,
}

#[derive(Debug, Default)]
pub struct Database {
    path: Option<PathBuf>,
    tables: RwLock<BTreeMap<String, Arc<InMemoryTable>>>,
}

impl Database {
    /// Database that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a snapshot-backed database; a missing file means an empty database
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut tables = BTreeMap::new();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let snapshot: DatabaseSnapshot = serde_json::from_str(&content)?;
            for (name, rows) in snapshot.tables {
                debug!(table = %name, rows = rows.len(), "loaded table");
                tables.insert(name.clone(), Arc::new(InMemoryTable::with_rows(name, rows)));
            }
            info!(path = %path.display(), tables = tables.len(), "opened database snapshot");
        }

        Ok(Self {
            path: Some(path),
            tables: RwLock::new(tables),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Table by name, created empty on first use
    pub fn table(&self, name: &str) -> Arc<InMemoryTable> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryTable::new(name)))
            .clone()
    }

    pub fn table_names(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Result<DatabaseSnapshot, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot = DatabaseSnapshot {
            version: SNAPSHOT_VERSION,
            tables: BTreeMap::new(),
        };
        for (name, table) in tables.iter() {
            snapshot.tables.insert(name.clone(), table.rows()?);
        }
        Ok(snapshot)
    }

    /// Write the snapshot to the path the database was opened with.
    /// In-memory databases have nothing to save.
    pub fn save(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut file, &snapshot)?;
        file.flush()?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| StoreError::Io(e.error))?;

        info!(path = %path.display(), tables = snapshot.tables.len(), "saved database snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_domain::{EntityId, Table};
    use serde_json::json;

    #[test]
    fn test_tables_are_created_once() {
        let db = Database::in_memory();
        let a = db.table("routes");
        let b = db.table("routes");

        a.insert(json!({ "id": "r-1" }).as_object().cloned().unwrap()).unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(db.table_names(), vec!["routes".to_string()]);
    }

    #[test]
    fn test_snapshot_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        let db = Database::open(&path).unwrap();
        db.table("waypoints")
            .insert(json!({ "id": "w-1", "name": "WPT 1" }).as_object().cloned().unwrap())
            .unwrap();
        db.table("waypoints")
            .insert(json!({ "id": "w-2", "name": "WPT 2" }).as_object().cloned().unwrap())
            .unwrap();
        db.save().unwrap();

        let reopened = Database::open(&path).unwrap();
        let waypoints = reopened.table("waypoints");
        assert_eq!(
            waypoints.select_ids().unwrap(),
            vec![EntityId::new("w-1"), EntityId::new("w-2")]
        );
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let db = Database::in_memory();
        db.table("missions");
        assert!(db.save().is_ok());
        assert!(db.path().is_none());
    }
}
