//! In-Memory Table
//!
//! Ordered row storage implementing the `Table` port.
//! Rows keep their insertion position; updates replace in place, so
//! selects reflect insertion order.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use planner_domain::{EntityId, Table};
use shared::{params, Condition, Row, StoreError, Value};

/// In-memory table
///
/// Thread-safe implementation using RwLock. Clones share the same rows.
#[derive(Debug, Clone)]
pub struct InMemoryTable {
    name: String,
    rows: Arc<RwLock<Vec<Row>>>,
}

impl InMemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rows(name, Vec::new())
    }

    pub fn with_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Copy of every row, in storage order
    pub fn rows(&self) -> Result<Vec<Row>, StoreError> {
        Ok(self.read()?.clone())
    }

    pub fn len(&self) -> usize {
        self.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole content
    pub fn replace_rows(&self, rows: Vec<Row>) -> Result<(), StoreError> {
        *self.write()? = rows;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Row>>, StoreError> {
        self.rows.read().map_err(|_| StoreError::Unavailable {
            table: self.name.clone(),
            reason: "Failed to acquire read lock".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Row>>, StoreError> {
        self.rows.write().map_err(|_| StoreError::Unavailable {
            table: self.name.clone(),
            reason: "Failed to acquire write lock".to_string(),
        })
    }
}

fn row_id(row: &Row) -> Option<EntityId> {
    row.get(params::ID)
        .map(EntityId::from_value)
        .filter(|id| !id.is_null())
}

impl Table for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn select_ids(&self) -> Result<Vec<EntityId>, StoreError> {
        Ok(self.read()?.iter().filter_map(row_id).collect())
    }

    fn select_by_id(&self, id: &EntityId) -> Result<Option<Row>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .find(|row| row_id(row).as_ref() == Some(id))
            .cloned())
    }

    fn select_one(&self, conditions: &[Condition], column: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter(|row| Condition::all_match(conditions, row))
            .filter_map(|row| row.get(column).cloned())
            .collect())
    }

    fn insert(&self, row: Row) -> Result<(), StoreError> {
        let mut rows = self.write()?;
        if let Some(id) = row_id(&row) {
            if rows.iter().any(|r| row_id(r).as_ref() == Some(&id)) {
                return Err(StoreError::DuplicateId {
                    table: self.name.clone(),
                    id: id.to_string(),
                });
            }
        }
        rows.push(row);
        Ok(())
    }

    fn update(&self, id: &EntityId, row: Row) -> Result<(), StoreError> {
        let mut rows = self.write()?;
        let slot = rows
            .iter_mut()
            .find(|r| row_id(r).as_ref() == Some(id))
            .ok_or_else(|| StoreError::RowNotFound {
                table: self.name.clone(),
                id: id.to_string(),
            })?;
        *slot = row;
        Ok(())
    }

    fn remove_by_conditions(&self, conditions: &[Condition]) -> Result<usize, StoreError> {
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|row| !Condition::all_match(conditions, row));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_select_update() {
        let table = InMemoryTable::new("routes");

        table.insert(row(json!({ "id": "r-1", "name": "One" }))).unwrap();
        table.insert(row(json!({ "id": "r-2", "name": "Two" }))).unwrap();

        assert_eq!(
            table.select_ids().unwrap(),
            vec![EntityId::new("r-1"), EntityId::new("r-2")]
        );

        table
            .update(&EntityId::new("r-1"), row(json!({ "id": "r-1", "name": "First" })))
            .unwrap();
        let stored = table.select_by_id(&EntityId::new("r-1")).unwrap().unwrap();
        assert_eq!(stored["name"], json!("First"));

        // Update keeps the position
        assert_eq!(table.select_ids().unwrap()[0], EntityId::new("r-1"));
    }

    #[test]
    fn test_duplicate_and_missing_ids() {
        let table = InMemoryTable::new("routes");
        table.insert(row(json!({ "id": "r-1" }))).unwrap();

        assert!(matches!(
            table.insert(row(json!({ "id": "r-1" }))),
            Err(StoreError::DuplicateId { .. })
        ));
        assert!(matches!(
            table.update(&EntityId::new("r-9"), Row::new()),
            Err(StoreError::RowNotFound { .. })
        ));
        assert!(table.select_by_id(&EntityId::new("r-9")).unwrap().is_none());
    }

    #[test]
    fn test_join_rows_keep_insertion_order() {
        let table = InMemoryTable::new("route_waypoints");
        for (route, waypoint) in [("r-1", "w-3"), ("r-2", "w-1"), ("r-1", "w-1"), ("r-1", "w-2")] {
            table.insert(row(json!({ "route": route, "waypoint": waypoint }))).unwrap();
        }

        let members = table
            .select_one(&[Condition::new(params::ROUTE, "r-1")], params::WAYPOINT)
            .unwrap();
        assert_eq!(members, vec![json!("w-3"), json!("w-1"), json!("w-2")]);

        let removed = table
            .remove_by_conditions(&[
                Condition::new(params::ROUTE, "r-1"),
                Condition::new(params::WAYPOINT, "w-1"),
            ])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 3);

        assert_eq!(table.remove_by_condition(Condition::new(params::ROUTE, "r-1")).unwrap(), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_clones_share_rows() {
        let table = InMemoryTable::new("missions");
        let other = table.clone();

        table.insert(row(json!({ "id": "m-1" }))).unwrap();
        assert_eq!(other.len(), 1);
    }
}
