//! Table - the store adapter port
//!
//! One `Table` per stored relation (routes, waypoints, the route/waypoint
//! join, missions, home points). Implementations own the actual row
//! storage; the repositories only speak rows and conditions.
//!
//! All operations are synchronous and either succeed or fail with a
//! `StoreError` that the repositories propagate unchanged.

use crate::model::entity::Entity;
use crate::model::id::EntityId;
use shared::{params, Condition, Row, StoreError, Value};

pub trait Table: Send + Sync {
    /// Table name, for logs and errors
    fn name(&self) -> &str;

    /// Ids of every row, in storage order
    fn select_ids(&self) -> Result<Vec<EntityId>, StoreError>;

    /// One row by id
    fn select_by_id(&self, id: &EntityId) -> Result<Option<Row>, StoreError>;

    /// Values of `column` from every row matching all conditions, in storage order
    fn select_one(&self, conditions: &[Condition], column: &str) -> Result<Vec<Value>, StoreError>;

    /// Append a row
    fn insert(&self, row: Row) -> Result<(), StoreError>;

    /// Replace the row with the given id, keeping its position
    fn update(&self, id: &EntityId, row: Row) -> Result<(), StoreError>;

    /// Remove every row matching all conditions; returns the number removed
    fn remove_by_conditions(&self, conditions: &[Condition]) -> Result<usize, StoreError>;

    fn remove_by_condition(&self, condition: Condition) -> Result<usize, StoreError> {
        self.remove_by_conditions(&[condition])
    }

    fn insert_entity(&self, entity: &dyn Entity) -> Result<(), StoreError> {
        self.insert(entity.to_row())
    }

    fn update_entity(&self, entity: &dyn Entity) -> Result<(), StoreError> {
        self.update(entity.id(), entity.to_row())
    }

    fn remove_entity(&self, entity: &dyn Entity) -> Result<usize, StoreError> {
        self.remove_by_id(entity.id())
    }

    fn remove_by_id(&self, id: &EntityId) -> Result<usize, StoreError> {
        self.remove_by_condition(Condition::new(params::ID, id.to_value()))
    }

    /// Refresh an entity in place from its stored row
    fn read_entity(&self, entity: &mut dyn Entity) -> Result<(), StoreError> {
        let row = self
            .select_by_id(entity.id())?
            .ok_or_else(|| StoreError::RowNotFound {
                table: self.name().to_string(),
                id: entity.id().to_string(),
            })?;
        entity.apply_row(&row);
        Ok(())
    }
}
