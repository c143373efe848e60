//! Missions Repository - Abstract persistence for Missions
//!
//! Missions sit one level above routes: each mission owns a route that is
//! stored through a `RoutesRepository`.

use crate::event::{MissionEvent, Observer, SubscriptionId};
use crate::model::entity::Shared;
use crate::model::id::EntityId;
use crate::model::mission::Mission;
use crate::model::operation::{MissionOperation, OperationKind, OperationState};
use crate::model::pattern::{RoutePattern, RoutePatternFactory};
use crate::model::types::MissionType;
use shared::RepositoryError;
use std::sync::Arc;

/// Missions Repository Trait
///
/// This is a PORT in hexagonal architecture.
pub trait MissionsRepository: Send + Sync {
    /// Load routes first, then every stored mission that is not cached yet.
    /// Returns the number of missions loaded.
    fn read_all(&self) -> Result<usize, RepositoryError>;

    fn mission(&self, id: &EntityId) -> Option<Shared<Mission>>;

    /// First cached mission planned for the vehicle.
    ///
    /// Linear scan of the cache: mission counts are small.
    fn mission_for_vehicle(&self, vehicle_id: &str) -> Option<Shared<Mission>>;

    fn mission_ids(&self) -> Vec<EntityId>;

    fn missions(&self) -> Vec<Shared<Mission>>;

    fn mission_type(&self, id: &str) -> Option<Arc<MissionType>>;

    fn mission_types(&self) -> Vec<Arc<MissionType>>;

    /// Register a mission type (and its route type). First registration wins.
    fn register_mission_type(&self, mission_type: Arc<MissionType>) -> bool;

    fn unregister_mission_type(&self, mission_type_id: &str) -> bool;

    /// Register the factory for a route pattern id. First registration wins.
    fn register_route_pattern_factory(
        &self,
        pattern_id: &str,
        factory: Arc<dyn RoutePatternFactory>,
    ) -> bool;

    fn unregister_route_pattern_factory(&self, pattern_id: &str) -> bool;

    fn route_pattern_ids(&self) -> Vec<String>;

    /// Create a pattern through its registered factory
    fn create_route_pattern(&self, pattern_id: &str) -> Option<RoutePattern>;

    /// Save the mission's route, then insert or update the mission and its home point
    fn save_mission(&self, mission: &Shared<Mission>) -> Result<(), RepositoryError>;

    fn remove_mission(&self, mission: &Shared<Mission>) -> Result<(), RepositoryError>;

    /// Discard unsaved changes to the mission and its home point
    fn restore_mission(&self, mission: &Shared<Mission>) -> Result<(), RepositoryError>;

    /// The operation running on a mission, if any
    fn operation_for_mission(&self, mission_id: &EntityId) -> Option<Shared<MissionOperation>>;

    /// Start an operation on a cached mission.
    ///
    /// Fails with `OperationInProgress` while another operation on the same
    /// mission has not ended.
    fn start_operation(
        &self,
        mission: &Shared<Mission>,
        kind: OperationKind,
    ) -> Result<Shared<MissionOperation>, RepositoryError>;

    /// Finish a running operation with a final state and stop tracking it.
    ///
    /// Returns `false` if the operation is not the one tracked for its
    /// mission or `state` is not final.
    fn end_operation(&self, operation: &Shared<MissionOperation>, state: OperationState) -> bool;

    fn subscribe(&self, observer: Observer<MissionEvent>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Count cached missions
    fn count(&self) -> usize {
        self.mission_ids().len()
    }
}
