//! Mission operations - transfers of a mission between planner and vehicle
//!
//! At most one operation runs per mission. The missions repository tracks
//! it from `start_operation` until `end_operation`.

use super::entity::{Entity, Shared, SharedExt};
use super::id::EntityId;
use super::mission::Mission;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Upload,
    Download,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Cancelled,
}

impl OperationState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, OperationState::InProgress)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperationKind::Upload => "upload",
            OperationKind::Download => "download",
            OperationKind::Clear => "clear",
        })
    }
}

#[derive(Debug)]
pub struct MissionOperation {
    mission: Shared<Mission>,
    mission_id: EntityId,
    kind: OperationKind,
    state: OperationState,
    progress: usize,
    total: usize,
}

impl MissionOperation {
    pub fn new(mission: Shared<Mission>, kind: OperationKind) -> Self {
        let mission_id = mission.read_entity().id().clone();
        Self {
            mission,
            mission_id,
            kind,
            state: OperationState::InProgress,
            progress: 0,
            total: 0,
        }
    }

    // ========== Getters ==========

    pub fn mission(&self) -> &Shared<Mission> {
        &self.mission
    }

    pub fn mission_id(&self) -> &EntityId {
        &self.mission_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn total(&self) -> usize {
        self.total
    }

    // ========== Mutations ==========

    /// Report how many of `total` items have been transferred
    pub fn set_progress(&mut self, progress: usize, total: usize) {
        self.total = total;
        self.progress = progress.min(total);
    }

    /// Move to a final state. Returns `false` if already finished or if
    /// `state` is not final.
    pub fn finish(&mut self, state: OperationState) -> bool {
        if self.state.is_finished() || !state.is_finished() {
            return false;
        }
        self.state = state;
        true
    }
}
