//! Change events broadcast by the repositories
//!
//! Every mutating repository operation emits exactly one terminal event per
//! top-level entity, after the cache and the store reflect the change.
//! Observers receive the live handle, so a removed entity is still readable
//! while its `Removed` event is delivered.

use crate::model::entity::{Entity, Shared, SharedExt};
use crate::model::id::EntityId;
use crate::model::mission::Mission;
use crate::model::operation::MissionOperation;
use crate::model::route::Route;
use serde::{Deserialize, Serialize};
use shared::EntityKind;

/// What happened, independent of the entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
    TypesChanged,
    OperationStarted,
    OperationEnded,
}

#[derive(Debug, Clone)]
pub enum RouteEvent {
    Added(Shared<Route>),
    Changed(Shared<Route>),
    Removed(Shared<Route>),
    TypesChanged,
}

#[derive(Debug, Clone)]
pub enum MissionEvent {
    Added(Shared<Mission>),
    Changed(Shared<Mission>),
    Removed(Shared<Mission>),
    TypesChanged,
    OperationStarted(Shared<MissionOperation>),
    OperationEnded(Shared<MissionOperation>),
}

/// Uniform view of an event, used by journals and logs
pub trait ChangeEvent {
    fn change(&self) -> ChangeKind;
    fn entity_kind(&self) -> EntityKind;
    fn entity_id(&self) -> Option<EntityId>;
}

impl ChangeEvent for RouteEvent {
    fn change(&self) -> ChangeKind {
        match self {
            RouteEvent::Added(_) => ChangeKind::Added,
            RouteEvent::Changed(_) => ChangeKind::Changed,
            RouteEvent::Removed(_) => ChangeKind::Removed,
            RouteEvent::TypesChanged => ChangeKind::TypesChanged,
        }
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Route
    }

    fn entity_id(&self) -> Option<EntityId> {
        match self {
            RouteEvent::Added(r) | RouteEvent::Changed(r) | RouteEvent::Removed(r) => {
                Some(r.read_entity().id().clone())
            }
            RouteEvent::TypesChanged => None,
        }
    }
}

impl ChangeEvent for MissionEvent {
    fn change(&self) -> ChangeKind {
        match self {
            MissionEvent::Added(_) => ChangeKind::Added,
            MissionEvent::Changed(_) => ChangeKind::Changed,
            MissionEvent::Removed(_) => ChangeKind::Removed,
            MissionEvent::TypesChanged => ChangeKind::TypesChanged,
            MissionEvent::OperationStarted(_) => ChangeKind::OperationStarted,
            MissionEvent::OperationEnded(_) => ChangeKind::OperationEnded,
        }
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Mission
    }

    fn entity_id(&self) -> Option<EntityId> {
        match self {
            MissionEvent::Added(m) | MissionEvent::Changed(m) | MissionEvent::Removed(m) => {
                Some(m.read_entity().id().clone())
            }
            MissionEvent::OperationStarted(op) | MissionEvent::OperationEnded(op) => {
                Some(op.read_entity().mission_id().clone())
            }
            MissionEvent::TypesChanged => None,
        }
    }
}

/// Callback invoked synchronously for every event.
///
/// Observers run while the emitting repository holds its lock; they must
/// not call back into that repository.
pub type Observer<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);
