//! Routes Repository - Abstract persistence for Routes and their waypoints
//!
//! This trait defines what the rest of the system needs from route storage.
//! How rows are kept in sync with the live graph is the implementation's
//! concern.

use crate::event::{Observer, RouteEvent, SubscriptionId};
use crate::model::entity::Shared;
use crate::model::id::EntityId;
use crate::model::route::Route;
use crate::model::types::{RouteType, WaypointType};
use crate::model::waypoint::Waypoint;
use shared::RepositoryError;
use std::sync::Arc;

/// Routes Repository Trait
///
/// This is a PORT in hexagonal architecture.
/// Every method is a blocking call; implementations serialize them.
pub trait RoutesRepository: Send + Sync {
    /// Load every stored route that is not cached yet.
    ///
    /// Rows with an unknown type are logged and skipped. Returns the number
    /// of routes loaded.
    fn read_all(&self) -> Result<usize, RepositoryError>;

    /// Cached route by id; never touches the store
    fn route(&self, id: &EntityId) -> Option<Shared<Route>>;

    fn route_ids(&self) -> Vec<EntityId>;

    fn routes(&self) -> Vec<Shared<Route>>;

    /// Cached waypoint by id
    fn waypoint(&self, id: &EntityId) -> Option<Shared<Waypoint>>;

    fn waypoint_ids(&self) -> Vec<EntityId>;

    fn route_type(&self, id: &str) -> Option<Arc<RouteType>>;

    fn route_types(&self) -> Vec<Arc<RouteType>>;

    fn waypoint_type(&self, id: &str) -> Option<Arc<WaypointType>>;

    /// Register a route type and its waypoint types. First registration
    /// wins; returns `false` if the id was already registered.
    fn register_route_type(&self, route_type: Arc<RouteType>) -> bool;

    /// Returns `false` if no route type with this id was registered
    fn unregister_route_type(&self, route_type_id: &str) -> bool;

    /// Insert or update a route, then reconcile its waypoints
    fn save_route(&self, route: &Shared<Route>) -> Result<(), RepositoryError>;

    /// Remove a route, its relations and the waypoints only it used
    fn remove_route(&self, route: &Shared<Route>) -> Result<(), RepositoryError>;

    /// Discard unsaved changes by reloading the route from the store
    fn restore_route(&self, route: &Shared<Route>) -> Result<(), RepositoryError>;

    fn subscribe(&self, observer: Observer<RouteEvent>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Check if a route is cached
    fn contains(&self, id: &EntityId) -> bool {
        self.route(id).is_some()
    }

    /// Count cached routes
    fn count(&self) -> usize {
        self.route_ids().len()
    }
}
