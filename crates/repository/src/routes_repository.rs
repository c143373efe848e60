//! TableRoutesRepository - Routes and waypoints kept in sync with three tables
//!
//! ```text
//! routes           {id, type, name, params}
//! waypoints        {id, type, name, latitude, longitude, altitude, params, current, reached}
//! route_waypoints  {route, waypoint}   one row per relation, in route order
//! ```
//!
//! Waypoints are shared by relation: a waypoint row is deleted once the
//! last route relating to it lets go.

use crate::cache::{EntityCache, RelationIndex};
use crate::notifier::ChangeNotifier;
use crate::registry::TypeRegistry;
use planner_domain::{
    share, Entity, EntityId, Observer, Route, RouteEvent, RouteType, RoutesRepository, Shared,
    SharedExt, SubscriptionId, Table, Waypoint, WaypointType,
};
use shared::{params, Condition, EntityKind, RepositoryError, Row, RowExt, StoreError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

type Result<T> = std::result::Result<T, RepositoryError>;

/// Everything guarded by the repository lock
#[derive(Default)]
struct RoutesState {
    routes: EntityCache<Route>,
    waypoints: EntityCache<Waypoint>,
    relations: RelationIndex,
    route_types: TypeRegistry<RouteType>,
    waypoint_types: TypeRegistry<WaypointType>,
}

/// Routes repository over the `Table` port
///
/// Every public operation holds the repository lock for its full duration.
/// Callers must not hold a lock on a route or waypoint handle while calling
/// in.
pub struct TableRoutesRepository {
    routes_table: Arc<dyn Table>,
    waypoints_table: Arc<dyn Table>,
    route_waypoints_table: Arc<dyn Table>,
    state: Mutex<RoutesState>,
    notifier: ChangeNotifier<RouteEvent>,
}

impl TableRoutesRepository {
    pub fn new(
        routes_table: Arc<dyn Table>,
        waypoints_table: Arc<dyn Table>,
        route_waypoints_table: Arc<dyn Table>,
    ) -> Self {
        Self {
            routes_table,
            waypoints_table,
            route_waypoints_table,
            state: Mutex::new(RoutesState::default()),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Ids of the routes a waypoint is related to
    pub fn routes_of_waypoint(&self, waypoint_id: &EntityId) -> Vec<EntityId> {
        self.lock().relations.owners_of(waypoint_id)
    }

    pub fn waypoint_types(&self) -> Vec<Arc<WaypointType>> {
        self.lock().waypoint_types.all()
    }

    fn lock(&self) -> MutexGuard<'_, RoutesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join_row(route_id: &EntityId, waypoint_id: &EntityId) -> Row {
        let mut row = Row::new();
        row.insert(params::ROUTE.to_string(), route_id.to_value());
        row.insert(params::WAYPOINT.to_string(), waypoint_id.to_value());
        row
    }

    fn join_conditions(route_id: &EntityId, waypoint_id: &EntityId) -> [Condition; 2] {
        [
            Condition::new(params::ROUTE, route_id.to_value()),
            Condition::new(params::WAYPOINT, waypoint_id.to_value()),
        ]
    }

    /// Waypoint ids related to a route, in stored join order
    fn stored_waypoint_ids(&self, route_id: &EntityId) -> Result<Vec<EntityId>> {
        let values = self.route_waypoints_table.select_one(
            &[Condition::new(params::ROUTE, route_id.to_value())],
            params::WAYPOINT,
        )?;
        Ok(values.iter().map(EntityId::from_value).collect())
    }

    /// Reconstruct a route and its waypoints from the store and cache it.
    ///
    /// `Ok(None)` when the row is gone or its type is unknown.
    fn read_route(&self, state: &mut RoutesState, id: &EntityId) -> Result<Option<Shared<Route>>> {
        let row = match self.routes_table.select_by_id(id)? {
            Some(row) => row,
            None => {
                warn!(route = %id, "route row not found");
                return Ok(None);
            }
        };

        let type_id = row.str_value(params::TYPE).unwrap_or_default();
        let route_type = match state.route_types.lookup(type_id) {
            Some(route_type) => route_type,
            None => {
                let err = RepositoryError::UnresolvedType {
                    kind: EntityKind::Route,
                    type_id: type_id.to_string(),
                };
                warn!(route = %id, "skipping route: {}", err);
                return Ok(None);
            }
        };

        let mut route = Route::from_row(route_type, &row);
        let route_id = route.id().clone();

        for waypoint_id in self.stored_waypoint_ids(&route_id)? {
            let waypoint = match state.waypoints.get(&waypoint_id) {
                Some(waypoint) => Some(waypoint),
                None => self.read_waypoint(state, &waypoint_id)?,
            };
            if let Some(waypoint) = waypoint {
                route.add_waypoint(waypoint);
                state.relations.relate(route_id.clone(), waypoint_id);
            }
        }

        debug!(route = %route_id, waypoints = route.waypoints_count(), "read route");
        let route = share(route);
        state.routes.put(route_id, route.clone());
        self.notifier.notify(&RouteEvent::Added(route.clone()));
        Ok(Some(route))
    }

    fn read_waypoint(
        &self,
        state: &mut RoutesState,
        id: &EntityId,
    ) -> Result<Option<Shared<Waypoint>>> {
        let row = match self.waypoints_table.select_by_id(id)? {
            Some(row) => row,
            None => {
                warn!(waypoint = %id, "waypoint row not found");
                return Ok(None);
            }
        };

        let type_id = row.str_value(params::TYPE).unwrap_or_default();
        let waypoint_type = match state.waypoint_types.lookup(type_id) {
            Some(waypoint_type) => waypoint_type,
            None => {
                let err = RepositoryError::UnresolvedType {
                    kind: EntityKind::Waypoint,
                    type_id: type_id.to_string(),
                };
                warn!(waypoint = %id, "skipping waypoint: {}", err);
                return Ok(None);
            }
        };

        let waypoint = share(Waypoint::from_row(waypoint_type, &row));
        state.waypoints.put(id.clone(), waypoint.clone());
        Ok(Some(waypoint))
    }

    /// Upsert a waypoint and relate it to the route if it is not yet
    fn save_waypoint(
        &self,
        state: &mut RoutesState,
        route_id: &EntityId,
        waypoint: &Shared<Waypoint>,
    ) -> Result<()> {
        let guard = waypoint.read_entity();
        let waypoint_id = guard.id().clone();
        if waypoint_id.is_null() {
            warn!(route = %route_id, "Can't save waypoint with no id, skipping");
            return Ok(());
        }

        if state.waypoints.contains(&waypoint_id) {
            match self.waypoints_table.update_entity(&*guard) {
                Ok(()) => {}
                // Cached but never stored, e.g. reloaded into a route that
                // lost the row
                Err(StoreError::RowNotFound { .. }) => self.waypoints_table.insert_entity(&*guard)?,
                Err(err) => return Err(err.into()),
            }
        } else {
            self.waypoints_table.insert_entity(&*guard)?;
        }
        drop(guard);
        state.waypoints.put(waypoint_id.clone(), waypoint.clone());

        if !state.relations.contains(route_id, &waypoint_id) {
            self.route_waypoints_table
                .insert(Self::join_row(route_id, &waypoint_id))?;
            state.relations.relate(route_id.clone(), waypoint_id);
        }
        Ok(())
    }

    /// Delete a waypoint from store and cache
    fn remove_waypoint(&self, state: &mut RoutesState, id: &EntityId) -> Result<()> {
        self.waypoints_table.remove_by_id(id)?;
        state.waypoints.remove(id);
        debug!(waypoint = %id, "removed waypoint");
        Ok(())
    }

    /// Drop one relation; the waypoint goes too when no route holds it any more
    fn release_waypoint(
        &self,
        state: &mut RoutesState,
        route_id: &EntityId,
        waypoint_id: &EntityId,
    ) -> Result<()> {
        self.route_waypoints_table
            .remove_by_conditions(&Self::join_conditions(route_id, waypoint_id))?;
        state.relations.unrelate(route_id, waypoint_id);
        if state.relations.is_orphan(waypoint_id) {
            self.remove_waypoint(state, waypoint_id)?;
        }
        Ok(())
    }

    fn route_id_of(route: &Shared<Route>) -> Result<EntityId> {
        let id = route.read_entity().id().clone();
        if id.is_null() {
            let err = RepositoryError::null_id(EntityKind::Route);
            warn!("{}", err);
            return Err(err);
        }
        Ok(id)
    }
}

impl RoutesRepository for TableRoutesRepository {
    fn read_all(&self) -> Result<usize> {
        let mut state = self.lock();
        let mut loaded = 0;

        for id in self.routes_table.select_ids()? {
            if state.routes.contains(&id) {
                continue;
            }
            if self.read_route(&mut state, &id)?.is_some() {
                loaded += 1;
            }
        }

        info!(loaded, total = state.routes.len(), "read routes");
        Ok(loaded)
    }

    fn route(&self, id: &EntityId) -> Option<Shared<Route>> {
        self.lock().routes.get(id)
    }

    fn route_ids(&self) -> Vec<EntityId> {
        self.lock().routes.ids()
    }

    fn routes(&self) -> Vec<Shared<Route>> {
        self.lock().routes.entities()
    }

    fn waypoint(&self, id: &EntityId) -> Option<Shared<Waypoint>> {
        self.lock().waypoints.get(id)
    }

    fn waypoint_ids(&self) -> Vec<EntityId> {
        self.lock().waypoints.ids()
    }

    fn route_type(&self, id: &str) -> Option<Arc<RouteType>> {
        self.lock().route_types.lookup(id)
    }

    fn route_types(&self) -> Vec<Arc<RouteType>> {
        self.lock().route_types.all()
    }

    fn waypoint_type(&self, id: &str) -> Option<Arc<WaypointType>> {
        self.lock().waypoint_types.lookup(id)
    }

    fn register_route_type(&self, route_type: Arc<RouteType>) -> bool {
        let mut state = self.lock();
        if !state.route_types.register(route_type.clone()) {
            return false;
        }
        for waypoint_type in &route_type.waypoint_types {
            state.waypoint_types.register(waypoint_type.clone());
        }

        debug!(route_type = %route_type.id, "registered route type");
        self.notifier.notify(&RouteEvent::TypesChanged);
        true
    }

    fn unregister_route_type(&self, route_type_id: &str) -> bool {
        let mut state = self.lock();
        let removed = match state.route_types.unregister(route_type_id) {
            Some(removed) => removed,
            None => return false,
        };

        let remaining = state.route_types.all();
        for waypoint_type in &removed.waypoint_types {
            if !remaining.iter().any(|rt| rt.permits(&waypoint_type.id)) {
                state.waypoint_types.unregister(&waypoint_type.id);
            }
        }

        debug!(route_type = %route_type_id, "unregistered route type");
        self.notifier.notify(&RouteEvent::TypesChanged);
        true
    }

    fn save_route(&self, route: &Shared<Route>) -> Result<()> {
        let mut state = self.lock();
        let route_id = Self::route_id_of(route)?;

        let guard = route.read_entity();
        let is_new = !state.routes.contains(&route_id);
        if is_new {
            self.routes_table.insert_entity(&*guard)?;
        } else {
            self.routes_table.update_entity(&*guard)?;
        }
        state.routes.put(route_id.clone(), route.clone());

        // Phase 1: relations the route no longer has, against the pre-save snapshot
        let current_ids = guard.waypoint_ids();
        for waypoint_id in state.relations.members_of(&route_id) {
            if !current_ids.contains(&waypoint_id) {
                self.release_waypoint(&mut state, &route_id, &waypoint_id)?;
            }
        }

        // Join rows must follow list order; rewrite them if a reorder broke that.
        // Only known relations are rewritten: join rows whose waypoint could not
        // be read stay in the store.
        let stored = state.relations.members_of(&route_id);
        let in_order = stored.iter().zip(current_ids.iter()).all(|(s, c)| s == c);
        if !in_order {
            debug!(route = %route_id, "waypoints reordered, rewriting relations");
            for waypoint_id in &stored {
                self.route_waypoints_table
                    .remove_by_conditions(&Self::join_conditions(&route_id, waypoint_id))?;
                state.relations.unrelate(&route_id, waypoint_id);
            }
        }

        // Phase 2: upsert every waypoint in the list
        for waypoint in guard.waypoints() {
            self.save_waypoint(&mut state, &route_id, waypoint)?;
        }
        let count = guard.waypoints_count();
        drop(guard);

        debug!(route = %route_id, waypoints = count, is_new, "saved route");
        let event = if is_new {
            RouteEvent::Added(route.clone())
        } else {
            RouteEvent::Changed(route.clone())
        };
        self.notifier.notify(&event);
        Ok(())
    }

    fn remove_route(&self, route: &Shared<Route>) -> Result<()> {
        let mut state = self.lock();
        let route_id = Self::route_id_of(route)?;

        self.route_waypoints_table
            .remove_by_condition(Condition::new(params::ROUTE, route_id.to_value()))?;
        for waypoint_id in state.relations.unrelate_all(&route_id) {
            if state.relations.is_orphan(&waypoint_id) {
                self.remove_waypoint(&mut state, &waypoint_id)?;
            }
        }

        self.routes_table.remove_by_id(&route_id)?;
        state.routes.remove(&route_id);

        debug!(route = %route_id, "removed route");
        self.notifier.notify(&RouteEvent::Removed(route.clone()));
        Ok(())
    }

    fn restore_route(&self, route: &Shared<Route>) -> Result<()> {
        let mut state = self.lock();
        let route_id = Self::route_id_of(route)?;

        let row = self
            .routes_table
            .select_by_id(&route_id)?
            .ok_or_else(|| StoreError::RowNotFound {
                table: self.routes_table.name().to_string(),
                id: route_id.to_string(),
            })?;

        let mut waypoints = Vec::new();
        state.relations.unrelate_all(&route_id);
        for waypoint_id in self.stored_waypoint_ids(&route_id)? {
            let waypoint = match state.waypoints.get(&waypoint_id) {
                Some(waypoint) => match self.waypoints_table.select_by_id(&waypoint_id)? {
                    Some(stored) => {
                        waypoint.write_entity().apply_row(&stored);
                        Some(waypoint)
                    }
                    None => {
                        warn!(waypoint = %waypoint_id, "waypoint row not found");
                        None
                    }
                },
                None => self.read_waypoint(&mut state, &waypoint_id)?,
            };
            if let Some(waypoint) = waypoint {
                state.relations.relate(route_id.clone(), waypoint_id);
                waypoints.push(waypoint);
            }
        }

        let displaced = {
            let mut guard = route.write_entity();
            let displaced = guard.set_waypoints(waypoints);
            guard.apply_row(&row);
            displaced
        };
        debug!(route = %route_id, displaced = displaced.len(), "restored route");
        drop(displaced);

        self.notifier.notify(&RouteEvent::Changed(route.clone()));
        Ok(())
    }

    fn subscribe(&self, observer: Observer<RouteEvent>) -> SubscriptionId {
        self.notifier.subscribe(observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}
