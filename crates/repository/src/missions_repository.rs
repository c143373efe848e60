//! TableMissionsRepository - Missions and home points, composed over routes
//!
//! ```text
//! missions        {id, type, name, vehicle, route, home}
//! home_waypoints  {id, type, name, latitude, longitude, altitude, params, current, reached}
//! ```
//!
//! Routes are delegated to a `RoutesRepository`. The mission lock is always
//! taken before the routes lock, never the other way around.

use crate::cache::EntityCache;
use crate::notifier::ChangeNotifier;
use crate::registry::TypeRegistry;
use planner_domain::{
    share, Entity, EntityId, Mission, MissionEvent, MissionOperation, MissionType,
    MissionsRepository, Observer, OperationKind, OperationState, RoutePattern,
    RoutePatternFactory, RoutesRepository, Shared, SharedExt, SubscriptionId, Table,
};
use shared::{params, EntityKind, RepositoryError, RepositoryOptions, RowExt, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Default)]
struct MissionsState {
    missions: EntityCache<Mission>,
    mission_types: TypeRegistry<MissionType>,
    pattern_factories: BTreeMap<String, Arc<dyn RoutePatternFactory>>,
    operations: BTreeMap<EntityId, Shared<MissionOperation>>,
}

/// Missions repository over the `Table` port
pub struct TableMissionsRepository {
    routes: Arc<dyn RoutesRepository>,
    missions_table: Arc<dyn Table>,
    home_waypoints_table: Arc<dyn Table>,
    options: RepositoryOptions,
    state: Mutex<MissionsState>,
    notifier: ChangeNotifier<MissionEvent>,
}

impl TableMissionsRepository {
    pub fn new(
        routes: Arc<dyn RoutesRepository>,
        missions_table: Arc<dyn Table>,
        home_waypoints_table: Arc<dyn Table>,
        options: RepositoryOptions,
    ) -> Self {
        Self {
            routes,
            missions_table,
            home_waypoints_table,
            options,
            state: Mutex::new(MissionsState::default()),
            notifier: ChangeNotifier::new(),
        }
    }

    /// The routes repository missions delegate to
    pub fn routes(&self) -> &Arc<dyn RoutesRepository> {
        &self.routes
    }

    fn lock(&self) -> MutexGuard<'_, MissionsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mission_id_of(mission: &Shared<Mission>) -> Result<EntityId> {
        let id = mission.read_entity().id().clone();
        if id.is_null() {
            let err = RepositoryError::null_id(EntityKind::Mission);
            warn!("{}", err);
            return Err(err);
        }
        Ok(id)
    }

    /// Finish and drop the operation tracked for a mission
    fn finish_operation(
        &self,
        state: &mut MissionsState,
        mission_id: &EntityId,
        final_state: OperationState,
    ) -> bool {
        let operation = match state.operations.get(mission_id) {
            Some(operation) => operation.clone(),
            None => return false,
        };
        if !operation.write_entity().finish(final_state) {
            return false;
        }
        state.operations.remove(mission_id);

        info!(mission = %mission_id, state = ?final_state, "operation ended");
        self.notifier.notify(&MissionEvent::OperationEnded(operation));
        true
    }

    /// Reconstruct a mission with its home point inlined, then attach its route
    fn read_mission(
        &self,
        state: &mut MissionsState,
        id: &EntityId,
    ) -> Result<Option<Shared<Mission>>> {
        let mut row = match self.missions_table.select_by_id(id)? {
            Some(row) => row,
            None => {
                warn!(mission = %id, "mission row not found");
                return Ok(None);
            }
        };

        let type_id = row.str_value(params::TYPE).unwrap_or_default();
        let mission_type = match state.mission_types.lookup(type_id) {
            Some(mission_type) => mission_type,
            None => {
                let err = RepositoryError::UnresolvedType {
                    kind: EntityKind::Mission,
                    type_id: type_id.to_string(),
                };
                warn!(mission = %id, "skipping mission: {}", err);
                return Ok(None);
            }
        };

        let home_id = row.get(params::HOME).map(EntityId::from_value).unwrap_or_default();
        if !home_id.is_null() {
            match self.home_waypoints_table.select_by_id(&home_id)? {
                Some(home_row) => {
                    row.insert(params::HOME.to_string(), Value::Object(home_row));
                }
                None => warn!(mission = %id, home = %home_id, "home point row not found"),
            }
        }
        let route_id = row
            .get(params::ROUTE)
            .map(EntityId::from_value)
            .filter(|route_id| !route_id.is_null());

        let mission = share(Mission::from_row(mission_type, &row));
        state.missions.put(id.clone(), mission.clone());
        self.notifier.notify(&MissionEvent::Added(mission.clone()));

        let route = route_id.as_ref().and_then(|route_id| self.routes.route(route_id));
        if route.is_none() {
            debug!(mission = %id, route = ?route_id, "mission route not resolved");
        }
        mission.write_entity().assign_route(route);
        Ok(Some(mission))
    }
}

impl MissionsRepository for TableMissionsRepository {
    fn read_all(&self) -> Result<usize> {
        let mut state = self.lock();
        self.routes.read_all()?;

        let mut loaded = 0;
        for id in self.missions_table.select_ids()? {
            if state.missions.contains(&id) {
                continue;
            }
            if self.read_mission(&mut state, &id)?.is_some() {
                loaded += 1;
            }
        }

        info!(loaded, total = state.missions.len(), "read missions");
        Ok(loaded)
    }

    fn mission(&self, id: &EntityId) -> Option<Shared<Mission>> {
        self.lock().missions.get(id)
    }

    fn mission_for_vehicle(&self, vehicle_id: &str) -> Option<Shared<Mission>> {
        self.lock()
            .missions
            .find(|mission| mission.vehicle_id() == Some(vehicle_id))
    }

    fn mission_ids(&self) -> Vec<EntityId> {
        self.lock().missions.ids()
    }

    fn missions(&self) -> Vec<Shared<Mission>> {
        self.lock().missions.entities()
    }

    fn mission_type(&self, id: &str) -> Option<Arc<MissionType>> {
        self.lock().mission_types.lookup(id)
    }

    fn mission_types(&self) -> Vec<Arc<MissionType>> {
        self.lock().mission_types.all()
    }

    fn register_mission_type(&self, mission_type: Arc<MissionType>) -> bool {
        let mut state = self.lock();
        if !state.mission_types.register(mission_type.clone()) {
            return false;
        }
        self.routes.register_route_type(mission_type.route_type.clone());

        debug!(mission_type = %mission_type.id, "registered mission type");
        self.notifier.notify(&MissionEvent::TypesChanged);
        true
    }

    fn unregister_mission_type(&self, mission_type_id: &str) -> bool {
        let mut state = self.lock();
        let removed = match state.mission_types.unregister(mission_type_id) {
            Some(removed) => removed,
            None => return false,
        };

        let route_type_id = &removed.route_type.id;
        let still_used = state
            .mission_types
            .all()
            .iter()
            .any(|mt| &mt.route_type.id == route_type_id);
        if !still_used {
            self.routes.unregister_route_type(route_type_id);
        }

        debug!(mission_type = %mission_type_id, "unregistered mission type");
        self.notifier.notify(&MissionEvent::TypesChanged);
        true
    }

    fn register_route_pattern_factory(
        &self,
        pattern_id: &str,
        factory: Arc<dyn RoutePatternFactory>,
    ) -> bool {
        let mut state = self.lock();
        if state.pattern_factories.contains_key(pattern_id) {
            return false;
        }
        state.pattern_factories.insert(pattern_id.to_string(), factory);

        debug!(pattern = %pattern_id, "registered route pattern factory");
        self.notifier.notify(&MissionEvent::TypesChanged);
        true
    }

    fn unregister_route_pattern_factory(&self, pattern_id: &str) -> bool {
        let mut state = self.lock();
        if state.pattern_factories.remove(pattern_id).is_none() {
            return false;
        }
        self.notifier.notify(&MissionEvent::TypesChanged);
        true
    }

    fn route_pattern_ids(&self) -> Vec<String> {
        self.lock().pattern_factories.keys().cloned().collect()
    }

    fn create_route_pattern(&self, pattern_id: &str) -> Option<RoutePattern> {
        self.lock()
            .pattern_factories
            .get(pattern_id)
            .map(|factory| factory.create())
    }

    fn save_mission(&self, mission: &Shared<Mission>) -> Result<()> {
        let mut state = self.lock();
        let mission_id = Self::mission_id_of(mission)?;

        let guard = mission.read_entity();
        if guard.home_point().id().is_null() {
            let err = RepositoryError::null_id(EntityKind::HomePoint);
            warn!(mission = %mission_id, "{}", err);
            return Err(err);
        }

        // The route row must exist before a mission row references it
        if let Some(route) = guard.route() {
            match self.routes.save_route(route) {
                Ok(()) => {}
                Err(err) if err.is_entity_scoped() => {
                    warn!(mission = %mission_id, "mission route not saved: {}", err);
                }
                Err(err) => return Err(err),
            }
        }

        let is_new = !state.missions.contains(&mission_id);
        if is_new {
            self.home_waypoints_table.insert_entity(guard.home_point())?;
            self.missions_table.insert_entity(&*guard)?;
        } else {
            self.home_waypoints_table.update_entity(guard.home_point())?;
            self.missions_table.update_entity(&*guard)?;
        }
        drop(guard);
        state.missions.put(mission_id.clone(), mission.clone());

        debug!(mission = %mission_id, is_new, "saved mission");
        let event = if is_new {
            MissionEvent::Added(mission.clone())
        } else {
            MissionEvent::Changed(mission.clone())
        };
        self.notifier.notify(&event);
        Ok(())
    }

    fn remove_mission(&self, mission: &Shared<Mission>) -> Result<()> {
        let mut state = self.lock();
        let mission_id = Self::mission_id_of(mission)?;
        let (home_id, route) = {
            let guard = mission.read_entity();
            (guard.home_point().id().clone(), guard.route().cloned())
        };

        self.missions_table.remove_by_id(&mission_id)?;
        self.home_waypoints_table.remove_by_id(&home_id)?;
        state.missions.remove(&mission_id);
        self.finish_operation(&mut state, &mission_id, OperationState::Cancelled);

        if self.options.cascade_mission_route {
            if let Some(route) = route {
                match self.routes.remove_route(&route) {
                    Ok(()) => {}
                    Err(err) if err.is_entity_scoped() => {
                        warn!(mission = %mission_id, "mission route not removed: {}", err);
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        debug!(mission = %mission_id, "removed mission");
        self.notifier.notify(&MissionEvent::Removed(mission.clone()));
        Ok(())
    }

    fn restore_mission(&self, mission: &Shared<Mission>) -> Result<()> {
        let _state = self.lock();
        let mission_id = Self::mission_id_of(mission)?;
        {
            let mut guard = mission.write_entity();
            self.missions_table.read_entity(&mut *guard)?;
            self.home_waypoints_table.read_entity(guard.home_point_mut())?;
        }

        debug!(mission = %mission_id, "restored mission");
        self.notifier.notify(&MissionEvent::Changed(mission.clone()));
        Ok(())
    }

    fn operation_for_mission(&self, mission_id: &EntityId) -> Option<Shared<MissionOperation>> {
        self.lock().operations.get(mission_id).cloned()
    }

    fn start_operation(
        &self,
        mission: &Shared<Mission>,
        kind: OperationKind,
    ) -> Result<Shared<MissionOperation>> {
        let mut state = self.lock();
        let mission_id = Self::mission_id_of(mission)?;
        if !state.missions.contains(&mission_id) {
            let err = RepositoryError::InvalidEntity {
                kind: EntityKind::Mission,
                reason: format!("mission '{}' is not loaded", mission_id),
            };
            warn!("{}", err);
            return Err(err);
        }
        if state.operations.contains_key(&mission_id) {
            let err = RepositoryError::OperationInProgress {
                mission: mission_id.to_string(),
            };
            warn!("{}", err);
            return Err(err);
        }

        let operation = share(MissionOperation::new(mission.clone(), kind));
        state.operations.insert(mission_id.clone(), operation.clone());

        info!(mission = %mission_id, %kind, "operation started");
        self.notifier.notify(&MissionEvent::OperationStarted(operation.clone()));
        Ok(operation)
    }

    fn end_operation(&self, operation: &Shared<MissionOperation>, final_state: OperationState) -> bool {
        let mut state = self.lock();
        let mission_id = operation.read_entity().mission_id().clone();
        let tracked = state
            .operations
            .get(&mission_id)
            .is_some_and(|current| Arc::ptr_eq(current, operation));
        if !tracked {
            debug!(mission = %mission_id, "operation is not running");
            return false;
        }
        self.finish_operation(&mut state, &mission_id, final_state)
    }

    fn subscribe(&self, observer: Observer<MissionEvent>) -> SubscriptionId {
        self.notifier.subscribe(observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::channel_observer;
    use crate::test_support::{mission_type, waypoint, Tables};
    use crate::TableRoutesRepository;
    use planner_domain::{
        AttributeDef, ChangeEvent, ChangeKind, DefaultPatternFactory, Position, RoutePatternType,
        RouteEvent,
    };
    use serde_json::json;
    use std::thread;

    fn repository(tables: &Tables, cascade: bool) -> (Arc<TableRoutesRepository>, TableMissionsRepository) {
        let (routes, missions) = tables.missions_repository(RepositoryOptions {
            cascade_mission_route: cascade,
        });
        missions.register_mission_type(mission_type());
        (routes, missions)
    }

    fn saved_mission(
        missions: &TableMissionsRepository,
        name: &str,
        vehicle: Option<&str>,
    ) -> Shared<Mission> {
        let mission_type = missions.mission_type("survey_mission").unwrap();
        let mission = share(Mission::new(mission_type, name, vehicle.map(String::from)));
        missions.save_mission(&mission).unwrap();
        mission
    }

    #[test]
    fn test_mission_type_registers_route_type() {
        let tables = Tables::new();
        let (routes, missions) = repository(&tables, true);

        assert!(routes.route_type("survey").is_some());
        assert!(routes.waypoint_type("takeoff").is_some());
        assert!(!missions.register_mission_type(mission_type()));

        assert!(missions.unregister_mission_type("survey_mission"));
        assert!(routes.route_type("survey").is_none());
        assert!(missions.mission_types().is_empty());
    }

    #[test]
    fn test_save_and_read_back() {
        let tables = Tables::new();
        let (routes, missions) = repository(&tables, true);
        let mission = saved_mission(&missions, "Survey north", Some("17"));
        {
            let guard = mission.read_entity();
            let route_type = guard.mission_type().route_type.clone();
            let route = guard.route().unwrap();
            route.write_entity().add_waypoint(waypoint(&route_type, "w-1"));
        }
        mission
            .write_entity()
            .home_point_mut()
            .set_position(Position::new(10.0, 20.0, 30.0));
        missions.save_mission(&mission).unwrap();

        let mission_id = mission.read_entity().id().clone();
        let route_id = mission.read_entity().route_id().unwrap();
        assert!(routes.contains(&route_id));
        assert_eq!(tables.home_waypoints.len(), 1);

        let (fresh_routes, fresh) = repository(&tables, true);
        assert_eq!(fresh.read_all().unwrap(), 1);
        assert_eq!(fresh_routes.count(), 1);

        let loaded = fresh.mission(&mission_id).unwrap();
        let loaded = loaded.read_entity();
        assert_eq!(loaded.name(), "Survey north");
        assert_eq!(loaded.vehicle_id(), Some("17"));
        assert_eq!(loaded.home_point().position(), Position::new(10.0, 20.0, 30.0));
        assert_eq!(loaded.route_id(), Some(route_id.clone()));

        let loaded_route = loaded.route().unwrap();
        assert!(Arc::ptr_eq(loaded_route, &fresh_routes.route(&route_id).unwrap()));
        assert_eq!(loaded_route.read_entity().waypoint_ids(), vec![EntityId::new("w-1")]);
    }

    #[test]
    fn test_vehicle_lookup() {
        let tables = Tables::new();
        let (_, missions) = repository(&tables, true);
        let _m1 = saved_mission(&missions, "M1", Some("V1"));
        let m2 = saved_mission(&missions, "M2", Some("V2"));

        let found = missions.mission_for_vehicle("V2").unwrap();
        assert!(Arc::ptr_eq(&found, &m2));
        assert!(missions.mission_for_vehicle("V3").is_none());
    }

    #[test]
    fn test_remove_cascades_to_route() {
        let tables = Tables::new();
        let (routes, missions) = repository(&tables, true);
        let mission = saved_mission(&missions, "M1", None);
        let route_id = mission.read_entity().route_id().unwrap();

        let (observer, rx) = channel_observer::<RouteEvent>();
        routes.subscribe(observer);
        missions.remove_mission(&mission).unwrap();

        assert!(missions.mission(mission.read_entity().id()).is_none());
        assert!(!routes.contains(&route_id));
        assert!(tables.missions.is_empty());
        assert!(tables.home_waypoints.is_empty());
        assert!(tables.routes.is_empty());
        assert_eq!(rx.try_iter().map(|e| e.change()).collect::<Vec<_>>(), vec![ChangeKind::Removed]);
    }

    #[test]
    fn test_remove_without_cascade_keeps_route() {
        let tables = Tables::new();
        let (routes, missions) = repository(&tables, false);
        let mission = saved_mission(&missions, "M1", None);
        let route_id = mission.read_entity().route_id().unwrap();

        missions.remove_mission(&mission).unwrap();

        assert!(routes.contains(&route_id));
        assert_eq!(tables.routes.len(), 1);
    }

    #[test]
    fn test_unknown_mission_type_is_skipped() {
        let tables = Tables::new();
        tables
            .missions
            .insert(json!({ "id": "m-1", "type": "ghost", "name": "Lost" }).as_object().cloned().unwrap())
            .unwrap();
        let (_, missions) = repository(&tables, true);
        saved_mission(&missions, "Known", None);

        let (_, fresh) = repository(&tables, true);
        assert_eq!(fresh.read_all().unwrap(), 1);
        assert!(fresh.mission(&EntityId::new("m-1")).is_none());
    }

    #[test]
    fn test_restore_mission() {
        let tables = Tables::new();
        let (_, missions) = repository(&tables, true);
        let mission = saved_mission(&missions, "Original", Some("V1"));

        {
            let mut guard = mission.write_entity();
            guard.set_name("Edited");
            guard.set_vehicle_id(None);
            guard.home_point_mut().set_name("moved");
        }
        missions.restore_mission(&mission).unwrap();

        let guard = mission.read_entity();
        assert_eq!(guard.name(), "Original");
        assert_eq!(guard.vehicle_id(), Some("V1"));
        assert_eq!(guard.home_point().name(), "HOME");
    }

    #[test]
    fn test_null_id_and_events() {
        let tables = Tables::new();
        let (_, missions) = repository(&tables, true);
        let (observer, rx) = channel_observer();
        missions.subscribe(observer);

        let mission_type = missions.mission_type("survey_mission").unwrap();
        let nameless = share(Mission::with_id(EntityId::null(), mission_type, "x", None));
        assert!(missions.save_mission(&nameless).unwrap_err().is_entity_scoped());

        let mission = saved_mission(&missions, "M1", None);
        missions.save_mission(&mission).unwrap();
        missions.remove_mission(&mission).unwrap();

        let changes: Vec<_> = rx.try_iter().map(|e: MissionEvent| e.change()).collect();
        assert_eq!(
            changes,
            vec![ChangeKind::Added, ChangeKind::Changed, ChangeKind::Removed]
        );
    }

    #[test]
    fn test_route_pattern_factories() {
        let tables = Tables::new();
        let (_, missions) = repository(&tables, true);
        let grid = Arc::new(RoutePatternType {
            id: "grid".to_string(),
            name: "Grid".to_string(),
            icon: String::new(),
            attributes: vec![AttributeDef::real("spacing", "Spacing", 50.0)],
        });

        let factory = Arc::new(DefaultPatternFactory::new(grid));
        assert!(missions.register_route_pattern_factory("grid", factory.clone()));
        assert!(!missions.register_route_pattern_factory("grid", factory));
        assert_eq!(missions.route_pattern_ids(), vec!["grid".to_string()]);

        let pattern = missions.create_route_pattern("grid").unwrap();
        assert_eq!(pattern.attributes().get("spacing"), Some(&json!(50.0)));
        assert!(missions.create_route_pattern("loiter").is_none());

        assert!(missions.unregister_route_pattern_factory("grid"));
        assert!(!missions.unregister_route_pattern_factory("grid"));
    }

    #[test]
    fn test_operation_lifecycle() {
        let tables = Tables::new();
        let (_, missions) = repository(&tables, true);
        let mission = saved_mission(&missions, "M1", Some("V1"));
        let mission_id = mission.read_entity().id().clone();
        let (observer, rx) = channel_observer();
        missions.subscribe(observer);

        let upload = missions.start_operation(&mission, OperationKind::Upload).unwrap();
        assert!(Arc::ptr_eq(&missions.operation_for_mission(&mission_id).unwrap(), &upload));

        let err = missions
            .start_operation(&mission, OperationKind::Download)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::OperationInProgress { .. }));

        upload.write_entity().set_progress(3, 4);
        assert!(!missions.end_operation(&upload, OperationState::InProgress));
        assert!(missions.end_operation(&upload, OperationState::Succeeded));
        assert!(!missions.end_operation(&upload, OperationState::Failed));
        assert_eq!(upload.read_entity().state(), OperationState::Succeeded);
        assert!(missions.operation_for_mission(&mission_id).is_none());

        let events: Vec<MissionEvent> = rx.try_iter().collect();
        let changes: Vec<_> = events.iter().map(|e| e.change()).collect();
        assert_eq!(changes, vec![ChangeKind::OperationStarted, ChangeKind::OperationEnded]);
        assert_eq!(events[1].entity_id(), Some(mission_id));

        let unsaved = share(Mission::new(missions.mission_type("survey_mission").unwrap(), "M2", None));
        assert!(missions.start_operation(&unsaved, OperationKind::Clear).is_err());
    }

    #[test]
    fn test_remove_cancels_running_operation() {
        let tables = Tables::new();
        let (_, missions) = repository(&tables, true);
        let mission = saved_mission(&missions, "M1", None);
        let operation = missions.start_operation(&mission, OperationKind::Upload).unwrap();

        let (observer, rx) = channel_observer();
        missions.subscribe(observer);
        missions.remove_mission(&mission).unwrap();

        assert_eq!(operation.read_entity().state(), OperationState::Cancelled);
        let changes: Vec<_> = rx.try_iter().map(|e: MissionEvent| e.change()).collect();
        assert_eq!(changes, vec![ChangeKind::OperationEnded, ChangeKind::Removed]);
    }

    #[test]
    fn test_missions_and_routes_from_several_threads() {
        let tables = Tables::new();
        let (routes, missions) = repository(&tables, true);
        let missions = Arc::new(missions);

        let writer = {
            let missions = Arc::clone(&missions);
            thread::spawn(move || {
                for i in 0..50 {
                    let mission = saved_mission(&missions, &format!("M{i}"), Some(format!("V{i}").as_str()));
                    missions.save_mission(&mission).unwrap();
                }
            })
        };
        let route_reader = {
            let routes = Arc::clone(&routes);
            thread::spawn(move || {
                for _ in 0..50 {
                    routes.read_all().unwrap();
                    for id in routes.route_ids() {
                        assert!(routes.route(&id).is_some());
                    }
                }
            })
        };
        let mission_reader = {
            let missions = Arc::clone(&missions);
            thread::spawn(move || {
                for _ in 0..50 {
                    missions.read_all().unwrap();
                    for mission in missions.missions() {
                        assert!(mission.read_entity().route().is_some());
                    }
                }
            })
        };
        for handle in [writer, route_reader, mission_reader] {
            handle.join().unwrap();
        }

        assert_eq!(missions.count(), 50);
        assert_eq!(routes.count(), 50);
        assert_eq!(tables.routes.len(), 50);
        assert_eq!(tables.missions.len(), 50);
        assert!(missions.mission_for_vehicle("V49").is_some());
    }
}
