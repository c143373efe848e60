//! EntityCache and RelationIndex
//!
//! Plain in-memory structures. They have no locking of their own; the
//! repository that owns them guards every access with its monitor lock.

use planner_domain::{EntityId, Shared, SharedExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Live entities of one kind, keyed by id
#[derive(Debug)]
pub struct EntityCache<T> {
    entries: BTreeMap<EntityId, Shared<T>>,
}

impl<T> EntityCache<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<Shared<T>> {
        self.entries.get(id).cloned()
    }

    /// Cache an entity, returning the handle it replaced
    pub fn put(&mut self, id: EntityId, entity: Shared<T>) -> Option<Shared<T>> {
        self.entries.insert(id, entity)
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Shared<T>> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entries.keys().cloned().collect()
    }

    pub fn entities(&self) -> Vec<Shared<T>> {
        self.entries.values().cloned().collect()
    }

    /// First entity (in id order) matching the predicate
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<Shared<T>> {
        self.entries
            .values()
            .find(|entity| predicate(&*entity.read_entity()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Many-to-many membership between owners (routes) and members (waypoints).
///
/// Members keep the order they were related in. The reverse index counts
/// owners per member, which is what decides when a member may be deleted.
#[derive(Debug, Default)]
pub struct RelationIndex {
    members: HashMap<EntityId, Vec<EntityId>>,
    owners: HashMap<EntityId, BTreeSet<EntityId>>,
}

impl RelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relate a member to an owner; returns `false` if already related
    pub fn relate(&mut self, owner: EntityId, member: EntityId) -> bool {
        let owners = self.owners.entry(member.clone()).or_default();
        if !owners.insert(owner.clone()) {
            return false;
        }
        self.members.entry(owner).or_default().push(member);
        true
    }

    /// Returns `false` if the pair was not related
    pub fn unrelate(&mut self, owner: &EntityId, member: &EntityId) -> bool {
        let Some(members) = self.members.get_mut(owner) else {
            return false;
        };
        let Some(index) = members.iter().position(|m| m == member) else {
            return false;
        };
        members.remove(index);
        if members.is_empty() {
            self.members.remove(owner);
        }
        self.forget_owner(owner, member);
        true
    }

    /// Drop every relation of an owner, returning its former members in order
    pub fn unrelate_all(&mut self, owner: &EntityId) -> Vec<EntityId> {
        let members = self.members.remove(owner).unwrap_or_default();
        for member in &members {
            self.forget_owner(owner, member);
        }
        members
    }

    /// Members of an owner, in relation order
    pub fn members_of(&self, owner: &EntityId) -> Vec<EntityId> {
        self.members.get(owner).cloned().unwrap_or_default()
    }

    pub fn owners_of(&self, member: &EntityId) -> Vec<EntityId> {
        self.owners
            .get(member)
            .map(|owners| owners.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, owner: &EntityId, member: &EntityId) -> bool {
        self.owners
            .get(member)
            .is_some_and(|owners| owners.contains(owner))
    }

    /// Number of owners still relating to the member
    pub fn owner_count(&self, member: &EntityId) -> usize {
        self.owners.get(member).map_or(0, BTreeSet::len)
    }

    pub fn is_orphan(&self, member: &EntityId) -> bool {
        self.owner_count(member) == 0
    }

    fn forget_owner(&mut self, owner: &EntityId, member: &EntityId) {
        if let Some(owners) = self.owners.get_mut(member) {
            owners.remove(owner);
            if owners.is_empty() {
                self.owners.remove(member);
            }
        }
    }
}
