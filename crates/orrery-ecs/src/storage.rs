//! Per-entity component storage.
//!
//! The [`ComponentStore`] maps every alive [`Entity`] to its [`ComponentSet`],
//! and each set maps a [`ComponentTypeId`] to exactly one boxed component.
//! An entity is alive exactly while it has an entry here, possibly empty.
//!
//! Entities are kept in a `BTreeMap`. Handles are allocated in increasing
//! order and never reused, so key order is creation order, and every scan
//! (queries, [`ComponentStore::entities`]) visits entities oldest first.

use std::collections::{BTreeMap, HashMap};

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// The components attached to one entity, at most one per type key.
#[derive(Debug, Default)]
pub struct ComponentSet {
    components: HashMap<ComponentTypeId, Box<dyn Component>>,
}

impl ComponentSet {
    /// Whether a component with key `id` is present.
    #[inline]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.components.contains_key(&id)
    }

    /// Whether every key in `ids` is present. An empty slice always matches.
    pub fn contains_all(&self, ids: &[ComponentTypeId]) -> bool {
        ids.iter().all(|id| self.contains(*id))
    }

    /// Borrow the component stored under `id`.
    pub fn get(&self, id: ComponentTypeId) -> Option<&dyn Component> {
        self.components.get(&id).map(|boxed| &**boxed)
    }

    /// Mutably borrow the component stored under `id`.
    pub fn get_mut(&mut self, id: ComponentTypeId) -> Option<&mut dyn Component> {
        match self.components.get_mut(&id) {
            Some(boxed) => Some(&mut **boxed),
            None => None,
        }
    }

    /// Store `component` under `id`, returning the instance it replaced.
    pub fn insert(
        &mut self,
        id: ComponentTypeId,
        component: Box<dyn Component>,
    ) -> Option<Box<dyn Component>> {
        self.components.insert(id, component)
    }

    /// Remove and return the component stored under `id`.
    pub fn remove(&mut self, id: ComponentTypeId) -> Option<Box<dyn Component>> {
        self.components.remove(&id)
    }

    /// The keys present in this set, sorted.
    pub fn type_ids(&self) -> Vec<ComponentTypeId> {
        let mut ids: Vec<_> = self.components.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of components in the set.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the set holds no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Mapping from alive entity to its component set.
#[derive(Debug, Default)]
pub struct ComponentStore {
    entities: BTreeMap<Entity, ComponentSet>,
}

impl ComponentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` with an empty component set.
    ///
    /// Returns `false` if the entity already had an entry (left untouched).
    pub fn spawn(&mut self, entity: Entity) -> bool {
        if self.entities.contains_key(&entity) {
            return false;
        }
        self.entities.insert(entity, ComponentSet::default());
        true
    }

    /// Remove `entity` and hand back its full component set.
    pub fn despawn(&mut self, entity: Entity) -> Option<ComponentSet> {
        self.entities.remove(&entity)
    }

    /// Whether `entity` has an entry.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// The component set of `entity`.
    pub fn set(&self, entity: Entity) -> Option<&ComponentSet> {
        self.entities.get(&entity)
    }

    /// The mutable component set of `entity`.
    pub fn set_mut(&mut self, entity: Entity) -> Option<&mut ComponentSet> {
        self.entities.get_mut(&entity)
    }

    /// Alive entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    /// `(entity, set)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &ComponentSet)> + '_ {
        self.entities.iter().map(|(e, set)| (*e, set))
    }

    /// Number of alive entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no alive entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
