//! Query engine: find alive entities holding a given set of component types.
//!
//! Matching is a full scan over the [`ComponentStore`], testing every
//! requested key against each entity's component set. Results are computed
//! fresh on every call, so a system always sees the mutations made by the
//! systems (and listeners) that ran before it.
//!
//! Results come back in entity creation order. Only the presence of the
//! requested types matters; the order in which components were added, and
//! any extra components an entity carries, do not affect matching.

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::entity::Entity;
use crate::storage::ComponentStore;

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// All entities in `store` whose component set is a superset of `required`.
///
/// An empty `required` slice matches every alive entity.
pub fn scan(store: &ComponentStore, required: &[ComponentTypeId]) -> Vec<Entity> {
    store
        .iter()
        .filter(|(_, set)| set.contains_all(required))
        .map(|(entity, _)| entity)
        .collect()
}

/// The oldest entity in `store` matching `required`, if any.
pub fn scan_first(store: &ComponentStore, required: &[ComponentTypeId]) -> Option<Entity> {
    store
        .iter()
        .find(|(_, set)| set.contains_all(required))
        .map(|(entity, _)| entity)
}

/// Number of entities in `store` matching `required`.
pub fn scan_count(store: &ComponentStore, required: &[ComponentTypeId]) -> usize {
    store
        .iter()
        .filter(|(_, set)| set.contains_all(required))
        .count()
}

// ---------------------------------------------------------------------------
// ComponentSet -- typed front end
// ---------------------------------------------------------------------------

/// A tuple of component types usable as a typed query: `(Position, Text)`.
pub trait ComponentSet {
    /// Resolve the tuple to type keys.
    ///
    /// Returns `None` if any member type was never registered. Such a type
    /// cannot be present on any entity, so the query matches nothing.
    fn type_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>>;
}

impl ComponentSet for () {
    fn type_ids(_registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>> {
        Some(Vec::new())
    }
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>> {
                Some(vec![$(registry.lookup::<$name>()?),+])
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pos;
    #[derive(Debug)]
    struct Vel;
    #[derive(Debug)]
    struct Unseen;

    fn fixture() -> (ComponentStore, ComponentTypeId, ComponentTypeId) {
        let mut reg = ComponentRegistry::new();
        let pos = reg.register::<Pos>("pos");
        let vel = reg.register::<Vel>("vel");

        let mut store = ComponentStore::new();
        for raw in 0..4 {
            store.spawn(Entity::from_raw(raw));
        }
        // 0: {}, 1: {pos}, 2: {pos, vel}, 3: {vel, pos} (added in reverse)
        store.set_mut(Entity::from_raw(1)).unwrap().insert(pos, Box::new(Pos));
        store.set_mut(Entity::from_raw(2)).unwrap().insert(pos, Box::new(Pos));
        store.set_mut(Entity::from_raw(2)).unwrap().insert(vel, Box::new(Vel));
        store.set_mut(Entity::from_raw(3)).unwrap().insert(vel, Box::new(Vel));
        store.set_mut(Entity::from_raw(3)).unwrap().insert(pos, Box::new(Pos));
        (store, pos, vel)
    }

    fn raw(entities: Vec<Entity>) -> Vec<u64> {
        entities.into_iter().map(Entity::index).collect()
    }

    #[test]
    fn superset_matching_ignores_insertion_order() {
        let (store, pos, vel) = fixture();
        assert_eq!(raw(scan(&store, &[pos, vel])), vec![2, 3]);
        assert_eq!(raw(scan(&store, &[vel, pos])), vec![2, 3]);
        assert_eq!(raw(scan(&store, &[pos])), vec![1, 2, 3]);
    }

    #[test]
    fn empty_type_set_matches_everything_alive() {
        let (store, _, _) = fixture();
        assert_eq!(raw(scan(&store, &[])), vec![0, 1, 2, 3]);
        assert_eq!(scan_count(&store, &[]), 4);
    }

    #[test]
    fn duplicate_keys_are_harmless() {
        let (store, pos, _) = fixture();
        assert_eq!(scan(&store, &[pos, pos]), scan(&store, &[pos]));
    }

    #[test]
    fn first_match_is_oldest() {
        let (store, _, vel) = fixture();
        assert_eq!(scan_first(&store, &[vel]), Some(Entity::from_raw(2)));
    }

    #[test]
    fn typed_sets_resolve_through_registry() {
        let mut reg = ComponentRegistry::new();
        let pos = reg.register::<Pos>("pos");
        let vel = reg.register::<Vel>("vel");
        assert_eq!(<(Pos, Vel)>::type_ids(&reg), Some(vec![pos, vel]));
        assert_eq!(<()>::type_ids(&reg), Some(vec![]));
        assert_eq!(<(Pos, Unseen)>::type_ids(&reg), None);
    }
}
