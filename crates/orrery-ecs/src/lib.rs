//! Orrery ECS -- a small entity-component-system runtime.
//!
//! Entities are opaque, never-recycled handles. Each alive entity owns a set
//! of components keyed by component type (at most one per type). Systems are
//! plain closures run in registration order by [`World::run`], and every
//! structural change is announced synchronously on an event bus so that
//! collaborators (renderers, indexes, audio) can react at the exact point of
//! the mutation.
//!
//! # Quick Start
//!
//! ```
//! use orrery_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut world = World::new();
//! let entity = world.create_entity();
//! world.add_component(entity, Position { x: 0.0, y: 0.0 }).unwrap();
//! world.add_component(entity, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
//!
//! world.add_named_system("movement", |world| {
//!     for e in world.query_of::<(Position, Velocity)>() {
//!         let dx = world.get_component::<Velocity>(e).map_or(0.0, |v| v.dx);
//!         if let Some(pos) = world.get_component_mut::<Position>(e) {
//!             pos.x += dx;
//!         }
//!     }
//! });
//! world.run();
//!
//! assert_eq!(world.get_component::<Position>(entity), Some(&Position { x: 1.0, y: 0.0 }));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod event;
pub mod query;
pub mod storage;
pub mod system;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
///
/// Only raised when the world is in strict mode; the default lenient mode
/// turns these conditions into silent no-ops.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (destroyed, or never allocated).
    #[error("{operation} on entity {entity}, which does not exist (destroyed or never allocated)")]
    NoSuchEntity {
        entity: entity::Entity,
        operation: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentInfo, ComponentRegistry, ComponentTypeId};
    pub use crate::entity::Entity;
    pub use crate::event::{Event, EventKind, SubscriptionId};
    pub use crate::query::ComponentSet;
    pub use crate::system::{NamedSystem, System};
    pub use crate::world::{World, WorldConfig};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    // -- test component types -----------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Text(String);

    #[derive(Debug, Clone, PartialEq)]
    struct Other;

    // -- end-to-end scenarios -----------------------------------------------

    #[test]
    fn entity_ids_start_at_zero_and_increase() {
        let mut world = World::new();
        assert_eq!(world.create_entity(), Entity::from_raw(0));
        assert_eq!(world.create_entity(), Entity::from_raw(1));
    }

    #[test]
    fn add_then_get_component() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Position { x: 10.0, y: 20.0 }).unwrap();
        assert!(world.has_component::<Position>(e));
        assert_eq!(world.get_component::<Position>(e).unwrap().x, 10.0);
    }

    #[test]
    fn remove_component_emits_removed_instance() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Position { x: 10.0, y: 20.0 }).unwrap();

        let seen: Rc<RefCell<Vec<(Entity, Position)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        world.on(EventKind::ComponentRemoved, move |_, event| {
            if let Event::ComponentRemoved { entity, component } = event {
                let pos = component.downcast_ref::<Position>().unwrap().clone();
                sink.borrow_mut().push((*entity, pos));
            }
        });

        world.remove_component::<Position>(e).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![(Entity::from_raw(0), Position { x: 10.0, y: 20.0 })]
        );
        assert!(!world.has_component::<Position>(e));
    }

    #[test]
    fn query_requires_every_type() {
        let mut world = World::new();
        let _e0 = world.create_entity();
        let e1 = world.create_entity();
        world.add_component(e1, Position { x: 0.0, y: 0.0 }).unwrap();
        world.add_component(e1, Text("hi".into())).unwrap();

        assert_eq!(world.query_of::<(Position, Text)>(), vec![e1]);
        assert_eq!(world.query_of::<(Position,)>(), vec![e1]);
        assert!(world.query_of::<(Text, Other)>().is_empty());

        let pos = world.component_id::<Position>().unwrap();
        let text = world.component_id::<Text>().unwrap();
        assert_eq!(world.query(&[text, pos]), vec![e1]);
    }

    #[test]
    fn destroy_notifies_and_removes_from_queries() {
        let mut world = World::new();
        let _e0 = world.create_entity();
        let e1 = world.create_entity();
        world.add_component(e1, Position { x: 0.0, y: 0.0 }).unwrap();

        let destroyed: Rc<RefCell<Vec<Entity>>> = Rc::default();
        let sink = Rc::clone(&destroyed);
        world.on(EventKind::EntityDestroyed, move |_, event| {
            if let Event::EntityDestroyed(entity) = event {
                sink.borrow_mut().push(*entity);
            }
        });

        world.destroy_entity(e1).unwrap();
        assert_eq!(*destroyed.borrow(), vec![e1]);
        assert!(world.query_of::<(Position,)>().is_empty());
    }

    #[test]
    fn run_twice_invokes_system_twice() {
        let mut world = World::new();
        let counter = Rc::new(Cell::new(0));
        let c = Rc::clone(&counter);
        world.add_system(move |_: &mut World| c.set(c.get() + 1));
        world.run();
        world.run();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn systems_run_in_registration_order_every_time() {
        let mut world = World::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        for name in ["input", "movement", "render"] {
            let order = Rc::clone(&order);
            world.add_named_system(name, move |_| order.borrow_mut().push(name));
        }
        world.run();
        world.run();
        assert_eq!(
            *order.borrow(),
            vec!["input", "movement", "render", "input", "movement", "render"]
        );
    }

    // -- cross-module behavior ----------------------------------------------

    #[test]
    fn later_systems_see_earlier_mutations_in_same_run() {
        let mut world = World::new();
        let seen = Rc::new(Cell::new(usize::MAX));
        let sink = Rc::clone(&seen);

        world.add_named_system("spawner", |world| {
            let e = world.create_entity();
            world.add_component(e, Text("new".into())).unwrap();
        });
        world.add_named_system("observer", move |world| {
            sink.set(world.query_of::<(Text,)>().len());
        });

        world.run();
        assert_eq!(seen.get(), 1);
        world.run();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn re_adding_replaces_previous_value() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Text("a".into())).unwrap();
        world.add_component(e, Text("b".into())).unwrap();
        assert_eq!(world.get_component::<Text>(e), Some(&Text("b".into())));
        assert_eq!(world.component_types(e).len(), 1);
    }

    #[test]
    fn destroyed_handles_are_never_reused() {
        let mut world = World::new();
        let a = world.create_entity();
        world.destroy_entity(a).unwrap();
        let b = world.create_entity();
        assert_ne!(a, b);
        assert!(!world.is_alive(a));
        assert!(world.is_alive(b));
        assert_eq!(world.next_entity(), Entity::from_raw(2));
    }

    #[test]
    fn explicit_registration_names_the_component() {
        let mut world = World::new();
        let id = world.register_component::<Position>("position");
        let e = world.create_entity();
        world.add_component(e, Position { x: 1.0, y: 1.0 }).unwrap();
        assert_eq!(world.component_id::<Position>(), Some(id));
        assert_eq!(world.registry().get_info(id).unwrap().name, "position");
        assert!(world.has_component_id(e, id));
    }

    #[test]
    fn typed_query_on_unregistered_type_is_empty() {
        let mut world = World::new();
        world.create_entity();
        assert!(world.query_of::<(Other,)>().is_empty());
        assert_eq!(world.query_of::<()>().len(), 1);
    }

    #[test]
    fn strict_error_message_names_operation_and_entity() {
        let mut world = World::with_config(WorldConfig { strict: true });
        let err = world.destroy_entity(Entity::from_raw(7)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "destroy_entity on entity 7, which does not exist (destroyed or never allocated)"
        );
    }
}
