//! Synchronous publish/subscribe for world lifecycle events.
//!
//! Listeners are registered per [`EventKind`] and invoked in registration
//! order, inline, from inside the mutating call that produced the event.
//! Every listener receives `&mut World`, so it may read the state as of that
//! exact point or mutate the world further (reentrantly).
//!
//! ## Emission semantics
//!
//! The bus itself only stores subscriptions; dispatch happens inside the
//! world's mutators (and [`World::emit_custom`](crate::world::World::emit_custom)),
//! following these rules:
//!
//! - The subscriber list for the emitted kind is snapshotted when emission
//!   starts. A listener subscribed during the emission is first called by
//!   the next one.
//! - A listener unsubscribed during the emission is skipped if it has not
//!   been reached yet.
//! - A listener may cause further events, including of the kind it is
//!   handling. The nested emission runs to completion inside the listener's
//!   call, and the listener itself is invoked for it too, so a destroy
//!   listener that destroys child entities sees every one of them. A
//!   listener that unconditionally re-triggers its own kind recurses without
//!   bound.
//!
//! Listeners are `Fn` so they can be re-entered; keep mutable state in a
//! `Cell` or `RefCell`.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::world::World;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The name under which listeners subscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An entity was created.
    EntityCreated,
    /// An entity and all of its components were removed.
    EntityDestroyed,
    /// A component was stored on an entity (possibly replacing one).
    ComponentAdded,
    /// A component was removed from an alive entity.
    ComponentRemoved,
    /// A collaborator-defined event.
    Custom(Cow<'static, str>),
}

impl EventKind {
    /// Shorthand for a custom event kind.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        EventKind::Custom(name.into())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::EntityCreated => f.write_str("entityCreated"),
            EventKind::EntityDestroyed => f.write_str("entityDestroyed"),
            EventKind::ComponentAdded => f.write_str("componentAdded"),
            EventKind::ComponentRemoved => f.write_str("componentRemoved"),
            EventKind::Custom(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An event payload as seen by listeners.
pub enum Event<'a> {
    /// A new entity exists, with an empty component set.
    EntityCreated(Entity),
    /// The entity no longer exists; its handle is permanently invalid.
    EntityDestroyed(Entity),
    /// A component of type `component` was stored on `entity`.
    ///
    /// Only the type key is carried: listeners hold `&mut World`, which
    /// rules out also lending them the stored value. Read it back through
    /// [`World::get_component_by_id`](crate::world::World::get_component_by_id).
    /// That read sees the live value, so if an earlier listener replaced or
    /// removed the component, later listeners observe the replacement (or
    /// nothing) rather than the value originally added.
    ComponentAdded {
        /// The entity that received the component.
        entity: Entity,
        /// Type key of the stored component.
        component: ComponentTypeId,
    },
    /// `component` was removed from `entity`. This is the removed instance
    /// itself; it is dropped once emission completes.
    ComponentRemoved {
        /// The entity that lost the component.
        entity: Entity,
        /// The removed instance.
        component: &'a dyn Component,
    },
    /// A collaborator-defined event with an arbitrary payload.
    Custom {
        /// Event name; matches [`EventKind::Custom`] subscriptions.
        name: &'a str,
        /// Payload, recovered by listeners through `downcast_ref`.
        payload: &'a dyn Any,
    },
}

impl Event<'_> {
    /// The kind listeners must subscribe to in order to receive this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::EntityCreated(_) => EventKind::EntityCreated,
            Event::EntityDestroyed(_) => EventKind::EntityDestroyed,
            Event::ComponentAdded { .. } => EventKind::ComponentAdded,
            Event::ComponentRemoved { .. } => EventKind::ComponentRemoved,
            Event::Custom { name, .. } => EventKind::Custom(Cow::Owned((*name).to_owned())),
        }
    }

    /// The entity this event is about, if any.
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Event::EntityCreated(entity) | Event::EntityDestroyed(entity) => Some(*entity),
            Event::ComponentAdded { entity, .. } | Event::ComponentRemoved { entity, .. } => {
                Some(*entity)
            }
            Event::Custom { .. } => None,
        }
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::EntityCreated(entity) => f.debug_tuple("EntityCreated").field(entity).finish(),
            Event::EntityDestroyed(entity) => {
                f.debug_tuple("EntityDestroyed").field(entity).finish()
            }
            Event::ComponentAdded { entity, component } => f
                .debug_struct("ComponentAdded")
                .field("entity", entity)
                .field("component", component)
                .finish(),
            Event::ComponentRemoved { entity, component } => f
                .debug_struct("ComponentRemoved")
                .field("entity", entity)
                .field("component", component)
                .finish(),
            Event::Custom { name, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Handle identifying one subscription; pass it to
/// [`World::unsubscribe`](crate::world::World::unsubscribe).
///
/// Ids are never reused, so subscribing the same closure twice yields two
/// independent handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A listener callback.
pub type Listener = dyn Fn(&mut World, &Event<'_>);

pub(crate) type SharedListener = Rc<Listener>;

struct Subscription {
    id: SubscriptionId,
    listener: SharedListener,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Ordered subscriber lists keyed by [`EventKind`].
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<Subscription>>,
    kinds: HashMap<SubscriptionId, EventKind>,
}

impl EventBus {
    /// Create a bus with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the subscriber list of `kind`.
    pub fn subscribe(&mut self, kind: EventKind, listener: Box<Listener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.kinds.insert(id, kind.clone());
        self.listeners.entry(kind).or_default().push(Subscription {
            id,
            listener: Rc::from(listener),
        });
        id
    }

    /// Remove exactly the subscription `id`.
    ///
    /// Returns `false` if it was already removed (or never existed).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(kind) = self.kinds.remove(&id) else {
            return false;
        };
        if let Some(subs) = self.listeners.get_mut(&kind) {
            subs.retain(|sub| sub.id != id);
            if subs.is_empty() {
                self.listeners.remove(&kind);
            }
        }
        true
    }

    /// Whether `id` is still subscribed.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.kinds.contains_key(&id)
    }

    /// Number of listeners currently subscribed to `kind`.
    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }

    /// Total number of live subscriptions across all kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether there are no subscriptions at all.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// The subscriber list of `kind` as it stands now, in registration order.
    pub(crate) fn snapshot(&self, kind: &EventKind) -> Vec<(SubscriptionId, SharedListener)> {
        self.listeners.get(kind).map_or_else(Vec::new, |subs| {
            subs.iter()
                .map(|sub| (sub.id, Rc::clone(&sub.listener)))
                .collect()
        })
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.kinds.len())
            .field("kinds", &self.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Box<Listener> {
        Box::new(|_world: &mut World, _event: &Event<'_>| {})
    }

    #[test]
    fn subscription_ids_are_unique() {
        let mut bus = EventBus::new();
        let a = bus.subscribe(EventKind::EntityCreated, noop());
        let b = bus.subscribe(EventKind::EntityCreated, noop());
        assert_ne!(a, b);
        assert_eq!(bus.listener_count(&EventKind::EntityCreated), 2);
    }

    #[test]
    fn unsubscribe_removes_only_that_subscription() {
        let mut bus = EventBus::new();
        let a = bus.subscribe(EventKind::EntityDestroyed, noop());
        let b = bus.subscribe(EventKind::EntityDestroyed, noop());

        assert!(bus.unsubscribe(a));
        assert!(!bus.unsubscribe(a));
        assert!(!bus.is_subscribed(a));
        assert!(bus.is_subscribed(b));
        assert_eq!(bus.listener_count(&EventKind::EntityDestroyed), 1);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let mut bus = EventBus::new();
        let ids: Vec<_> = (0..4)
            .map(|_| bus.subscribe(EventKind::ComponentAdded, noop()))
            .collect();
        let snap: Vec<_> = bus
            .snapshot(&EventKind::ComponentAdded)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(snap, ids);
        assert!(bus.snapshot(&EventKind::ComponentRemoved).is_empty());
    }

    #[test]
    fn custom_kinds_match_by_name() {
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::custom("scored"), noop());
        let payload = 3u32;
        let event = Event::Custom {
            name: "scored",
            payload: &payload,
        };
        assert_eq!(bus.listener_count(&event.kind()), 1);
        assert_eq!(event.entity(), None);
        assert_eq!(event.kind().to_string(), "scored");
    }
}
