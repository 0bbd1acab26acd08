//! The [`World`] is the top-level container for the ECS. It owns the entity
//! allocator, the component registry and store, the event bus, and the
//! system schedule, and it is the only thing systems and listeners are given.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, trace_span, warn};

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::entity::{Entity, EntityAllocator};
use crate::event::{Event, EventBus, EventKind, SubscriptionId};
use crate::query::{self, ComponentSet};
use crate::storage::ComponentStore;
use crate::system::{NamedSystem, Schedule, System};
use crate::EcsError;

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Behavior switches for a [`World`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Report operations on nonexistent entities as
    /// [`EcsError::NoSuchEntity`] instead of silently ignoring them.
    pub strict: bool,
}

// ---------------------------------------------------------------------------
// RunGuard
// ---------------------------------------------------------------------------

/// Marks the schedule as running; cleared on drop, including during unwind.
struct RunGuard(Rc<Cell<bool>>);

impl RunGuard {
    fn enter(flag: &Rc<Cell<bool>>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(Rc::clone(flag)))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The top-level ECS container.
///
/// Structural mutations (create/destroy entity, add/remove component) emit
/// their event synchronously before returning, so listeners observe the
/// world exactly as of that point in the mutation sequence.
///
/// Operations on an entity that does not exist are no-ops. By default they
/// also return `Ok(())`; with [`WorldConfig::strict`] they return
/// [`EcsError::NoSuchEntity`]. Either way nothing is mutated and no event
/// fires.
pub struct World {
    config: WorldConfig,
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    store: ComponentStore,
    events: EventBus,
    schedule: Schedule,
    running: Rc<Cell<bool>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.store.len())
            .field("component_types", &self.registry.len())
            .field("subscriptions", &self.events.len())
            .field("system_count", &self.schedule.len())
            .field("strict", &self.config.strict)
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a new, empty world with the default (lenient) configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a new, empty world with the given configuration.
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            allocator: EntityAllocator::new(),
            registry: ComponentRegistry::new(),
            store: ComponentStore::new(),
            events: EventBus::new(),
            schedule: Schedule::new(),
            running: Rc::new(Cell::new(false)),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Switch strict mode on or off.
    pub fn set_strict(&mut self, strict: bool) {
        self.config.strict = strict;
    }

    fn missing_entity(&self, entity: Entity, operation: &'static str) -> Result<(), EcsError> {
        if self.config.strict {
            return Err(EcsError::NoSuchEntity { entity, operation });
        }
        trace!(%entity, operation, "ignored operation on nonexistent entity");
        Ok(())
    }

    // -- component registration ---------------------------------------------

    /// Read-only access to the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register a component type under a human-readable name.
    ///
    /// Registration is optional: [`add_component`](Self::add_component)
    /// registers unseen types under their Rust type name.
    pub fn register_component<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        self.registry.register::<T>(name)
    }

    /// The type key for `T`, or `None` if `T` has never been registered.
    pub fn component_id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.registry.lookup::<T>()
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create a new entity with an empty component set and emit
    /// [`Event::EntityCreated`].
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.store.spawn(entity);
        debug!(%entity, "entity created");
        self.emit(&Event::EntityCreated(entity));
        entity
    }

    /// Destroy `entity` and all of its components in one step, then emit
    /// [`Event::EntityDestroyed`].
    ///
    /// No `ComponentRemoved` events are emitted for the components that go
    /// with it. Destroying an entity that does not exist is a no-op.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        let Some(components) = self.store.despawn(entity) else {
            return self.missing_entity(entity, "destroy_entity");
        };
        debug!(%entity, components = components.len(), "entity destroyed");
        self.emit(&Event::EntityDestroyed(entity));
        drop(components);
        Ok(())
    }

    /// Whether `entity` is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    /// All alive entities, in creation order.
    pub fn entities(&self) -> Vec<Entity> {
        self.store.entities().collect()
    }

    /// The handle the next [`create_entity`](Self::create_entity) will return.
    pub fn next_entity(&self) -> Entity {
        self.allocator.peek_next()
    }

    // -- component access ---------------------------------------------------

    /// Store `component` on `entity`, replacing any component of the same
    /// type, then emit [`Event::ComponentAdded`].
    ///
    /// The replaced instance, if any, is dropped after the event.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), EcsError> {
        let Some(set) = self.store.set_mut(entity) else {
            return self.missing_entity(entity, "add_component");
        };
        let type_id = self.registry.get_or_register::<T>();
        let replaced = set.insert(type_id, Box::new(component));
        trace!(
            %entity,
            component = std::any::type_name::<T>(),
            replaced = replaced.is_some(),
            "component added"
        );
        self.emit(&Event::ComponentAdded {
            entity,
            component: type_id,
        });
        drop(replaced);
        Ok(())
    }

    /// Remove the `T` component from `entity` and emit
    /// [`Event::ComponentRemoved`] carrying the removed instance.
    ///
    /// If the entity lacks the component this is a no-op.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        match self.registry.lookup::<T>() {
            Some(type_id) => self.remove_component_by_id(entity, type_id),
            None if self.store.contains(entity) => Ok(()),
            None => self.missing_entity(entity, "remove_component"),
        }
    }

    /// Key-based form of [`remove_component`](Self::remove_component).
    pub fn remove_component_by_id(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
    ) -> Result<(), EcsError> {
        let Some(set) = self.store.set_mut(entity) else {
            return self.missing_entity(entity, "remove_component");
        };
        let Some(removed) = set.remove(type_id) else {
            return Ok(());
        };
        // Deref first: the box is itself a `Component` and would report its
        // own type name.
        let component: &dyn Component = &*removed;
        trace!(%entity, component = component.component_name(), "component removed");
        self.emit(&Event::ComponentRemoved { entity, component });
        Ok(())
    }

    /// Whether `entity` has a `T` component. False for nonexistent entities.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.registry
            .lookup::<T>()
            .is_some_and(|type_id| self.has_component_id(entity, type_id))
    }

    /// Key-based form of [`has_component`](Self::has_component).
    pub fn has_component_id(&self, entity: Entity, type_id: ComponentTypeId) -> bool {
        self.store
            .set(entity)
            .is_some_and(|set| set.contains(type_id))
    }

    /// Borrow the `T` component of `entity`, or `None` if either is missing.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let type_id = self.registry.lookup::<T>()?;
        self.store.set(entity)?.get(type_id)?.downcast_ref::<T>()
    }

    /// Mutably borrow the `T` component of `entity`.
    ///
    /// In-place mutation is not a structural change and emits no event.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let type_id = self.registry.lookup::<T>()?;
        self.store
            .set_mut(entity)?
            .get_mut(type_id)?
            .downcast_mut::<T>()
    }

    /// Borrow a component by type key, type-erased.
    pub fn get_component_by_id(
        &self,
        entity: Entity,
        type_id: ComponentTypeId,
    ) -> Option<&dyn Component> {
        self.store.set(entity)?.get(type_id)
    }

    /// The type keys currently present on `entity`, sorted. Empty for
    /// nonexistent entities.
    pub fn component_types(&self, entity: Entity) -> Vec<ComponentTypeId> {
        self.store
            .set(entity)
            .map(|set| set.type_ids())
            .unwrap_or_default()
    }

    // -- queries ------------------------------------------------------------

    /// Every alive entity holding all of `types`, in creation order.
    ///
    /// Computed fresh on every call. An empty `types` matches every alive
    /// entity.
    pub fn query(&self, types: &[ComponentTypeId]) -> Vec<Entity> {
        query::scan(&self.store, types)
    }

    /// Typed form of [`query`](Self::query): `world.query_of::<(Position, Text)>()`.
    pub fn query_of<Q: ComponentSet>(&self) -> Vec<Entity> {
        match Q::type_ids(&self.registry) {
            Some(types) => query::scan(&self.store, &types),
            None => Vec::new(),
        }
    }

    /// The oldest alive entity holding all of `types`.
    pub fn query_first(&self, types: &[ComponentTypeId]) -> Option<Entity> {
        query::scan_first(&self.store, types)
    }

    /// Number of alive entities holding all of `types`.
    pub fn query_count(&self, types: &[ComponentTypeId]) -> usize {
        query::scan_count(&self.store, types)
    }

    // -- events -------------------------------------------------------------

    /// Subscribe `listener` to events of `kind`.
    ///
    /// Listeners run in subscription order. Subscribing the same closure
    /// twice creates two independent subscriptions. A listener may be
    /// re-entered by events it causes itself, so it is `Fn`; keep mutable
    /// state in a `Cell` or `RefCell`.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&mut World, &Event<'_>) + 'static,
    {
        let id = self.events.subscribe(kind, Box::new(listener));
        trace!(?id, "listener subscribed");
        id
    }

    /// Cancel a subscription. Returns `false` if it was already cancelled.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Number of listeners subscribed to `kind`.
    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.events.listener_count(kind)
    }

    /// Deliver an [`Event::Custom`] named `name` to its listeners.
    ///
    /// Lifecycle events are emitted only by the mutators that cause them,
    /// so listeners can trust that an `EntityDestroyed` really means the
    /// entity is gone.
    pub fn emit_custom(&mut self, name: &str, payload: &dyn Any) {
        self.emit(&Event::Custom { name, payload });
    }

    /// Deliver `event` to every listener of its kind, synchronously and in
    /// subscription order. See the [`event`](crate::event) module for the
    /// snapshot and reentrancy rules.
    pub(crate) fn emit(&mut self, event: &Event<'_>) {
        let kind = event.kind();
        for (id, listener) in self.events.snapshot(&kind) {
            if !self.events.is_subscribed(id) {
                continue;
            }
            (*listener)(self, event);
        }
    }

    // -- systems ------------------------------------------------------------

    /// Append a system to the schedule.
    pub fn add_system<S: System>(&mut self, system: S) {
        self.schedule.push(Box::new(system));
    }

    /// Append a closure to the schedule under a readable name.
    pub fn add_named_system<F>(&mut self, name: &str, func: F)
    where
        F: FnMut(&mut World) + 'static,
    {
        self.add_system(NamedSystem::new(name, func));
    }

    /// Number of registered systems.
    pub fn system_count(&self) -> usize {
        self.schedule.len()
    }

    /// Registered system names, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.schedule.names()
    }

    /// Invoke every registered system once, in registration order.
    ///
    /// Each system runs to completion before the next starts. Systems added
    /// during a run are first invoked by the next run. Calling `run` from
    /// inside a system is ignored. A panicking system unwinds out of `run`;
    /// the schedule itself is left intact.
    pub fn run(&mut self) {
        let Some(_guard) = RunGuard::enter(&self.running) else {
            warn!("World::run called while already running, ignored");
            return;
        };
        for scheduled in self.schedule.snapshot() {
            let _span = trace_span!("system", name = %scheduled.name).entered();
            let Ok(mut system) = scheduled.system.try_borrow_mut() else {
                continue;
            };
            system.run(self);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
