//! Component trait and component type registration.
//!
//! Components are stored type-erased, keyed by a [`ComponentTypeId`]. The
//! key is assigned by the [`ComponentRegistry`] the first time a Rust type is
//! seen, either through an explicit [`World::register_component`] call or
//! implicitly when a component of that type is first added.
//!
//! [`World::register_component`]: crate::world::World::register_component

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A plain data record that can be attached to an entity.
///
/// Blanket-implemented for every `'static + Debug` type, so user structs need
/// no extra derive. The methods exist to recover the concrete type from a
/// `&dyn Component`.
///
/// `Box<dyn Component>` is itself `'static + Debug`, so it is a `Component`
/// too: calling `as_any` or `component_name` directly on the box describes
/// the box. Deref to `&dyn Component` first (`(*boxed).component_name()`).
pub trait Component: Any + fmt::Debug + 'static {
    /// Upcast to `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Upcast to `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Upcast an owned box to `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    /// The Rust type name of the concrete component.
    fn component_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug> Component for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn Component {
    /// Whether the concrete type behind this trait object is `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete component reference.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to a concrete mutable component reference.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight key identifying one component kind.
///
/// Two components of the same Rust type always share the same key within a
/// world, regardless of their field values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// The numeric value of this key (its registration order).
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Key assigned at registration time.
    pub id: ComponentTypeId,
    /// Human-readable name (caller-supplied, or the Rust type name when the
    /// type was registered implicitly).
    pub name: String,
    /// Rust `TypeId` of the component.
    pub type_id: TypeId,
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping Rust types to [`ComponentTypeId`]s and their metadata.
///
/// A type can only be registered once; subsequent registrations of the same
/// Rust `TypeId` return the existing [`ComponentTypeId`].
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    by_name: HashMap<String, ComponentTypeId>,
    /// Indexed by `ComponentTypeId.0`.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type under the given `name`.
    ///
    /// If the type has already been registered, the existing
    /// [`ComponentTypeId`] is returned and `name` is ignored.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already taken by a different Rust type.
    pub fn register<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        let rust_type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type_id) {
            return existing;
        }
        if self.by_name.contains_key(name) {
            panic!(
                "component name '{}' is already registered for a different type",
                name
            );
        }

        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            type_id: rust_type_id,
        });
        self.by_type.insert(rust_type_id, id);
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Return the key for `T`, registering it under its Rust type name if it
    /// has not been seen yet.
    pub fn get_or_register<T: Component>(&mut self) -> ComponentTypeId {
        match self.lookup::<T>() {
            Some(id) => id,
            None => self.register::<T>(std::any::type_name::<T>()),
        }
    }

    /// Look up a component type by its Rust type.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Look up a component type by a raw Rust `TypeId`.
    pub fn lookup_type_id(&self, type_id: TypeId) -> Option<ComponentTypeId> {
        self.by_type.get(&type_id).copied()
    }

    /// Look up a component type by its registered name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Get the [`ComponentInfo`] for a registered key.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.0 as usize)
    }

    /// Total number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether any component types have been registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns the names of all registered component types, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pos {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Label(String);

    #[test]
    fn register_and_lookup() {
        let mut reg = ComponentRegistry::new();
        let id = reg.register::<Pos>("position");
        assert_eq!(reg.lookup::<Pos>(), Some(id));
        assert_eq!(reg.lookup_by_name("position"), Some(id));
        assert_eq!(reg.lookup_type_id(TypeId::of::<Pos>()), Some(id));
    }

    #[test]
    fn same_type_same_id() {
        let mut reg = ComponentRegistry::new();
        let id1 = reg.register::<Pos>("position");
        let id2 = reg.register::<Pos>("position_again");
        assert_eq!(id1, id2);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.lookup_by_name("position_again"), None);
    }

    #[test]
    fn different_types_different_ids() {
        let mut reg = ComponentRegistry::new();
        let p = reg.register::<Pos>("position");
        let l = reg.register::<Label>("label");
        assert_ne!(p, l);
        assert_eq!(reg.registered_names(), vec!["label", "position"]);
    }

    #[test]
    #[should_panic(expected = "already registered for a different type")]
    fn name_clash_between_types_panics() {
        let mut reg = ComponentRegistry::new();
        reg.register::<Pos>("thing");
        reg.register::<Label>("thing");
    }

    #[test]
    fn implicit_registration_uses_type_name() {
        let mut reg = ComponentRegistry::new();
        let id = reg.get_or_register::<Label>();
        let info = reg.get_info(id).unwrap();
        assert_eq!(info.name, std::any::type_name::<Label>());
        assert_eq!(reg.get_or_register::<Label>(), id);
    }

    #[test]
    fn dyn_component_downcasts() {
        let boxed: Box<dyn Component> = Box::new(Pos { x: 1.0, y: 2.0 });
        let component: &dyn Component = &*boxed;
        assert!(component.is::<Pos>());
        assert!(!component.is::<Label>());
        assert_eq!(
            component.downcast_ref::<Pos>(),
            Some(&Pos { x: 1.0, y: 2.0 })
        );
        assert_eq!(component.component_name(), std::any::type_name::<Pos>());
    }

    #[test]
    fn boxed_component_must_be_dereffed_for_its_name() {
        let boxed: Box<dyn Component> = Box::new(7u32);
        assert_eq!((*boxed).component_name(), "u32");
        assert!((*boxed).as_any().is::<u32>());
        assert_ne!(boxed.component_name(), "u32");
    }
}
