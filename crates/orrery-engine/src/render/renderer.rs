//! Keeps a [`Scene`] in sync with the renderable entities of a [`World`].

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use orrery_ecs::entity::Entity;
use orrery_ecs::event::{Event, EventKind};
use orrery_ecs::world::World;
use tracing::{debug, trace};

use super::components::{Position, Renderable, Text};
use super::scene::{NodeId, Scene};
use super::RenderError;

/// Name the renderer's system is registered under by [`SceneRenderer::install`].
pub const RENDER_SYSTEM_NAME: &str = "scene_renderer";

#[derive(Debug)]
struct RendererState {
    scene: Scene,
    root: NodeId,
    nodes: BTreeMap<Entity, NodeId>,
}

impl RendererState {
    /// Free the node owned by `entity`, if it has one.
    fn release(&mut self, entity: Entity) {
        if let Some(node) = self.nodes.remove(&entity) {
            self.scene.remove(node);
            debug!(%entity, %node, "node released");
        }
    }
}

// ---------------------------------------------------------------------------
// SceneRenderer
// ---------------------------------------------------------------------------

/// Mirrors every entity with a [`Renderable`] into a node under one mount
/// point.
///
/// Cloning yields another handle to the same scene; the clone registered by
/// [`install`](Self::install) and the one kept by the caller observe the same
/// nodes.
#[derive(Debug, Clone)]
pub struct SceneRenderer {
    state: Rc<RefCell<RendererState>>,
}

impl SceneRenderer {
    /// Attach to the mount point registered under `selector`.
    ///
    /// Fails with [`RenderError::MountNotFound`] if the scene has no such
    /// mount point. On success the renderer subscribes to entity destruction
    /// and to `Renderable` removal, releasing the entity's node at that exact
    /// point.
    pub fn new(world: &mut World, scene: Scene, selector: &str) -> Result<Self, RenderError> {
        let root = scene
            .query_selector(selector)
            .ok_or_else(|| RenderError::MountNotFound {
                selector: selector.to_owned(),
            })?;
        let state = Rc::new(RefCell::new(RendererState {
            scene,
            root,
            nodes: BTreeMap::new(),
        }));

        let on_destroy = Rc::clone(&state);
        world.on(EventKind::EntityDestroyed, move |_, event| {
            if let Event::EntityDestroyed(entity) = event {
                on_destroy.borrow_mut().release(*entity);
            }
        });

        let on_remove = Rc::clone(&state);
        world.on(EventKind::ComponentRemoved, move |_, event| {
            if let Event::ComponentRemoved { entity, component } = event {
                if component.is::<Renderable>() {
                    on_remove.borrow_mut().release(*entity);
                }
            }
        });

        debug!(selector, %root, "scene renderer attached");
        Ok(Self { state })
    }

    /// Register [`update`](Self::update) as a system on `world`.
    pub fn install(&self, world: &mut World) {
        let renderer = self.clone();
        world.add_named_system(RENDER_SYSTEM_NAME, move |world| renderer.update(world));
    }

    /// Sync the scene with the world.
    ///
    /// Entities seen for the first time get a node appended to the mount
    /// point, and the node id is written back into their `Renderable`.
    /// Every pass copies `Position` into the node's offsets and `Text` into
    /// its text content.
    pub fn update(&self, world: &mut World) {
        for entity in world.query_of::<(Renderable,)>() {
            let Some(node) = self.ensure_node(world, entity) else {
                continue;
            };
            let mut state = self.state.borrow_mut();
            let Some(n) = state.scene.get_mut(node) else {
                continue;
            };
            if let Some(pos) = world.get_component::<Position>(entity) {
                n.set_offset(pos.x, pos.y);
            }
            if let Some(text) = world.get_component::<Text>(entity) {
                if n.text.as_deref() != Some(text.as_str()) {
                    n.text = Some(text.0.clone());
                }
            }
        }
    }

    fn ensure_node(&self, world: &mut World, entity: Entity) -> Option<NodeId> {
        let existing = self.state.borrow().nodes.get(&entity).copied();
        let node = match existing {
            Some(node) => node,
            None => {
                let renderable = world.get_component::<Renderable>(entity)?;
                let mut guard = self.state.borrow_mut();
                let state = &mut *guard;
                let node = state
                    .scene
                    .create_element(&renderable.tag, &renderable.class_name);
                state.scene.append_child(state.root, node);
                state.nodes.insert(entity, node);
                trace!(%entity, %node, tag = %renderable.tag, "node created for entity");
                node
            }
        };
        if let Some(renderable) = world.get_component_mut::<Renderable>(entity) {
            renderable.node = Some(node);
        }
        Some(node)
    }

    // -- inspection ---------------------------------------------------------

    /// The node currently owned by `entity`.
    pub fn node_for(&self, entity: Entity) -> Option<NodeId> {
        self.state.borrow().nodes.get(&entity).copied()
    }

    /// Number of entities that currently own a node.
    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    /// The mount point nodes are appended to.
    pub fn root(&self) -> NodeId {
        self.state.borrow().root
    }

    /// Borrow the scene. Release the borrow before destroying entities.
    pub fn scene(&self) -> Ref<'_, Scene> {
        Ref::map(self.state.borrow(), |state| &state.scene)
    }

    /// Markup of the whole scene.
    pub fn markup(&self) -> String {
        self.scene().to_markup()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn app_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_mount("#app", "div").unwrap();
        scene
    }

    fn spawn_label(world: &mut World, text: &str) -> Entity {
        let e = world.create_entity();
        world.add_component(e, Position::new(10.0, 10.0)).unwrap();
        world.add_component(e, Renderable::new("h1", "title-class")).unwrap();
        world.add_component(e, Text::new(text)).unwrap();
        e
    }

    #[test]
    fn missing_mount_fails_fast() {
        let mut world = World::new();
        let err = SceneRenderer::new(&mut world, Scene::new(), "#app").unwrap_err();
        assert_eq!(
            err,
            RenderError::MountNotFound {
                selector: "#app".into()
            }
        );
        assert_eq!(err.to_string(), "mount point not found for selector: #app");
        assert_eq!(world.listener_count(&EventKind::EntityDestroyed), 0);
    }

    #[test]
    fn node_created_once_and_written_back() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        let e = spawn_label(&mut world, "hi");

        renderer.update(&mut world);
        let node = renderer.node_for(e).unwrap();
        assert_eq!(world.get_component::<Renderable>(e).unwrap().node, Some(node));

        renderer.update(&mut world);
        assert_eq!(renderer.node_for(e), Some(node));
        assert_eq!(renderer.node_count(), 1);
        assert_eq!(renderer.scene().get(renderer.root()).unwrap().children(), &[node]);
    }

    #[test]
    fn position_and_text_sync_every_pass() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        let e = spawn_label(&mut world, "one");
        renderer.update(&mut world);

        world.get_component_mut::<Position>(e).unwrap().x = 42.0;
        world.get_component_mut::<Text>(e).unwrap().0 = "two".into();
        renderer.update(&mut world);

        let node = renderer.node_for(e).unwrap();
        let scene = renderer.scene();
        let n = scene.get(node).unwrap();
        assert_eq!(n.left, Some(42.0));
        assert_eq!(n.top, Some(10.0));
        assert_eq!(n.text.as_deref(), Some("two"));
    }

    #[test]
    fn entities_without_renderable_are_ignored() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        let e = world.create_entity();
        world.add_component(e, Text::new("invisible")).unwrap();
        renderer.update(&mut world);
        assert_eq!(renderer.node_for(e), None);
        assert_eq!(renderer.markup(), r#"<div id="app"></div>"#);
    }

    #[test]
    fn destroy_releases_node_immediately() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        let e = spawn_label(&mut world, "bye");
        renderer.update(&mut world);
        let node = renderer.node_for(e).unwrap();

        world.destroy_entity(e).unwrap();
        assert_eq!(renderer.node_for(e), None);
        assert!(!renderer.scene().contains(node));
        assert_eq!(renderer.markup(), r#"<div id="app"></div>"#);

        // A second destroy is a no-op for the core, so nothing else happens.
        world.destroy_entity(e).unwrap();
        assert_eq!(renderer.scene().len(), 1);
    }

    #[test]
    fn destroy_before_first_update_is_harmless() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        let e = spawn_label(&mut world, "never shown");
        world.destroy_entity(e).unwrap();
        renderer.update(&mut world);
        assert_eq!(renderer.node_count(), 0);
    }

    #[test]
    fn removing_renderable_releases_node() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        let e = spawn_label(&mut world, "hi");
        renderer.update(&mut world);

        world.remove_component::<Text>(e).unwrap();
        assert!(renderer.node_for(e).is_some());

        world.remove_component::<Renderable>(e).unwrap();
        assert_eq!(renderer.node_for(e), None);
        assert!(world.is_alive(e));
    }

    #[test]
    fn replaced_renderable_keeps_its_node() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        let e = spawn_label(&mut world, "hi");
        renderer.update(&mut world);
        let node = renderer.node_for(e).unwrap();

        world.add_component(e, Renderable::new("h2", "")).unwrap();
        renderer.update(&mut world);
        assert_eq!(renderer.node_for(e), Some(node));
        assert_eq!(world.get_component::<Renderable>(e).unwrap().node, Some(node));
    }

    #[test]
    fn install_runs_update_with_world() {
        let mut world = World::new();
        let renderer = SceneRenderer::new(&mut world, app_scene(), "#app").unwrap();
        renderer.install(&mut world);
        assert_eq!(world.system_names(), vec![RENDER_SYSTEM_NAME]);

        let e = spawn_label(&mut world, "hello");
        world.run();
        assert!(renderer.node_for(e).is_some());
        assert!(renderer.markup().contains(">hello</h1>"));
    }
}
