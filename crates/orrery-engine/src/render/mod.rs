//! Headless scene renderer.
//!
//! A [`Scene`] is a retained tree of element-like [`Node`]s hung off named
//! mount points (`"#app"`). The [`SceneRenderer`] keeps one node per entity
//! carrying a [`Renderable`], syncs it from the entity's [`Position`] and
//! [`Text`] every pass, and frees it the moment the entity is destroyed.
//! [`Scene::to_markup`] prints the tree for inspection and tests.

pub mod components;
pub mod renderer;
pub mod scene;

pub use components::{Position, Renderable, Text};
pub use renderer::{SceneRenderer, RENDER_SYSTEM_NAME};
pub use scene::{Node, NodeId, Scene};

/// Errors raised by the scene and its renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// No mount point is registered under the selector.
    #[error("mount point not found for selector: {selector}")]
    MountNotFound { selector: String },

    /// A mount point with this selector already exists.
    #[error("mount point already registered for selector: {selector}")]
    DuplicateMount { selector: String },
}
