//! Orrery Engine -- tick driver and scene renderer on top of the ECS core.
//!
//! This crate builds on [`orrery_ecs`] to provide the pieces around the
//! world: a fixed-timestep [`TickLoop`](tick::TickLoop) that calls
//! [`World::run`](orrery_ecs::world::World::run) once per tick, and a
//! headless [`SceneRenderer`](render::SceneRenderer) that mirrors renderable
//! entities into a retained node tree and frees each node when its entity
//! is destroyed.
//!
//! # Quick Start
//!
//! ```
//! use orrery_engine::prelude::*;
//!
//! let mut scene = Scene::new();
//! scene.add_mount("#app", "div").unwrap();
//!
//! let mut world = World::new();
//! let renderer = SceneRenderer::new(&mut world, scene, "#app").unwrap();
//! renderer.install(&mut world);
//!
//! let label = world.create_entity();
//! world.add_component(label, Position::new(10.0, 10.0)).unwrap();
//! world.add_component(label, Renderable::new("h1", "title-class")).unwrap();
//! world.add_component(label, Text::new("Hello")).unwrap();
//!
//! let mut tick_loop = TickLoop::new(world, TickConfig::default()).unwrap();
//! tick_loop.tick();
//! assert!(renderer.markup().contains("Hello"));
//!
//! tick_loop.world_mut().destroy_entity(label).unwrap();
//! assert!(!renderer.markup().contains("Hello"));
//! ```

#![deny(unsafe_code)]

pub mod render;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use orrery_ecs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while configuring the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The tick step is zero, negative, or not finite.
    #[error("fixed_dt must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The renderer could not be set up.
    #[error(transparent)]
    Render(#[from] render::RenderError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use orrery_ecs::prelude::*;

    pub use crate::render::{
        Node, NodeId, Position, RenderError, Renderable, Scene, SceneRenderer, Text,
    };
    pub use crate::tick::{TickConfig, TickDiagnostics, TickLoop};
    pub use crate::EngineError;
}
