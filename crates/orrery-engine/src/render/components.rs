//! Components the scene renderer reads.

use serde::{Deserialize, Serialize};

use super::scene::NodeId;

/// Marks an entity for rendering as a node with the given tag and class.
///
/// `node` is filled in by the renderer the first time it sees the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub tag: String,
    pub class_name: String,
    #[serde(skip)]
    pub node: Option<NodeId>,
}

impl Renderable {
    pub fn new(tag: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class_name: class_name.into(),
            node: None,
        }
    }
}

/// 2D offset of a rendered node from its mount point's origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Text content of a rendered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text(pub String);

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
