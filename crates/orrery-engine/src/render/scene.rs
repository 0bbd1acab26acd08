//! Retained node tree with named mount points.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use tracing::trace;

use super::RenderError;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Handle to a node in a [`Scene`]. Never reused within one scene.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One element-like node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    /// `id` attribute; set on mount points registered with a `#name` selector.
    pub id: Option<String>,
    pub class_name: String,
    pub text: Option<String>,
    /// Absolute offset from the parent. `None` until positioned.
    pub left: Option<f64>,
    pub top: Option<f64>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str, class_name: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            id: None,
            class_name: class_name.to_owned(),
            text: None,
            left: None,
            top: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Set both offsets at once.
    pub fn set_offset(&mut self, left: f64, top: f64) {
        self.left = Some(left);
        self.top = Some(top);
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A forest of nodes rooted at mount points.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    /// Mount points in registration order.
    mounts: Vec<(String, NodeId)>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root node reachable through `selector`.
    ///
    /// A selector of the form `#name` also sets the node's `id` attribute.
    pub fn add_mount(&mut self, selector: &str, tag: &str) -> Result<NodeId, RenderError> {
        if self.query_selector(selector).is_some() {
            return Err(RenderError::DuplicateMount {
                selector: selector.to_owned(),
            });
        }
        let node = self.create_element(tag, "");
        if let (Some(id), Some(n)) = (selector.strip_prefix('#'), self.nodes.get_mut(&node)) {
            n.id = Some(id.to_owned());
        }
        self.mounts.push((selector.to_owned(), node));
        Ok(node)
    }

    /// The mount point registered under `selector`, if any.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.mounts
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, node)| *node)
    }

    /// Create a detached node.
    pub fn create_element(&mut self, tag: &str, class_name: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(tag, class_name));
        trace!(node = %id, tag, "node created");
        id
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Returns `false` if either node is missing or `child` is `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child)
        {
            return false;
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
        true
    }

    /// Detach `node` from its parent and free it with all its descendants.
    ///
    /// Returns `false` if the node does not exist. Mount points cannot be
    /// removed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.nodes.contains_key(&node) || self.mounts.iter().any(|(_, m)| *m == node) {
            return false;
        }
        self.detach(node);
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(freed) = self.nodes.remove(&id) {
                pending.extend(freed.children);
            }
        }
        trace!(node = %node, "node removed");
        true
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != node);
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(&node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of live nodes, mount points included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -- markup -------------------------------------------------------------

    /// Serialize every mount point, in registration order, as HTML-like
    /// markup. Positioned nodes carry an inline `style` with their offsets.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for (_, root) in &self.mounts {
            self.write_node(&mut out, *root);
        }
        out
    }

    /// Markup of a single subtree, or an empty string for a missing node.
    pub fn node_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, node);
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        out.push('<');
        out.push_str(&node.tag);
        if let Some(dom_id) = &node.id {
            let _ = write!(out, " id=\"{}\"", escape(dom_id));
        }
        if !node.class_name.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&node.class_name));
        }
        if let (Some(left), Some(top)) = (node.left, node.top) {
            let _ = write!(
                out,
                " style=\"position: absolute; left: {left}px; top: {top}px\""
            );
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape(text));
        }
        for child in &node.children {
            self.write_node(out, *child);
        }
        let _ = write!(out, "</{}>", node.tag);
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
