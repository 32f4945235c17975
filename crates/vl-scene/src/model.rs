//! Scene-graph data model.
//!
//! The scene is a tree of visual nodes (shapes, paths, text, groups) kept
//! in a `StableDiGraph` with parent→child edges. Every node carries a free
//! transform (translate / scale / rotate / skew), plus interaction flags
//! (`selectable`, `editable`, `exclude_from_export`) that the snapshot
//! codec cares about.

use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Paint & style ───────────────────────────────────────────────────────

/// RGBA color, 4 × f32 in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
}

/// Inline style on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub opacity: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}

// ─── Transform ───────────────────────────────────────────────────────────

/// Free transform applied to a node: translate, scale, rotate, skew.
/// Angles are degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub angle: f32,
    pub skew_x: f32,
    pub skew_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// A single path command (SVG-like but simplified). Free-draw strokes are
/// sequences of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32), // control, end
    Close,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The node kinds in the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Root of the scene. Exactly one per graph, never serialized.
    Root,
    /// Container for other nodes.
    Group,
    Rect {
        width: f32,
        height: f32,
    },
    Ellipse {
        rx: f32,
        ry: f32,
    },
    /// Freeform path (free-draw / pen output).
    Path {
        commands: Vec<PathCmd>,
    },
    Text {
        content: String,
    },
}

/// A single node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: ShapeKind,
    pub transform: Transform,
    pub style: Style,

    /// Whether the node can be picked/selected on the canvas.
    pub selectable: bool,
    /// Whether the node's content can be edited in place (text).
    pub editable: bool,
    /// Excluded from export and from history snapshots. Overlay helpers
    /// (guides, cursors, selection chrome) set this.
    pub exclude_from_export: bool,
}

impl SceneNode {
    pub fn new(id: NodeId, kind: ShapeKind) -> Self {
        Self {
            id,
            kind,
            transform: Transform::default(),
            style: Style::default(),
            selectable: true,
            editable: true,
            exclude_from_export: false,
        }
    }

    /// Builder-style position helper.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.x = x;
        self.transform.y = y;
        self
    }
}

// ─── Scene graph ─────────────────────────────────────────────────────────

/// The scene tree: a `StableDiGraph` of `SceneNode` with parent→child
/// edges and an id→index side table for O(1) lookup.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub graph: StableDiGraph<SceneNode, ()>,
    pub root: NodeIndex,
    id_index: HashMap<NodeId, NodeIndex>,
}

impl SceneGraph {
    /// Create an empty scene with just the root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = NodeId::named("root");
        let root = graph.add_node(SceneNode::new(root_id, ShapeKind::Root));

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
        }
    }

    /// Add a node as a child of `parent`. Returns the new node's index.
    pub fn add_node(&mut self, parent: NodeIndex, node: SceneNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        idx
    }

    /// Remove a node and all its descendants. Returns the removed ids,
    /// target first, in removal order.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> Vec<NodeId> {
        let mut order = vec![idx];
        let mut cursor = 0;
        while cursor < order.len() {
            let here = order[cursor];
            order.extend(self.children(here));
            cursor += 1;
        }

        let mut removed = Vec::with_capacity(order.len());
        for idx in order {
            if let Some(node) = self.graph.remove_node(idx) {
                self.id_index.remove(&node.id);
                removed.push(node.id);
            }
        }
        removed
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in a deterministic order (sorted by
    /// `NodeIndex`, so snapshot serialization is stable regardless of how
    /// `petgraph` iterates its adjacency list). Not necessarily insertion
    /// order: a freed index can be reused by a later insert.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Number of nodes excluding the root.
    pub fn node_count(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(name: &str) -> SceneNode {
        SceneNode::new(
            NodeId::named(name),
            ShapeKind::Rect {
                width: 10.0,
                height: 10.0,
            },
        )
    }

    #[test]
    fn add_and_lookup() {
        let mut scene = SceneGraph::new();
        let idx = scene.add_node(scene.root, rect("a"));
        assert_eq!(scene.index_of(NodeId::named("a")), Some(idx));
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.parent(idx), Some(scene.root));
    }

    #[test]
    fn remove_subtree_takes_descendants() {
        let mut scene = SceneGraph::new();
        let group = scene.add_node(
            scene.root,
            SceneNode::new(NodeId::named("g"), ShapeKind::Group),
        );
        scene.add_node(group, rect("inner_a"));
        scene.add_node(group, rect("inner_b"));
        scene.add_node(scene.root, rect("outside"));

        let removed = scene.remove_subtree(group);
        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0], NodeId::named("g"));
        assert!(scene.get_by_id(NodeId::named("inner_a")).is_none());
        assert!(scene.get_by_id(NodeId::named("outside")).is_some());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn children_order_is_deterministic() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root, rect("a"));
        let b = scene.add_node(scene.root, rect("b"));
        let c = scene.add_node(scene.root, rect("c"));
        assert_eq!(scene.children(scene.root), vec![a, b, c]);
    }
}
