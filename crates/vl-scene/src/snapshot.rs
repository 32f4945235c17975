//! Snapshot codec: scene state ⇄ opaque serialized token.
//!
//! A [`Snapshot`] is the full state of the scene at one instant, encoded
//! as JSON text. It is immutable, cheap to compare (string equality), and
//! carries only a fixed subset of node attributes: structure, geometry,
//! transform and style always; `selectable` / `editable` only when named
//! in the caller's extra-attributes allow-list. Nodes flagged
//! `exclude_from_export` are omitted entirely, along with their subtrees.

use crate::id::NodeId;
use crate::model::{SceneGraph, SceneNode, ShapeKind, Style, Transform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribute names accepted in the extra-attributes allow-list.
pub const ATTR_SELECTABLE: &str = "selectable";
pub const ATTR_EDITABLE: &str = "editable";

/// Opaque, comparable, serializable token for one instant of scene state.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    json: String,
}

impl Snapshot {
    /// The raw serialized form (stable for persistence/transport).
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// Decode back into a loadable scene description.
    pub fn decode(&self) -> Result<SceneDescription, SnapshotError> {
        Ok(serde_json::from_str(&self.json)?)
    }

    /// Rehydrate a snapshot from previously exported text. The text is not
    /// validated here; a bad payload surfaces as `decode` failing.
    pub fn from_json(json: String) -> Self {
        Self { json }
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot({} bytes)", self.json.len())
    }
}

impl From<&SceneDescription> for Snapshot {
    fn from(desc: &SceneDescription) -> Self {
        // Plain structs with string keys; serialization cannot fail.
        let json = serde_json::to_string(desc).unwrap_or_default();
        Self { json }
    }
}

/// Decoded form of a snapshot: a flat node list in parent-before-child
/// order, hierarchy restored through the `parent` references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub nodes: Vec<NodeRecord>,
}

/// One serialized node. Extra attributes are optional fields so that
/// snapshots taken with different allow-lists stay comparable within a
/// session and compact on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: ShapeKind,
    pub transform: Transform,
    pub style: Style,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
}

impl NodeRecord {
    /// Rebuild a scene node. Extra attributes the snapshot did not carry
    /// fall back to their defaults.
    pub fn to_node(&self) -> SceneNode {
        let mut node = SceneNode::new(self.id, self.kind.clone());
        node.transform = self.transform;
        node.style = self.style.clone();
        node.selectable = self.selectable.unwrap_or(true);
        node.editable = self.editable.unwrap_or(true);
        node
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode the scene into a description, honoring the extra-attributes
/// allow-list and skipping export-excluded subtrees.
pub fn describe(scene: &SceneGraph, extra_attrs: &[&str]) -> SceneDescription {
    let want_selectable = extra_attrs.contains(&ATTR_SELECTABLE);
    let want_editable = extra_attrs.contains(&ATTR_EDITABLE);

    let mut nodes = Vec::with_capacity(scene.node_count());
    // Preorder walk so every record's parent precedes it.
    let mut stack: Vec<(petgraph::graph::NodeIndex, Option<NodeId>)> = scene
        .children(scene.root)
        .into_iter()
        .rev()
        .map(|idx| (idx, None))
        .collect();

    while let Some((idx, parent)) = stack.pop() {
        let node = &scene.graph[idx];
        if node.exclude_from_export {
            continue; // subtree goes with it
        }
        nodes.push(NodeRecord {
            id: node.id,
            parent,
            kind: node.kind.clone(),
            transform: node.transform,
            style: node.style.clone(),
            selectable: want_selectable.then_some(node.selectable),
            editable: want_editable.then_some(node.editable),
        });
        for child in scene.children(idx).into_iter().rev() {
            stack.push((child, Some(node.id)));
        }
    }

    SceneDescription { nodes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scene_with(names: &[&str]) -> SceneGraph {
        let mut scene = SceneGraph::new();
        for name in names {
            scene.add_node(
                scene.root,
                SceneNode::new(
                    NodeId::named(name),
                    ShapeKind::Rect {
                        width: 20.0,
                        height: 10.0,
                    },
                ),
            );
        }
        scene
    }

    #[test]
    fn equal_scenes_equal_snapshots() {
        let a = Snapshot::from(&describe(&scene_with(&["r1", "r2"]), &[]));
        let b = Snapshot::from(&describe(&scene_with(&["r1", "r2"]), &[]));
        assert_eq!(a, b);
    }

    #[test]
    fn different_scenes_differ() {
        let a = Snapshot::from(&describe(&scene_with(&["r1"]), &[]));
        let b = Snapshot::from(&describe(&scene_with(&["r1", "r2"]), &[]));
        assert_ne!(a, b);
    }

    #[test]
    fn extra_attrs_are_allow_listed() {
        let mut scene = scene_with(&["r1"]);
        scene.get_by_id_mut(NodeId::named("r1")).unwrap().selectable = false;

        let bare = describe(&scene, &[]);
        assert_eq!(bare.nodes[0].selectable, None);
        assert_eq!(bare.nodes[0].editable, None);

        let full = describe(&scene, &[ATTR_SELECTABLE, ATTR_EDITABLE]);
        assert_eq!(full.nodes[0].selectable, Some(false));
        assert_eq!(full.nodes[0].editable, Some(true));
    }

    #[test]
    fn excluded_subtree_is_omitted() {
        let mut scene = SceneGraph::new();
        let overlay = scene.add_node(scene.root, {
            let mut g = SceneNode::new(NodeId::named("overlay"), ShapeKind::Group);
            g.exclude_from_export = true;
            g
        });
        scene.add_node(
            overlay,
            SceneNode::new(
                NodeId::named("guide"),
                ShapeKind::Rect {
                    width: 1.0,
                    height: 100.0,
                },
            ),
        );
        scene.add_node(
            scene.root,
            SceneNode::new(
                NodeId::named("art"),
                ShapeKind::Ellipse { rx: 5.0, ry: 5.0 },
            ),
        );

        let desc = describe(&scene, &[]);
        let ids: Vec<&str> = desc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["art"]);
    }

    #[test]
    fn decode_roundtrip() {
        let mut scene = scene_with(&["r1"]);
        let group = scene.add_node(
            scene.root,
            SceneNode::new(NodeId::named("g"), ShapeKind::Group),
        );
        scene.add_node(
            group,
            SceneNode::new(
                NodeId::named("child"),
                ShapeKind::Text {
                    content: "hi".into(),
                },
            ),
        );

        let desc = describe(&scene, &[ATTR_SELECTABLE]);
        let snap = Snapshot::from(&desc);
        let back = snap.decode().unwrap();
        assert_eq!(back, desc);

        // Hierarchy is preserved through parent references.
        let child = back
            .nodes
            .iter()
            .find(|n| n.id == NodeId::named("child"))
            .unwrap();
        assert_eq!(child.parent, Some(NodeId::named("g")));
    }

    #[test]
    fn malformed_text_fails_decode() {
        let snap = Snapshot::from_json("not json".into());
        assert!(snap.decode().is_err());
    }
}
