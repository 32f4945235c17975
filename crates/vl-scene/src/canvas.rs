//! The canvas host: owns the scene graph, selection, render scheduling,
//! the notification hub, and the queued-load machinery.
//!
//! Every mutation operation publishes its notification through the hub
//! *after* applying the change, so observers always see post-state.
//! Loading a scene description is deliberately split in two: callers queue
//! it with [`Canvas::load_from_scene`] and the content lands on a later
//! [`Canvas::complete_next_load`] — the cooperative stand-in for a decode
//! step that may need to fetch embedded resources asynchronously.

use crate::events::{EventHub, EventKind, SceneEvent, Subscription};
use crate::id::NodeId;
use crate::model::{PathCmd, SceneGraph, SceneNode, ShapeKind, Style};
use crate::snapshot::{self, ATTR_EDITABLE, ATTR_SELECTABLE, SceneDescription, Snapshot};
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Identifies one queued load, handed back when that load completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
struct PendingLoad {
    ticket: LoadTicket,
    scene: SceneDescription,
}

/// An interactive drawing surface over a [`SceneGraph`].
#[derive(Debug)]
pub struct Canvas {
    graph: SceneGraph,
    selection: Vec<NodeId>,
    hub: EventHub,
    /// Extra-attributes allow-list applied to captured state.
    snapshot_attrs: SmallVec<[String; 2]>,
    pending_loads: VecDeque<PendingLoad>,
    next_ticket: u64,
    frames_rendered: u64,
    render_queued: bool,
}

impl Canvas {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: SceneGraph::new(),
            selection: Vec::new(),
            hub: EventHub::new(),
            snapshot_attrs: [ATTR_SELECTABLE, ATTR_EDITABLE]
                .into_iter()
                .map(String::from)
                .collect(),
            pending_loads: VecDeque::new(),
            next_ticket: 0,
            frames_rendered: 0,
            render_queued: false,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.graph.get_by_id(id)
    }

    // ─── Notifications ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, kind: EventKind) -> Subscription {
        self.hub.subscribe(kind)
    }

    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        self.hub.unsubscribe(token)
    }

    /// Pop the oldest delivered notification.
    pub fn take_event(&mut self) -> Option<SceneEvent> {
        self.hub.take()
    }

    /// Pop the oldest delivered notification with the scene state that
    /// was captured when it fired.
    pub fn take_event_with_state(&mut self) -> Option<(SceneEvent, Option<Snapshot>)> {
        self.hub.take_with_state()
    }

    /// Publish an event on behalf of a collaborator (the history engine
    /// uses this for its `history:*` notifications).
    ///
    /// Mutation events carry the scene state captured right here, after
    /// the mutation they report — observers draining a batch later still
    /// see per-action state, not the cumulative end state.
    pub fn notify(&mut self, event: SceneEvent) {
        if !self.hub.is_observed(event.kind()) {
            return;
        }
        let state = match event.kind() {
            EventKind::NodeAdded
            | EventKind::NodeRemoved
            | EventKind::NodeModified
            | EventKind::NodeSkewed
            | EventKind::FreeDrawCompleted => Some(self.capture_state()),
            // Move frames never record, so their capture is skipped.
            _ => None,
        };
        self.hub.emit_with_state(event, state);
    }

    // ─── Structural edits ────────────────────────────────────────────────

    /// Add a node under `parent` (the root when `None` or unknown).
    pub fn add_node(&mut self, parent: Option<NodeId>, node: SceneNode) -> NodeId {
        let parent_idx = parent
            .and_then(|id| self.graph.index_of(id))
            .unwrap_or(self.graph.root);
        let id = node.id;
        self.graph.add_node(parent_idx, node);
        self.notify(SceneEvent::NodeAdded { target: id });
        id
    }

    /// Remove a node and its descendants. One notification fires, for the
    /// target only — the subtree is part of the same logical action.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.graph.index_of(id) else {
            return false;
        };
        if idx == self.graph.root {
            return false;
        }
        let removed = self.graph.remove_subtree(idx);
        self.selection.retain(|sel| !removed.contains(sel));
        self.notify(SceneEvent::NodeRemoved { target: id });
        true
    }

    /// Add a free-draw path. Fires both node-added and free-draw-completed:
    /// two notifications, one logical action.
    pub fn free_draw(&mut self, commands: Vec<PathCmd>) -> NodeId {
        let node = SceneNode::new(NodeId::fresh("path"), ShapeKind::Path { commands });
        let id = self.add_node(None, node);
        self.notify(SceneEvent::FreeDrawCompleted { target: id });
        id
    }

    // ─── Property edits ──────────────────────────────────────────────────

    /// One frame of a continuous drag gesture.
    pub fn drag_node(&mut self, id: NodeId, dx: f32, dy: f32) -> bool {
        let Some(node) = self.graph.get_by_id_mut(id) else {
            return false;
        };
        node.transform.x += dx;
        node.transform.y += dy;
        self.notify(SceneEvent::NodeMoveStarted { target: id });
        true
    }

    /// End of a drag gesture. The terminal modified notification.
    pub fn end_drag(&mut self, id: NodeId) -> bool {
        if self.graph.get_by_id(id).is_none() {
            return false;
        }
        self.notify(SceneEvent::NodeModified { target: Some(id) });
        true
    }

    /// Programmatic reposition (not a gesture).
    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        self.modify(id, |node| {
            node.transform.x = x;
            node.transform.y = y;
        })
    }

    pub fn scale_node(&mut self, id: NodeId, scale_x: f32, scale_y: f32) -> bool {
        self.modify(id, |node| {
            node.transform.scale_x = scale_x;
            node.transform.scale_y = scale_y;
        })
    }

    /// Set rotation in degrees.
    pub fn rotate_node(&mut self, id: NodeId, angle: f32) -> bool {
        self.modify(id, |node| node.transform.angle = angle)
    }

    pub fn set_style(&mut self, id: NodeId, style: Style) -> bool {
        self.modify(id, |node| node.style = style)
    }

    fn modify(&mut self, id: NodeId, apply: impl FnOnce(&mut SceneNode)) -> bool {
        let Some(node) = self.graph.get_by_id_mut(id) else {
            return false;
        };
        apply(node);
        self.notify(SceneEvent::NodeModified { target: Some(id) });
        true
    }

    /// Skew gets its own notification kind (fires per adjustment, like the
    /// other shear-style handles).
    pub fn skew_node(&mut self, id: NodeId, skew_x: f32, skew_y: f32) -> bool {
        let Some(node) = self.graph.get_by_id_mut(id) else {
            return false;
        };
        node.transform.skew_x = skew_x;
        node.transform.skew_y = skew_y;
        self.notify(SceneEvent::NodeSkewed { target: id });
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: NodeId) -> bool {
        if self.graph.get_by_id(id).is_none() {
            return false;
        }
        if !self.selection.contains(&id) {
            self.selection.push(id);
        }
        true
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    // ─── Snapshot codec boundary ─────────────────────────────────────────

    /// Encode the current scene. `extra_attrs` is the allow-list of
    /// non-default attributes to carry (see [`crate::snapshot`]).
    pub fn serialize_current_state(&self, extra_attrs: &[&str]) -> Snapshot {
        Snapshot::from(&snapshot::describe(&self.graph, extra_attrs))
    }

    /// Encode the current scene with the canvas's own allow-list. This is
    /// the capture attached to mutation events.
    pub fn capture_state(&self) -> Snapshot {
        let attrs: SmallVec<[&str; 2]> = self.snapshot_attrs.iter().map(String::as_str).collect();
        self.serialize_current_state(&attrs)
    }

    /// Override the extra-attributes allow-list. Takes effect for the
    /// next capture; state already queued keeps the list it was taken
    /// with.
    pub fn set_snapshot_attrs(&mut self, attrs: impl IntoIterator<Item = String>) {
        self.snapshot_attrs = attrs.into_iter().collect();
    }

    /// Drop every node. A removal notification fires per top-level node;
    /// descendants go with their parents silently.
    pub fn clear_all_content(&mut self) {
        let top_level: Vec<NodeId> = self
            .graph
            .children(self.graph.root)
            .into_iter()
            .map(|idx| self.graph.graph[idx].id)
            .collect();
        // Fresh graph rather than node-by-node removal: snapshot ordering
        // only needs to be deterministic, and a rebuilt graph has no freed
        // indices for later inserts to reuse.
        self.graph = SceneGraph::new();
        self.selection.clear();
        for id in top_level {
            self.notify(SceneEvent::NodeRemoved { target: id });
        }
    }

    /// Queue a decoded scene for loading. Content lands when
    /// [`Canvas::complete_next_load`] runs.
    pub fn load_from_scene(&mut self, scene: SceneDescription) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.pending_loads.push_back(PendingLoad { ticket, scene });
        ticket
    }

    pub fn has_pending_load(&self) -> bool {
        !self.pending_loads.is_empty()
    }

    /// Apply the oldest queued load. Each landed node fires node-added —
    /// observers see loads the same way they see interactive inserts.
    pub fn complete_next_load(&mut self) -> Option<LoadTicket> {
        let load = self.pending_loads.pop_front()?;
        for record in &load.scene.nodes {
            // Records are parent-before-child; a missing parent means a
            // hand-edited description and lands the node at the root.
            let parent_idx = record
                .parent
                .and_then(|id| self.graph.index_of(id))
                .unwrap_or(self.graph.root);
            self.graph.add_node(parent_idx, record.to_node());
            self.notify(SceneEvent::NodeAdded { target: record.id });
        }
        log::trace!(
            "LOAD {:?} landed: {} nodes",
            load.ticket,
            load.scene.nodes.len()
        );
        Some(load.ticket)
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Draw a frame now, consuming any queued render request.
    pub fn render_now(&mut self) {
        self.frames_rendered += 1;
        self.render_queued = false;
        log::trace!("RENDER frame {} ({} nodes)", self.frames_rendered, self.graph.node_count());
    }

    /// Ask for a re-render on the next scheduling opportunity.
    pub fn request_render(&mut self) {
        self.render_queued = true;
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn render_queued(&self) -> bool {
        self.render_queued
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}
