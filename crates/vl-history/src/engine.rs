//! The history engine: observer, recorder, stacks, replayer.
//!
//! The engine turns a stream of low-level mutation notifications into a
//! stack of full-state snapshots, exactly one per logical user action:
//!
//! - the **observer** (`observe`) classifies the six notification kinds it
//!   subscribes to and tracks the in-gesture moving flag;
//! - the **recorder** (`record_if_needed`) holds the single authoritative
//!   suppression gate, the excluded-target rule, and snapshot dedup,
//!   committing the state captured when each notification fired so edits
//!   batched before one drain still land one entry each;
//! - the **replayer** (`begin_undo` / `begin_redo` / `complete_replay`)
//!   restores a stack entry through the canvas's queued-load machinery
//!   with capture suppressed for the whole flight.
//!
//! Replays are transactional: the stacks move only once the restored scene
//! has actually landed, so a failed decode leaves history untouched.

use crate::error::HistoryError;
use smallvec::SmallVec;
use vl_scene::{Canvas, EventKind, LoadTicket, NodeId, SceneEvent, Snapshot, Subscription};

/// Invoked when the replay that a call started has fully completed.
pub type ReplayCallback = Box<dyn FnOnce() + 'static>;

/// Which stack a replay is walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayKind {
    Undo,
    Redo,
}

/// One in-flight replay. Exists from `begin_*` until `complete_replay`.
struct Replay {
    ticket: LoadTicket,
    kind: ReplayKind,
    /// Processing value to restore on completion (nesting-safe: an
    /// administratively disabled engine stays disabled afterwards).
    resume_processing: bool,
    /// The snapshot being restored; becomes `next_state` on success.
    restored: Snapshot,
    callback: Option<ReplayCallback>,
}

/// Snapshot-based undo/redo over one [`Canvas`].
///
/// One engine per canvas; all flags and stacks are instance state.
pub struct HistoryEngine {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// The most recently committed snapshot, used purely for dedup.
    next_state: Option<Snapshot>,
    /// Suppression gate: true during replay or while recording is
    /// administratively disabled.
    processing: bool,
    /// True while a continuous drag gesture is in progress.
    moving: bool,
    /// Subscription tokens captured at `attach`, reused at `detach`.
    subscriptions: SmallVec<[Subscription; 6]>,
    replay: Option<Replay>,
}

impl HistoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            next_state: None,
            processing: false,
            moving: false,
            subscriptions: SmallVec::new(),
            replay: None,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Subscribe to the six mutation notification kinds. Idempotent.
    pub fn attach(&mut self, canvas: &mut Canvas) {
        if !self.subscriptions.is_empty() {
            return;
        }
        for kind in [
            EventKind::NodeAdded,
            EventKind::NodeRemoved,
            EventKind::NodeModified,
            EventKind::NodeSkewed,
            EventKind::FreeDrawCompleted,
            EventKind::NodeMoveStarted,
        ] {
            self.subscriptions.push(canvas.subscribe(kind));
        }
    }

    /// Remove every subscription taken at `attach`, using the tokens
    /// captured back then.
    pub fn detach(&mut self, canvas: &mut Canvas) {
        for token in self.subscriptions.drain(..) {
            canvas.unsubscribe(token);
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    // ─── Observer ────────────────────────────────────────────────────────

    /// Classify one drained notification. `state` is the scene state
    /// captured when the notification fired. Only the six subscribed
    /// kinds react; anything else (including the engine's own `history:*`
    /// notifications) passes through untouched.
    pub fn observe(&mut self, canvas: &mut Canvas, event: &SceneEvent, state: Option<&Snapshot>) {
        if !self.is_attached() {
            return;
        }
        match event {
            // A move is a multi-frame gesture; only its end matters.
            SceneEvent::NodeMoveStarted { .. } => self.moving = true,
            SceneEvent::NodeModified { target } => {
                if self.moving {
                    self.moving = false;
                }
                self.record_if_needed(canvas, *target, state);
            }
            SceneEvent::NodeAdded { target }
            | SceneEvent::NodeRemoved { target }
            | SceneEvent::NodeSkewed { target }
            | SceneEvent::FreeDrawCompleted { target } => {
                self.record_if_needed(canvas, Some(*target), state);
            }
            _ => {}
        }
    }

    // ─── Recorder ────────────────────────────────────────────────────────

    /// Commit a snapshot to the undo stack, unless the gate is up, the
    /// target is excluded, or the state is unchanged. `state` is the
    /// capture taken when the notification fired; without one (the
    /// re-enable path) the live scene is captured instead.
    pub fn record_if_needed(
        &mut self,
        canvas: &mut Canvas,
        target: Option<NodeId>,
        state: Option<&Snapshot>,
    ) {
        if self.processing || self.moving {
            return;
        }
        if let Some(id) = target
            && canvas.node(id).is_some_and(|n| n.exclude_from_export)
        {
            return;
        }

        let snapshot = match state {
            Some(state) => state.clone(),
            None => canvas.capture_state(),
        };
        if self.next_state.as_ref() == Some(&snapshot) {
            return; // redundant notification for an already-recorded action
        }

        self.undo_stack.push(snapshot.clone());
        self.next_state = Some(snapshot.clone());
        // A committed forward edit invalidates the redo branch.
        self.redo_stack.clear();
        canvas.notify(SceneEvent::HistoryAppend {
            snapshot,
            initial: false,
        });
    }

    /// Capture the current scene as the permanent baseline, discarding any
    /// entries recorded before it.
    pub fn save_initial_state(&mut self, canvas: &mut Canvas) {
        let snapshot = canvas.capture_state();
        self.undo_stack.clear();
        self.undo_stack.push(snapshot.clone());
        self.next_state = Some(snapshot.clone());
        canvas.notify(SceneEvent::HistoryAppend {
            snapshot,
            initial: true,
        });
    }

    // ─── Recording toggles ───────────────────────────────────────────────

    /// Suppress capture until `enable_recording`. Not nesting-aware on its
    /// own; replay saves and restores the flag around itself.
    pub fn disable_recording(&mut self) {
        self.processing = true;
    }

    /// Resume capture, then immediately attempt one targetless capture so
    /// edits made while disabled collapse into a single entry.
    pub fn enable_recording(&mut self, canvas: &mut Canvas) {
        self.processing = false;
        self.record_if_needed(canvas, None, None);
    }

    // ─── Replayer ────────────────────────────────────────────────────────

    /// Start restoring the state before the current one. Returns
    /// `Ok(false)` when already at the baseline (the initial snapshot is
    /// never undone past).
    pub fn begin_undo(
        &mut self,
        canvas: &mut Canvas,
        callback: Option<ReplayCallback>,
    ) -> Result<bool, HistoryError> {
        if self.undo_stack.len() <= 1 {
            return Ok(false);
        }
        let restored = self.undo_stack[self.undo_stack.len() - 2].clone();
        self.begin_replay(canvas, ReplayKind::Undo, restored, callback)?;
        Ok(true)
    }

    /// Start re-applying the most recently undone state.
    pub fn begin_redo(
        &mut self,
        canvas: &mut Canvas,
        callback: Option<ReplayCallback>,
    ) -> Result<bool, HistoryError> {
        let Some(restored) = self.redo_stack.last().cloned() else {
            return Ok(false);
        };
        self.begin_replay(canvas, ReplayKind::Redo, restored, callback)?;
        Ok(true)
    }

    fn begin_replay(
        &mut self,
        canvas: &mut Canvas,
        kind: ReplayKind,
        restored: Snapshot,
        callback: Option<ReplayCallback>,
    ) -> Result<(), HistoryError> {
        if self.replay.is_some() {
            return Err(HistoryError::ReplayInFlight);
        }

        let resume_processing = self.processing;
        self.processing = true;

        let scene = match restored.decode() {
            Ok(scene) => scene,
            Err(err) => {
                // Never leave the engine stuck suppressed; stacks were not
                // touched yet, so history stays consistent.
                self.processing = resume_processing;
                return Err(err.into());
            }
        };

        canvas.deselect_all();
        canvas.clear_all_content();
        let ticket = canvas.load_from_scene(scene);

        self.replay = Some(Replay {
            ticket,
            kind,
            resume_processing,
            restored,
            callback,
        });
        Ok(())
    }

    /// The load ticket of the in-flight replay, if any. The pump matches
    /// completed loads against this.
    pub fn replay_ticket(&self) -> Option<LoadTicket> {
        self.replay.as_ref().map(|r| r.ticket)
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    /// Finish the in-flight replay after its load has landed: commit the
    /// stack movement, force a full re-render, publish the event, restore
    /// the gate, and run the caller's callback.
    pub fn complete_replay(&mut self, canvas: &mut Canvas) {
        let Some(replay) = self.replay.take() else {
            return;
        };

        match replay.kind {
            ReplayKind::Undo => {
                if let Some(current) = self.undo_stack.pop() {
                    self.redo_stack.push(current);
                }
            }
            ReplayKind::Redo => {
                if let Some(snapshot) = self.redo_stack.pop() {
                    self.undo_stack.push(snapshot);
                }
            }
        }
        self.next_state = Some(replay.restored);

        canvas.render_now();
        // Guarantee a follow-up pass in case render scheduling coalesced.
        canvas.request_render();
        canvas.notify(match replay.kind {
            ReplayKind::Undo => SceneEvent::HistoryUndo,
            ReplayKind::Redo => SceneEvent::HistoryRedo,
        });

        self.processing = replay.resume_processing;
        if let Some(callback) = replay.callback {
            callback();
        }
    }

    /// Drop both stacks unconditionally. No re-seed: the next baseline
    /// comes from `save_initial_state` or the next recorded edit.
    pub fn clear_history(&mut self, canvas: &mut Canvas) -> Result<(), HistoryError> {
        if self.replay.is_some() {
            return Err(HistoryError::ReplayInFlight);
        }
        self.undo_stack.clear();
        self.redo_stack.clear();
        canvas.notify(SceneEvent::HistoryClear);
        Ok(())
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new()
    }
}
