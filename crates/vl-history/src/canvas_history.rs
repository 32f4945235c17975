//! Canvas + history engine, wired together.
//!
//! [`CanvasHistory`] owns a [`Canvas`] and a [`HistoryEngine`] and drives
//! the cooperative loop between them: mutations queue notifications on the
//! canvas, [`CanvasHistory::pump`] drains them into the engine, completes
//! queued loads, and finishes in-flight replays.
//!
//! The initial baseline is captured as a one-shot deferred task: never in
//! the constructor, only on the first `pump` after any queued content load
//! has landed — an incomplete scene never becomes the permanent floor of
//! the undo stack.

use crate::engine::HistoryEngine;
use vl_scene::{Canvas, SceneEvent};

/// A canvas with reversible editing.
pub struct CanvasHistory {
    canvas: Canvas,
    engine: HistoryEngine,
    initial_capture_pending: bool,
}

impl CanvasHistory {
    /// Wrap a canvas. The engine attaches immediately; the initial
    /// baseline is deferred to the first `pump`.
    #[must_use]
    pub fn new(mut canvas: Canvas) -> Self {
        let mut engine = HistoryEngine::new();
        engine.attach(&mut canvas);
        Self {
            canvas,
            engine,
            initial_capture_pending: true,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Mutable access to the canvas. Edit through this, then `pump`.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn engine(&self) -> &HistoryEngine {
        &self.engine
    }

    /// Run the cooperative loop until quiescent: complete queued loads,
    /// drain notifications through the engine, finish in-flight replays,
    /// and take the deferred initial baseline once the scene has settled.
    ///
    /// Returns every notification delivered during this pump, in order,
    /// for the caller's own observers.
    pub fn pump(&mut self) -> Vec<SceneEvent> {
        let mut seen = Vec::new();
        loop {
            let mut progressed = false;

            if let Some(ticket) = self.canvas.complete_next_load() {
                progressed = true;
                // Drain the load's own notifications while the gate is
                // still up, so the recorder sees and rejects them.
                self.drain(&mut seen);
                if self.engine.replay_ticket() == Some(ticket) {
                    self.engine.complete_replay(&mut self.canvas);
                }
            }

            if self.drain(&mut seen) {
                progressed = true;
            }

            if self.initial_capture_pending
                && !self.canvas.has_pending_load()
                && !self.engine.is_replaying()
            {
                self.engine.save_initial_state(&mut self.canvas);
                self.initial_capture_pending = false;
                progressed = true;
            }

            if !progressed {
                return seen;
            }
        }
    }

    fn drain(&mut self, seen: &mut Vec<SceneEvent>) -> bool {
        let mut any = false;
        while let Some((event, state)) = self.canvas.take_event_with_state() {
            any = true;
            self.engine.observe(&mut self.canvas, &event, state.as_ref());
            seen.push(event);
        }
        any
    }

    // ─── Public history surface ──────────────────────────────────────────

    /// Start undoing the last action. Returns whether a replay started;
    /// rejections (already replaying, corrupt snapshot) are logged, never
    /// raised — matching the silent no-op contract of the surface.
    pub fn undo(&mut self) -> bool {
        match self.engine.begin_undo(&mut self.canvas, None) {
            Ok(started) => started,
            Err(err) => {
                log::warn!("undo rejected: {err}");
                false
            }
        }
    }

    /// Like [`CanvasHistory::undo`], invoking `callback` once the replay
    /// has fully completed (on a later `pump`).
    pub fn undo_with(&mut self, callback: impl FnOnce() + 'static) -> bool {
        match self
            .engine
            .begin_undo(&mut self.canvas, Some(Box::new(callback)))
        {
            Ok(started) => started,
            Err(err) => {
                log::warn!("undo rejected: {err}");
                false
            }
        }
    }

    /// Start re-applying the most recently undone action.
    pub fn redo(&mut self) -> bool {
        match self.engine.begin_redo(&mut self.canvas, None) {
            Ok(started) => started,
            Err(err) => {
                log::warn!("redo rejected: {err}");
                false
            }
        }
    }

    pub fn redo_with(&mut self, callback: impl FnOnce() + 'static) -> bool {
        match self
            .engine
            .begin_redo(&mut self.canvas, Some(Box::new(callback)))
        {
            Ok(started) => started,
            Err(err) => {
                log::warn!("redo rejected: {err}");
                false
            }
        }
    }

    pub fn clear_history(&mut self) -> bool {
        match self.engine.clear_history(&mut self.canvas) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("clear_history rejected: {err}");
                false
            }
        }
    }

    /// Re-baseline on the current scene immediately (also cancels the
    /// pending deferred capture).
    pub fn save_initial_state(&mut self) {
        self.engine.save_initial_state(&mut self.canvas);
        self.initial_capture_pending = false;
    }

    pub fn enable_recording(&mut self) {
        self.engine.enable_recording(&mut self.canvas);
    }

    pub fn disable_recording(&mut self) {
        self.engine.disable_recording();
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }

    /// Re-bind the mutation subscriptions (no-op while attached).
    pub fn attach(&mut self) {
        self.engine.attach(&mut self.canvas);
    }

    /// Unbind every subscription taken at attach time. Call before
    /// disposing of the owner.
    pub fn detach(&mut self) {
        self.engine.detach(&mut self.canvas);
    }

    /// Tear down and hand the canvas back.
    pub fn into_canvas(mut self) -> Canvas {
        self.engine.detach(&mut self.canvas);
        self.canvas
    }
}
