//! Snapshot-based undo/redo for the Vellum canvas.
//!
//! The engine layers reversible editing on top of `vl-scene` without
//! touching the scene graph itself: it observes the canvas's mutation
//! notifications, records one full-state [`vl_scene::Snapshot`] per
//! logical user action (deduplicating the many low-level notifications a
//! single action fires), and replays stack entries through the canvas's
//! queued-load machinery with capture suppressed for the whole flight.
//!
//! Most users want [`CanvasHistory`], which owns the canvas and drives the
//! cooperative loop; [`HistoryEngine`] is the same machinery for callers
//! that manage their own event loop.
//!
//! ```
//! use vl_history::CanvasHistory;
//! use vl_scene::{Canvas, NodeId, SceneNode, ShapeKind};
//!
//! let mut history = CanvasHistory::new(Canvas::new());
//! history.pump(); // captures the initial baseline
//!
//! let node = SceneNode::new(
//!     NodeId::named("box"),
//!     ShapeKind::Rect { width: 100.0, height: 50.0 },
//! );
//! history.canvas_mut().add_node(None, node);
//! history.pump(); // records the edit
//!
//! assert!(history.undo());
//! history.pump(); // completes the replay
//! assert!(history.canvas().graph().is_empty());
//! ```

pub mod canvas_history;
pub mod engine;
pub mod error;
pub mod shortcuts;

pub use canvas_history::CanvasHistory;
pub use engine::{HistoryEngine, ReplayCallback};
pub use error::HistoryError;
pub use shortcuts::{HistoryAction, ShortcutMap};
