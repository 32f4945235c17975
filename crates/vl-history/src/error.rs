use thiserror::Error;
use vl_scene::SnapshotError;

/// Errors surfaced by the history engine.
///
/// Running out of undo/redo entries is deliberately *not* here — that is
/// steady-state behavior and the operations report it as a `false` return,
/// not a failure.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A replay is already in flight; undo/redo/clear are serialized.
    #[error("a replay is already in flight")]
    ReplayInFlight,

    /// The snapshot to restore failed to decode. The stacks and the
    /// processing flag are left as they were before the call.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
