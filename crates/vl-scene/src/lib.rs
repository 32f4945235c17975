pub mod canvas;
pub mod events;
pub mod id;
pub mod model;
pub mod snapshot;

pub use canvas::{Canvas, LoadTicket};
pub use events::{EventKind, SceneEvent, Subscription};
pub use id::NodeId;
pub use model::*;
pub use snapshot::{SceneDescription, Snapshot, SnapshotError};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
