//! Mutation notifications and the subscription hub.
//!
//! The canvas publishes a notification for every mutation it performs;
//! interested parties subscribe by kind and drain delivered events from a
//! FIFO queue on their own schedule (single-threaded cooperative model —
//! no callbacks fire inside the mutation call itself).
//!
//! Subscriptions are identified by an opaque token returned at subscribe
//! time. Unsubscribing takes that same token, so there is no way to build
//! the classic "unbind with a freshly bound handler" no-op bug.

use crate::id::NodeId;
use crate::snapshot::Snapshot;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// The kinds of notification the canvas can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeAdded,
    NodeRemoved,
    NodeModified,
    NodeSkewed,
    FreeDrawCompleted,
    NodeMoveStarted,
    HistoryAppend,
    HistoryUndo,
    HistoryRedo,
    HistoryClear,
}

/// A single notification with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    NodeAdded { target: NodeId },
    NodeRemoved { target: NodeId },
    /// Covers programmatic property changes and the end of a drag,
    /// scale or rotate gesture. `target` is absent for document-wide
    /// modifications.
    NodeModified { target: Option<NodeId> },
    NodeSkewed { target: NodeId },
    FreeDrawCompleted { target: NodeId },
    /// Fired per frame while a continuous drag gesture is in progress.
    NodeMoveStarted { target: NodeId },
    HistoryAppend { snapshot: Snapshot, initial: bool },
    HistoryUndo,
    HistoryRedo,
    HistoryClear,
}

impl SceneEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SceneEvent::NodeAdded { .. } => EventKind::NodeAdded,
            SceneEvent::NodeRemoved { .. } => EventKind::NodeRemoved,
            SceneEvent::NodeModified { .. } => EventKind::NodeModified,
            SceneEvent::NodeSkewed { .. } => EventKind::NodeSkewed,
            SceneEvent::FreeDrawCompleted { .. } => EventKind::FreeDrawCompleted,
            SceneEvent::NodeMoveStarted { .. } => EventKind::NodeMoveStarted,
            SceneEvent::HistoryAppend { .. } => EventKind::HistoryAppend,
            SceneEvent::HistoryUndo => EventKind::HistoryUndo,
            SceneEvent::HistoryRedo => EventKind::HistoryRedo,
            SceneEvent::HistoryClear => EventKind::HistoryClear,
        }
    }

    /// The node the event is about, if any.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            SceneEvent::NodeAdded { target }
            | SceneEvent::NodeRemoved { target }
            | SceneEvent::NodeSkewed { target }
            | SceneEvent::FreeDrawCompleted { target }
            | SceneEvent::NodeMoveStarted { target } => Some(*target),
            SceneEvent::NodeModified { target } => *target,
            _ => None,
        }
    }
}

/// An opaque subscription token. Keep it to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Subscribe/emit/drain hub owned by the canvas.
///
/// Queued events may carry the scene state captured when they fired, so
/// observers that drain later still see per-action state rather than
/// whatever the scene looks like at drain time.
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: SmallVec<[(Subscription, EventKind); 8]>,
    queue: VecDeque<(SceneEvent, Option<Snapshot>)>,
    next_token: u64,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in one event kind. Each call yields a distinct
    /// token, even for the same kind.
    pub fn subscribe(&mut self, kind: EventKind) -> Subscription {
        self.next_token += 1;
        let token = Subscription(self.next_token);
        self.subscribers.push((token, kind));
        token
    }

    /// Remove a subscription. Returns false if the token was already gone.
    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(t, _)| *t != token);
        self.subscribers.len() != before
    }

    pub fn is_observed(&self, kind: EventKind) -> bool {
        self.subscribers.iter().any(|(_, k)| *k == kind)
    }

    /// Queue an event for delivery if anyone is subscribed to its kind.
    pub fn emit(&mut self, event: SceneEvent) {
        self.emit_with_state(event, None);
    }

    /// Queue an event together with the scene state captured when it
    /// fired.
    pub fn emit_with_state(&mut self, event: SceneEvent, state: Option<Snapshot>) {
        if self.is_observed(event.kind()) {
            self.queue.push_back((event, state));
        }
    }

    /// Pop the oldest delivered event.
    pub fn take(&mut self) -> Option<SceneEvent> {
        self.queue.pop_front().map(|(event, _)| event)
    }

    /// Pop the oldest delivered event with its captured state.
    pub fn take_with_state(&mut self) -> Option<(SceneEvent, Option<Snapshot>)> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unobserved_kinds_are_dropped() {
        let mut hub = EventHub::new();
        hub.emit(SceneEvent::NodeAdded {
            target: NodeId::named("n"),
        });
        assert_eq!(hub.pending(), 0);

        hub.subscribe(EventKind::NodeAdded);
        hub.emit(SceneEvent::NodeAdded {
            target: NodeId::named("n"),
        });
        assert_eq!(hub.pending(), 1);
    }

    #[test]
    fn delivery_is_fifo() {
        let mut hub = EventHub::new();
        hub.subscribe(EventKind::NodeAdded);
        hub.subscribe(EventKind::NodeRemoved);
        let a = NodeId::named("a");
        hub.emit(SceneEvent::NodeAdded { target: a });
        hub.emit(SceneEvent::NodeRemoved { target: a });

        assert_eq!(hub.take(), Some(SceneEvent::NodeAdded { target: a }));
        assert_eq!(hub.take(), Some(SceneEvent::NodeRemoved { target: a }));
        assert_eq!(hub.take(), None);
    }

    #[test]
    fn unsubscribe_uses_the_original_token() {
        let mut hub = EventHub::new();
        let token = hub.subscribe(EventKind::NodeModified);
        assert!(hub.is_observed(EventKind::NodeModified));

        assert!(hub.unsubscribe(token));
        assert!(!hub.is_observed(EventKind::NodeModified));
        // Second removal is a no-op, not a panic.
        assert!(!hub.unsubscribe(token));

        hub.emit(SceneEvent::NodeModified { target: None });
        assert_eq!(hub.pending(), 0);
    }

    #[test]
    fn state_rides_with_its_event() {
        let mut hub = EventHub::new();
        hub.subscribe(EventKind::NodeAdded);
        let snap = Snapshot::from_json("{\"nodes\":[]}".into());
        hub.emit_with_state(
            SceneEvent::NodeAdded {
                target: NodeId::named("n"),
            },
            Some(snap.clone()),
        );

        let (event, state) = hub.take_with_state().unwrap();
        assert_eq!(event.kind(), EventKind::NodeAdded);
        assert_eq!(state, Some(snap));
    }

    #[test]
    fn two_subscribers_one_delivery() {
        // The queue is shared; multiple subscriptions to a kind do not
        // duplicate events.
        let mut hub = EventHub::new();
        hub.subscribe(EventKind::NodeAdded);
        hub.subscribe(EventKind::NodeAdded);
        hub.emit(SceneEvent::NodeAdded {
            target: NodeId::named("x"),
        });
        assert_eq!(hub.pending(), 1);
    }
}
