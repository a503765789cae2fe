//! Lifecycle event sinks.
//!
//! Every entry moves through `Queued -> Dispatched -> {Succeeded | Failed | Panicked}`,
//! or `Queued -> Cancelled` if the dispatcher shuts down first. A sink attached to
//! a dispatcher observes each transition exactly once.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::util::TaskId;

/// Lifecycle transition recorded for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Accepted into the admission queue.
    Queued,
    /// Cleared by gate and limiter; the task is now running.
    Dispatched,
    /// Task returned `Ok`.
    Succeeded,
    /// Task returned `Err`.
    Failed,
    /// Task panicked.
    Panicked,
    /// Dropped unstarted because the dispatcher shut down.
    Cancelled,
}

impl EventKind {
    /// True for states an entry never leaves.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Queued | Self::Dispatched)
    }
}

/// A single lifecycle event.
#[derive(Debug, Clone)]
pub struct DispatchEvent {
    /// Task the event belongs to.
    pub task_id: TaskId,
    /// Transition that occurred.
    pub kind: EventKind,
    /// Monotonic time of the transition.
    pub at: Instant,
    /// Tasks executing when the event was recorded.
    pub in_flight: u32,
}

impl DispatchEvent {
    /// Build an event stamped with the current instant.
    pub fn now(task_id: TaskId, kind: EventKind, in_flight: u32) -> Self {
        Self {
            task_id,
            kind,
            at: Instant::now(),
            in_flight,
        }
    }
}

/// Receiver for lifecycle events.
///
/// Called from the dispatch loop and from task completion paths, so
/// implementations must be cheap and must not block.
pub trait EventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: DispatchEvent);
}

/// Bounded in-memory sink for testing and dev. Clones share one buffer.
#[derive(Clone)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<VecDeque<DispatchEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink that keeps the most recent `max_events` events.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events of one kind, oldest first.
    pub fn of_kind(&self, kind: EventKind) -> Vec<DispatchEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: DispatchEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink that forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: DispatchEvent) {
        tracing::debug!(
            task_id = event.task_id,
            kind = ?event.kind,
            in_flight = event.in_flight,
            "dispatch event"
        );
    }
}
