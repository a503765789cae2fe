//! Task identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier assigned to each submitted task, unique per dispatcher.
pub type TaskId = u64;

/// Monotonic id source. The first id handed out is 1.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    last: AtomicU64,
}

impl TaskIdGenerator {
    /// Create a generator starting at 1.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Take the next id.
    pub fn next_id(&self) -> TaskId {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}
