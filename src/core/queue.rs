//! FIFO admission queue for pending entries.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

struct QueueState<T> {
    entries: VecDeque<T>,
    closed: bool,
}

/// Arrival-ordered queue with async wait-for-head.
///
/// Entries are never reordered. Once closed, the queue refuses new entries and
/// hands them back to the caller, so nothing can be stranded after shutdown.
pub struct AdmissionQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Notify,
}

impl<T> AdmissionQueue<T> {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                closed: false,
            }),
            available: Notify::new(),
        }
    }

    /// Append an entry to the back of the queue.
    ///
    /// # Errors
    ///
    /// Returns the entry unchanged if the queue has been closed.
    pub fn push(&self, entry: T) -> Result<usize, T> {
        let depth = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(entry);
            }
            state.entries.push_back(entry);
            state.entries.len()
        };
        self.available.notify_one();
        Ok(depth)
    }

    /// Remove the head entry, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().entries.pop_front()
    }

    /// Wait for and remove the head entry.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(entry) = state.entries.pop_front() {
                    return Some(entry);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Close the queue and take every entry still waiting, oldest first.
    pub fn close(&self) -> Vec<T> {
        let drained = {
            let mut state = self.state.lock();
            state.closed = true;
            state.entries.drain(..).collect()
        };
        self.available.notify_waiters();
        drained
    }

    /// True once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of waiting entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// True if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for AdmissionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
