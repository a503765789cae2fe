//! Dispatcher statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of dispatcher activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Configured concurrency bound.
    pub max_concurrent: u32,
    /// Configured start budget per window.
    pub requests_per_second: u32,
    /// Tasks currently executing.
    pub active: u32,
    /// Highest number of tasks ever executing at once.
    pub peak_concurrent: u32,
    /// Tasks submitted but not yet dispatched or cancelled.
    pub queued: u64,
    /// Starts still counted in the current rate window.
    pub starts_in_window: u64,
    /// Total tasks submitted.
    pub submitted: u64,
    /// Total tasks dispatched.
    pub dispatched: u64,
    /// Tasks that returned `Ok`.
    pub succeeded: u64,
    /// Tasks that returned `Err`.
    pub failed: u64,
    /// Tasks that panicked.
    pub panicked: u64,
    /// Tasks cancelled by shutdown before dispatch.
    pub cancelled: u64,
    /// Dispatches that had to wait on the rate window.
    pub rate_limited_waits: u64,
}

impl DispatchStats {
    /// Tasks that reached a terminal state.
    pub const fn settled(&self) -> u64 {
        self.succeeded + self.failed + self.panicked + self.cancelled
    }
}

/// Internal counters (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    pub submitted: AtomicU64,
    pub dispatched: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub panicked: AtomicU64,
    pub cancelled: AtomicU64,
    pub rate_limited_waits: AtomicU64,
}

impl DispatchCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Fill the counter-backed fields of a snapshot.
    pub fn snapshot_into(&self, stats: &mut DispatchStats) {
        stats.submitted = self.submitted.load(Ordering::Relaxed);
        stats.dispatched = self.dispatched.load(Ordering::Relaxed);
        stats.succeeded = self.succeeded.load(Ordering::Relaxed);
        stats.failed = self.failed.load(Ordering::Relaxed);
        stats.panicked = self.panicked.load(Ordering::Relaxed);
        stats.cancelled = self.cancelled.load(Ordering::Relaxed);
        stats.rate_limited_waits = self.rate_limited_waits.load(Ordering::Relaxed);
        stats.queued = stats
            .submitted
            .saturating_sub(stats.dispatched)
            .saturating_sub(stats.cancelled);
    }
}
