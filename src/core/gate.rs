//! Concurrency gate bounding in-flight tasks.
//!
//! Uses a lock-free `AtomicU32` for slot accounting (CAS reservation) and a
//! `tokio::sync::Notify` to wake the acquirer when a slot is released.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::core::DispatchError;

/// Bounds the number of simultaneously executing tasks.
#[derive(Debug)]
pub struct ConcurrencyGate {
    max_concurrent: u32,
    in_flight: AtomicU32,
    peak: AtomicU32,
    released: Notify,
}

/// A reserved execution slot. The slot is returned to the gate on drop.
#[derive(Debug)]
#[must_use = "dropping a SlotGuard releases the slot immediately"]
pub struct SlotGuard {
    gate: Arc<ConcurrencyGate>,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `max_concurrent` tasks.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] when `max_concurrent` is zero.
    pub fn new(max_concurrent: u32) -> Result<Arc<Self>, DispatchError> {
        if max_concurrent == 0 {
            return Err(DispatchError::InvalidConfig(
                "max_concurrent must be greater than 0".into(),
            ));
        }
        Ok(Arc::new(Self {
            max_concurrent,
            in_flight: AtomicU32::new(0),
            peak: AtomicU32::new(0),
            released: Notify::new(),
        }))
    }

    /// Configured slot count.
    pub const fn max_concurrent(&self) -> u32 {
        self.max_concurrent
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of slots ever held at once.
    pub fn peak(&self) -> u32 {
        self.peak.load(Ordering::Acquire)
    }

    /// True if another task may start right now.
    pub fn has_capacity(&self) -> bool {
        self.in_flight() < self.max_concurrent
    }

    /// Try to reserve a slot using a CAS loop.
    pub fn try_acquire(self: &Arc<Self>) -> Option<SlotGuard> {
        let mut current = self.in_flight.load(Ordering::Acquire);
        loop {
            if current >= self.max_concurrent {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.peak.fetch_max(current + 1, Ordering::AcqRel);
                    return Some(SlotGuard {
                        gate: Arc::clone(self),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Wait until a slot can be reserved.
    pub async fn acquire(self: &Arc<Self>) -> SlotGuard {
        loop {
            // Register interest before checking so a release between the check
            // and the await is not lost.
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(slot) = self.try_acquire() {
                return slot;
            }
            tracing::trace!(in_flight = self.in_flight(), "gate saturated, waiting for release");
            notified.await;
        }
    }

    fn release(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "released a slot that was never held");
        self.released.notify_one();
    }
}

impl SlotGuard {
    /// Slots held on the owning gate, including this one.
    pub fn in_flight(&self) -> u32 {
        self.gate.in_flight()
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.gate.release();
    }
}
