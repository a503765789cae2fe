//! Sliding-window limiter over task start times.
//!
//! The limiter keeps one timestamp per granted start. A timestamp stops counting
//! once `window` has fully elapsed since it was recorded, so at most `max_starts`
//! starts ever fall inside any trailing window. This is a sliding log, not a
//! fixed bucket: there is no boundary at which the budget resets in bulk.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::DispatchError;

/// Sliding-window start limiter.
#[derive(Debug)]
pub struct RateLimiter {
    max_starts: u32,
    window: Duration,
    /// Start timestamps, oldest at the front.
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_starts` starts per `window`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] if either value is zero. A zero
    /// budget would never grant clearance.
    pub fn new(max_starts: u32, window: Duration) -> Result<Self, DispatchError> {
        if max_starts == 0 {
            return Err(DispatchError::InvalidConfig(
                "requests_per_second must be greater than 0".into(),
            ));
        }
        if window.is_zero() {
            return Err(DispatchError::InvalidConfig(
                "rate window must be greater than 0".into(),
            ));
        }
        Ok(Self {
            max_starts,
            window,
            starts: Mutex::new(VecDeque::with_capacity((max_starts as usize).min(1024))),
        })
    }

    /// Configured start budget per window.
    pub const fn max_starts(&self) -> u32 {
        self.max_starts
    }

    /// Configured window length.
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Try to record a start at `now`.
    ///
    /// Returns `Ok(())` and logs `now` when budget remains; otherwise returns how
    /// long until the oldest logged start leaves the window.
    ///
    /// # Errors
    ///
    /// `Err(wait)` when the window is full. `wait` is never negative and is
    /// at least one millisecond so callers cannot spin.
    pub fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        let mut starts = self.starts.lock();
        self.admit(&mut starts, now)
    }

    /// Suspend until a start is permitted, then record it.
    ///
    /// Each wake re-runs the check from the top: other callers may have filled
    /// the window while this one slept. Returns the number of times it had to
    /// wait.
    pub async fn await_clearance(&self) -> u32 {
        let mut waits = 0;
        loop {
            // Read the clock under the lock so the log stays ordered across callers.
            let admitted = {
                let mut starts = self.starts.lock();
                self.admit(&mut starts, Instant::now())
            };
            match admitted {
                Ok(()) => return waits,
                Err(wait) => {
                    waits += 1;
                    tracing::debug!(wait_ms = wait.as_millis() as u64, "rate window full, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Number of starts still counted in the window ending at `now`.
    pub fn in_window(&self, now: Instant) -> usize {
        let mut starts = self.starts.lock();
        Self::prune(&mut starts, now, self.window);
        starts.len()
    }

    fn admit(&self, starts: &mut VecDeque<Instant>, now: Instant) -> Result<(), Duration> {
        Self::prune(starts, now, self.window);

        if starts.len() < self.max_starts as usize {
            starts.push_back(now);
            return Ok(());
        }

        // An expiry past the end of the clock never arrives; wait as long as possible.
        let wait = starts
            .front()
            .map_or(Duration::ZERO, |oldest| {
                oldest
                    .checked_add(self.window)
                    .map_or(Duration::MAX, |expires| expires.saturating_duration_since(now))
            })
            .max(Duration::from_millis(1));
        Err(wait)
    }

    fn prune(starts: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while starts
            .front()
            .and_then(|t| t.checked_add(window))
            .is_some_and(|expires| expires <= now)
        {
            starts.pop_front();
        }
    }
}
