//! Throttled dispatch core: admission queue, concurrency gate, rate limiter,
//! and the dispatch loop tying them together.

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod gate;
pub mod handle;
pub mod queue;
pub mod rate_limiter;
pub mod stats;

pub use dispatcher::{DispatchLimits, Dispatcher, Spawn, DEFAULT_WINDOW};
pub use error::{AppResult, DispatchError, TaskError};
pub use events::{DispatchEvent, EventKind, EventSink, InMemoryEventSink, TracingEventSink};
pub use gate::{ConcurrencyGate, SlotGuard};
pub use handle::TaskHandle;
pub use queue::AdmissionQueue;
pub use rate_limiter::RateLimiter;
pub use stats::DispatchStats;
