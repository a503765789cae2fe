//! # Throttled Dispatch
//!
//! A throttled task dispatcher for async workloads that call rate-limited
//! upstreams.
//!
//! Tasks are opaque async closures. The dispatcher queues them in arrival order
//! and starts them under two bounds at once:
//!
//! - **Concurrency**: at most `max_concurrent` tasks executing at any instant.
//! - **Start rate**: at most `requests_per_second` task *starts* within any
//!   trailing window (one second by default), evaluated as a sliding log of
//!   start times rather than a fixed bucket.
//!
//! Each submission returns a [`TaskHandle`](core::TaskHandle) that settles
//! exactly once with the task's own value or error. A failing or panicking task
//! only affects its own handle; the queue keeps moving.
//!
//! ## Key Features
//!
//! - **FIFO admission**: start order equals submission order
//! - **Self-driving loop**: a released slot wakes the dispatch loop; no polling
//! - **Guaranteed slot release**: slots are RAII guards, so panics cannot leak them
//! - **Lifecycle events**: optional [`EventSink`](core::EventSink) observes every transition
//! - **Config from JSON or environment**: see [`config::DispatcherConfig`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use throttled_dispatch::core::{DispatchLimits, Dispatcher};
//!
//! let dispatcher = Dispatcher::new(DispatchLimits::new(2, 5))?;
//!
//! let handles: Vec<_> = ids
//!     .into_iter()
//!     .map(|id| dispatcher.submit(move || fetch_show(id)))
//!     .collect();
//!
//! for handle in handles {
//!     match handle.await {
//!         Ok(show) => store(show).await?,
//!         Err(e) => tracing::warn!("fetch failed: {e}"),
//!     }
//! }
//! ```
//!
//! For complete examples, see `tests/dispatcher_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Dispatcher core: queue, gate, limiter, and dispatch loop.
pub mod core;
/// Configuration models for dispatchers.
pub mod config;
/// Builders to construct dispatchers from configuration.
pub mod builders;
/// Runtime adapters hosting the dispatch loop.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{DispatchError, DispatchLimits, Dispatcher, TaskError, TaskHandle};
