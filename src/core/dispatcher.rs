//! Throttled dispatcher and its dispatch loop.
//!
//! A single persistent loop per dispatcher moves entries out of the admission
//! queue. For each entry it reserves a concurrency slot, waits for rate
//! clearance, then spawns the task with the slot moved into it. Releasing the
//! slot on completion wakes the loop, so no poller or fixed timer is involved.
//!
//! Because only the loop dequeues, start order is submission order.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, trace, warn};

use crate::core::events::{DispatchEvent, EventKind, EventSink};
use crate::core::gate::{ConcurrencyGate, SlotGuard};
use crate::core::queue::AdmissionQueue;
use crate::core::rate_limiter::RateLimiter;
use crate::core::stats::{DispatchCounters, DispatchStats};
use crate::core::{DispatchError, TaskError, TaskHandle};
use crate::runtime::TokioSpawner;
use crate::util::{TaskId, TaskIdGenerator};

/// Default rate window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a future to run to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// The two throttling bounds plus the window they apply over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    /// Maximum tasks executing at once.
    pub max_concurrent: u32,
    /// Maximum task starts within any trailing `window`.
    pub requests_per_second: u32,
    /// Length of the rate window.
    pub window: Duration,
}

impl DispatchLimits {
    /// Limits over the default one-second window.
    pub const fn new(max_concurrent: u32, requests_per_second: u32) -> Self {
        Self {
            max_concurrent,
            requests_per_second,
            window: DEFAULT_WINDOW,
        }
    }

    /// Override the rate window.
    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Reject zero bounds.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.max_concurrent == 0 {
            return Err(DispatchError::InvalidConfig(
                "max_concurrent must be greater than 0".into(),
            ));
        }
        if self.requests_per_second == 0 {
            return Err(DispatchError::InvalidConfig(
                "requests_per_second must be greater than 0".into(),
            ));
        }
        if self.window.is_zero() {
            return Err(DispatchError::InvalidConfig(
                "window must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeeded,
    Failed,
    Panicked,
}

impl From<Outcome> for EventKind {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => Self::Succeeded,
            Outcome::Failed => Self::Failed,
            Outcome::Panicked => Self::Panicked,
        }
    }
}

/// Type-erased task. Invoking it runs the task and settles its handle.
type Job = Box<dyn FnOnce() -> BoxFuture<'static, Outcome> + Send>;

/// A queued task paired with the channel that settles its handle.
struct PendingEntry {
    id: TaskId,
    enqueued_at: Instant,
    job: Job,
}

/// State shared by handles, the dispatch loop, and running tasks.
struct Shared {
    limits: DispatchLimits,
    queue: AdmissionQueue<PendingEntry>,
    gate: Arc<ConcurrencyGate>,
    limiter: RateLimiter,
    ids: TaskIdGenerator,
    counters: DispatchCounters,
    events: Option<Arc<dyn EventSink>>,
    shutdown: CancellationToken,
}

impl Shared {
    fn emit(&self, task_id: TaskId, kind: EventKind, in_flight: u32) {
        if let Some(sink) = &self.events {
            sink.record(DispatchEvent::now(task_id, kind, in_flight));
        }
    }

    /// Settle an undispatched entry as cancelled. Dropping the job drops the
    /// sender, which the handle reports as [`TaskError::Cancelled`].
    fn cancel_entry(&self, entry: PendingEntry) {
        debug!(task_id = entry.id, "cancelling undispatched task");
        DispatchCounters::bump(&self.counters.cancelled);
        self.emit(entry.id, EventKind::Cancelled, self.gate.in_flight());
        drop(entry);
    }

    fn close_queue(&self) {
        let drained = self.queue.close();
        if !drained.is_empty() {
            warn!(count = drained.len(), "dispatcher closed with queued tasks");
        }
        for entry in drained {
            self.cancel_entry(entry);
        }
    }

    fn launch<S>(self: &Arc<Self>, entry: PendingEntry, slot: SlotGuard, spawner: &S)
    where
        S: Spawn,
    {
        let PendingEntry {
            id,
            enqueued_at,
            job,
        } = entry;
        let in_flight = slot.in_flight();
        DispatchCounters::bump(&self.counters.dispatched);
        debug!(
            task_id = id,
            in_flight,
            queued_ms = enqueued_at.elapsed().as_millis() as u64,
            "dispatching task"
        );
        self.emit(id, EventKind::Dispatched, in_flight);

        let shared = Arc::clone(self);
        spawner.spawn(async move {
            let outcome = job().await;
            let counter = match outcome {
                Outcome::Succeeded => &shared.counters.succeeded,
                Outcome::Failed => &shared.counters.failed,
                Outcome::Panicked => &shared.counters.panicked,
            };
            DispatchCounters::bump(counter);
            trace!(task_id = id, ?outcome, "task settled");
            shared.emit(id, outcome.into(), slot.in_flight().saturating_sub(1));
            // Releasing the slot wakes the dispatch loop.
            drop(slot);
        });
    }
}

/// Dispatch loop: one per dispatcher, runs until shutdown.
async fn dispatch_loop<S>(shared: Arc<Shared>, spawner: S)
where
    S: Spawn,
{
    info!(
        max_concurrent = shared.gate.max_concurrent(),
        requests_per_second = shared.limiter.max_starts(),
        window_ms = shared.limiter.window().as_millis() as u64,
        "dispatch loop started"
    );

    loop {
        let entry = tokio::select! {
            biased;
            () = shared.shutdown.cancelled() => break,
            next = shared.queue.pop() => match next {
                Some(entry) => entry,
                None => break,
            },
        };

        let slot = tokio::select! {
            biased;
            () = shared.shutdown.cancelled() => {
                shared.cancel_entry(entry);
                break;
            }
            slot = shared.gate.acquire() => slot,
        };

        let waits = tokio::select! {
            biased;
            () = shared.shutdown.cancelled() => {
                drop(slot);
                shared.cancel_entry(entry);
                break;
            }
            waits = shared.limiter.await_clearance() => waits,
        };
        if waits > 0 {
            DispatchCounters::bump(&shared.counters.rate_limited_waits);
        }

        shared.launch(entry, slot, &spawner);
    }

    shared.close_queue();
    info!("dispatch loop stopped");
}

/// Throttled task dispatcher.
///
/// Accepts opaque async tasks and runs them under two bounds at once: at most
/// `max_concurrent` executing, and at most `requests_per_second` starts in any
/// trailing window. Cloning is cheap and clones share one queue. The dispatcher
/// shuts down when [`shutdown`](Self::shutdown) is called or the last clone is
/// dropped; tasks already running finish, queued ones are cancelled.
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::new(DispatchLimits::new(2, 5))?;
/// let latest = dispatcher.submit(|| async { fetch_latest_id().await }).await?;
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
    _shutdown_on_drop: Arc<DropGuard>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("limits", &self.shared.limits)
            .field("in_flight", &self.shared.gate.in_flight())
            .field("queued", &self.shared.queue.len())
            .field("shutdown", &self.shared.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher whose loop and tasks run on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfig`] for zero limits, or
    /// [`DispatchError::NoRuntime`] when called outside a tokio runtime.
    pub fn new(limits: DispatchLimits) -> Result<Self, DispatchError> {
        Self::with_spawner(limits, TokioSpawner::current()?)
    }

    /// Create a dispatcher that spawns its loop and tasks through `spawner`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfig`] for zero limits.
    pub fn with_spawner<S>(limits: DispatchLimits, spawner: S) -> Result<Self, DispatchError>
    where
        S: Spawn + Clone + Send + Sync + 'static,
    {
        Self::start(limits, None, spawner)
    }

    pub(crate) fn start<S>(
        limits: DispatchLimits,
        events: Option<Arc<dyn EventSink>>,
        spawner: S,
    ) -> Result<Self, DispatchError>
    where
        S: Spawn + Clone + Send + Sync + 'static,
    {
        limits.validate()?;
        let shutdown = CancellationToken::new();
        let shared = Arc::new(Shared {
            limits,
            queue: AdmissionQueue::new(),
            gate: ConcurrencyGate::new(limits.max_concurrent)?,
            limiter: RateLimiter::new(limits.requests_per_second, limits.window)?,
            ids: TaskIdGenerator::new(),
            counters: DispatchCounters::default(),
            events,
            shutdown: shutdown.clone(),
        });

        spawner.spawn(dispatch_loop(Arc::clone(&shared), spawner.clone()));

        Ok(Self {
            shared,
            _shutdown_on_drop: Arc::new(shutdown.drop_guard()),
        })
    }

    /// Submit a task.
    ///
    /// Never fails synchronously. The returned handle settles exactly once
    /// with the task's value, its error ([`TaskError::Failed`]), a panic
    /// ([`TaskError::Panicked`]), or [`TaskError::Cancelled`] if the
    /// dispatcher shut down before the task started.
    pub fn submit<F, Fut, T, E>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let id = self.shared.ids.next_id();
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            async move {
                let settled = AssertUnwindSafe(async move { task().await })
                    .catch_unwind()
                    .await;
                let (outcome, result) = match settled {
                    Ok(Ok(value)) => (Outcome::Succeeded, Ok(value)),
                    Ok(Err(err)) => (Outcome::Failed, Err(TaskError::Failed(err))),
                    Err(panic) => (
                        Outcome::Panicked,
                        Err(TaskError::Panicked(panic_message(panic.as_ref()))),
                    ),
                };
                if tx.send(result).is_err() {
                    trace!(task_id = id, "handle dropped before task settled");
                }
                outcome
            }
            .boxed()
        });

        DispatchCounters::bump(&self.shared.counters.submitted);
        self.shared.emit(id, EventKind::Queued, self.shared.gate.in_flight());

        let entry = PendingEntry {
            id,
            enqueued_at: Instant::now(),
            job,
        };
        match self.shared.queue.push(entry) {
            Ok(depth) => debug!(task_id = id, depth, "task queued"),
            Err(entry) => {
                warn!(task_id = id, "submit after shutdown");
                self.shared.cancel_entry(entry);
            }
        }

        TaskHandle::new(id, rx)
    }

    /// Stop dispatching. Queued tasks settle as cancelled; running tasks finish.
    pub fn shutdown(&self) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }
        info!("dispatcher shutdown requested");
        self.shared.shutdown.cancel();
        self.shared.close_queue();
    }

    /// True once shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Configured limits.
    pub fn limits(&self) -> DispatchLimits {
        self.shared.limits
    }

    /// Snapshot of current activity.
    pub fn stats(&self) -> DispatchStats {
        let mut stats = DispatchStats {
            max_concurrent: self.shared.gate.max_concurrent(),
            requests_per_second: self.shared.limiter.max_starts(),
            active: self.shared.gate.in_flight(),
            peak_concurrent: self.shared.gate.peak(),
            starts_in_window: self.shared.limiter.in_window(Instant::now()) as u64,
            ..DispatchStats::default()
        };
        self.shared.counters.snapshot_into(&mut stats);
        stats
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
