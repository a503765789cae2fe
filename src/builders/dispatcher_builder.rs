//! Builders to construct dispatchers from limits or configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DispatcherConfig, SchedulerConfig};
use crate::core::{DispatchError, DispatchLimits, Dispatcher, EventSink, Spawn};
use crate::runtime::TokioSpawner;

/// Fluent construction for a [`Dispatcher`].
#[derive(Clone)]
pub struct DispatcherBuilder {
    limits: DispatchLimits,
    events: Option<Arc<dyn EventSink>>,
}

impl DispatcherBuilder {
    /// Start from explicit limits.
    pub const fn new(limits: DispatchLimits) -> Self {
        Self {
            limits,
            events: None,
        }
    }

    /// Start from a dispatcher configuration.
    pub const fn from_config(cfg: &DispatcherConfig) -> Self {
        Self::new(cfg.limits())
    }

    /// Set the concurrency bound.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: u32) -> Self {
        self.limits.max_concurrent = max_concurrent;
        self
    }

    /// Set the start budget per window.
    #[must_use]
    pub fn with_requests_per_second(mut self, requests_per_second: u32) -> Self {
        self.limits.requests_per_second = requests_per_second;
        self
    }

    /// Set the rate window.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.limits.window = window;
        self
    }

    /// Attach a lifecycle event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Some(Arc::new(sink));
        self
    }

    /// Limits the builder currently holds.
    pub const fn limits(&self) -> DispatchLimits {
        self.limits
    }

    /// Build on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfig`] for zero limits, or
    /// [`DispatchError::NoRuntime`] outside a tokio runtime.
    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        self.build_with(TokioSpawner::current()?)
    }

    /// Build using the provided spawner.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfig`] for zero limits.
    pub fn build_with<S>(self, spawner: S) -> Result<Dispatcher, DispatchError>
    where
        S: Spawn + Clone + Send + Sync + 'static,
    {
        Dispatcher::start(self.limits, self.events, spawner)
    }
}

/// Build one dispatcher per configured name, all sharing `spawner`.
///
/// # Errors
///
/// Fails without building anything if the configuration is invalid.
pub fn build_dispatchers<S>(
    cfg: &SchedulerConfig,
    spawner: &S,
) -> Result<HashMap<String, Dispatcher>, DispatchError>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    cfg.validate()?;

    let mut dispatchers = HashMap::with_capacity(cfg.dispatchers.len());
    for (name, dispatcher_cfg) in &cfg.dispatchers {
        let dispatcher = DispatcherBuilder::from_config(dispatcher_cfg).build_with(spawner.clone())?;
        tracing::debug!(dispatcher = %name, limits = ?dispatcher.limits(), "built dispatcher");
        dispatchers.insert(name.clone(), dispatcher);
    }

    Ok(dispatchers)
}
