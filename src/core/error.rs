//! Error types for dispatcher operations.

use thiserror::Error;

/// Errors produced while constructing or configuring a dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Limits or configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No tokio runtime was available to host the dispatch loop.
    #[error("no tokio runtime available")]
    NoRuntime,
}

/// Failure observed through a [`TaskHandle`](crate::core::TaskHandle).
///
/// `Failed` carries the task's own error untouched; the dispatcher never
/// interprets, retries, or suppresses it.
#[derive(Debug, Error)]
pub enum TaskError<E> {
    /// The task ran and returned an error.
    #[error("task failed: {0}")]
    Failed(E),
    /// The task panicked while running.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The dispatcher shut down before the task was dispatched.
    #[error("dispatcher shut down before task was dispatched")]
    Cancelled,
}

impl<E> TaskError<E> {
    /// Return the task's own error, if that is what this is.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Panicked(_) | Self::Cancelled => None,
        }
    }

    /// True if the dispatcher cancelled the task before it started.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
