//! Dispatcher and scheduler configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, DispatchError, DispatchLimits};

/// Environment variable for [`DispatcherConfig::max_concurrent`].
pub const ENV_MAX_CONCURRENT: &str = "DISPATCH_MAX_CONCURRENT";
/// Environment variable for [`DispatcherConfig::requests_per_second`].
pub const ENV_REQUESTS_PER_SECOND: &str = "DISPATCH_REQUESTS_PER_SECOND";
/// Environment variable for [`DispatcherConfig::window_ms`].
pub const ENV_WINDOW_MS: &str = "DISPATCH_WINDOW_MS";

/// Configuration for a single dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Maximum tasks executing at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
    /// Maximum task starts per rate window.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Rate window in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

const fn default_max_concurrent() -> u32 {
    4
}

const fn default_requests_per_second() -> u32 {
    10
}

const fn default_window_ms() -> u64 {
    1000
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            requests_per_second: default_requests_per_second(),
            window_ms: default_window_ms(),
        }
    }
}

impl DispatcherConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] for any zero value.
    pub fn validate(&self) -> Result<(), DispatchError> {
        self.limits().validate()
    }

    /// Limits described by this configuration.
    pub const fn limits(&self) -> DispatchLimits {
        DispatchLimits::new(self.max_concurrent, self.requests_per_second)
            .with_window(Duration::from_millis(self.window_ms))
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] on malformed JSON or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, DispatchError> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| DispatchError::InvalidConfig(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from the process environment, reading a `.env` file first if present.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but not a number, or the result is invalid.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is fine; the process environment still applies.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_MAX_CONCURRENT) {
            cfg.max_concurrent = parse_var(ENV_MAX_CONCURRENT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUESTS_PER_SECOND) {
            cfg.requests_per_second = parse_var(ENV_REQUESTS_PER_SECOND, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WINDOW_MS) {
            cfg.window_ms = parse_var(ENV_WINDOW_MS, &raw)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key}={raw:?} is not a valid number"))
}

/// Root configuration: named dispatchers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Map of dispatcher name to configuration.
    pub dispatchers: HashMap<String, DispatcherConfig>,
}

impl SchedulerConfig {
    /// Validate all dispatchers and ensure at least one exists.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] naming the first bad dispatcher.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.dispatchers.is_empty() {
            return Err(DispatchError::InvalidConfig(
                "at least one dispatcher must be defined".into(),
            ));
        }
        for (name, cfg) in &self.dispatchers {
            cfg.validate().map_err(|e| {
                DispatchError::InvalidConfig(format!("dispatcher `{name}` invalid: {e}"))
            })?;
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] on malformed JSON or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, DispatchError> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| DispatchError::InvalidConfig(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
