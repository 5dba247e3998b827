//! Configuration for the graph engine
//!
//! Defaults can be overridden from environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Quiet period before a scheduled batch runs
    #[serde(default = "default_debounce")]
    pub debounce: Duration,

    /// Whether successful results are memoized
    #[serde(default = "default_memoization_enabled")]
    pub memoization_enabled: bool,

    /// Upper bound on a single capability call
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout: Duration,

    /// How long execution calls wait for the engine lock before reporting busy
    #[serde(default = "default_lock_wait")]
    pub lock_wait: Duration,
}

fn default_debounce() -> Duration {
    Duration::from_millis(50)
}

fn default_memoization_enabled() -> bool {
    true
}

fn default_execution_timeout() -> Duration {
    Duration::from_millis(5000)
}

fn default_lock_wait() -> Duration {
    Duration::from_millis(5000)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            memoization_enabled: default_memoization_enabled(),
            execution_timeout: default_execution_timeout(),
            lock_wait: default_lock_wait(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults overridden by environment variables
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(ms) = millis_from_env("NODEFLOW_DEBOUNCE_MS") {
            config.debounce = ms;
        }

        if let Ok(memoization) = env::var("NODEFLOW_MEMOIZATION") {
            match memoization.to_lowercase().as_str() {
                "true" | "1" | "on" => config.memoization_enabled = true,
                "false" | "0" | "off" => config.memoization_enabled = false,
                _ => warn!("Invalid NODEFLOW_MEMOIZATION value: {}", memoization),
            }
        }

        if let Some(ms) = millis_from_env("NODEFLOW_EXECUTION_TIMEOUT_MS") {
            config.execution_timeout = ms;
        }

        if let Some(ms) = millis_from_env("NODEFLOW_LOCK_WAIT_MS") {
            config.lock_wait = ms;
        }

        config
    }

    /// Set the debounce delay
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Enable or disable memoization
    pub fn with_memoization(mut self, enabled: bool) -> Self {
        self.memoization_enabled = enabled;
        self
    }

    /// Set the per-node execution timeout
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Set the lock wait
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }
}

fn millis_from_env(name: &str) -> Option<Duration> {
    let value = env::var(name).ok()?;
    match value.parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!("Invalid {} value: {}", name, value);
            None
        }
    }
}
