//! Monitoring module for Nodeflow.
//!
//! Holds the logging configuration and subscriber setup shared by the
//! binary and any embedding application.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

pub mod logging;

pub use logging::{init_logging, LogExt};

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Log level filter (e.g., "info,nodeflow_exec=debug"), used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit JSON instead of pretty logs
    pub json: bool,
    /// Also write JSON logs to this file, rotated daily
    pub log_file: Option<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "nodeflow".to_string(),
            log_filter: "info".to_string(),
            json: false,
            log_file: None,
        }
    }
}

impl MonitoringConfig {
    /// Defaults overridden by `NODEFLOW_LOG`, `NODEFLOW_LOG_JSON` and `NODEFLOW_LOG_FILE`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(filter) = env::var("NODEFLOW_LOG") {
            config.log_filter = filter;
        }

        if let Ok(json) = env::var("NODEFLOW_LOG_JSON") {
            match json.to_lowercase().as_str() {
                "true" | "1" => config.json = true,
                "false" | "0" => config.json = false,
                _ => warn!("Invalid NODEFLOW_LOG_JSON value: {}", json),
            }
        }

        if let Ok(file) = env::var("NODEFLOW_LOG_FILE") {
            if !file.is_empty() {
                config.log_file = Some(file);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MonitoringConfig::default();
        assert_eq!(config.service_name, "nodeflow");
        assert_eq!(config.log_filter, "info");
        assert!(!config.json);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("NODEFLOW_LOG", "debug");
        env::set_var("NODEFLOW_LOG_JSON", "yes-please");
        env::set_var("NODEFLOW_LOG_FILE", "/tmp/nodeflow.log");

        let config = MonitoringConfig::from_env();

        env::remove_var("NODEFLOW_LOG");
        env::remove_var("NODEFLOW_LOG_JSON");
        env::remove_var("NODEFLOW_LOG_FILE");

        assert_eq!(config.log_filter, "debug");
        assert!(!config.json);
        assert_eq!(config.log_file.as_deref(), Some("/tmp/nodeflow.log"));
    }
}
