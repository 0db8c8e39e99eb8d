//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `buffer_size` is 0
    /// - `relay_idle_timeout_ms` is less than 100ms or exceeds 1 minute
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid { field: "buffer_size".into(), reason: "must be greater than 0".into() });
        }

        if self.relay_idle_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "relay_idle_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.relay_idle_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "relay_idle_timeout_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.docstore_url.is_none() {
            tracing::warn!(
                "docstore_url is not configured; the cache source will report \
                 every lookup as unavailable and origin hits will not be stored"
            );
        }

        Ok(())
    }
}
