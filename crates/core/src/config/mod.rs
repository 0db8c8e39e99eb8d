//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (EVERGREEN_*)
//! 2. TOML config file (if EVERGREEN_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (EVERGREEN_*)
/// 2. TOML config file (if EVERGREEN_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// Absence of an optional backend value (document store, LLM key) degrades
/// that backend to logged failures; it never stops the proxy from serving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the proxy listens on.
    ///
    /// Set via EVERGREEN_LISTEN environment variable.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Base URL of the document-store backend used as the content cache.
    ///
    /// Set via EVERGREEN_DOCSTORE_URL environment variable. When unset,
    /// cache lookups and back-fills degrade to logged failures.
    #[serde(default)]
    pub docstore_url: Option<String>,

    /// Document-store index holding cached documents.
    ///
    /// Set via EVERGREEN_DOCSTORE_INDEX environment variable.
    #[serde(default = "default_docstore_index")]
    pub docstore_index: String,

    /// Snapshot-availability endpoint of the web archive.
    ///
    /// Set via EVERGREEN_ARCHIVE_API_URL environment variable.
    #[serde(default = "default_archive_api_url")]
    pub archive_api_url: String,

    /// Base URL of the SERP API used as the last-resort source.
    ///
    /// Set via EVERGREEN_SERP_URL environment variable.
    #[serde(default = "default_serp_url")]
    pub serp_url: String,

    /// Base URL of the chat-completion API used for summarization.
    ///
    /// Set via EVERGREEN_LLM_API_URL environment variable.
    #[serde(default = "default_llm_api_url")]
    pub llm_api_url: String,

    /// API key for the chat-completion API.
    ///
    /// Set via EVERGREEN_LLM_API_KEY environment variable. When unset,
    /// summarization degrades to logged failures and raw search payloads
    /// are returned instead.
    #[serde(default)]
    pub llm_api_key: Option<String>,

    /// Model submitted to the chat-completion API.
    ///
    /// Set via EVERGREEN_LLM_MODEL environment variable.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via EVERGREEN_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-source HTTP request timeout in milliseconds.
    ///
    /// Set via EVERGREEN_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Copy-buffer size for the non-GET relay path.
    ///
    /// Set via EVERGREEN_BUFFER_SIZE environment variable.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Idle timeout for the relay byte pump in milliseconds.
    ///
    /// Set via EVERGREEN_RELAY_IDLE_TIMEOUT_MS environment variable.
    #[serde(default = "default_relay_idle_timeout_ms")]
    pub relay_idle_timeout_ms: u64,

    /// Skip upstream certificate verification on the TLS relay path.
    ///
    /// Set via EVERGREEN_RELAY_SKIP_TLS_VERIFY environment variable.
    #[serde(default = "default_true")]
    pub relay_skip_tls_verify: bool,
}

fn default_listen() -> String {
    "127.0.0.1:5555".into()
}

fn default_docstore_index() -> String {
    "evergreen".into()
}

fn default_archive_api_url() -> String {
    "http://archive.org/wayback/available".into()
}

fn default_serp_url() -> String {
    "https://librey.org".into()
}

fn default_llm_api_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_model() -> String {
    "gpt-4".into()
}

fn default_user_agent() -> String {
    "evergreen/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_buffer_size() -> usize {
    8192
}

fn default_relay_idle_timeout_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            docstore_url: None,
            docstore_index: default_docstore_index(),
            archive_api_url: default_archive_api_url(),
            serp_url: default_serp_url(),
            llm_api_url: default_llm_api_url(),
            llm_api_key: None,
            llm_model: default_llm_model(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            buffer_size: default_buffer_size(),
            relay_idle_timeout_ms: default_relay_idle_timeout_ms(),
            relay_skip_tls_verify: true,
        }
    }
}

impl AppConfig {
    /// Per-source timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Relay idle timeout as Duration.
    pub fn relay_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_idle_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `EVERGREEN_`
    /// 2. TOML file from `EVERGREEN_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("EVERGREEN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("EVERGREEN_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the document-store URL is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the document-store URL is not set.
    pub fn require_docstore_url(&self) -> Result<&str, ConfigError> {
        self.docstore_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "docstore_url".into(),
            hint: "Set EVERGREEN_DOCSTORE_URL environment variable".into(),
        })
    }

    /// Check if the LLM API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the LLM API key is not set.
    pub fn require_llm_api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "llm_api_key".into(),
            hint: "Set EVERGREEN_LLM_API_KEY environment variable".into(),
        })
    }
}
