//! Search-engine fallback client.
//!
//! Last source of the resolution chain. The URL nobody could serve is
//! sanitized into a natural-language-ish query and sent to a SERP API;
//! the raw response body is treated as an opaque payload for the
//! summarizer (or, failing that, for the client directly).

use std::sync::LazyLock;
use std::time::Duration;

use bytes::Bytes;
use evergreen_core::{ContentSource, SourceOutcome};
use regex::Regex;
use reqwest::StatusCode;

use crate::error::BackendError;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Strips a leading scheme and everything that is not a letter, digit, or
/// whitespace. Each match becomes a single space.
static SANITIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://|[^A-Za-z0-9\s]").unwrap());

/// Turn a URL into a query a search engine can make sense of.
pub fn sanitize_query(url: &str) -> String {
    SANITIZE.replace_all(url, " ").into_owned()
}

/// SERP client configuration.
#[derive(Debug, Clone)]
pub struct SerpConfig {
    /// Base URL of the SERP API.
    pub base_url: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for SerpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://librey.org".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: "evergreen/0.1".to_string(),
        }
    }
}

/// Client for the SERP API.
#[derive(Debug, Clone)]
pub struct SerpClient {
    http: reqwest::Client,
    config: SerpConfig,
}

impl SerpClient {
    /// Create a new SERP client with the given configuration.
    pub fn new(config: SerpConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Query the SERP API for the sanitized form of `url`.
    ///
    /// The response body is opaque; only a 200 makes it usable.
    pub async fn query(&self, url: &str) -> Result<Bytes, BackendError> {
        let q = sanitize_query(url);
        let endpoint = format!("{}/api.php", self.config.base_url.trim_end_matches('/'));

        tracing::debug!("querying SERP API: q={}", q);

        let response = self
            .http
            .get(&endpoint)
            .query(&[("q", q.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BackendError::HttpStatus { status: status.as_u16() });
        }

        let body = response.bytes().await?;
        Ok(body)
    }
}

#[async_trait::async_trait]
impl ContentSource for SerpClient {
    async fn fetch(&self, url: &str) -> SourceOutcome {
        match self.query(url).await {
            Ok(body) => SourceOutcome::Hit(body),
            Err(e) => SourceOutcome::Unavailable(e.to_string()),
        }
    }
}
