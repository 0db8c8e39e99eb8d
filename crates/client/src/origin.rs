//! Live origin-server fetch client.
//!
//! Third source of the resolution chain: one direct GET against the URL
//! itself. The request timeout is the only safety budget applied here;
//! redirect handling is left to the transport defaults.

use std::time::Duration;

use bytes::Bytes;
use evergreen_core::{ContentSource, SourceOutcome};
use reqwest::StatusCode;

use crate::error::BackendError;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Origin fetch configuration.
#[derive(Debug, Clone)]
pub struct OriginConfig {
    /// User agent string.
    pub user_agent: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self { user_agent: "evergreen/0.1".to_string(), timeout: DEFAULT_TIMEOUT }
    }
}

/// Client for direct origin fetches.
#[derive(Debug, Clone)]
pub struct OriginClient {
    http: reqwest::Client,
}

impl OriginClient {
    /// Create a new origin client with the given configuration.
    pub fn new(config: OriginConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch `url` from its origin server.
    ///
    /// 200 is a hit, 404 a definitive miss; every other status and every
    /// transport failure makes this source unusable for the attempt.
    pub async fn fetch(&self, url: &str) -> Result<Option<Bytes>, BackendError> {
        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                Ok(Some(body))
            }
            StatusCode::NOT_FOUND => Ok(None),
            s => Err(BackendError::HttpStatus { status: s.as_u16() }),
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for OriginClient {
    async fn fetch(&self, url: &str) -> SourceOutcome {
        match OriginClient::fetch(self, url).await {
            Ok(Some(body)) => SourceOutcome::Hit(body),
            Ok(None) => SourceOutcome::Miss,
            Err(e) => SourceOutcome::Unavailable(e.to_string()),
        }
    }
}
