//! Historical-archive fetch client.
//!
//! Second source of the resolution chain. Resolving a URL here takes two
//! sequential network calls: an availability lookup that reports the
//! closest archived snapshot, then a fetch of that snapshot's bytes.
//! Neither call is retried; a failure at either step makes this source
//! unavailable for the request and the chain moves on.

pub mod response;

pub use response::{AvailabilityResponse, ClosestSnapshot};

use std::time::Duration;

use bytes::Bytes;
use evergreen_core::{ContentSource, SourceOutcome};
use reqwest::StatusCode;

use crate::error::BackendError;

/// Default availability endpoint.
const DEFAULT_API_URL: &str = "http://archive.org/wayback/available";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Archive client configuration.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Snapshot-availability endpoint.
    pub api_url: String,
    /// Request timeout, applied to each of the two calls (default: 20s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: "evergreen/0.1".to_string(),
        }
    }
}

/// Client for the snapshot-availability service and snapshot fetches.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: reqwest::Client,
    config: ArchiveConfig,
}

impl ArchiveClient {
    /// Create a new archive client with the given configuration.
    pub fn new(config: ArchiveConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Fetch the closest archived copy of `url`.
    ///
    /// Returns `Ok(None)` when the archive has no snapshot (or reports an
    /// empty snapshot URL, or the snapshot itself answers 404). Any
    /// transport or parse failure is an `Err`.
    pub async fn fetch(&self, url: &str) -> Result<Option<Bytes>, BackendError> {
        let response = self
            .http
            .get(&self.config.api_url)
            .query(&[("url", url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::HttpStatus { status: status.as_u16() });
        }

        let availability: AvailabilityResponse =
            response.json().await.map_err(|e| BackendError::Parse(e.to_string()))?;

        let Some(snapshot_url) = availability.snapshot_url() else {
            tracing::debug!("no archived snapshot for {}", url);
            return Ok(None);
        };

        let snapshot = self.http.get(snapshot_url).send().await?;
        match snapshot.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let body = snapshot.bytes().await?;
                Ok(Some(body))
            }
            s => Err(BackendError::HttpStatus { status: s.as_u16() }),
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for ArchiveClient {
    async fn fetch(&self, url: &str) -> SourceOutcome {
        match ArchiveClient::fetch(self, url).await {
            Ok(Some(body)) => SourceOutcome::Hit(body),
            Ok(None) => SourceOutcome::Miss,
            Err(e) => SourceOutcome::Unavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ArchiveClient {
        ArchiveClient::new(ArchiveConfig {
            api_url: format!("{}/wayback/available", server.uri()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_closest_snapshot() {
        let server = MockServer::start().await;
        let snapshot_path = "/web/20240101000000/http://example.com/";

        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .and(query_param("url", "http://example.com:80/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "archived_snapshots": {
                    "closest": {
                        "available": true,
                        "status": "200",
                        "url": format!("{}{}", server.uri(), snapshot_path),
                        "timestamp": "20240101000000"
                    }
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(snapshot_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archived page".as_slice()))
            .mount(&server)
            .await;

        let body = client_for(&server)
            .fetch("http://example.com:80/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body.as_ref(), b"archived page");
    }

    #[tokio::test]
    async fn test_no_snapshot_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"archived_snapshots": {}})))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch("http://example.com:80/").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_404_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "archived_snapshots": {
                    "closest": {"url": format!("{}/web/gone", server.uri()), "available": true}
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/web/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch("http://example.com:80/").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_availability_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch("http://example.com:80/").await;
        assert!(matches!(result, Err(BackendError::HttpStatus { status: 502 })));
    }

    #[tokio::test]
    async fn test_malformed_availability_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>surprise</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch("http://example.com:80/").await;
        assert!(matches!(result, Err(BackendError::Parse(_))));
    }
}
