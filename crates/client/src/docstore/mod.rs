//! Document-store cache client.
//!
//! The first and fastest source of the resolution chain: a remote
//! document store (Elasticsearch-compatible REST surface) holding one
//! document per content address. Every operation is a single network
//! call; there is no local buffering or batching.
//!
//! A definitive miss (the store answered "not found") and a backend
//! failure (the store was unreachable or answered garbage) are kept
//! distinct so the chain's logs do not mistake an outage for absence.

pub mod document;

pub use document::{CachedDocument, GetDocumentResponse};

use std::time::Duration;

use bytes::Bytes;
use evergreen_core::{CacheSink, ContentSource, SourceOutcome, content_address};
use reqwest::StatusCode;

use crate::error::BackendError;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Document-store client configuration.
#[derive(Debug, Clone)]
pub struct DocStoreConfig {
    /// Base URL of the store. When absent, every operation degrades to
    /// [`BackendError::NotConfigured`].
    pub base_url: Option<String>,
    /// Index holding the cached documents.
    pub index: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self { base_url: None, index: "evergreen".to_string(), timeout: DEFAULT_TIMEOUT }
    }
}

/// Client for the document-store cache backend.
#[derive(Debug, Clone)]
pub struct DocStoreClient {
    http: reqwest::Client,
    config: DocStoreConfig,
}

impl DocStoreClient {
    /// Create a new document-store client with the given configuration.
    pub fn new(config: DocStoreConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn base_url(&self) -> Result<&str, BackendError> {
        self.config
            .base_url
            .as_deref()
            .ok_or(BackendError::NotConfigured("docstore_url"))
    }

    fn document_endpoint(&self, address: &str) -> Result<String, BackendError> {
        let base = self.base_url()?;
        Ok(format!("{}/{}/_doc/{}", base.trim_end_matches('/'), self.config.index, address))
    }

    /// Look up a cached document by content address.
    ///
    /// Returns `Ok(Some(bytes))` on a hit, `Ok(None)` when the store
    /// definitively does not have the document, and `Err` when the store
    /// itself was unusable.
    pub async fn get(&self, address: &str) -> Result<Option<Bytes>, BackendError> {
        let endpoint = self.document_endpoint(address)?;
        let response = self.http.get(&endpoint).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BackendError::HttpStatus { status: status.as_u16() });
        }

        let envelope: GetDocumentResponse = response.json().await.map_err(|e| BackendError::Parse(e.to_string()))?;

        Ok(envelope
            .into_document()
            .map(|doc| Bytes::from(doc.content.into_bytes())))
    }

    /// Upsert the cached document for `url`.
    ///
    /// The document is keyed by the content address of `url`; a repeated
    /// put overwrites the previous document wholesale (last writer wins).
    pub async fn put(&self, url: &str, content: &[u8]) -> Result<(), BackendError> {
        let address = content_address(url);
        let endpoint = self.document_endpoint(&address)?;

        let doc = CachedDocument {
            url: url.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        };

        let response = self.http.put(&endpoint).json(&doc).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Store(format!("document store returned status {}", status.as_u16())));
        }

        tracing::debug!("stored {} bytes for {} as {}", content.len(), url, address);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContentSource for DocStoreClient {
    async fn fetch(&self, url: &str) -> SourceOutcome {
        match self.get(&content_address(url)).await {
            Ok(Some(body)) => SourceOutcome::Hit(body),
            Ok(None) => SourceOutcome::Miss,
            Err(e) => SourceOutcome::Unavailable(e.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl CacheSink for DocStoreClient {
    async fn store(&self, url: &str, content: &[u8]) -> Result<(), String> {
        self.put(url, content).await.map_err(|e| e.to_string())
    }
}
