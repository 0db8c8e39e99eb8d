//! Chat-completion summarizer client.
//!
//! Optional post-processing for the search fallback: the raw SERP payload
//! is handed to a chat-completion API with an instruction to infer what
//! the user was originally looking for. A missing API key degrades this
//! client to logged failures; the chain then serves the raw payload.

pub mod request;
pub mod response;

pub use request::{ChatMessage, ChatRequest};
pub use response::{ChatChoice, ChatResponse};

use std::time::Duration;

use bytes::Bytes;
use evergreen_core::Summarizer;
use reqwest::StatusCode;

use crate::error::BackendError;

/// Default chat-completion API base URL.
const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Summarizer client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the chat-completion API.
    pub api_url: String,
    /// Bearer token. When absent, every call degrades to
    /// [`BackendError::NotConfigured`].
    pub api_key: Option<String>,
    /// Model name submitted with each request.
    pub model: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: "gpt-4".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for the chat-completion API.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new summarizer client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Infer the search intent behind a scraped search payload.
    pub async fn summarize(&self, content: &[u8]) -> Result<Bytes, BackendError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(BackendError::NotConfigured("llm_api_key"))?;

        let scraped = String::from_utf8_lossy(content);
        let request = ChatRequest::infer_search_intent(&self.config.model, &scraped);
        let endpoint = format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BackendError::HttpStatus { status: status.as_u16() });
        }

        let completion: ChatResponse = response.json().await.map_err(|e| BackendError::Parse(e.to_string()))?;
        let text = completion
            .first_content()
            .ok_or_else(|| BackendError::Parse("completion response carried no choices".to_string()))?;

        Ok(Bytes::copy_from_slice(text.as_bytes()))
    }
}

#[async_trait::async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, content: &[u8]) -> Result<Bytes, String> {
        LlmClient::summarize(self, content).await.map_err(|e| e.to_string())
    }
}
