//! The layered content-resolution model.
//!
//! A "fetch this URL" request is answered by trying an ordered chain of
//! sources and stopping at the first one that produces usable content:
//!
//! 1. the content-addressed document cache
//! 2. the historical snapshot archive
//! 3. the live origin server
//! 4. a search-engine fallback, optionally summarized
//!
//! Every source answers with a [`SourceOutcome`]: a definitive miss and a
//! backend outage both advance the chain, but they stay distinguishable so
//! logs can tell "not there" from "could not ask".

pub mod chain;

pub use chain::ResolutionChain;

use bytes::Bytes;

/// The sources of the resolution chain, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Cache,
    Archive,
    Origin,
    Search,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Cache => "cache",
            SourceKind::Archive => "archive",
            SourceKind::Origin => "origin",
            SourceKind::Search => "search",
        };
        f.write_str(name)
    }
}

/// The result of asking one source for one URL.
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    /// Usable content was returned; the chain stops here.
    Hit(Bytes),
    /// The source definitively does not have this URL.
    Miss,
    /// The source was unusable for this attempt (transport failure,
    /// unexpected status, malformed payload). Carries detail for logging.
    Unavailable(String),
}

/// Final result of a chain execution.
///
/// `resolved` is false only when every source failed to produce a hit,
/// in which case `body` is empty.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub resolved: bool,
    pub body: Bytes,
    pub source: Option<SourceKind>,
}

impl Resolution {
    fn exhausted() -> Self {
        Self { resolved: false, body: Bytes::new(), source: None }
    }
}

/// A backend that can be asked for the content of a URL.
///
/// Implementations are closed failure boundaries: any internal error must
/// come back as [`SourceOutcome::Unavailable`], never a panic or a hang
/// beyond the backend's own request timeout.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> SourceOutcome;
}

/// Turns a raw search-result payload into inferred search intent.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    /// On failure, returns detail for logging only; the caller falls back
    /// to the raw payload.
    async fn summarize(&self, content: &[u8]) -> Result<Bytes, String>;
}

/// Write half of the cache, used to back-fill origin hits.
///
/// Stores are idempotent last-writer-wins upserts keyed by the content
/// address of `url`. Two concurrent requests for the same URL may both
/// fall through to origin and both store; that race is accepted, not
/// locked against.
#[async_trait::async_trait]
pub trait CacheSink: Send + Sync {
    async fn store(&self, url: &str, content: &[u8]) -> Result<(), String>;
}
