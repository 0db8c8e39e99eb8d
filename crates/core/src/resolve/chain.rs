//! The resolution-chain orchestrator.

use std::sync::Arc;

use bytes::Bytes;

use super::{CacheSink, ContentSource, Resolution, SourceKind, SourceOutcome, Summarizer};

/// Runs the ordered source chain for one URL at a time.
///
/// Sources are tried strictly in order (cache, archive, origin, search) and
/// never raced, retried, or reordered; the cost of a later source is only
/// paid after the earlier ones definitively failed. An origin hit is
/// back-filled into the cache before the result is returned; the back-fill
/// failing never downgrades the hit.
///
/// A search hit is terminal even when the follow-up summarization fails —
/// the raw search payload is returned in that case, so SERP output can
/// reach the client as page content. That matches the deployed behavior
/// this component replaces and is kept deliberately.
pub struct ResolutionChain {
    cache: Arc<dyn ContentSource>,
    archive: Arc<dyn ContentSource>,
    origin: Arc<dyn ContentSource>,
    search: Arc<dyn ContentSource>,
    summarizer: Arc<dyn Summarizer>,
    sink: Arc<dyn CacheSink>,
}

impl ResolutionChain {
    pub fn new(
        cache: Arc<dyn ContentSource>, archive: Arc<dyn ContentSource>, origin: Arc<dyn ContentSource>,
        search: Arc<dyn ContentSource>, summarizer: Arc<dyn Summarizer>, sink: Arc<dyn CacheSink>,
    ) -> Self {
        Self { cache, archive, origin, search, summarizer, sink }
    }

    /// Resolve one URL through the chain.
    ///
    /// Never returns an error: every backend failure is absorbed into the
    /// fallback policy, and exhaustion surfaces as an unresolved result
    /// with an empty body.
    pub async fn resolve(&self, url: &str) -> Resolution {
        let sources: [(SourceKind, &Arc<dyn ContentSource>); 4] = [
            (SourceKind::Cache, &self.cache),
            (SourceKind::Archive, &self.archive),
            (SourceKind::Origin, &self.origin),
            (SourceKind::Search, &self.search),
        ];

        for (kind, source) in sources {
            match source.fetch(url).await {
                SourceOutcome::Hit(body) => {
                    tracing::info!("resolved {} from {} ({} bytes)", url, kind, body.len());
                    let body = match kind {
                        SourceKind::Origin => {
                            self.backfill(url, &body).await;
                            body
                        }
                        SourceKind::Search => self.summarize_or_raw(body).await,
                        _ => body,
                    };
                    return Resolution { resolved: true, body, source: Some(kind) };
                }
                SourceOutcome::Miss => {
                    tracing::debug!("{} miss for {}", kind, url);
                }
                SourceOutcome::Unavailable(detail) => {
                    tracing::warn!("{} unavailable for {}: {}", kind, url, detail);
                }
            }
        }

        tracing::info!("all sources exhausted for {}", url);
        Resolution::exhausted()
    }

    /// Back-fill an origin hit so future requests for this URL hit the
    /// cache. Awaited before the response is returned, and swallowed on
    /// failure: the content already reached us and must reach the client.
    async fn backfill(&self, url: &str, content: &[u8]) {
        if let Err(detail) = self.sink.store(url, content).await {
            tracing::warn!("cache back-fill failed for {}: {}", url, detail);
        }
    }

    /// Replace a raw search payload with its summarized intent when the
    /// summarizer cooperates; keep the raw payload when it does not.
    async fn summarize_or_raw(&self, raw: Bytes) -> Bytes {
        match self.summarizer.summarize(&raw).await {
            Ok(summary) => summary,
            Err(detail) => {
                tracing::warn!("summarization failed, returning raw search payload: {}", detail);
                raw
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        outcome: SourceOutcome,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(outcome: SourceOutcome) -> Arc<Self> {
            Arc::new(Self { outcome, calls: AtomicUsize::new(0) })
        }

        fn hit(body: &[u8]) -> Arc<Self> {
            Self::new(SourceOutcome::Hit(Bytes::copy_from_slice(body)))
        }

        fn miss() -> Arc<Self> {
            Self::new(SourceOutcome::Miss)
        }

        fn unavailable() -> Arc<Self> {
            Self::new(SourceOutcome::Unavailable("backend down".into()))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ContentSource for StubSource {
        async fn fetch(&self, _url: &str) -> SourceOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct StubSummarizer {
        result: Result<Bytes, String>,
        calls: AtomicUsize,
    }

    impl StubSummarizer {
        fn ok(body: &[u8]) -> Arc<Self> {
            Arc::new(Self { result: Ok(Bytes::copy_from_slice(body)), calls: AtomicUsize::new(0) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { result: Err("model unreachable".into()), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait::async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, _content: &[u8]) -> Result<Bytes, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        stored: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait::async_trait]
    impl CacheSink for RecordingSink {
        async fn store(&self, url: &str, content: &[u8]) -> Result<(), String> {
            self.stored.lock().unwrap().push((url.to_string(), content.to_vec()));
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait::async_trait]
    impl CacheSink for FailingSink {
        async fn store(&self, _url: &str, _content: &[u8]) -> Result<(), String> {
            Err("store unreachable".into())
        }
    }

    fn chain(
        cache: Arc<StubSource>, archive: Arc<StubSource>, origin: Arc<StubSource>, search: Arc<StubSource>,
        summarizer: Arc<StubSummarizer>, sink: Arc<RecordingSink>,
    ) -> ResolutionChain {
        ResolutionChain::new(cache, archive, origin, search, summarizer, sink)
    }

    #[tokio::test]
    async fn test_cache_hit_short_circuits() {
        let cache = StubSource::hit(b"cached");
        let archive = StubSource::miss();
        let origin = StubSource::miss();
        let search = StubSource::miss();
        let sink = Arc::new(RecordingSink::default());
        let c = chain(
            cache.clone(),
            archive.clone(),
            origin.clone(),
            search.clone(),
            StubSummarizer::ok(b""),
            sink.clone(),
        );

        let res = c.resolve("http://example.com:80/").await;

        assert!(res.resolved);
        assert_eq!(res.body.as_ref(), b"cached");
        assert_eq!(res.source, Some(SourceKind::Cache));
        assert_eq!(cache.calls(), 1);
        assert_eq!(archive.calls(), 0);
        assert_eq!(origin.calls(), 0);
        assert_eq!(search.calls(), 0);
        assert!(sink.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_falls_through_to_origin_and_backfills() {
        let cache = StubSource::miss();
        let archive = StubSource::miss();
        let origin = StubSource::hit(b"fresh from origin");
        let search = StubSource::miss();
        let sink = Arc::new(RecordingSink::default());
        let c = chain(
            cache,
            archive,
            origin,
            search.clone(),
            StubSummarizer::ok(b""),
            sink.clone(),
        );

        let res = c.resolve("http://example.com:80/page").await;

        assert!(res.resolved);
        assert_eq!(res.body.as_ref(), b"fresh from origin");
        assert_eq!(res.source, Some(SourceKind::Origin));
        assert_eq!(search.calls(), 0);

        let stored = sink.stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, "http://example.com:80/page");
        assert_eq!(stored[0].1, b"fresh from origin");
    }

    #[tokio::test]
    async fn test_unavailable_advances_like_miss() {
        let cache = StubSource::unavailable();
        let archive = StubSource::hit(b"archived");
        let c = chain(
            cache,
            archive,
            StubSource::miss(),
            StubSource::miss(),
            StubSummarizer::ok(b""),
            Arc::new(RecordingSink::default()),
        );

        let res = c.resolve("http://example.com:80/").await;

        assert!(res.resolved);
        assert_eq!(res.body.as_ref(), b"archived");
        assert_eq!(res.source, Some(SourceKind::Archive));
    }

    #[tokio::test]
    async fn test_exhaustion_returns_empty_unresolved() {
        let sink = Arc::new(RecordingSink::default());
        let c = chain(
            StubSource::miss(),
            StubSource::unavailable(),
            StubSource::miss(),
            StubSource::unavailable(),
            StubSummarizer::ok(b"unused"),
            sink.clone(),
        );

        let res = c.resolve("http://example.com:80/gone").await;

        assert!(!res.resolved);
        assert!(res.body.is_empty());
        assert_eq!(res.source, None);
        assert!(sink.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_replaces_search_payload() {
        let summarizer = StubSummarizer::ok(b"inferred intent");
        let c = chain(
            StubSource::miss(),
            StubSource::miss(),
            StubSource::miss(),
            StubSource::hit(b"raw serp payload"),
            summarizer.clone(),
            Arc::new(RecordingSink::default()),
        );

        let res = c.resolve("http://example.com:80/").await;

        assert!(res.resolved);
        assert_eq!(res.body.as_ref(), b"inferred intent");
        assert_eq!(res.source, Some(SourceKind::Search));
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_hit_survives_summarizer_failure() {
        let c = chain(
            StubSource::miss(),
            StubSource::miss(),
            StubSource::miss(),
            StubSource::hit(b"raw serp payload"),
            StubSummarizer::failing(),
            Arc::new(RecordingSink::default()),
        );

        let res = c.resolve("http://example.com:80/").await;

        assert!(res.resolved);
        assert_eq!(res.body.as_ref(), b"raw serp payload");
        assert_eq!(res.source, Some(SourceKind::Search));
    }

    #[tokio::test]
    async fn test_backfill_failure_keeps_origin_hit() {
        let origin = StubSource::hit(b"content");
        let c = ResolutionChain::new(
            StubSource::miss(),
            StubSource::miss(),
            origin,
            StubSource::miss(),
            StubSummarizer::ok(b""),
            Arc::new(FailingSink),
        );

        let res = c.resolve("http://example.com:80/").await;

        assert!(res.resolved);
        assert_eq!(res.body.as_ref(), b"content");
    }
}
