//! The always-online proxy connector.
//!
//! Sits between the raw client socket and the resolution chain: parses
//! the request head the client sent, runs GETs through the chain, and
//! hands everything else to the pass-through relay.

use std::sync::Arc;

use evergreen_core::{RequestTarget, ResolutionChain};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::relay::Relay;

/// Upper bound on the request head the connector will buffer.
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Read from the client until the end of the request head (or EOF).
///
/// Returns the bytes read so far, which include the full head and may
/// include the start of a body. `None` when the client sent nothing.
pub async fn read_request_head<C>(conn: &mut C) -> std::io::Result<Option<Vec<u8>>>
where
    C: AsyncRead + Unpin,
{
    let mut raw = Vec::with_capacity(1024);
    let mut buf = [0u8; 1024];

    loop {
        let n = conn.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        if raw.windows(4).any(|w| w == b"\r\n\r\n") || raw.len() >= MAX_HEAD_BYTES {
            break;
        }
    }

    if raw.is_empty() { Ok(None) } else { Ok(Some(raw)) }
}

/// Parse the request line (plus `Host` header when needed) into a target.
///
/// Handles the three forms proxy clients send: absolute-form
/// (`GET http://host/path`), authority-form (`CONNECT host:443`), and
/// origin-form (`GET /path` with a `Host` header). Returns `None` for
/// anything that does not parse; the caller drops the connection.
pub fn parse_request_head(raw: &[u8]) -> Option<RequestTarget> {
    let head = String::from_utf8_lossy(raw);
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?;

    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;

    if method.eq_ignore_ascii_case("CONNECT") {
        let (host, port) = split_authority(target, 443)?;
        return Some(RequestTarget { scheme: "https".to_string(), host, port, path: String::new(), method });
    }

    if target.contains("://") {
        let parsed = url::Url::parse(target).ok()?;
        let host = parsed.host_str()?.to_string();
        let port = parsed.port_or_known_default().unwrap_or(80);
        return Some(RequestTarget {
            scheme: parsed.scheme().to_string(),
            host,
            port,
            // Kept verbatim so the chain resolves exactly what was asked.
            path: target.to_string(),
            method,
        });
    }

    // Origin-form target: the Host header names the upstream.
    let host_value = lines
        .take_while(|l| !l.is_empty())
        .find_map(|l| l.split_once(':').filter(|(k, _)| k.eq_ignore_ascii_case("host")).map(|(_, v)| v.trim()))?;
    let (host, port) = split_authority(host_value, 80)?;

    Some(RequestTarget { scheme: "http".to_string(), host, port, path: target.to_string(), method })
}

fn split_authority(authority: &str, default_port: u16) -> Option<(String, u16)> {
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Some((host.to_string(), port.parse().ok()?)),
        None if !authority.is_empty() => Some((authority.to_string(), default_port)),
        _ => None,
    }
}

/// The connector: GETs resolve through the chain, everything else relays.
pub struct AlwaysOnline {
    chain: Arc<ResolutionChain>,
    relay: Relay,
}

impl AlwaysOnline {
    pub fn new(chain: Arc<ResolutionChain>, relay: Relay) -> Self {
        Self { chain, relay }
    }

    /// Handle one inbound request.
    ///
    /// The full response (or the relayed bytes) is written to `conn`
    /// before this returns. The returned flag says whether the request
    /// was fully handled, i.e. the chain resolved it; relayed requests
    /// report false.
    pub async fn handle<C>(&self, conn: &mut C, raw: &[u8], target: &RequestTarget) -> bool
    where
        C: AsyncRead + AsyncWrite + Unpin,
    {
        if target.is_get() {
            let url = target.absolute_url();
            let resolution = self.chain.resolve(&url).await;
            if let Err(e) = conn.write_all(&resolution.body).await {
                tracing::warn!("failed to write response for {}: {}", url, e);
                return false;
            }
            resolution.resolved
        } else {
            tracing::info!("relaying {} {}:{}", target.method, target.host, target.port);
            if let Err(e) = self.relay.run(conn, target, raw).await {
                tracing::warn!("relay to {}:{} failed: {}", target.host, target.port, e);
            }
            false
        }
    }
}
