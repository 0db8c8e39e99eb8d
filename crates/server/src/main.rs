//! evergreen proxy entry point.
//!
//! Boots the always-online proxy: loads configuration, constructs the
//! shared backend clients once, and serves the connector from a TCP
//! accept loop. Logging goes to stderr.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use evergreen_client::{
    ArchiveClient, ArchiveConfig, DocStoreClient, DocStoreConfig, LlmClient, LlmConfig, OriginClient, OriginConfig,
    SerpClient, SerpConfig,
};
use evergreen_core::{AppConfig, ResolutionChain};

mod connector;
mod relay;

use connector::{AlwaysOnline, parse_request_head, read_request_head};
use relay::{Relay, RelayConfig};

fn build_connector(config: &AppConfig) -> Result<AlwaysOnline> {
    let docstore = Arc::new(DocStoreClient::new(DocStoreConfig {
        base_url: config.docstore_url.clone(),
        index: config.docstore_index.clone(),
        timeout: config.timeout(),
    })?);

    let archive = Arc::new(ArchiveClient::new(ArchiveConfig {
        api_url: config.archive_api_url.clone(),
        timeout: config.timeout(),
        user_agent: config.user_agent.clone(),
    })?);

    let origin = Arc::new(OriginClient::new(OriginConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
    })?);

    let serp = Arc::new(SerpClient::new(SerpConfig {
        base_url: config.serp_url.clone(),
        timeout: config.timeout(),
        user_agent: config.user_agent.clone(),
    })?);

    let llm = Arc::new(LlmClient::new(LlmConfig {
        api_url: config.llm_api_url.clone(),
        api_key: config.llm_api_key.clone(),
        model: config.llm_model.clone(),
        timeout: config.timeout(),
    })?);

    let chain = Arc::new(ResolutionChain::new(
        docstore.clone(),
        archive,
        origin,
        serp,
        llm,
        docstore,
    ));

    let relay = Relay::new(RelayConfig {
        buffer_size: config.buffer_size,
        idle_timeout: config.relay_idle_timeout(),
        skip_tls_verify: config.relay_skip_tls_verify,
    });

    Ok(AlwaysOnline::new(chain, relay))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;
    let connector = Arc::new(build_connector(&config)?);

    let listener = TcpListener::bind(&config.listen).await?;
    tracing::info!("evergreen proxy listening on {}", config.listen);

    loop {
        let (mut conn, peer) = listener.accept().await?;
        let connector = connector.clone();

        tokio::spawn(async move {
            let raw = match read_request_head(&mut conn).await {
                Ok(Some(raw)) => raw,
                Ok(None) => return,
                Err(e) => {
                    tracing::debug!("failed to read request from {}: {}", peer, e);
                    return;
                }
            };

            let Some(target) = parse_request_head(&raw) else {
                tracing::debug!("unparseable request head from {}", peer);
                return;
            };

            tracing::debug!("{} {} from {}", target.method, target.absolute_url(), peer);
            let handled = connector.handle(&mut conn, &raw, &target).await;
            if !handled {
                tracing::debug!("request from {} was not fully handled", peer);
            }
        });
    }
}
