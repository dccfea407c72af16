//! tierscope server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tierscope_client::{
    HttpImageWarmer, ImageWarmer, PlayerLookup, ProfileLinks, RankingClient, RankingConfig, RequestQueue, RetryPolicy,
};
use tierscope_core::{AppConfig, CacheDb, TtlCache};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(api = %config.api_base_url, db = %config.db_path.display(), "Starting tierscope server on stdio transport");

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache database at {}", config.db_path.display()))?;

    let client = RankingClient::new(RankingConfig {
        base_url: config.api_base_url.clone(),
        timeout: config.timeout(),
        user_agent: config.user_agent.clone(),
        retry: RetryPolicy::default(),
    })?;

    let warmer: Arc<dyn ImageWarmer> = Arc::new(HttpImageWarmer::new(&config.user_agent, config.timeout())?);
    let links = ProfileLinks::new(&config.avatar_url_template, &config.profile_url_template);

    let mut lookup = PlayerLookup::new(client, RequestQueue::new(), TtlCache::new(db), links);
    if config.warm_avatars {
        lookup = lookup.with_warmer(Arc::clone(&warmer));
    }

    let handler = handler::TierscopeServer::new(lookup, warmer);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
