//! otaku-sw entry point.
//!
//! Boots the offline cache router against the SQLite store and serves its
//! event entry points as MCP tools on stdio. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use otaku_client::{FetchConfig, HttpNetwork};
use otaku_core::{AppConfig, CacheDb, Network, ServiceWorker};

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        version = %config.cache_version,
        origin = %config.origin,
        db_path = %config.db_path.display(),
        "Starting otaku-sw on stdio transport"
    );

    let store = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let worker = ServiceWorker::new(config, store, network)?;

    match worker.start().await {
        Ok(report) => tracing::info!(
            deleted_partitions = report.deleted_partitions.len(),
            purged_entries = report.purged_entries.len(),
            claimed_clients = report.claimed_clients,
            "worker activated"
        ),
        Err(err) => tracing::error!(error = %err, "worker failed to start, requests pass through to the network"),
    }

    let handler = handler::OtakuServer::new(Arc::new(worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
