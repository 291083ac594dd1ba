//! dockerinfo daemon entry point.

use std::sync::Arc;

use log::{error, info};
use tokio::signal;

mod cache;
mod config;
mod error;
mod http;
mod lookup;
mod record;
mod refresher;
mod runtime;
mod types;

use cache::SnapshotCache;
use config::Config;
use lookup::LookupService;
use refresher::Refresher;
use runtime::DockerRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let cfg = Config::load()?;

    // Initialize logging; RUST_LOG refines the configured level
    env_logger::Builder::new()
        .filter_level(cfg.log_filter())
        .parse_default_env()
        .init();
    info!("Starting dockerinfo with config: {:?}", cfg);

    // Container inventory (Docker)
    let runtime = DockerRuntime::connect(cfg.docker_timeout())?;

    // Snapshot cache and lookups
    let cache = SnapshotCache::new(Refresher::new(Arc::new(runtime)), cfg.freshness());
    let lookup = Arc::new(LookupService::new(cache));

    // HTTP server, until Ctrl+C
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
    };
    if let Err(e) = http::serve(cfg.listen, lookup, shutdown).await {
        error!("HTTP server failed: {}", e);
        return Err(e);
    }

    info!("Shutdown complete.");
    Ok(())
}
