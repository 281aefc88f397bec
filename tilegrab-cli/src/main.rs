//! tilegrab - offline map tile downloader server.
//!
//! Starts the HTTP server that exposes the download control channel and the
//! cached-tile endpoints on top of the `tilegrab` library.

mod config;
mod error;
mod logging;
mod server;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tilegrab::cache::DiskTileCache;
use tilegrab::provider::AsyncReqwestClient;
use tilegrab::DownloadService;
use tracing::{error, info, warn};

use config::ServeConfig;
use error::CliError;
use server::create_router;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServeConfig::parse();
    let _log_guard = logging::init_logging(config.verbose, config.log_dir.as_deref());

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServeConfig) -> Result<(), CliError> {
    config.validate()?;

    let registry = config.load_registry()?;
    let client = AsyncReqwestClient::with_timeout(config.request_timeout())?;
    let store = DiskTileCache::new(&config.maps_directory);
    let download_config = config.download_config();

    info!(version = tilegrab::VERSION, "Starting tilegrab");
    info!(
        maps_directory = %store.root().display(),
        map_sources = registry.len(),
        workers = download_config.workers,
        rate_per_second = download_config.rate_per_second,
        max_retries = download_config.max_retries,
        request_timeout_secs = config.request_timeout,
        "Configuration"
    );

    let service = DownloadService::new(
        Arc::new(registry),
        Arc::new(store),
        Arc::new(client),
        download_config,
    );
    let router = create_router(service.clone());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| CliError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "Listening, control channel at ws://{}/ws", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(service))
        .await
        .map_err(CliError::Serve)?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C after cancelling any running download.
async fn shutdown_signal(service: DownloadService) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }

    info!("Shutdown requested");
    if service.cancel() {
        info!("Cancelled the running download");
    }
}
