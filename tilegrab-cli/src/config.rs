//! Command-line and environment configuration.
//!
//! Every option can be given as a flag or through a `TILEGRAB_*`
//! environment variable; flags win.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tilegrab::download::{
    DownloadConfig, DEFAULT_MAX_RETRIES, DEFAULT_RATE_PER_SECOND, DEFAULT_WORKERS,
};
use tilegrab::provider::{MapSourceRegistry, DEFAULT_REQUEST_TIMEOUT};

use crate::error::CliError;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind host (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default tile cache directory.
pub const DEFAULT_MAPS_DIRECTORY: &str = "maps";

/// Offline map tile downloader.
///
/// Serves a WebSocket control channel at `/ws` that starts and cancels
/// downloads, plus HTTP endpoints for the map-source list and cached tiles.
#[derive(Parser, Debug, Clone)]
#[command(name = "tilegrab", author, version, about, long_about = None)]
pub struct ServeConfig {
    /// Host address to bind to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILEGRAB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILEGRAB_PORT")]
    pub port: u16,

    /// Directory downloaded tiles are cached in.
    #[arg(
        long = "maps-directory",
        default_value = DEFAULT_MAPS_DIRECTORY,
        env = "TILEGRAB_MAPS_DIRECTORY"
    )]
    pub maps_directory: PathBuf,

    /// Concurrent download workers.
    #[arg(long, default_value_t = DEFAULT_WORKERS, env = "TILEGRAB_MAX_WORKERS")]
    pub max_workers: usize,

    /// Tiles released per second across all workers.
    #[arg(long, default_value_t = DEFAULT_RATE_PER_SECOND, env = "TILEGRAB_RATE_LIMIT")]
    pub rate_limit: u32,

    /// Fetch attempts per tile, including the first.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, env = "TILEGRAB_MAX_RETRIES")]
    pub max_retries: u32,

    /// Per-request HTTP timeout in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(),
        env = "TILEGRAB_REQUEST_TIMEOUT"
    )]
    pub request_timeout: u64,

    /// JSON file of `{"name": "url template"}` replacing the built-in map sources.
    #[arg(long, env = "TILEGRAB_MAP_SOURCES")]
    pub map_sources: Option<PathBuf>,

    /// Directory for daily-rotated log files, in addition to stderr.
    #[arg(long, env = "TILEGRAB_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, env = "TILEGRAB_VERBOSE")]
    pub verbose: bool,
}

impl ServeConfig {
    /// Rejects settings the downloader cannot run with.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.max_workers == 0 {
            return Err(CliError::Config("--max-workers must be at least 1".into()));
        }
        if self.rate_limit == 0 {
            return Err(CliError::Config("--rate-limit must be at least 1".into()));
        }
        if self.max_retries == 0 {
            return Err(CliError::Config("--max-retries must be at least 1".into()));
        }
        if self.request_timeout == 0 {
            return Err(CliError::Config(
                "--request-timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Downloader settings derived from the flags.
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::default()
            .with_workers(self.max_workers)
            .with_rate_per_second(self.rate_limit)
            .with_max_retries(self.max_retries)
            .with_request_timeout(self.request_timeout())
    }

    /// The built-in map sources, or the `--map-sources` file when given.
    pub fn load_registry(&self) -> Result<MapSourceRegistry, CliError> {
        match &self.map_sources {
            Some(path) => Ok(MapSourceRegistry::from_file(path)?),
            None => Ok(MapSourceRegistry::embedded()),
        }
    }
}
