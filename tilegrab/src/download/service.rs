//! Download entry point for transports.
//!
//! [`DownloadService`] ties the map-source registry, tile store, HTTP client
//! and session bookkeeping together. Transports hand it decoded requests
//! and an [`EventEmitter`]; everything else happens on spawned tasks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::config::DownloadConfig;
use super::error::DownloadError;
use super::events::{DownloadEvent, EventEmitter};
use super::orchestrator::{DownloadJob, TileDownloader};
use super::progress::DownloadSummary;
use super::request::{AreaDownloadRequest, WorldDownloadRequest};
use super::session::{SessionGuard, SessionManager};
use crate::cache::{sanitize_style_name, CacheResult, TileStore};
use crate::coord::{GeoPoint, TileCoord};
use crate::geometry::{select_tiles, world_tiles, WORLD_MAX_ZOOM};
use crate::provider::{AsyncHttpClient, MapSourceRegistry, TileSource};

/// What area a session covers.
enum Area {
    Polygons {
        polygons: Vec<Vec<GeoPoint>>,
        min_zoom: u8,
        max_zoom: u8,
    },
    World,
}

/// Starts, cancels and inspects download sessions.
///
/// At most one session runs at a time per service.
#[derive(Clone)]
pub struct DownloadService {
    registry: Arc<MapSourceRegistry>,
    store: Arc<dyn TileStore>,
    downloader: Arc<TileDownloader>,
    sessions: SessionManager,
}

impl DownloadService {
    pub fn new(
        registry: Arc<MapSourceRegistry>,
        store: Arc<dyn TileStore>,
        client: Arc<dyn AsyncHttpClient>,
        config: DownloadConfig,
    ) -> Self {
        let downloader = TileDownloader::new(client, Arc::clone(&store), config);
        Self {
            registry,
            store,
            downloader: Arc::new(downloader),
            sessions: SessionManager::new(),
        }
    }

    pub fn registry(&self) -> &MapSourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn TileStore> {
        &self.store
    }

    pub fn config(&self) -> &DownloadConfig {
        self.downloader.config()
    }

    /// Cache directory name for a tile URL template.
    pub fn style_for_template(&self, template: &str) -> String {
        sanitize_style_name(self.registry.style_name_for(template))
    }

    /// Starts downloading the tiles covering the request's polygons.
    ///
    /// Validation and the one-session check happen before anything is
    /// spawned. A rejected request is reported on `events` as an `error`
    /// and returned; the running session, if any, is unaffected.
    pub fn start_area(
        &self,
        request: AreaDownloadRequest,
        events: EventEmitter,
    ) -> Result<JoinHandle<DownloadSummary>, DownloadError> {
        let (min_zoom, max_zoom) = match request.validate() {
            Ok(range) => range,
            Err(e) => return Err(self.reject(e, events)),
        };

        info!(
            polygons = request.polygons.len(),
            min_zoom,
            max_zoom,
            map_style = %request.map_style,
            "Area download requested"
        );

        let area = Area::Polygons {
            polygons: request.polygons,
            min_zoom,
            max_zoom,
        };
        self.start(area, request.map_style, request.convert_to_8bit, events)
    }

    /// Starts downloading every tile from zoom 0 to 7.
    pub fn start_world(
        &self,
        request: WorldDownloadRequest,
        events: EventEmitter,
    ) -> Result<JoinHandle<DownloadSummary>, DownloadError> {
        info!(
            map_style = %request.map_style,
            max_zoom = WORLD_MAX_ZOOM,
            "World download requested"
        );
        self.start(Area::World, request.map_style, request.convert_to_8bit, events)
    }

    /// Cancels the running session. Returns false if none is running.
    ///
    /// The session reports `download_cancelled` once its workers stop.
    pub fn cancel(&self) -> bool {
        let cancelled = self.sessions.cancel();
        if cancelled {
            info!("Download cancellation requested");
        }
        cancelled
    }

    pub fn is_running(&self) -> bool {
        self.sessions.is_running()
    }

    /// Tiles stored under a style name (sanitized here).
    pub async fn cached_tiles(&self, style: &str) -> CacheResult<Vec<TileCoord>> {
        let style = sanitize_style_name(style);
        self.store.list(&style).await
    }

    /// Bytes of a stored tile, or `None` if it has not been downloaded.
    pub async fn cached_tile(&self, style: &str, tile: TileCoord) -> CacheResult<Option<Vec<u8>>> {
        let style = sanitize_style_name(style);
        self.store.get(&style, tile).await
    }

    fn start(
        &self,
        area: Area,
        template: String,
        convert: bool,
        events: EventEmitter,
    ) -> Result<JoinHandle<DownloadSummary>, DownloadError> {
        let guard = match self.sessions.try_begin() {
            Ok(guard) => guard,
            Err(e) => return Err(self.reject(e, events)),
        };

        let style = self.style_for_template(&template);
        let downloader = Arc::clone(&self.downloader);

        Ok(tokio::spawn(run_session(
            downloader, guard, area, template, style, convert, events,
        )))
    }

    fn reject(&self, error: DownloadError, events: EventEmitter) -> DownloadError {
        warn!(error = %error, "Download request rejected");
        let message = error.to_string();
        tokio::spawn(async move { events.emit(DownloadEvent::error(message)).await });
        error
    }
}

/// Selects tiles and runs the session. The guard ends the session on drop.
async fn run_session(
    downloader: Arc<TileDownloader>,
    guard: SessionGuard,
    area: Area,
    template: String,
    style: String,
    convert: bool,
    events: EventEmitter,
) -> DownloadSummary {
    let tiles = match area {
        Area::World => world_tiles(WORLD_MAX_ZOOM),
        Area::Polygons {
            polygons,
            min_zoom,
            max_zoom,
        } => {
            let selected = tokio::task::spawn_blocking(move || {
                select_tiles(&polygons, min_zoom, max_zoom)
            })
            .await;
            match selected {
                Ok(tiles) => tiles,
                Err(e) => {
                    warn!(error = %e, "Tile selection aborted");
                    Vec::new()
                }
            }
        }
    };

    let job = DownloadJob {
        tiles,
        source: TileSource::new(template),
        style,
        convert,
    };

    let summary = downloader.run(job, guard.token().clone(), events).await;
    info!(session = guard.id(), %summary, "Download session ended");
    drop(guard);
    summary
}
