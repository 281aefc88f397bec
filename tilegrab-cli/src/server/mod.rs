//! HTTP and WebSocket transport.
//!
//! # Routes
//!
//! ```text
//! /ws                              - download control channel (WebSocket)
//! /get_map_sources                 - map-source registry as JSON
//! /get_cached_tiles/:style         - cached tiles of a style as [[z,x,y], ...]
//! /tiles/:style/:z/:x/:y[.png]     - one cached tile
//! ```

mod handlers;
mod ws;

use axum::{routing::get, Router};
use tilegrab::DownloadService;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: DownloadService,
}

/// Builds the application router around a download service.
pub fn create_router(service: DownloadService) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/get_map_sources", get(handlers::map_sources_handler))
        .route("/get_cached_tiles/:style", get(handlers::cached_tiles_handler))
        .route("/tiles/:style/:z/:x/:y", get(handlers::tile_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
