//! Read-only HTTP endpoints.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tilegrab::provider::MapSourceRegistry;
use tilegrab::TileCoord;
use tracing::{debug, warn};

use super::AppState;

/// Path parameters of `/tiles/:style/:z/:x/:y`.
///
/// Coordinates arrive as strings so malformed ones answer 404 like absent
/// tiles do.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    pub style: String,
    pub z: String,
    pub x: String,
    /// Row, optionally suffixed with `.png`.
    pub y: String,
}

impl TilePathParams {
    fn tile(&self) -> Option<TileCoord> {
        let y = self.y.strip_suffix(".png").unwrap_or(&self.y);
        let zoom = self.z.parse().ok()?;
        let x = self.x.parse().ok()?;
        let y = y.parse().ok()?;
        TileCoord::new(x, y, zoom).ok()
    }
}

/// `GET /get_map_sources`
pub async fn map_sources_handler(State(state): State<AppState>) -> Json<MapSourceRegistry> {
    Json(state.service.registry().clone())
}

/// `GET /get_cached_tiles/:style`
///
/// Responds with `[[z, x, y], ...]`, sorted, empty for unknown styles.
pub async fn cached_tiles_handler(
    State(state): State<AppState>,
    Path(style): Path<String>,
) -> Response {
    match state.service.cached_tiles(&style).await {
        Ok(tiles) => {
            let triples: Vec<[u32; 3]> = tiles
                .iter()
                .map(|t| [u32::from(t.zoom), t.x, t.y])
                .collect();
            Json(triples).into_response()
        }
        Err(e) => {
            warn!(style = %style, error = %e, "Failed to list cached tiles");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// `GET /tiles/:style/:z/:x/:y`
pub async fn tile_handler(
    State(state): State<AppState>,
    Path(params): Path<TilePathParams>,
) -> Response {
    let Some(tile) = params.tile() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.service.cached_tile(&params.style, tile).await {
        Ok(Some(data)) => ([(header::CONTENT_TYPE, "image/png")], data).into_response(),
        Ok(None) => {
            debug!(style = %params.style, tile = %tile, "Tile not cached");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            warn!(style = %params.style, tile = %tile, error = %e, "Failed to read cached tile");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
