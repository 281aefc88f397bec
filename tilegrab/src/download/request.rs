//! Inbound download requests.

use serde::{Deserialize, Serialize};

use super::error::DownloadError;
use crate::coord::{GeoPoint, MAX_ZOOM, MIN_ZOOM};

/// Download the tiles covering a set of polygons.
///
/// Zoom levels are signed on the wire so that negative values reach
/// validation instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDownloadRequest {
    /// Closed rings; the first point need not be repeated at the end.
    pub polygons: Vec<Vec<GeoPoint>>,
    pub min_zoom: i32,
    pub max_zoom: i32,
    /// Tile URL template.
    pub map_style: String,
    #[serde(default)]
    pub convert_to_8bit: bool,
}

impl AreaDownloadRequest {
    /// Checks the zoom range and polygon list, returning the zoom range.
    pub fn validate(&self) -> Result<(u8, u8), DownloadError> {
        let range = validate_zoom_range(self.min_zoom, self.max_zoom)?;
        if self.polygons.is_empty() {
            return Err(DownloadError::NoPolygons);
        }
        Ok(range)
    }
}

/// Download every tile of the world at low zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDownloadRequest {
    /// Tile URL template.
    pub map_style: String,
    #[serde(default)]
    pub convert_to_8bit: bool,
}

fn validate_zoom_range(min: i32, max: i32) -> Result<(u8, u8), DownloadError> {
    let allowed = i32::from(MIN_ZOOM)..=i32::from(MAX_ZOOM);
    if !allowed.contains(&min) || !allowed.contains(&max) || min > max {
        return Err(DownloadError::InvalidZoomRange { min, max });
    }
    // Both values are within 0..=19
    Ok((min as u8, max as u8))
}
