//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates used by slippy-map tile servers.

mod types;

pub use types::{BoundingBox, CoordError, GeoPoint, TileCoord, MAX_ZOOM, MIN_ZOOM};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// Uses the spherical Mercator formula and floors the result. Nothing is
/// clamped: a longitude of exactly 180 yields `x == 2^zoom`, and latitudes
/// close to the poles produce saturated rows. Callers that need on-grid
/// tiles clamp themselves (see [`crate::geometry`]).
///
/// # Arguments
///
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees
/// * `zoom` - Zoom level
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> TileCoord {
    let (fx, fy) = to_tile_fraction(lat, lon, zoom);

    TileCoord {
        zoom,
        x: fx.floor() as u32,
        y: fy.floor() as u32,
    }
}

/// Fractional tile position of a geographic point.
///
/// The integer part is the tile index, the fractional part the position
/// inside the tile. Grid lines map back to whole numbers up to floating
/// point error.
#[inline]
pub fn to_tile_fraction(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);

    let x = n * (lon + 180.0) / 360.0;

    let lat_rad = lat * PI / 180.0;
    let y = n * (1.0 - lat_rad.tan().asinh() / PI) / 2.0;

    (x, y)
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    grid_corner(tile.x, tile.y, tile.zoom)
}

/// Computes the geographic bounding box of a tile.
///
/// North/south come from the inverse Web Mercator latitude of the tile's
/// top and bottom rows; east/west are linear in longitude.
pub fn tile_bounds(tile: &TileCoord) -> BoundingBox {
    let (north, west) = grid_corner(tile.x, tile.y, tile.zoom);
    let (south, east) = grid_corner(tile.x + 1, tile.y + 1, tile.zoom);

    BoundingBox {
        west,
        south,
        east,
        north,
    }
}

/// Latitude/longitude of a grid line intersection at the given zoom.
fn grid_corner(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);

    let lon = x as f64 / n * 360.0 - 180.0;

    let lat_rad = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}
