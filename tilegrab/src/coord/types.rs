//! Coordinate value types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum zoom level of the tile pyramid.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level accepted for downloads.
pub const MAX_ZOOM: u8 = 19;

/// Errors raised when constructing coordinates that violate the tile grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Zoom level outside `MIN_ZOOM..=MAX_ZOOM`.
    #[error("invalid zoom level {0} (must be {MIN_ZOOM}-{MAX_ZOOM})")]
    InvalidZoom(u8),

    /// Tile index outside the `2^z × 2^z` grid of its zoom level.
    #[error("tile {x},{y} is outside the grid at zoom {zoom}")]
    OutOfGrid { x: u32, y: u32, zoom: u8 },
}

/// A slippy-map tile address.
///
/// `x` grows west to east, `y` grows north to south. Ordering is
/// zoom-major, then `x`, then `y`, which matches the selector's
/// enumeration order within a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Creates a tile, checking that it lies on the grid of its zoom level.
    pub fn new(x: u32, y: u32, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = Self::tiles_at_zoom(zoom);
        if x >= n || y >= n {
            return Err(CoordError::OutOfGrid { x, y, zoom });
        }
        Ok(Self { zoom, x, y })
    }

    /// Number of tiles along one axis at the given zoom (`2^zoom`).
    #[inline]
    pub fn tiles_at_zoom(zoom: u8) -> u32 {
        1u32 << zoom
    }

    /// Returns true if the tile satisfies the grid invariant.
    pub fn is_valid(&self) -> bool {
        self.zoom <= MAX_ZOOM
            && self.x < Self::tiles_at_zoom(self.zoom)
            && self.y < Self::tiles_at_zoom(self.zoom)
    }

    /// Geographic footprint of this tile.
    pub fn bounds(&self) -> BoundingBox {
        super::tile_bounds(self)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned geographic rectangle.
///
/// Serialises with the field order the event stream uses
/// (`west, south, east, north`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self {
            west: first.lng,
            south: first.lat,
            east: first.lng,
            north: first.lat,
        };
        for p in &points[1..] {
            bbox.north = bbox.north.max(p.lat);
            bbox.south = bbox.south.min(p.lat);
            bbox.east = bbox.east.max(p.lng);
            bbox.west = bbox.west.min(p.lng);
        }
        Some(bbox)
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng >= self.west
            && point.lng <= self.east
    }

    pub fn north_west(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.west)
    }

    pub fn north_east(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.east)
    }

    pub fn south_east(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.east)
    }

    pub fn south_west(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.west)
    }

    /// Corners in ring order, starting at the north-west corner.
    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            self.north_west(),
            self.north_east(),
            self.south_east(),
            self.south_west(),
        ]
    }
}
