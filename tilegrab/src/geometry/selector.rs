//! Area-to-tile selection.
//!
//! Turns request polygons into the list of tiles that must be fetched.
//! Each polygon is first reduced to a candidate rectangle of tiles from its
//! bounding box, then every candidate is classified precisely against the
//! polygon.
//!
//! # Ordering
//!
//! Output order is deterministic: polygon order, then zoom ascending, then
//! `x` ascending, then `y` ascending. A tile selected by an earlier polygon
//! keeps its first position.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use tracing::debug;

use super::polygon::Polygon;
use crate::coord::{to_tile_fraction, tile_bounds, BoundingBox, GeoPoint, TileCoord};

/// Highest zoom level covered by a world download.
pub const WORLD_MAX_ZOOM: u8 = 7;

/// Tolerance for snapping bounding-box edges onto grid lines, as a fraction
/// of the world width.
///
/// Edges round-tripped through the Mercator formulas land a few ulps off
/// the grid line they came from. Scaled by `2^z` this is about 40 µm on the
/// ground at every zoom.
const GRID_SNAP: f64 = 1e-12;

/// How a tile relates to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// All four tile corners are inside the polygon.
    TileInsidePolygon,
    /// All polygon vertices are inside the tile.
    PolygonInsideTile,
    /// The outlines touch or cross.
    Boundary,
}

/// Classifies a tile against a polygon. First matching rule wins; `None`
/// means the tile does not overlap the polygon.
pub fn classify(polygon: &Polygon<'_>, bounds: &BoundingBox) -> Option<Coverage> {
    if polygon.contains_box(bounds) {
        Some(Coverage::TileInsidePolygon)
    } else if polygon.is_within(bounds) {
        Some(Coverage::PolygonInsideTile)
    } else if polygon.intersects(bounds) {
        Some(Coverage::Boundary)
    } else {
        None
    }
}

/// Accumulates a deduplicated, ordered tile selection.
#[derive(Debug, Default)]
pub struct TileSelector {
    seen: HashSet<TileCoord>,
    tiles: Vec<TileCoord>,
}

impl TileSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every tile overlapping `ring` for zoom levels
    /// `min_zoom..=max_zoom`.
    ///
    /// Rings with fewer than three points contribute nothing. Returns the
    /// number of newly selected tiles.
    pub fn add_polygon(&mut self, ring: &[GeoPoint], min_zoom: u8, max_zoom: u8) -> usize {
        let Some(polygon) = Polygon::new(ring) else {
            debug!(points = ring.len(), "Skipping degenerate polygon");
            return 0;
        };

        let before = self.tiles.len();
        let bbox = polygon.bbox();

        for zoom in min_zoom..=max_zoom {
            let (xs, ys) = candidate_range(&bbox, zoom);

            for x in xs {
                for y in ys.clone() {
                    let tile = TileCoord { zoom, x, y };
                    if self.seen.contains(&tile) {
                        continue;
                    }

                    if classify(&polygon, &tile_bounds(&tile)).is_some() {
                        self.seen.insert(tile);
                        self.tiles.push(tile);
                    }
                }
            }
        }

        let added = self.tiles.len() - before;
        debug!(
            vertices = ring.len(),
            min_zoom,
            max_zoom,
            added,
            "Polygon tiles selected"
        );
        added
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        self.seen.contains(tile)
    }

    /// Consumes the selector, returning tiles in selection order.
    pub fn into_tiles(self) -> Vec<TileCoord> {
        self.tiles
    }
}

/// Selects the tiles covering `polygons` at zoom levels
/// `min_zoom..=max_zoom`, without duplicates.
pub fn select_tiles(polygons: &[Vec<GeoPoint>], min_zoom: u8, max_zoom: u8) -> Vec<TileCoord> {
    let mut selector = TileSelector::new();
    for ring in polygons {
        selector.add_polygon(ring, min_zoom, max_zoom);
    }
    selector.into_tiles()
}

/// Enumerates every tile from zoom 0 through `max_zoom`.
pub fn world_tiles(max_zoom: u8) -> Vec<TileCoord> {
    let total: usize = (0..=max_zoom)
        .map(|z| {
            let n = TileCoord::tiles_at_zoom(z) as usize;
            n * n
        })
        .sum();

    let mut tiles = Vec::with_capacity(total);
    for zoom in 0..=max_zoom {
        let n = TileCoord::tiles_at_zoom(zoom);
        for x in 0..n {
            for y in 0..n {
                tiles.push(TileCoord { zoom, x, y });
            }
        }
    }
    tiles
}

/// Tile rectangle that may overlap `bbox` at `zoom`.
///
/// Built from the north-west and south-east corners. The far edges are
/// exclusive, so a box ending exactly on a grid line does not pull in the
/// neighbouring row or column, and both axes are clamped to the grid.
fn candidate_range(bbox: &BoundingBox, zoom: u8) -> (RangeInclusive<u32>, RangeInclusive<u32>) {
    let n = TileCoord::tiles_at_zoom(zoom);
    let last = (n - 1) as f64;
    let snap = GRID_SNAP * n as f64;
    let (west_x, north_y) = to_tile_fraction(bbox.north, bbox.west, zoom);
    let (east_x, south_y) = to_tile_fraction(bbox.south, bbox.east, zoom);

    (
        grid_span(west_x, east_x, last, snap),
        grid_span(north_y, south_y, last, snap),
    )
}

fn grid_span(lo: f64, hi: f64, last: f64, snap: f64) -> RangeInclusive<u32> {
    let first = (lo + snap).floor().clamp(0.0, last);
    let end = ((hi - snap).ceil() - 1.0).clamp(0.0, last).max(first);
    first as u32..=end as u32
}
