//! Polygon geometry and tile selection.
//!
//! [`polygon`] holds the planar predicates (orientation, segment
//! intersection, point-in-polygon). [`selector`] uses them to turn request
//! polygons into tile lists.

pub mod polygon;
mod selector;

pub use polygon::{Orientation, Polygon};
pub use selector::{
    classify, select_tiles, world_tiles, Coverage, TileSelector, WORLD_MAX_ZOOM,
};
