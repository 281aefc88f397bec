//! tilegrab - offline map tile downloader
//!
//! Turns a geographic area (polygons or the whole world) and a zoom range
//! into the set of slippy-map tiles covering it, then fetches those tiles
//! from a tile server into a local cache.
//!
//! # Modules
//!
//! - [`coord`]: lat/lon ↔ tile index conversion and tile footprints
//! - [`geometry`]: polygon predicates and area-to-tile selection
//! - [`cache`]: tile storage keyed by style and tile
//! - [`provider`]: URL templates, the HTTP seam and the map-source registry
//! - [`convert`]: 8-bit palette re-encoding
//! - [`download`]: the rate-limited, retrying, cancellable downloader

pub mod cache;
pub mod convert;
pub mod coord;
pub mod download;
pub mod geometry;
pub mod provider;

pub use coord::{BoundingBox, GeoPoint, TileCoord};
pub use download::{DownloadConfig, DownloadEvent, DownloadService};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
