//! Storage contract for downloaded tiles.
//!
//! Tiles are addressed by `(style, zoom, x, y)`. Existence is the only state
//! a store tracks: there is no metadata, no expiry and no eviction.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;

use crate::coord::TileCoord;

/// Errors raised by tile stores.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Creating the tile's parent directories failed.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing or publishing the tile file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a stored tile failed for a reason other than absence.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Listing the style directory failed.
    #[error("failed to list cached tiles: {0}")]
    List(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistent tile storage keyed by style and tile address.
///
/// Implementations receive the already sanitized style name (see
/// [`super::sanitize_style_name`]) and must be safe to share across worker
/// tasks. Writes to distinct tiles never conflict.
pub trait TileStore: Send + Sync {
    /// Returns true if the tile has been stored before.
    ///
    /// Lookup failures count as a miss so the tile is fetched again.
    fn contains<'a>(&'a self, style: &'a str, tile: TileCoord) -> BoxFuture<'a, bool>;

    /// Stores a tile, replacing any previous content.
    fn put<'a>(
        &'a self,
        style: &'a str,
        tile: TileCoord,
        data: Vec<u8>,
    ) -> BoxFuture<'a, CacheResult<()>>;

    /// Lists every stored tile of a style, sorted by zoom, `x`, `y`.
    ///
    /// An unknown style yields an empty list.
    fn list<'a>(&'a self, style: &'a str) -> BoxFuture<'a, CacheResult<Vec<TileCoord>>>;

    /// Returns the stored bytes of a tile, or `None` if it is absent.
    fn get<'a>(
        &'a self,
        style: &'a str,
        tile: TileCoord,
    ) -> BoxFuture<'a, CacheResult<Option<Vec<u8>>>>;
}
