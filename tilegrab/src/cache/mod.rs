//! Tile storage.
//!
//! [`TileStore`] is the async, object-safe contract the downloader writes
//! through. [`DiskTileCache`] is the production store;
//! [`MemoryTileStore`] keeps everything in memory.
//!
//! Style names are sanitized with [`sanitize_style_name`] before they reach
//! a store, so stores can use them directly as path components.

mod disk;
mod memory;
mod style;
mod traits;

pub use disk::DiskTileCache;
pub use memory::MemoryTileStore;
pub use style::sanitize_style_name;
pub use traits::{BoxFuture, CacheError, CacheResult, TileStore};
