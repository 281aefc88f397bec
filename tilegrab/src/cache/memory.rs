//! In-memory tile store.
//!
//! Backed by `DashMap` so workers can read and write concurrently without
//! holding a lock across await points. Nothing is persisted or evicted.

use dashmap::DashMap;

use super::traits::{BoxFuture, CacheResult, TileStore};
use crate::coord::TileCoord;

type StoreKey = (String, TileCoord);

/// Concurrent in-memory tile store.
#[derive(Debug, Default)]
pub struct MemoryTileStore {
    tiles: DashMap<StoreKey, Vec<u8>>,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tiles across all styles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Stores a tile synchronously. Handy for seeding.
    pub fn insert(&self, style: &str, tile: TileCoord, data: Vec<u8>) {
        self.tiles.insert((style.to_string(), tile), data);
    }

    /// Returns a copy of a stored tile.
    pub fn tile(&self, style: &str, tile: TileCoord) -> Option<Vec<u8>> {
        self.tiles
            .get(&(style.to_string(), tile))
            .map(|entry| entry.value().clone())
    }
}

impl TileStore for MemoryTileStore {
    fn contains<'a>(&'a self, style: &'a str, tile: TileCoord) -> BoxFuture<'a, bool> {
        Box::pin(async move { self.tiles.contains_key(&(style.to_string(), tile)) })
    }

    fn put<'a>(
        &'a self,
        style: &'a str,
        tile: TileCoord,
        data: Vec<u8>,
    ) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            self.insert(style, tile, data);
            Ok(())
        })
    }

    fn list<'a>(&'a self, style: &'a str) -> BoxFuture<'a, CacheResult<Vec<TileCoord>>> {
        Box::pin(async move {
            let mut tiles: Vec<TileCoord> = self
                .tiles
                .iter()
                .filter(|entry| entry.key().0 == style)
                .map(|entry| entry.key().1)
                .collect();
            tiles.sort();
            Ok(tiles)
        })
    }

    fn get<'a>(
        &'a self,
        style: &'a str,
        tile: TileCoord,
    ) -> BoxFuture<'a, CacheResult<Option<Vec<u8>>>> {
        Box::pin(async move { Ok(self.tile(style, tile)) })
    }
}
