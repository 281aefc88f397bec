//! Filesystem tile store.
//!
//! Layout: `<root>/<style>/<z>/<x>/<y>.png`. The directory tree is the only
//! index; listing a style walks it.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use super::traits::{BoxFuture, CacheError, CacheResult, TileStore};
use crate::coord::TileCoord;

/// Tile file extension. Tiles are stored under `.png` whatever the server
/// actually sent.
const TILE_EXTENSION: &str = "png";

/// Tile store rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskTileCache {
    root: PathBuf,
}

impl DiskTileCache {
    /// Creates a store rooted at `root`. Nothing is created until the first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every tile of a style.
    pub fn style_dir(&self, style: &str) -> PathBuf {
        self.root.join(style)
    }

    /// Path a tile is stored at.
    pub fn tile_path(&self, style: &str, tile: TileCoord) -> PathBuf {
        self.style_dir(style)
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.{}", tile.y, TILE_EXTENSION))
    }

    /// Reads a stored tile, or `None` if it is absent.
    pub async fn read_tile(&self, style: &str, tile: TileCoord) -> CacheResult<Option<Vec<u8>>> {
        let path = self.tile_path(style, tile);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    async fn write_tile(&self, style: &str, tile: TileCoord, data: Vec<u8>) -> CacheResult<()> {
        let path = self.tile_path(style, tile);
        let Some(dir) = path.parent() else {
            return Err(CacheError::Write {
                path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "tile path has no parent"),
            });
        };

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| CacheError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

        // Concurrent writers of the same tile each use their own temp file
        let tmp = dir.join(format!(
            ".{}.{:08x}.tmp",
            tile.y,
            rand::random::<u32>()
        ));

        if let Err(source) = tokio::fs::write(&tmp, &data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Write { path: tmp, source });
        }

        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Write { path, source });
        }

        trace!(style, tile = %tile, bytes = data.len(), "Tile written");
        Ok(())
    }

    async fn list_tiles(&self, style: &str) -> CacheResult<Vec<TileCoord>> {
        let style_dir = self.style_dir(style);

        tokio::task::spawn_blocking(move || scan_style_dir(&style_dir))
            .await
            .map_err(|e| CacheError::List(e.to_string()))?
    }
}

impl TileStore for DiskTileCache {
    fn contains<'a>(&'a self, style: &'a str, tile: TileCoord) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let path = self.tile_path(style, tile);
            tokio::fs::try_exists(&path).await.unwrap_or(false)
        })
    }

    fn put<'a>(
        &'a self,
        style: &'a str,
        tile: TileCoord,
        data: Vec<u8>,
    ) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(self.write_tile(style, tile, data))
    }

    fn list<'a>(&'a self, style: &'a str) -> BoxFuture<'a, CacheResult<Vec<TileCoord>>> {
        Box::pin(self.list_tiles(style))
    }

    fn get<'a>(
        &'a self,
        style: &'a str,
        tile: TileCoord,
    ) -> BoxFuture<'a, CacheResult<Option<Vec<u8>>>> {
        Box::pin(self.read_tile(style, tile))
    }
}

/// Collects every `<z>/<x>/<y>.png` under a style directory.
fn scan_style_dir(style_dir: &Path) -> CacheResult<Vec<TileCoord>> {
    if !style_dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/*/*/*.{}",
        glob::Pattern::escape(&style_dir.to_string_lossy()),
        TILE_EXTENSION
    );
    let entries = glob::glob(&pattern).map_err(|e| CacheError::List(e.to_string()))?;

    let mut tiles = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable cache entry");
                continue;
            }
        };

        if let Some(tile) = path
            .strip_prefix(style_dir)
            .ok()
            .and_then(parse_relative_tile_path)
        {
            tiles.push(tile);
        }
    }

    tiles.sort();
    Ok(tiles)
}

/// Parses `z/x/y.png` relative to a style directory.
///
/// Anything that is not three numeric components forming an on-grid tile
/// is rejected, including leftover temp files.
fn parse_relative_tile_path(relative: &Path) -> Option<TileCoord> {
    let mut parts = relative.components().map(|c| match c {
        Component::Normal(s) => s.to_str(),
        _ => None,
    });

    let zoom: u8 = parts.next()??.parse().ok()?;
    let x: u32 = parts.next()??.parse().ok()?;
    let file = parts.next()??;
    if parts.next().is_some() {
        return None;
    }

    let y: u32 = file
        .strip_suffix(TILE_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()?;

    TileCoord::new(x, y, zoom).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tile(zoom: u8, x: u32, y: u32) -> TileCoord {
        TileCoord { zoom, x, y }
    }

    #[test]
    fn test_tile_path_layout() {
        let cache = DiskTileCache::new("/maps");
        assert_eq!(
            cache.tile_path("osm", tile(5, 10, 12)),
            PathBuf::from("/maps/osm/5/10/12.png")
        );
    }

    #[test]
    fn test_parse_relative_tile_path() {
        assert_eq!(
            parse_relative_tile_path(Path::new("3/4/5.png")),
            Some(tile(3, 4, 5))
        );
        assert_eq!(parse_relative_tile_path(Path::new("3/4/.5.0badf00d.tmp")), None);
        assert_eq!(parse_relative_tile_path(Path::new("3/4/five.png")), None);
        assert_eq!(parse_relative_tile_path(Path::new("3/4/5.jpg")), None);
        assert_eq!(parse_relative_tile_path(Path::new("3/8/5.png")), None);
        assert_eq!(parse_relative_tile_path(Path::new("3/4/5/6.png")), None);
    }

    #[tokio::test]
    async fn test_put_then_contains_and_read() {
        let dir = TempDir::new().unwrap();
        let cache = DiskTileCache::new(dir.path());
        let t = tile(4, 3, 2);

        assert!(!cache.contains("osm", t).await);
        cache.put("osm", t, vec![1, 2, 3]).await.unwrap();

        assert!(cache.contains("osm", t).await);
        assert!(dir.path().join("osm/4/3/2.png").is_file());
        assert_eq!(cache.read_tile("osm", t).await.unwrap(), Some(vec![1, 2, 3]));
        assert!(!cache.contains("other", t).await);
    }

    #[tokio::test]
    async fn test_put_replaces_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let cache = DiskTileCache::new(dir.path());
        let t = tile(2, 1, 1);

        cache.put("s", t, vec![1]).await.unwrap();
        cache.put("s", t, vec![2, 2]).await.unwrap();

        assert_eq!(cache.get("s", t).await.unwrap(), Some(vec![2, 2]));
        let names: Vec<_> = std::fs::read_dir(dir.path().join("s/2/1"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("1.png")]);
    }

    #[tokio::test]
    async fn test_read_missing_tile_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = DiskTileCache::new(dir.path());

        assert_eq!(cache.read_tile("osm", tile(0, 0, 0)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_sorted_and_ignores_junk() {
        let dir = TempDir::new().unwrap();
        let cache = DiskTileCache::new(dir.path());

        for t in [tile(3, 2, 1), tile(1, 0, 1), tile(3, 1, 7)] {
            cache.put("osm", t, vec![0]).await.unwrap();
        }
        std::fs::write(dir.path().join("osm/3/2/notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("osm/3/2/readme.png"), b"x").unwrap();

        let tiles = cache.list("osm").await.unwrap();
        assert_eq!(tiles, vec![tile(1, 0, 1), tile(3, 1, 7), tile(3, 2, 1)]);
    }

    #[tokio::test]
    async fn test_list_unknown_style_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = DiskTileCache::new(dir.path());

        assert!(cache.list("nothing-here").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let cache = DiskTileCache::new(&blocker);

        let err = cache.put("osm", tile(1, 1, 1), vec![1]).await.unwrap_err();
        assert!(matches!(err, CacheError::CreateDir { .. }), "{err}");
    }
}
