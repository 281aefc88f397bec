//! Tile URL templates.
//!
//! Templates use the common slippy-map placeholders:
//!
//! | placeholder | value                         |
//! |-------------|-------------------------------|
//! | `{s}`       | subdomain, one of `a`, `b`, `c` |
//! | `{z}`       | zoom level                    |
//! | `{x}`       | tile column                   |
//! | `{y}`       | tile row                      |
//!
//! Any other text, including unknown placeholders, is passed through.

use rand::Rng;

use crate::coord::TileCoord;

/// Subdomains substituted for `{s}`.
pub const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// A tile server URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    template: String,
}

impl TileSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Builds the URL for a tile with an explicit subdomain.
    pub fn url_with_subdomain(&self, tile: TileCoord, subdomain: &str) -> String {
        self.template
            .replace("{s}", subdomain)
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    /// Builds the URL for a tile, spreading load over a random subdomain.
    pub fn url_for(&self, tile: TileCoord) -> String {
        let subdomain = SUBDOMAINS[rand::rng().random_range(0..SUBDOMAINS.len())];
        self.url_with_subdomain(tile, subdomain)
    }
}
