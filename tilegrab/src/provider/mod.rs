//! Tile sources and the HTTP layer.
//!
//! - [`TileSource`] expands URL templates for a tile.
//! - [`AsyncHttpClient`] is the fetch seam; [`AsyncReqwestClient`] is the
//!   production implementation.
//! - [`MapSourceRegistry`] maps style names to templates and back.

mod http;
mod registry;
mod template;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_REQUEST_TIMEOUT, USER_AGENT};
pub use registry::{MapSourceRegistry, RegistryError, DEFAULT_STYLE};
pub use template::{TileSource, SUBDOMAINS};
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
