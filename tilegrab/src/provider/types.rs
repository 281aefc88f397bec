//! Provider error type.

use thiserror::Error;

/// Errors raised while fetching a tile from a remote server.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The fetch was abandoned because the download was cancelled.
    #[error("request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// True for the error kinds worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::ClientBuild(_))
    }
}
