//! Async HTTP client abstraction for testability

use std::time::Duration;

use super::types::ProviderError;
use crate::cache::BoxFuture;

/// User-Agent sent with every tile request.
pub const USER_AGENT: &str = concat!("tilegrab/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for async HTTP GET operations.
///
/// Callers that need cancellation race the returned future against their
/// token; dropping the future aborts the request.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET and returns the full body of a success response.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>>;
}

/// HTTP client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default 30 second timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ProviderError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| ProviderError::Body(e.to_string()))
        })
    }
}
