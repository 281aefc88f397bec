//! CLI error types.

use std::fmt;
use std::io;

use tilegrab::provider::{ProviderError, RegistryError};

/// Errors that stop the server from starting or keep it from running.
#[derive(Debug)]
pub enum CliError {
    /// Invalid flag or environment value.
    Config(String),

    /// Map-source file could not be loaded.
    Registry(RegistryError),

    /// HTTP client could not be built.
    HttpClient(ProviderError),

    /// Listening socket could not be opened.
    Bind { addr: String, source: io::Error },

    /// Server stopped with an I/O error.
    Serve(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Registry(e) => write!(f, "Failed to load map sources: {}", e),
            CliError::HttpClient(e) => write!(f, "HTTP client unavailable: {}", e),
            CliError::Bind { addr, source } => {
                write!(f, "Failed to bind to {}: {}", addr, source)
            }
            CliError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Registry(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Bind { source, .. } => Some(source),
            CliError::Serve(e) => Some(e),
        }
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::HttpClient(e)
    }
}
