//! Download request errors.

use thiserror::Error;

/// Reasons a download request is rejected.
///
/// Display strings are what transports show to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// A session is already running.
    #[error("Another download is already in progress.")]
    AlreadyRunning,

    /// Zoom range outside `0..=19` or inverted.
    #[error("Invalid zoom range (must be 0-19, min <= max)")]
    InvalidZoomRange { min: i32, max: i32 },

    /// The area request carried no polygons.
    #[error("No polygons provided")]
    NoPolygons,
}
