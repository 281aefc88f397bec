//! Download progress events.
//!
//! Events are the only thing a transport sees of a download. They
//! serialise as `{"type": ..., "data": ...}`, with `data` omitted for
//! variants that carry nothing.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::coord::{BoundingBox, TileCoord};

/// A state transition reported to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// The tile list is ready; emitted before the first tile is released.
    DownloadStarted { total_tiles: usize },
    /// The tile was already cached.
    TileSkipped(BoundingBox),
    /// The tile was fetched and stored.
    TileDownloaded(BoundingBox),
    /// Every attempt failed. `tile` is `z/x/y`.
    TileFailed { tile: String },
    /// All workers finished without cancellation.
    TilesDownloaded,
    /// Final event of a successful session.
    DownloadComplete,
    /// Final event of a cancelled session.
    DownloadCancelled,
    /// A request was rejected.
    Error { message: String },
}

impl DownloadEvent {
    pub fn tile_failed(tile: TileCoord) -> Self {
        Self::TileFailed {
            tile: tile.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// True for events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::DownloadComplete | Self::DownloadCancelled)
    }
}

/// Sending half of an event stream.
///
/// Emission waits for channel capacity, so a slow consumer slows the
/// workers down instead of growing memory. A dropped receiver turns
/// emission into a no-op.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::Sender<DownloadEvent>,
}

impl EventEmitter {
    /// Creates an emitter and the matching receiver.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<DownloadEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: DownloadEvent) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event).await {
            trace!(?event, "Event receiver dropped");
        }
    }

    /// True once the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
