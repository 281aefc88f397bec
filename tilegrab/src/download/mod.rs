//! Concurrent, rate-limited tile downloading.
//!
//! # Architecture
//!
//! - [`DownloadService`]: request validation, style resolution and the
//!   one-session-at-a-time rule. This is what transports talk to.
//! - [`TileDownloader`]: runs one session (feeder, rate gate, worker pool).
//! - [`DownloadEvent`]: everything a session reports, in wire form.
//!
//! # Example
//!
//! ```ignore
//! use tilegrab::download::{DownloadService, DownloadConfig, EventEmitter};
//!
//! let service = DownloadService::new(registry, store, client, DownloadConfig::default());
//! let (events, mut rx) = EventEmitter::channel(256);
//! service.start_world(request, events)?;
//! while let Some(event) = rx.recv().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

mod config;
mod error;
mod events;
mod orchestrator;
mod policy;
mod progress;
mod rate;
mod request;
mod service;
mod session;
mod worker;

pub use config::{
    DownloadConfig, DEFAULT_BACKOFF_BASE, DEFAULT_EVENT_BUFFER, DEFAULT_MAX_RETRIES,
    DEFAULT_RATE_PER_SECOND, DEFAULT_WORKERS,
};
pub use error::DownloadError;
pub use events::{DownloadEvent, EventEmitter};
pub use orchestrator::{DownloadJob, TileDownloader};
pub use policy::RetryPolicy;
pub use progress::{DownloadOutcome, DownloadSummary, ProgressCounters};
pub use rate::RateGate;
pub use request::{AreaDownloadRequest, WorldDownloadRequest};
pub use service::DownloadService;
pub use session::{SessionGuard, SessionManager};
