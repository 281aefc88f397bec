//! Concurrent tile download orchestration.
//!
//! A session is one feeder plus a fixed pool of workers:
//!
//! ```text
//!  tiles ──► feeder ──(RateGate tick)──► queue (cap 1) ──► worker 1..N
//!                                                            │
//!                                     events ◄───────────────┘
//! ```
//!
//! The feeder releases at most one tile per rate period in selector order.
//! Workers claim tiles as they become free, so completion order is
//! unordered.
//!
//! # Cancellation
//!
//! Cancelling the token stops the feeder before its next release and stops
//! every worker before its next claim. In-flight requests are aborted and
//! no new request is started, so at most one tile per worker is affected.
//! A worker sleeping in backoff notices at its next attempt. Tiles
//! interrupted by cancellation produce no event.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::DownloadConfig;
use super::events::{DownloadEvent, EventEmitter};
use super::progress::{DownloadOutcome, DownloadSummary, ProgressCounters};
use super::rate::RateGate;
use super::worker::{run_worker, TileQueue, WorkerContext};
use crate::cache::TileStore;
use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, TileSource};

/// Capacity of the work queue between feeder and workers.
///
/// Kept at one so the rate gate, not the buffer, decides when tiles are
/// released.
const QUEUE_CAPACITY: usize = 1;

/// One session's worth of work.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Tiles in release order.
    pub tiles: Vec<TileCoord>,
    /// Where tiles are fetched from.
    pub source: TileSource,
    /// Sanitized style name the tiles are stored under.
    pub style: String,
    /// Re-encode tiles as 8-bit PNG before storing.
    pub convert: bool,
}

/// Runs download sessions against a store and an HTTP client.
pub struct TileDownloader {
    client: Arc<dyn AsyncHttpClient>,
    store: Arc<dyn TileStore>,
    config: DownloadConfig,
}

impl TileDownloader {
    pub fn new(
        client: Arc<dyn AsyncHttpClient>,
        store: Arc<dyn TileStore>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Downloads every tile of `job`, reporting progress on `events`.
    ///
    /// Emits `download_started` first. When all workers have finished it
    /// emits `tiles_downloaded` and `download_complete`, or
    /// `download_cancelled` if `token` was cancelled.
    pub async fn run(
        &self,
        job: DownloadJob,
        token: CancellationToken,
        events: EventEmitter,
    ) -> DownloadSummary {
        let started = Instant::now();
        let total = job.tiles.len();
        let workers = self.config.workers.max(1);

        info!(
            style = %job.style,
            total_tiles = total,
            workers,
            rate_per_second = self.config.rate_per_second,
            max_retries = self.config.max_retries,
            convert = job.convert,
            "Download started"
        );
        events
            .emit(DownloadEvent::DownloadStarted { total_tiles: total })
            .await;

        let counters = Arc::new(ProgressCounters::new());
        let ctx = Arc::new(WorkerContext {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            source: job.source,
            style: job.style.clone(),
            convert: job.convert,
            policy: self.config.retry_policy(),
            events: events.clone(),
            counters: Arc::clone(&counters),
            token: token.clone(),
        });

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue: TileQueue = Arc::new(Mutex::new(rx));

        let handles: Vec<_> = (0..workers)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&ctx), Arc::clone(&queue))))
            .collect();
        drop(ctx);

        let gate = RateGate::new(self.config.release_interval());
        let released = feed(job.tiles, tx, &token, gate).await;

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Download worker terminated abnormally");
            }
        }

        let outcome = if token.is_cancelled() {
            DownloadOutcome::Cancelled
        } else {
            DownloadOutcome::Completed
        };
        let summary = counters.summary(total, outcome, started.elapsed());

        info!(
            style = %job.style,
            released,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            store_errors = summary.store_errors,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            outcome = %outcome,
            "Download finished"
        );

        match outcome {
            DownloadOutcome::Completed => {
                events.emit(DownloadEvent::TilesDownloaded).await;
                events.emit(DownloadEvent::DownloadComplete).await;
            }
            DownloadOutcome::Cancelled => {
                events.emit(DownloadEvent::DownloadCancelled).await;
            }
        }

        summary
    }
}

/// Releases tiles into the queue, one per gate tick.
///
/// Returns the number of tiles released. Dropping `tx` on return closes the
/// queue so idle workers exit.
async fn feed(
    tiles: Vec<TileCoord>,
    tx: mpsc::Sender<TileCoord>,
    token: &CancellationToken,
    mut gate: RateGate,
) -> usize {
    let mut released = 0;

    for tile in tiles {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = gate.tick() => {}
        }

        let sent = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            sent = tx.send(tile) => sent,
        };
        if sent.is_err() {
            // Every worker is gone
            break;
        }
        released += 1;
    }

    released
}
