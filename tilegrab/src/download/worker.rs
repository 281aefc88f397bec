//! Per-tile processing.
//!
//! A worker repeatedly claims a tile from the shared queue and drives it to
//! a final state:
//!
//! ```text
//! claim ──► cached? ──yes──► tile_skipped
//!              │ no
//!              ▼
//!           fetch ◄──┐ backoff
//!              │ err ─┘ (until attempts run out ──► tile_failed)
//!              ▼ ok
//!           convert (optional, falls back to original bytes)
//!              ▼
//!           store ──err──► logged, no event
//!              ▼ ok
//!           tile_downloaded
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::events::{DownloadEvent, EventEmitter};
use super::policy::RetryPolicy;
use super::progress::ProgressCounters;
use crate::cache::TileStore;
use crate::convert::to_8bit_png;
use crate::coord::{tile_bounds, TileCoord};
use crate::provider::{AsyncHttpClient, ProviderError, TileSource};

/// Work queue shared by all workers of a session.
pub(crate) type TileQueue = Arc<Mutex<mpsc::Receiver<TileCoord>>>;

/// Everything a worker needs, shared by the pool.
pub(crate) struct WorkerContext {
    pub client: Arc<dyn AsyncHttpClient>,
    pub store: Arc<dyn TileStore>,
    pub source: TileSource,
    pub style: String,
    pub convert: bool,
    pub policy: RetryPolicy,
    pub events: EventEmitter,
    pub counters: Arc<ProgressCounters>,
    pub token: CancellationToken,
}

/// Final state of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TileOutcome {
    Skipped,
    Downloaded,
    Failed,
    StoreError,
    Cancelled,
}

/// Worker loop: claims tiles until the queue closes or the session is
/// cancelled.
pub(crate) async fn run_worker(id: usize, ctx: Arc<WorkerContext>, queue: TileQueue) {
    let mut processed = 0usize;

    loop {
        if ctx.token.is_cancelled() {
            break;
        }

        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = ctx.token.cancelled() => None,
                tile = rx.recv() => tile,
            }
        };

        let Some(tile) = next else {
            break;
        };

        if process_tile(&ctx, tile).await == TileOutcome::Cancelled {
            break;
        }
        processed += 1;
    }

    debug!(worker = id, processed, "Worker finished");
}

/// Drives a single tile to a final state, emitting its event.
pub(crate) async fn process_tile(ctx: &WorkerContext, tile: TileCoord) -> TileOutcome {
    if ctx.store.contains(&ctx.style, tile).await {
        debug!(tile = %tile, "Tile cached, skipping");
        ctx.counters.record_skipped();
        ctx.events
            .emit(DownloadEvent::TileSkipped(tile_bounds(&tile)))
            .await;
        return TileOutcome::Skipped;
    }

    let data = match fetch_with_retry(ctx, tile).await {
        Ok(data) => data,
        Err(ProviderError::Cancelled) => return TileOutcome::Cancelled,
        Err(e) => {
            warn!(
                tile = %tile,
                attempts = ctx.policy.max_attempts(),
                error = %e,
                "Tile failed after all attempts"
            );
            ctx.counters.record_failed();
            ctx.events.emit(DownloadEvent::tile_failed(tile)).await;
            return TileOutcome::Failed;
        }
    };

    let data = if ctx.convert {
        match to_8bit_png(&data) {
            Ok(converted) => converted,
            Err(e) => {
                debug!(tile = %tile, error = %e, "8-bit conversion failed, keeping original");
                data
            }
        }
    } else {
        data
    };

    let bytes = data.len();
    if let Err(e) = ctx.store.put(&ctx.style, tile, data).await {
        warn!(tile = %tile, error = %e, "Failed to store tile");
        ctx.counters.record_store_error();
        return TileOutcome::StoreError;
    }

    debug!(tile = %tile, bytes, "Tile downloaded");
    ctx.counters.record_downloaded();
    ctx.events
        .emit(DownloadEvent::TileDownloaded(tile_bounds(&tile)))
        .await;
    TileOutcome::Downloaded
}

/// Fetches a tile, retrying with backoff.
///
/// Cancellation is checked before each attempt and aborts an in-flight
/// request. Backoff sleeps run to completion; a cancel during one is seen
/// at the next attempt.
async fn fetch_with_retry(ctx: &WorkerContext, tile: TileCoord) -> Result<Vec<u8>, ProviderError> {
    let max_attempts = ctx.policy.max_attempts().max(1);
    let mut attempt = 1;

    loop {
        if ctx.token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let url = ctx.source.url_for(tile);
        let result = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => Err(ProviderError::Cancelled),
            result = ctx.client.get(&url) => result,
        };

        match result {
            Ok(data) => return Ok(data),
            Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
            Err(e) => match ctx.policy.delay_for_attempt(attempt) {
                Some(delay) if e.is_retryable() => {
                    warn!(
                        tile = %tile,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Tile fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                _ => return Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BoxFuture, CacheError, CacheResult, MemoryTileStore};
    use crate::provider::MockAsyncHttpClient;
    use std::io;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Store that holds nothing and rejects every write.
    struct ReadOnlyStore;

    impl TileStore for ReadOnlyStore {
        fn contains<'a>(&'a self, _style: &'a str, _tile: TileCoord) -> BoxFuture<'a, bool> {
            Box::pin(async { false })
        }

        fn put<'a>(
            &'a self,
            _style: &'a str,
            tile: TileCoord,
            _data: Vec<u8>,
        ) -> BoxFuture<'a, CacheResult<()>> {
            Box::pin(async move {
                Err(CacheError::Write {
                    path: PathBuf::from(format!("{}.png", tile)),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
                })
            })
        }

        fn list<'a>(&'a self, _style: &'a str) -> BoxFuture<'a, CacheResult<Vec<TileCoord>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn get<'a>(
            &'a self,
            _style: &'a str,
            _tile: TileCoord,
        ) -> BoxFuture<'a, CacheResult<Option<Vec<u8>>>> {
            Box::pin(async { Ok(None) })
        }
    }

    const TEMPLATE: &str = "https://{s}.tiles.test/{z}/{x}/{y}.png";

    fn tile() -> TileCoord {
        TileCoord { zoom: 3, x: 2, y: 5 }
    }

    fn context(
        client: Arc<MockAsyncHttpClient>,
        store: Arc<MemoryTileStore>,
        attempts: u32,
    ) -> (WorkerContext, mpsc::Receiver<DownloadEvent>) {
        let (events, rx) = EventEmitter::channel(16);
        let ctx = WorkerContext {
            client,
            store,
            source: TileSource::new(TEMPLATE),
            style: "test".into(),
            convert: false,
            policy: RetryPolicy::fixed(attempts, Duration::from_millis(10)),
            events,
            counters: Arc::new(ProgressCounters::new()),
            token: CancellationToken::new(),
        };
        (ctx, rx)
    }

    fn http_error() -> ProviderError {
        ProviderError::HttpStatus {
            status: 500,
            url: "u".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_tile_is_skipped_without_fetch() {
        let client = Arc::new(MockAsyncHttpClient::always(Ok(vec![9])));
        let store = Arc::new(MemoryTileStore::new());
        store.insert("test", tile(), vec![1]);
        let (ctx, mut rx) = context(client.clone(), store, 3);

        assert_eq!(process_tile(&ctx, tile()).await, TileOutcome::Skipped);
        assert_eq!(client.calls(), 0);
        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::TileSkipped(tile_bounds(&tile())))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retries() {
        let client = Arc::new(MockAsyncHttpClient::scripted(
            vec![Err(http_error()), Err(http_error())],
            Ok(vec![7, 7]),
        ));
        let store = Arc::new(MemoryTileStore::new());
        let (ctx, mut rx) = context(client.clone(), store.clone(), 3);

        assert_eq!(process_tile(&ctx, tile()).await, TileOutcome::Downloaded);
        assert_eq!(client.calls(), 3);
        assert_eq!(store.tile("test", tile()), Some(vec![7, 7]));
        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::TileDownloaded(tile_bounds(&tile())))
        );
        assert_eq!(ctx.counters.downloaded(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_all_attempts() {
        let client = Arc::new(MockAsyncHttpClient::always(Err(http_error())));
        let store = Arc::new(MemoryTileStore::new());
        let (ctx, mut rx) = context(client.clone(), store.clone(), 3);

        assert_eq!(process_tile(&ctx, tile()).await, TileOutcome::Failed);
        assert_eq!(client.calls(), 3);
        assert!(store.is_empty());
        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::TileFailed {
                tile: "3/2/5".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_urls_are_expanded() {
        let client = Arc::new(MockAsyncHttpClient::always(Ok(vec![1])));
        let store = Arc::new(MemoryTileStore::new());
        let (ctx, _rx) = context(client.clone(), store, 1);

        process_tile(&ctx, tile()).await;
        let url = &client.urls()[0];
        assert!(url.ends_with(".tiles.test/3/2/5.png"), "{}", url);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_in_flight_fetch_without_event() {
        let client = Arc::new(
            MockAsyncHttpClient::always(Ok(vec![1])).with_delay(Duration::from_secs(60)),
        );
        let store = Arc::new(MemoryTileStore::new());
        let (ctx, mut rx) = context(client.clone(), store.clone(), 3);

        let token = ctx.token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        assert_eq!(process_tile(&ctx, tile()).await, TileOutcome::Cancelled);
        assert!(store.is_empty());
        drop(ctx);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_is_not_retried_and_emits_nothing() {
        let client = Arc::new(MockAsyncHttpClient::always(Ok(vec![1])));
        let (mut ctx, mut rx) = context(client.clone(), Arc::new(MemoryTileStore::new()), 3);
        ctx.store = Arc::new(ReadOnlyStore);

        assert_eq!(process_tile(&ctx, tile()).await, TileOutcome::StoreError);
        assert_eq!(client.calls(), 1);
        assert_eq!(ctx.counters.store_errors(), 1);
        assert_eq!(ctx.counters.downloaded(), 0);
        drop(ctx);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_is_seen_at_next_attempt() {
        let client = Arc::new(MockAsyncHttpClient::always(Err(http_error())));
        let store = Arc::new(MemoryTileStore::new());
        let (ctx, mut rx) = context(client.clone(), store.clone(), 3);

        // Lands halfway through the 10ms backoff after the first failure
        let token = ctx.token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            token.cancel();
        });

        let start = Instant::now();
        assert_eq!(process_tile(&ctx, tile()).await, TileOutcome::Cancelled);

        assert!(start.elapsed() >= Duration::from_millis(10));
        assert_eq!(client.calls(), 1);
        assert_eq!(ctx.counters.failed(), 0);
        assert!(store.is_empty());
        drop(ctx);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_conversion_failure_keeps_original_bytes() {
        let client = Arc::new(MockAsyncHttpClient::always(Ok(b"not a png".to_vec())));
        let store = Arc::new(MemoryTileStore::new());
        let (mut ctx, _rx) = context(client, store.clone(), 1);
        ctx.convert = true;

        assert_eq!(process_tile(&ctx, tile()).await, TileOutcome::Downloaded);
        assert_eq!(store.tile("test", tile()), Some(b"not a png".to_vec()));
    }
}
