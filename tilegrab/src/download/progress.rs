//! Per-session counters and the final summary.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Shared counters updated by the workers.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    store_errors: AtomicUsize,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn store_errors(&self) -> usize {
        self.store_errors.load(Ordering::Relaxed)
    }

    /// Tiles that reached a final state.
    pub fn processed(&self) -> usize {
        self.downloaded() + self.skipped() + self.failed() + self.store_errors()
    }

    /// Freezes the counters into a summary.
    pub fn summary(
        &self,
        total: usize,
        outcome: DownloadOutcome,
        elapsed: Duration,
    ) -> DownloadSummary {
        DownloadSummary {
            total,
            downloaded: self.downloaded(),
            skipped: self.skipped(),
            failed: self.failed(),
            store_errors: self.store_errors(),
            outcome,
            elapsed,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed,
    Cancelled,
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one download session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Tiles selected for the session.
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    /// Tiles whose every attempt failed.
    pub failed: usize,
    /// Tiles fetched but not written.
    pub store_errors: usize,
    pub outcome: DownloadOutcome,
    pub elapsed: Duration,
}

impl DownloadSummary {
    /// Tiles never processed, typically because of cancellation.
    pub fn remaining(&self) -> usize {
        self.total
            .saturating_sub(self.downloaded + self.skipped + self.failed + self.store_errors)
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == DownloadOutcome::Cancelled
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} tiles: {} downloaded, {} skipped, {} failed, {} not stored in {:.1}s",
            self.outcome,
            self.total,
            self.downloaded,
            self.skipped,
            self.failed,
            self.store_errors,
            self.elapsed.as_secs_f64()
        )
    }
}
