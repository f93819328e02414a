//! Download telemetry.
//!
//! Lock-free atomic counters recorded by the download workers, with
//! point-in-time snapshots for display. Counters only ever increase during
//! a run.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters shared by all download workers.
#[derive(Debug, Default)]
pub struct DownloadMetrics {
    tiles_scheduled: AtomicUsize,
    tiles_succeeded: AtomicUsize,
    tiles_failed: AtomicUsize,
    attempts: AtomicUsize,
    retries: AtomicUsize,
    bytes_downloaded: AtomicU64,
}

impl DownloadMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tile count of a scheduled run.
    pub fn run_scheduled(&self, tiles: usize) {
        self.tiles_scheduled.fetch_add(tiles, Ordering::Relaxed);
    }

    /// Record one fetch attempt (successful or not).
    pub fn attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a retry of a previously failed attempt.
    pub fn retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tile completing with a payload of `bytes` length.
    pub fn tile_succeeded(&self, bytes: u64) {
        self.tiles_succeeded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a tile exhausting its budget.
    pub fn tile_failed(&self) {
        self.tiles_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tiles_scheduled: self.tiles_scheduled.load(Ordering::Relaxed),
            tiles_succeeded: self.tiles_succeeded.load(Ordering::Relaxed),
            tiles_failed: self.tiles_failed.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }
}

/// Immutable copy of [`DownloadMetrics`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tiles_scheduled: usize,
    pub tiles_succeeded: usize,
    pub tiles_failed: usize,
    pub attempts: usize,
    pub retries: usize,
    pub bytes_downloaded: u64,
}

impl MetricsSnapshot {
    /// Tiles with a terminal result so far.
    pub fn tiles_completed(&self) -> usize {
        self.tiles_succeeded + self.tiles_failed
    }
}
