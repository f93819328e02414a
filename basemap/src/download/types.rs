//! Download result and manifest types.

use serde::Serialize;

use crate::coord::TileCoord;
use crate::fetch::FetchError;

/// Terminal outcome of one tile.
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// Validated image payload.
    Payload(Vec<u8>),
    /// All attempts exhausted (or cancelled before completion).
    Failed(FetchError),
}

/// Per-tile download record. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// The tile this result belongs to.
    pub coord: TileCoord,
    /// Concrete URL the tile was fetched from.
    pub url: String,
    /// Number of fetch attempts spent on this tile.
    pub attempts: u32,
    /// Payload or final failure.
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    /// Whether this tile ended in a payload.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Payload(_))
    }

    /// The payload bytes, if the tile succeeded.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.outcome {
            DownloadOutcome::Payload(bytes) => Some(bytes),
            DownloadOutcome::Failed(_) => None,
        }
    }
}

/// One permanently failed tile, with enough context to be actionable.
#[derive(Debug, Clone, Serialize)]
pub struct TileFailure {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    pub url: String,
    pub attempts: u32,
    pub reason: String,
}

impl TileFailure {
    /// Record a failed result. Panics on a successful one; callers filter.
    fn from_result(result: &DownloadResult) -> Self {
        let reason = match &result.outcome {
            DownloadOutcome::Failed(e) => e.to_string(),
            DownloadOutcome::Payload(_) => unreachable!("success is not a failure"),
        };
        Self {
            zoom: result.coord.zoom,
            x: result.coord.x,
            y: result.coord.y,
            url: result.url.clone(),
            attempts: result.attempts,
            reason,
        }
    }
}

/// Summary manifest of one download run.
///
/// Serialized alongside the output raster so an operator can see exactly
/// which tiles are missing from a partial mosaic.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    /// Tiles offered to the coordinator.
    pub requested: usize,
    /// Tiles that produced a payload.
    pub succeeded: usize,
    /// Tiles that exhausted their retries (or were cancelled).
    pub failed: usize,
    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,
    /// Per-tile failure details.
    pub failures: Vec<TileFailure>,
}

impl DownloadReport {
    /// Summarise a completed run.
    pub fn from_results(results: &[DownloadResult], cancelled: bool) -> Self {
        let failures: Vec<TileFailure> = results
            .iter()
            .filter(|r| !r.is_success())
            .map(TileFailure::from_result)
            .collect();
        Self {
            requested: results.len(),
            succeeded: results.len() - failures.len(),
            failed: failures.len(),
            cancelled,
            failures,
        }
    }

    /// Demote a tile that downloaded but failed a later pipeline stage
    /// (e.g. full decode during georeferencing).
    pub fn record_late_failure(
        &mut self,
        coord: TileCoord,
        url: String,
        attempts: u32,
        reason: String,
    ) {
        self.succeeded = self.succeeded.saturating_sub(1);
        self.failed += 1;
        self.failures.push(TileFailure {
            zoom: coord.zoom,
            x: coord.x,
            y: coord.y,
            url,
            attempts,
            reason,
        });
    }

    /// Render the manifest as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("manifest serialization cannot fail")
    }
}
