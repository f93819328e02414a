//! Progress events for external rendering.
//!
//! The engine emits these from inside the worker pool; a UI layer (the CLI
//! progress bar, a log sink) decides how to present them. Event emission
//! must stay cheap - callbacks run on download worker threads.

use std::sync::Arc;

use crate::coord::TileCoord;

/// A structured progress event from the download coordinator.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A run was scheduled with this many tiles.
    RunStarted { total: usize },
    /// One tile fetched and validated.
    TileSucceeded {
        coord: TileCoord,
        completed: usize,
        total: usize,
    },
    /// An attempt failed; the tile will be retried.
    TileRetrying { coord: TileCoord, attempt: u32 },
    /// A tile exhausted its retry budget.
    TileFailed {
        coord: TileCoord,
        completed: usize,
        total: usize,
    },
    /// Every tile has a terminal result.
    RunCompleted { succeeded: usize, failed: usize },
}

/// Callback invoked for every [`ProgressEvent`].
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
