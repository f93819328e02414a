//! Progress bar rendering for download events.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use basemap::download::{ProgressCallback, ProgressEvent};

/// Build a progress callback that drives an indicatif bar.
///
/// Returns the bar alongside the callback so the caller can finish it after
/// the import completes or fails.
pub fn progress_bar() -> (ProgressBar, ProgressCallback) {
    let bar = ProgressBar::hidden();
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:32}] {pos}/{len} tiles {msg}",
        )
        .expect("static template is valid")
        .progress_chars("=> "),
    );

    let bar_for_events = bar.clone();
    let callback: ProgressCallback = Arc::new(move |event| match event {
        ProgressEvent::RunStarted { total } => {
            bar_for_events.set_length(total as u64);
            bar_for_events.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        ProgressEvent::TileSucceeded { completed, .. } => {
            bar_for_events.set_position(completed as u64);
        }
        ProgressEvent::TileRetrying { coord, attempt } => {
            bar_for_events.set_message(format!("retrying {} (attempt {})", coord, attempt));
        }
        ProgressEvent::TileFailed {
            coord, completed, ..
        } => {
            bar_for_events.set_position(completed as u64);
            bar_for_events.set_message(format!("failed {}", coord));
        }
        ProgressEvent::RunCompleted { succeeded, failed } => {
            bar_for_events.set_message(format!("{} ok, {} failed", succeeded, failed));
        }
    });

    (bar, callback)
}
