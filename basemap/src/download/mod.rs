//! Download coordination.
//!
//! Drives a full tile set to completion with bounded concurrency, randomized
//! ordering, an explicit retry policy, and cancellation support. Individual
//! tile failures never abort a run; every tile ends in exactly one terminal
//! [`DownloadResult`].

mod coordinator;
mod policy;
mod progress;
mod types;

pub use coordinator::{CancelFlag, DownloadConfig, DownloadCoordinator};
pub use policy::RetryPolicy;
pub use progress::{ProgressCallback, ProgressEvent};
pub use types::{DownloadOutcome, DownloadReport, DownloadResult, TileFailure};
