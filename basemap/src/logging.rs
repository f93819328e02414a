//! Logging initialisation for binaries.
//!
//! Console subscriber with env-filter control; `RUST_LOG` overrides the
//! default level. Library code only ever emits `tracing` events and never
//! installs a subscriber itself.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// `default_level` is used when `RUST_LOG` is unset (e.g. `"info"` or
/// `"warn"`). Safe to call once per process; later calls are ignored.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
