//! The download coordinator.
//!
//! A fixed-size worker pool consumes a shared, pre-shuffled queue of tile
//! coordinates. Shuffling spreads requests over the map instead of walking
//! it row by row, which keeps the access pattern unremarkable to per-IP
//! rate limiters. The RNG is injected so tests can pin the order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::catalog::UrlTemplate;
use crate::coord::TileCoord;
use crate::fetch::{FetchError, TileFetcher};
use crate::telemetry::DownloadMetrics;

use super::policy::RetryPolicy;
use super::progress::{ProgressCallback, ProgressEvent};
use super::types::{DownloadOutcome, DownloadResult};

/// Default number of concurrent fetch workers.
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Cancellation signal shared between an operator-facing layer and the
/// worker pool.
///
/// Setting the flag stops new tiles from being scheduled and new attempts
/// from being issued; in-flight HTTP requests run to completion and their
/// results are retained.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tuning knobs for a download run.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Number of worker threads (fetches in flight at once).
    pub concurrency: usize,
    /// Retry policy applied per tile.
    pub retry: RetryPolicy,
    /// Per-attempt HTTP timeout, consumed when building the HTTP client.
    pub timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
            timeout: crate::fetch::DEFAULT_TIMEOUT,
        }
    }
}

impl DownloadConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Drives a tile set to completion.
///
/// Every offered tile ends in exactly one terminal [`DownloadResult`];
/// partial success is a normal outcome and is reported, not raised.
pub struct DownloadCoordinator {
    fetcher: TileFetcher,
    template: UrlTemplate,
    config: DownloadConfig,
    cancel: CancelFlag,
    metrics: Arc<DownloadMetrics>,
    on_progress: Option<ProgressCallback>,
}

impl DownloadCoordinator {
    /// Create a coordinator for one server's template.
    pub fn new(fetcher: TileFetcher, template: UrlTemplate, config: DownloadConfig) -> Self {
        Self {
            fetcher,
            template,
            config,
            cancel: CancelFlag::new(),
            metrics: Arc::new(DownloadMetrics::new()),
            on_progress: None,
        }
    }

    /// Use an externally owned cancel flag (e.g. wired to Ctrl-C).
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Share an externally owned metrics collector.
    pub fn with_metrics(mut self, metrics: Arc<DownloadMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Install a progress event callback.
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// A clone of the coordinator's cancel flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The coordinator's metrics collector.
    pub fn metrics(&self) -> Arc<DownloadMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Download every tile in `tiles`, in an order shuffled by `rng`.
    ///
    /// Returns one terminal result per offered tile. Tiles still queued when
    /// cancellation strikes are recorded as failed with a cancellation
    /// reason and zero attempts.
    pub fn run<R: Rng + ?Sized>(&self, mut tiles: Vec<TileCoord>, rng: &mut R) -> Vec<DownloadResult> {
        tiles.shuffle(rng);

        let total = tiles.len();
        self.metrics.run_scheduled(total);
        self.emit(ProgressEvent::RunStarted { total });
        info!(
            tiles = total,
            workers = self.config.concurrency,
            attempts_per_tile = self.config.retry.max_attempts(),
            "starting tile download"
        );

        let queue: Mutex<VecDeque<TileCoord>> = Mutex::new(tiles.into_iter().collect());
        let results: Mutex<Vec<DownloadResult>> = Mutex::new(Vec::with_capacity(total));
        let completed = AtomicUsize::new(0);

        let workers = self.config.concurrency.max(1).min(total.max(1));
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| self.worker(&queue, &results, &completed, total));
            }
        });

        let mut results = results.into_inner().unwrap();
        let cancelled = self.cancel.is_cancelled();

        // Tiles never scheduled because of cancellation still get a terminal
        // result so the manifest accounts for every requested tile.
        for coord in queue.into_inner().unwrap() {
            self.metrics.tile_failed();
            results.push(DownloadResult {
                url: self.template.render(&coord),
                coord,
                attempts: 0,
                outcome: DownloadOutcome::Failed(FetchError::Cancelled),
            });
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        self.emit(ProgressEvent::RunCompleted { succeeded, failed });
        info!(succeeded, failed, cancelled, "tile download finished");

        results
    }

    fn worker(
        &self,
        queue: &Mutex<VecDeque<TileCoord>>,
        results: &Mutex<Vec<DownloadResult>>,
        completed: &AtomicUsize,
        total: usize,
    ) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }
            let coord = match queue.lock().unwrap().pop_front() {
                Some(coord) => coord,
                None => return,
            };

            let result = self.download_tile(coord);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if result.is_success() {
                self.emit(ProgressEvent::TileSucceeded {
                    coord,
                    completed: done,
                    total,
                });
            } else {
                self.emit(ProgressEvent::TileFailed {
                    coord,
                    completed: done,
                    total,
                });
            }
            results.lock().unwrap().push(result);
        }
    }

    /// Drive a single tile through the retry budget to a terminal result.
    fn download_tile(&self, coord: TileCoord) -> DownloadResult {
        let url = self.template.render(&coord);
        let mut attempt = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                self.metrics.tile_failed();
                return DownloadResult {
                    coord,
                    url,
                    attempts: attempt,
                    outcome: DownloadOutcome::Failed(FetchError::Cancelled),
                };
            }

            attempt += 1;
            self.metrics.attempt();

            match self.fetcher.fetch(&url) {
                Ok(payload) => {
                    debug!(tile = %coord, bytes = payload.len(), attempts = attempt, "tile downloaded");
                    self.metrics.tile_succeeded(payload.len() as u64);
                    return DownloadResult {
                        coord,
                        url,
                        attempts: attempt,
                        outcome: DownloadOutcome::Payload(payload),
                    };
                }
                Err(error) if error.is_retryable() => {
                    match self.config.retry.delay_for_attempt(attempt) {
                        Some(delay) => {
                            warn!(tile = %coord, attempt, error = %error, "tile fetch failed, retrying");
                            self.metrics.retry();
                            self.emit(ProgressEvent::TileRetrying { coord, attempt });
                            if !delay.is_zero() {
                                thread::sleep(delay);
                            }
                        }
                        None => {
                            warn!(tile = %coord, attempts = attempt, url = %url, error = %error, "tile failed permanently");
                            self.metrics.tile_failed();
                            return DownloadResult {
                                coord,
                                url,
                                attempts: attempt,
                                outcome: DownloadOutcome::Failed(error),
                            };
                        }
                    }
                }
                Err(error) => {
                    // Cancellation surfaced mid-attempt: terminal, no retry.
                    self.metrics.tile_failed();
                    return DownloadResult {
                        coord,
                        url,
                        attempts: attempt,
                        outcome: DownloadOutcome::Failed(error),
                    };
                }
            }
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.on_progress {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Scheme;
    use crate::fetch::{HttpClient, MockHttpClient};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn png_tile() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(256, 256, image::Rgba([50, 60, 70, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn template() -> UrlTemplate {
        UrlTemplate::parse("http://tiles.test/{z}/{x}/{y}.png", Scheme::Xyz, None).unwrap()
    }

    fn grid(width: u32, height: u32) -> Vec<TileCoord> {
        let mut tiles = Vec::new();
        for y in 0..height {
            for x in 0..width {
                tiles.push(TileCoord::new(x, y, 10));
            }
        }
        tiles
    }

    fn coordinator(client: Arc<dyn HttpClient>, config: DownloadConfig) -> DownloadCoordinator {
        DownloadCoordinator::new(TileFetcher::new(client, 256), template(), config)
    }

    #[test]
    fn test_all_failures_spend_exact_attempt_budget() {
        let client = Arc::new(MockHttpClient::always(Err(FetchError::Network(
            "unreachable".to_string(),
        ))));
        let config = DownloadConfig::new()
            .with_concurrency(2)
            .with_retry(RetryPolicy::fixed(3, Duration::ZERO));
        let coordinator = coordinator(client.clone(), config);

        let tiles = grid(3, 2);
        let mut rng = StdRng::seed_from_u64(7);
        let results = coordinator.run(tiles, &mut rng);

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| !r.is_success()));
        assert!(results.iter().all(|r| r.attempts == 3));
        // 6 tiles x 3 attempts, nothing more, nothing less
        assert_eq!(client.calls(), 18);
    }

    #[test]
    fn test_fail_twice_then_succeed() {
        let client = Arc::new(MockHttpClient::scripted(vec![
            Err(FetchError::Network("reset".to_string())),
            Err(FetchError::EmptyBody),
            Ok(png_tile()),
        ]));
        let config = DownloadConfig::new()
            .with_concurrency(1)
            .with_retry(RetryPolicy::fixed(3, Duration::ZERO));
        let coordinator = coordinator(client.clone(), config);

        let mut rng = StdRng::seed_from_u64(1);
        let results = coordinator.run(vec![TileCoord::new(5, 5, 10)], &mut rng);

        assert_eq!(results.len(), 1);
        assert!(results[0].is_success());
        assert_eq!(results[0].attempts, 3);
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn test_no_retries_on_policy_none() {
        let client = Arc::new(MockHttpClient::always(Err(FetchError::EmptyBody)));
        let config = DownloadConfig::new()
            .with_concurrency(1)
            .with_retry(RetryPolicy::None);
        let coordinator = coordinator(client.clone(), config);

        let mut rng = StdRng::seed_from_u64(1);
        let results = coordinator.run(grid(2, 2), &mut rng);

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.attempts == 1));
        assert_eq!(client.calls(), 4);
    }

    #[test]
    fn test_seeded_rng_gives_deterministic_order() {
        let run_order = |seed: u64| -> Vec<TileCoord> {
            let client = Arc::new(MockHttpClient::always(Ok(png_tile())));
            let config = DownloadConfig::new()
                .with_concurrency(1)
                .with_retry(RetryPolicy::None);
            let coordinator = coordinator(client, config);
            let mut rng = StdRng::seed_from_u64(seed);
            coordinator
                .run(grid(4, 4), &mut rng)
                .iter()
                .map(|r| r.coord)
                .collect()
        };

        assert_eq!(run_order(42), run_order(42));
        // A different seed should visit 16 tiles in a different order.
        assert_ne!(run_order(42), run_order(43));
    }

    #[test]
    fn test_pre_cancelled_run_fetches_nothing() {
        let client = Arc::new(MockHttpClient::always(Ok(png_tile())));
        let config = DownloadConfig::new().with_retry(RetryPolicy::None);
        let coordinator = coordinator(client.clone(), config);

        coordinator.cancel_flag().cancel();
        let mut rng = StdRng::seed_from_u64(1);
        let results = coordinator.run(grid(2, 2), &mut rng);

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| !r.is_success()));
        assert!(results.iter().all(|r| r.attempts == 0));
        assert_eq!(client.calls(), 0);
    }

    /// Stub that cancels the shared flag after serving one tile.
    struct CancelAfterFirst {
        flag: CancelFlag,
        payload: Vec<u8>,
        calls: AtomicUsize,
    }

    impl HttpClient for CancelAfterFirst {
        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.flag.cancel();
            Ok(self.payload.clone())
        }
    }

    #[test]
    fn test_cancellation_mid_run_retains_completed_tiles() {
        let flag = CancelFlag::new();
        let client = Arc::new(CancelAfterFirst {
            flag: flag.clone(),
            payload: png_tile(),
            calls: AtomicUsize::new(0),
        });
        let config = DownloadConfig::new()
            .with_concurrency(1)
            .with_retry(RetryPolicy::None);
        let coordinator = coordinator(client.clone(), config).with_cancel_flag(flag);

        let mut rng = StdRng::seed_from_u64(3);
        let results = coordinator.run(grid(2, 2), &mut rng);

        assert_eq!(results.len(), 4, "every requested tile gets a result");
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        assert_eq!(succeeded, 1, "the completed tile is retained");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    /// Stub that tracks the high-water mark of concurrent requests.
    struct ConcurrencyProbe {
        payload: Vec<u8>,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl HttpClient for ConcurrencyProbe {
        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    #[test]
    fn test_concurrency_limit_is_respected() {
        let client = Arc::new(ConcurrencyProbe {
            payload: png_tile(),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let config = DownloadConfig::new()
            .with_concurrency(3)
            .with_retry(RetryPolicy::None);
        let coordinator = coordinator(client.clone(), config);

        let mut rng = StdRng::seed_from_u64(9);
        let results = coordinator.run(grid(4, 3), &mut rng);

        assert_eq!(results.len(), 12);
        assert!(results.iter().all(|r| r.is_success()));
        assert!(
            client.peak.load(Ordering::SeqCst) <= 3,
            "no more than 3 fetches in flight"
        );
    }

    #[test]
    fn test_empty_tile_list() {
        let client = Arc::new(MockHttpClient::always(Ok(png_tile())));
        let coordinator = coordinator(client.clone(), DownloadConfig::new());

        let mut rng = StdRng::seed_from_u64(1);
        let results = coordinator.run(Vec::new(), &mut rng);

        assert!(results.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn test_progress_events_cover_run() {
        use std::sync::Mutex as StdMutex;

        let events: Arc<StdMutex<Vec<ProgressEvent>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let client = Arc::new(MockHttpClient::always(Ok(png_tile())));
        let config = DownloadConfig::new()
            .with_concurrency(1)
            .with_retry(RetryPolicy::None);
        let coordinator = coordinator(client, config)
            .with_progress(Arc::new(move |event| sink.lock().unwrap().push(event)));

        let mut rng = StdRng::seed_from_u64(1);
        coordinator.run(grid(2, 1), &mut rng);

        let events = events.lock().unwrap();
        assert!(matches!(events.first(), Some(ProgressEvent::RunStarted { total: 2 })));
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::RunCompleted {
                succeeded: 2,
                failed: 0
            })
        ));
        let successes = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::TileSucceeded { .. }))
            .count();
        assert_eq!(successes, 2);
    }
}
