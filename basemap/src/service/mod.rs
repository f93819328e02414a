//! End-to-end import pipeline.
//!
//! [`BasemapService`] wires the stages together: zoom selection, tile
//! enumeration, coordinated download, per-tile georeferencing, mosaic
//! assembly and reprojection. Individual tile failures flow into the
//! manifest; only a structurally invalid request or a run with zero usable
//! tiles is fatal.

mod request;

pub use request::ImportRequest;

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::addressor::{AddressingError, TileRange};
use crate::catalog::UrlTemplate;
use crate::download::{
    CancelFlag, DownloadCoordinator, DownloadReport, ProgressCallback,
};
use crate::fetch::{FetchError, HttpClient, ReqwestClient, TileFetcher};
use crate::georef::{GeoreferencedTile, Georeferencer};
use crate::mosaic::{AssemblyError, Mosaic, MosaicBuilder};
use crate::telemetry::DownloadMetrics;
use crate::zoom;

/// Result of a completed import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// The reprojected raster.
    pub mosaic: Mosaic,
    /// Download manifest, including any partial failures.
    pub report: DownloadReport,
    /// Zoom level the tiles were fetched at.
    pub zoom: u8,
}

/// Fatal import failures.
#[derive(Debug)]
pub enum ImportError {
    /// Invalid request; no network activity happened.
    Addressing(AddressingError),
    /// HTTP client construction failed.
    Client(FetchError),
    /// Assembly or reprojection failed; the manifest explains which tiles
    /// were missing.
    Assembly {
        source: AssemblyError,
        report: DownloadReport,
    },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Addressing(e) => write!(f, "{}", e),
            ImportError::Client(e) => write!(f, "failed to set up HTTP client: {}", e),
            ImportError::Assembly { source, report } => write!(
                f,
                "{} ({} of {} tiles failed)",
                source, report.failed, report.requested
            ),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Addressing(e) => Some(e),
            ImportError::Client(e) => Some(e),
            ImportError::Assembly { source, .. } => Some(source),
        }
    }
}

impl From<AddressingError> for ImportError {
    fn from(e: AddressingError) -> Self {
        ImportError::Addressing(e)
    }
}

/// The import engine.
///
/// Holds the cross-cutting wiring (HTTP client override for tests, cancel
/// flag, progress callback, metrics); each [`import`](Self::import) call is
/// otherwise independent.
#[derive(Default)]
pub struct BasemapService {
    client: Option<Arc<dyn HttpClient>>,
    cancel: CancelFlag,
    progress: Option<ProgressCallback>,
    metrics: Arc<DownloadMetrics>,
}

impl BasemapService {
    /// Create a service using the default reqwest-backed HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the HTTP client (dependency injection for tests).
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Use an externally owned cancel flag.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Install a progress event callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// A clone of the service's cancel flag, for wiring to Ctrl-C.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The service's metrics collector.
    pub fn metrics(&self) -> Arc<DownloadMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the full pipeline for one request.
    pub fn import(&self, request: &ImportRequest) -> Result<ImportOutcome, ImportError> {
        // Template validation is fatal before any network activity.
        let template = UrlTemplate::from_spec(&request.server, request.api_key.clone())?;

        let target_resolution = zoom::target_resolution(&request.bbox, request.width, request.height);
        let zoom = zoom::select_zoom(target_resolution, request.server.max_zoom);

        let margin = request.margin.unwrap_or(request.server.margin);
        let range = TileRange::covering(&request.bbox, zoom, margin)?;
        let tiles: Vec<_> = range.tiles().collect();
        info!(
            server = %request.server.id,
            zoom,
            target_resolution,
            tiles = tiles.len(),
            "resolved tile cover"
        );

        let client: Arc<dyn HttpClient> = match &self.client {
            Some(client) => Arc::clone(client),
            None => Arc::new(
                ReqwestClient::with_timeout(request.download.timeout)
                    .map_err(ImportError::Client)?,
            ),
        };

        let fetcher = TileFetcher::new(client, request.server.tile_size);
        let mut coordinator =
            DownloadCoordinator::new(fetcher, template, request.download.clone())
                .with_cancel_flag(self.cancel.clone())
                .with_metrics(Arc::clone(&self.metrics));
        if let Some(progress) = &self.progress {
            coordinator = coordinator.with_progress(Arc::clone(progress));
        }

        let results = match request.seed {
            Some(seed) => coordinator.run(tiles, &mut StdRng::seed_from_u64(seed)),
            None => coordinator.run(tiles, &mut rand::rng()),
        };
        let mut report = DownloadReport::from_results(&results, self.cancel.is_cancelled());

        // Georeference the survivors; decode failures demote to failed tiles.
        let georeferencer = Georeferencer::new(request.server.tile_size);
        let mut georeferenced: Vec<GeoreferencedTile> = Vec::with_capacity(report.succeeded);
        for result in &results {
            let Some(payload) = result.payload() else {
                continue;
            };
            match georeferencer.georeference(result.coord, payload) {
                Ok(tile) => georeferenced.push(tile),
                Err(e) => {
                    warn!(tile = %result.coord, error = %e, "dropping undecodable tile");
                    report.record_late_failure(
                        result.coord,
                        result.url.clone(),
                        result.attempts,
                        e.to_string(),
                    );
                }
            }
        }

        let builder = MosaicBuilder::new(request.server.tile_size);
        let source = builder
            .assemble(&georeferenced)
            .map_err(|source| ImportError::Assembly {
                source,
                report: report.clone(),
            })?;
        let mosaic = builder
            .reproject(
                &source,
                request.target_crs,
                &request.bbox,
                request.width,
                request.height,
                request.resampling,
            )
            .map_err(|source| ImportError::Assembly {
                source,
                report: report.clone(),
            })?;

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            zoom,
            "import complete"
        );

        Ok(ImportOutcome {
            mosaic,
            report,
            zoom,
        })
    }
}
