//! Import request configuration.

use crate::catalog::ServerSpec;
use crate::coord::BoundingBox;
use crate::crs::Crs;
use crate::download::DownloadConfig;
use crate::mosaic::Resampling;

/// Everything one import needs.
///
/// Built from the invocation surface (CLI flags or a host application) via
/// the `with_*` methods; unset knobs fall back to server and download
/// defaults.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Requested extent in WGS84 degrees. Projected inputs go through
    /// [`crate::mosaic::reproject::bbox_to_wgs84`] first.
    pub bbox: BoundingBox,
    /// Tile source to fetch from.
    pub server: ServerSpec,
    /// API key substituted into `{apikey}` templates.
    pub api_key: Option<String>,
    /// Output raster width in pixels.
    pub width: u32,
    /// Output raster height in pixels.
    pub height: u32,
    /// CRS of the output raster.
    pub target_crs: Crs,
    /// Resampling method for the reprojection.
    pub resampling: Resampling,
    /// Download tuning (concurrency, retries, timeout).
    pub download: DownloadConfig,
    /// Override of the server's bounding-box expansion margin.
    pub margin: Option<f64>,
    /// Seed for the tile-order shuffle; `None` uses entropy.
    pub seed: Option<u64>,
}

impl ImportRequest {
    /// Create a request with defaults: Web Mercator output, cubic
    /// resampling, default download tuning.
    pub fn new(bbox: BoundingBox, server: ServerSpec, width: u32, height: u32) -> Self {
        Self {
            bbox,
            server,
            api_key: None,
            width,
            height,
            target_crs: Crs::WEB_MERCATOR,
            resampling: Resampling::default(),
            download: DownloadConfig::default(),
            margin: None,
            seed: None,
        }
    }

    /// Set the output CRS.
    pub fn with_target_crs(mut self, crs: Crs) -> Self {
        self.target_crs = crs;
        self
    }

    /// Set the resampling method.
    pub fn with_resampling(mut self, resampling: Resampling) -> Self {
        self.resampling = resampling;
        self
    }

    /// Set the download configuration.
    pub fn with_download(mut self, download: DownloadConfig) -> Self {
        self.download = download;
        self
    }

    /// Set the API key for `{apikey}` templates.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the bounding-box expansion margin.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = Some(margin.max(0.0));
        self
    }

    /// Pin the tile-order shuffle for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::registry;
    use crate::download::RetryPolicy;
    use std::time::Duration;

    fn request() -> ImportRequest {
        let bbox = BoundingBox::new(-74.1, 40.6, -73.9, 40.8).unwrap();
        let server = registry().lookup("OpenStreetMap").unwrap().clone();
        ImportRequest::new(bbox, server, 1024, 1024)
    }

    #[test]
    fn test_defaults() {
        let request = request();
        assert_eq!(request.target_crs, Crs::WEB_MERCATOR);
        assert_eq!(request.resampling, Resampling::Cubic);
        assert!(request.api_key.is_none());
        assert!(request.margin.is_none());
        assert!(request.seed.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let request = request()
            .with_target_crs(Crs::WGS84)
            .with_resampling(Resampling::Nearest)
            .with_api_key("k")
            .with_margin(0.25)
            .with_seed(99)
            .with_download(
                DownloadConfig::new()
                    .with_concurrency(2)
                    .with_retry(RetryPolicy::fixed(5, Duration::ZERO)),
            );

        assert_eq!(request.target_crs, Crs::WGS84);
        assert_eq!(request.resampling, Resampling::Nearest);
        assert_eq!(request.api_key.as_deref(), Some("k"));
        assert_eq!(request.margin, Some(0.25));
        assert_eq!(request.seed, Some(99));
        assert_eq!(request.download.concurrency, 2);
    }

    #[test]
    fn test_negative_margin_clamped() {
        assert_eq!(request().with_margin(-0.5).margin, Some(0.0));
    }
}
