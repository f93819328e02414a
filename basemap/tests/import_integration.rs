//! End-to-end import scenarios driven through a mock HTTP client.
//!
//! The bounding box used here covers exactly the 2x2 tile grid of zoom 1
//! (after margin expansion and edge clamping), which makes tile accounting
//! exact: four tiles requested, every scenario below controls which of them
//! succeed.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use basemap::mosaic::AssemblyError;
use basemap::{
    BoundingBox, BasemapService, Crs, DownloadConfig, FetchError, HttpClient, ImportError,
    ImportRequest, Resampling, RetryPolicy, ServerSpec,
};

/// Solid-colour 256x256 PNG payload.
fn png_tile(color: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(256, 256, image::Rgba(color));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Mock client with per-URL overrides, a default response, and URL capture.
struct PerUrlClient {
    default: Result<Vec<u8>, FetchError>,
    overrides: HashMap<String, Result<Vec<u8>, FetchError>>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl PerUrlClient {
    fn ok(default_payload: Vec<u8>) -> Self {
        Self {
            default: Ok(default_payload),
            overrides: HashMap::new(),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    fn failing_all() -> Self {
        Self {
            default: Err(FetchError::Network("unreachable".to_string())),
            overrides: HashMap::new(),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    fn with_override(mut self, url: &str, response: Result<Vec<u8>, FetchError>) -> Self {
        self.overrides.insert(url.to_string(), response);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl HttpClient for PerUrlClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        self.overrides
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Bounding box whose cover at zoom 1 is the full 2x2 grid.
fn quad_bbox() -> BoundingBox {
    BoundingBox::new(-170.0, 5.0, -10.0, 84.0).unwrap()
}

fn quad_request(server: ServerSpec) -> ImportRequest {
    ImportRequest::new(quad_bbox(), server, 200, 200)
        .with_seed(7)
        .with_download(
            DownloadConfig::new()
                .with_concurrency(2)
                .with_retry(RetryPolicy::fixed(3, Duration::ZERO)),
        )
}

fn xyz_server() -> ServerSpec {
    ServerSpec::custom("http://tiles.test/{z}/{x}/{y}.png")
}

#[test]
fn all_four_tiles_succeed() {
    let client = Arc::new(PerUrlClient::ok(png_tile([90, 120, 150, 255])));
    let service = BasemapService::new().with_client(client.clone());

    let outcome = service.import(&quad_request(xyz_server())).unwrap();

    assert_eq!(outcome.zoom, 1, "bbox and output size should select zoom 1");
    assert_eq!(outcome.report.requested, 4);
    assert_eq!(outcome.report.succeeded, 4);
    assert_eq!(outcome.report.failed, 0);
    assert!(outcome.report.failures.is_empty());
    assert_eq!(client.calls(), 4, "one attempt per tile");

    // Output raster at the requested size, fully covered by tile data.
    assert_eq!(outcome.mosaic.image.dimensions(), (200, 200));
    assert_eq!(outcome.mosaic.crs, Crs::WEB_MERCATOR);
    assert_eq!(
        *outcome.mosaic.image.get_pixel(100, 100),
        image::Rgba([90, 120, 150, 255])
    );

    // The output transform spans the requested bbox in mercator metres.
    let (west_m, north_m) = basemap::coord::lon_lat_to_mercator(quad_bbox().west, quad_bbox().north);
    assert!((outcome.mosaic.transform.origin_x - west_m).abs() < 1.0);
    assert!((outcome.mosaic.transform.origin_y - north_m).abs() < 1.0);
}

#[test]
fn one_tile_fails_all_retries() {
    // Tile 1/0/1 permanently fails; the mosaic assembles from the other 3.
    let client = Arc::new(
        PerUrlClient::ok(png_tile([10, 20, 30, 255])).with_override(
            "http://tiles.test/1/0/1.png",
            Err(FetchError::Network("connection reset".to_string())),
        ),
    );
    let service = BasemapService::new().with_client(client.clone());

    let outcome = service.import(&quad_request(xyz_server())).unwrap();

    assert_eq!(outcome.report.requested, 4);
    assert_eq!(outcome.report.succeeded, 3);
    assert_eq!(outcome.report.failed, 1);

    let failure = &outcome.report.failures[0];
    assert_eq!((failure.zoom, failure.x, failure.y), (1, 0, 1));
    assert_eq!(failure.attempts, 3, "the failing tile used its full budget");
    assert!(failure.reason.contains("connection reset"));
    assert!(failure.url.contains("/1/0/1.png"));

    // 3 tiles x 1 attempt + 1 tile x 3 attempts
    assert_eq!(client.calls(), 6);

    // Partial success still yields a raster.
    assert_eq!(outcome.mosaic.image.dimensions(), (200, 200));
}

#[test]
fn all_tiles_fail_is_fatal_with_manifest() {
    let client = Arc::new(PerUrlClient::failing_all());
    let service = BasemapService::new().with_client(client.clone());

    let error = service.import(&quad_request(xyz_server())).unwrap_err();

    match error {
        ImportError::Assembly { source, report } => {
            assert!(matches!(source, AssemblyError::NoTiles));
            assert_eq!(report.requested, 4);
            assert_eq!(report.succeeded, 0);
            assert_eq!(report.failed, 4);
            assert_eq!(report.failures.len(), 4);
            assert!(report.failures.iter().all(|f| f.attempts == 3));
        }
        other => panic!("expected assembly error, got {:?}", other),
    }
    assert_eq!(client.calls(), 12, "4 tiles x 3 attempts, then stop");
}

#[test]
fn corrupt_payload_counts_as_validation_failure() {
    // One tile serves an HTML error page on every attempt; the header check
    // burns the retry budget and the tile lands in the manifest.
    let client = Arc::new(
        PerUrlClient::ok(png_tile([1, 2, 3, 255])).with_override(
            "http://tiles.test/1/1/0.png",
            Ok(b"<html>rate limited</html>".to_vec()),
        ),
    );
    let service = BasemapService::new().with_client(client.clone());

    let outcome = service.import(&quad_request(xyz_server())).unwrap();

    assert_eq!(outcome.report.succeeded, 3);
    assert_eq!(outcome.report.failed, 1);
    assert!(outcome.report.failures[0].reason.contains("raster"));
    assert_eq!(client.calls(), 6);
}

#[test]
fn quadkey_server_requests_quadkey_urls() {
    let client = Arc::new(PerUrlClient::ok(png_tile([5, 5, 5, 255])));
    let service = BasemapService::new().with_client(client.clone());

    let server = ServerSpec::custom("http://quad.test/t{quadkey}.png");
    let outcome = service.import(&quad_request(server)).unwrap();

    assert_eq!(outcome.report.succeeded, 4);
    let mut urls = client.urls();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "http://quad.test/t0.png",
            "http://quad.test/t1.png",
            "http://quad.test/t2.png",
            "http://quad.test/t3.png",
        ],
        "zoom-1 tiles address as single-digit quadkeys"
    );
}

#[test]
fn wgs84_output_reprojects() {
    let client = Arc::new(PerUrlClient::ok(png_tile([200, 100, 50, 255])));
    let service = BasemapService::new().with_client(client);

    let request = quad_request(xyz_server())
        .with_target_crs(Crs::WGS84)
        .with_resampling(Resampling::Bilinear);
    let outcome = service.import(&request).unwrap();

    assert_eq!(outcome.mosaic.crs, Crs::WGS84);
    // Degrees now: origin is the bbox's NW corner.
    assert!((outcome.mosaic.transform.origin_x - (-170.0)).abs() < 1e-6);
    assert!((outcome.mosaic.transform.origin_y - 84.0).abs() < 1e-6);
    assert_eq!(
        *outcome.mosaic.image.get_pixel(100, 100),
        image::Rgba([200, 100, 50, 255])
    );
}

#[test]
fn missing_template_placeholder_aborts_before_network() {
    let client = Arc::new(PerUrlClient::ok(png_tile([1, 1, 1, 255])));
    let service = BasemapService::new().with_client(client.clone());

    let mut server = xyz_server();
    server.url_template = "http://tiles.test/{z}/{x}.png".to_string();
    let error = service.import(&quad_request(server)).unwrap_err();

    assert!(matches!(error, ImportError::Addressing(_)));
    assert_eq!(client.calls(), 0, "no network activity on a bad template");
}

#[test]
fn cancelled_run_is_fatal_but_accounted() {
    let client = Arc::new(PerUrlClient::ok(png_tile([1, 1, 1, 255])));
    let service = BasemapService::new().with_client(client.clone());
    service.cancel_flag().cancel();

    let error = service.import(&quad_request(xyz_server())).unwrap_err();

    match error {
        ImportError::Assembly { source, report } => {
            assert!(matches!(source, AssemblyError::NoTiles));
            assert!(report.cancelled);
            assert_eq!(report.requested, 4);
            assert_eq!(report.succeeded, 0);
        }
        other => panic!("expected assembly error, got {:?}", other),
    }
    assert_eq!(client.calls(), 0);
}
