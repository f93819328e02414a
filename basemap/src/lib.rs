//! Basemap - tiled web-map imagery acquisition and mosaic engine
//!
//! This library downloads raster basemap tiles from slippy-map (XYZ) and
//! Bing-style (quadkey) tile services, assembles them into a single
//! georeferenced mosaic, and reprojects the result into a target coordinate
//! reference system.
//!
//! # Pipeline
//!
//! ```text
//! BoundingBox + output size ──► zoom::select_zoom
//!                           ──► addressor::TileRange (tile list)
//!                           ──► download::DownloadCoordinator (worker pool)
//!                           ──► georef::Georeferencer (per-tile affine)
//!                           ──► mosaic::MosaicBuilder (assemble + reproject)
//! ```
//!
//! The high-level entry point is [`service::BasemapService`].

pub mod addressor;
pub mod catalog;
pub mod coord;
pub mod crs;
pub mod download;
pub mod fetch;
pub mod georef;
pub mod logging;
pub mod mosaic;
pub mod service;
pub mod telemetry;
pub mod zoom;

pub use addressor::{AddressingError, TileRange};
pub use catalog::{ImageFormat, Scheme, ServerSpec};
pub use coord::{BoundingBox, TileCoord};
pub use crs::Crs;
pub use download::{
    CancelFlag, DownloadConfig, DownloadCoordinator, DownloadReport, DownloadResult, RetryPolicy,
};
pub use fetch::{FetchError, HttpClient, ReqwestClient, TileFetcher};
pub use georef::{GeoTransform, GeoreferencedTile, Georeferencer};
pub use mosaic::{AssemblyError, Mosaic, MosaicBuilder, Resampling};
pub use service::{BasemapService, ImportError, ImportOutcome, ImportRequest};

/// Library version, exposed for CLI banners.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
