//! Mosaic assembly and reprojection.
//!
//! All georeferenced tiles from one run share EPSG:3857, so assembly is a
//! pure blit: each tile lands at its exact grid offset in one canvas, with
//! last-write-wins on margin overlap. The assembled canvas is then
//! reprojected into the target CRS by inverse-mapping every output pixel and
//! sampling with a configurable method.

pub mod output;
pub mod reproject;
mod resample;

pub use resample::Resampling;

use std::fmt;

use image::RgbaImage;
use tracing::{debug, info};

use crate::coord::{BoundingBox, TileCoord};
use crate::crs::Crs;
use crate::georef::{GeoTransform, GeoreferencedTile};

use reproject::CrsTransformer;

/// Fatal mosaic failures.
///
/// Raised only when no usable raster can be produced; individual tile
/// failures upstream are reported, not raised.
#[derive(Debug, Clone)]
pub enum AssemblyError {
    /// No tiles survived download and georeferencing.
    NoTiles,
    /// Tiles from different zoom levels cannot share one canvas.
    ZoomMismatch { expected: u8, found: u8 },
    /// The tile cover would need a canvas beyond sane memory bounds.
    CanvasTooLarge { width: u64, height: u64 },
    /// Requested output size has a zero dimension.
    InvalidOutputSize { width: u32, height: u32 },
    /// The CRS is not in the definition database.
    UnsupportedCrs(String),
    /// Coordinate transformation failed.
    Reprojection(String),
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::NoTiles => {
                write!(f, "no tiles available to assemble (all downloads failed)")
            }
            AssemblyError::ZoomMismatch { expected, found } => {
                write!(
                    f,
                    "tile zoom mismatch: expected {}, found {}",
                    expected, found
                )
            }
            AssemblyError::CanvasTooLarge { width, height } => {
                write!(f, "assembled canvas {}x{} exceeds limits", width, height)
            }
            AssemblyError::InvalidOutputSize { width, height } => {
                write!(f, "invalid output size {}x{}", width, height)
            }
            AssemblyError::UnsupportedCrs(crs) => write!(f, "unsupported CRS {}", crs),
            AssemblyError::Reprojection(msg) => write!(f, "reprojection failed: {}", msg),
        }
    }
}

impl std::error::Error for AssemblyError {}

/// Upper bound on either canvas axis, in pixels.
const MAX_CANVAS_AXIS: u64 = 65_536;

/// The assembled tile canvas in the tiles' native CRS (EPSG:3857).
#[derive(Debug, Clone)]
pub struct SourceMosaic {
    pub image: RgbaImage,
    pub transform: GeoTransform,
}

/// The terminal artifact: a reprojected raster with its georeferencing.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub image: RgbaImage,
    pub transform: GeoTransform,
    pub crs: Crs,
}

/// Assembles georeferenced tiles and reprojects the result.
#[derive(Debug, Clone, Copy)]
pub struct MosaicBuilder {
    tile_size: u32,
}

impl MosaicBuilder {
    /// Create a builder for `tile_size`-pixel square tiles.
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    /// Merge all tiles into one canvas positioned by their transforms.
    ///
    /// Order-independent up to overlap: tiles on the expansion margin may
    /// overlap and resolve last-write-wins, matching upstream tile edge
    /// behaviour. Missing tiles stay transparent.
    pub fn assemble(&self, tiles: &[GeoreferencedTile]) -> Result<SourceMosaic, AssemblyError> {
        let first = tiles.first().ok_or(AssemblyError::NoTiles)?;
        let zoom = first.coord.zoom;

        let mut x_min = u32::MAX;
        let mut x_max = 0u32;
        let mut y_min = u32::MAX;
        let mut y_max = 0u32;
        for tile in tiles {
            if tile.coord.zoom != zoom {
                return Err(AssemblyError::ZoomMismatch {
                    expected: zoom,
                    found: tile.coord.zoom,
                });
            }
            x_min = x_min.min(tile.coord.x);
            x_max = x_max.max(tile.coord.x);
            y_min = y_min.min(tile.coord.y);
            y_max = y_max.max(tile.coord.y);
        }

        let ts = self.tile_size as u64;
        let width = (x_max - x_min + 1) as u64 * ts;
        let height = (y_max - y_min + 1) as u64 * ts;
        if width > MAX_CANVAS_AXIS || height > MAX_CANVAS_AXIS {
            return Err(AssemblyError::CanvasTooLarge { width, height });
        }

        let mut canvas = RgbaImage::new(width as u32, height as u32);
        for tile in tiles {
            let offset_x = (tile.coord.x - x_min) as i64 * ts as i64;
            let offset_y = (tile.coord.y - y_min) as i64 * ts as i64;
            image::imageops::replace(&mut canvas, &tile.image, offset_x, offset_y);
        }

        let transform = GeoTransform::for_tile(&TileCoord::new(x_min, y_min, zoom), self.tile_size);
        debug!(
            tiles = tiles.len(),
            width, height, zoom, "assembled source mosaic"
        );

        Ok(SourceMosaic {
            image: canvas,
            transform,
        })
    }

    /// Reproject the assembled canvas into `target_crs`, covering `bbox` at
    /// the requested output dimensions.
    ///
    /// Every output pixel center is inverse-mapped through the CRS
    /// transform into the source canvas and sampled with `resampling`.
    /// Pixels falling outside the canvas stay transparent.
    pub fn reproject(
        &self,
        source: &SourceMosaic,
        target_crs: Crs,
        bbox: &BoundingBox,
        width: u32,
        height: u32,
        resampling: Resampling,
    ) -> Result<Mosaic, AssemblyError> {
        if width == 0 || height == 0 {
            return Err(AssemblyError::InvalidOutputSize { width, height });
        }

        // Output extent expressed in the target CRS.
        let to_target = CrsTransformer::new(Crs::WGS84, target_crs)?;
        let (min_x, min_y) = to_target.transform(bbox.west, bbox.south)?;
        let (max_x, max_y) = to_target.transform(bbox.east, bbox.north)?;
        if !(min_x < max_x && min_y < max_y) {
            return Err(AssemblyError::Reprojection(format!(
                "degenerate output extent in {}",
                target_crs
            )));
        }

        let transform = GeoTransform {
            origin_x: min_x,
            origin_y: max_y,
            pixel_width: (max_x - min_x) / width as f64,
            pixel_height: -(max_y - min_y) / height as f64,
        };

        // Inverse mapping: output pixel -> target CRS -> EPSG:3857 -> source
        // pixel. Identity when the target is already Web Mercator.
        let to_source = if target_crs == Crs::WEB_MERCATOR {
            None
        } else {
            Some(CrsTransformer::new(target_crs, Crs::WEB_MERCATOR)?)
        };

        let mut image = RgbaImage::new(width, height);
        for out_y in 0..height {
            for out_x in 0..width {
                let (tx, ty) = transform.pixel_to_world(out_x as f64 + 0.5, out_y as f64 + 0.5);
                let (mx, my) = match &to_source {
                    Some(t) => match t.transform(tx, ty) {
                        Ok(point) => point,
                        Err(_) => continue,
                    },
                    None => (tx, ty),
                };
                let (sx, sy) = source.transform.world_to_pixel(mx, my);
                if let Some(pixel) = resample::sample(&source.image, sx, sy, resampling) {
                    image.put_pixel(out_x, out_y, pixel);
                }
            }
        }

        info!(
            width,
            height,
            crs = %target_crs,
            method = %resampling,
            "reprojected mosaic"
        );

        Ok(Mosaic {
            image,
            transform,
            crs: target_crs,
        })
    }
}
