//! Per-tile georeferencing.
//!
//! Attaches an affine transform (world-file equivalent) to each downloaded
//! tile, derived purely from the tile coordinate and zoom level. All
//! transforms live in EPSG:3857 metres, the tiles' native CRS; the mosaic
//! stage reprojects once at the end.

use std::fmt;

use image::RgbaImage;

use crate::coord::{self, TileCoord};

/// North-up affine transform from pixel space to world space.
///
/// `pixel_height` is negative: row indices grow southward while mercator y
/// grows northward. No rotation terms; tiles are axis-aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// World x of the top-left corner of the top-left pixel.
    pub origin_x: f64,
    /// World y of the top-left corner of the top-left pixel.
    pub origin_y: f64,
    /// World units per pixel along x (positive).
    pub pixel_width: f64,
    /// World units per pixel along y (negative).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// The transform of a tile at its native resolution.
    ///
    /// The tile's top-left corner maps to a known mercator coordinate and
    /// the pixel size is the per-zoom ground resolution. Deriving both from
    /// the tile index alone is what keeps adjacent tiles seamless.
    pub fn for_tile(coord: &TileCoord, tile_size: u32) -> Self {
        let (origin_x, origin_y) = coord::tile_to_mercator(coord);
        let resolution = coord::tile_span(coord.zoom) / tile_size as f64;
        Self {
            origin_x,
            origin_y,
            pixel_width: resolution,
            pixel_height: -resolution,
        }
    }

    /// Map a (fractional) pixel position to world coordinates.
    #[inline]
    pub fn pixel_to_world(&self, px: f64, py: f64) -> (f64, f64) {
        (
            self.origin_x + px * self.pixel_width,
            self.origin_y + py * self.pixel_height,
        )
    }

    /// Map world coordinates to a (fractional) pixel position.
    #[inline]
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Render the six-line ESRI world file for this transform.
    ///
    /// Lines 5 and 6 are the world coordinates of the *center* of the
    /// upper-left pixel, per the world-file convention.
    pub fn world_file(&self) -> String {
        format!(
            "{}\n0.0\n0.0\n{}\n{}\n{}\n",
            self.pixel_width,
            self.pixel_height,
            self.origin_x + 0.5 * self.pixel_width,
            self.origin_y + 0.5 * self.pixel_height,
        )
    }
}

/// A decoded tile with its affine transform attached.
///
/// Owned by the mosaic builder during assembly and discarded once merged.
#[derive(Debug, Clone)]
pub struct GeoreferencedTile {
    pub coord: TileCoord,
    pub image: RgbaImage,
    pub transform: GeoTransform,
}

/// Failures while georeferencing one tile.
///
/// These are routed back as failed tiles in the manifest; they never abort
/// the run.
#[derive(Debug, Clone)]
pub enum GeorefError {
    /// Payload did not decode as an image.
    Decode(String),
    /// Decoded dimensions differ from the scheme tile size.
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: u32,
    },
}

impl fmt::Display for GeorefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeorefError::Decode(msg) => write!(f, "tile payload failed to decode: {}", msg),
            GeorefError::DimensionMismatch {
                width,
                height,
                expected,
            } => write!(
                f,
                "tile decoded to {}x{}, expected {}x{}",
                width, height, expected, expected
            ),
        }
    }
}

impl std::error::Error for GeorefError {}

/// Turns successful download payloads into [`GeoreferencedTile`]s.
#[derive(Debug, Clone, Copy)]
pub struct Georeferencer {
    tile_size: u32,
}

impl Georeferencer {
    /// Create a georeferencer for `tile_size`-pixel square tiles.
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    /// Decode a payload and attach its transform.
    pub fn georeference(
        &self,
        coord: TileCoord,
        payload: &[u8],
    ) -> Result<GeoreferencedTile, GeorefError> {
        let image = image::load_from_memory(payload)
            .map_err(|e| GeorefError::Decode(e.to_string()))?
            .to_rgba8();

        let (width, height) = image.dimensions();
        if width != self.tile_size || height != self.tile_size {
            return Err(GeorefError::DimensionMismatch {
                width,
                height,
                expected: self.tile_size,
            });
        }

        Ok(GeoreferencedTile {
            coord,
            transform: GeoTransform::for_tile(&coord, self.tile_size),
            image,
        })
    }
}
