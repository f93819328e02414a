//! Single-attempt tile fetch with payload validation.

use std::io::Cursor;
use std::sync::Arc;

use super::{FetchError, HttpClient};

/// Magic header prefixes of raster formats tile servers are known to return.
///
/// Servers routinely serve PNG from `.jpeg` endpoints and vice versa, so the
/// check accepts any recognisable raster rather than the declared format.
const RASTER_MAGICS: [&[u8]; 6] = [
    &[0x89, b'P', b'N', b'G'],       // PNG
    &[0xFF, 0xD8, 0xFF],             // JPEG
    b"GIF8",                         // GIF
    &[0x49, 0x49, 0x2A, 0x00],       // TIFF little-endian
    &[0x4D, 0x4D, 0x00, 0x2A],       // TIFF big-endian
    &[0x52, 0x49, 0x46, 0x46],       // RIFF (WebP container)
];

/// Downloads and validates a single tile.
///
/// One fetch attempt per call; the retry budget belongs to the
/// [`DownloadCoordinator`](crate::download::DownloadCoordinator). Validation
/// covers the magic header and the pixel dimensions (header-only decode),
/// so a mangled or mis-sized payload fails the attempt just like a network
/// error would.
pub struct TileFetcher {
    client: Arc<dyn HttpClient>,
    tile_size: u32,
}

impl TileFetcher {
    /// Create a fetcher expecting `tile_size`-pixel square tiles.
    pub fn new(client: Arc<dyn HttpClient>, tile_size: u32) -> Self {
        Self { client, tile_size }
    }

    /// The expected tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Fetch one tile and validate the payload.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let payload = self.client.get(url)?;

        if payload.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        if !has_raster_magic(&payload) {
            return Err(FetchError::BadMagic);
        }

        let (width, height) = image::ImageReader::new(Cursor::new(&payload))
            .with_guessed_format()
            .map_err(|e| FetchError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        if width != self.tile_size || height != self.tile_size {
            return Err(FetchError::DimensionMismatch {
                width,
                height,
                expected: self.tile_size,
            });
        }

        Ok(payload)
    }
}

/// Whether `payload` starts with a known raster magic header.
fn has_raster_magic(payload: &[u8]) -> bool {
    RASTER_MAGICS
        .iter()
        .any(|magic| payload.starts_with(magic))
}
