//! Tile range enumeration.
//!
//! Maps a geographic bounding box and zoom level onto the inclusive tile
//! index ranges that cover it, expanded by a fractional margin plus one tile
//! ring so mosaic edges never land exactly on the requested extent. Indices
//! falling outside `[0, 2^z - 1]` after expansion (polar edges) are clamped
//! away silently.

use std::fmt;

use crate::catalog::Scheme;
use crate::coord::{self, BoundingBox, CoordError, TileCoord};

/// Fatal addressing failures, raised before any network activity.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressingError {
    /// Malformed bounding box or invalid zoom.
    InvalidBounds(CoordError),
    /// URL template lacks a placeholder its scheme requires.
    MissingPlaceholder {
        scheme: Scheme,
        placeholder: String,
    },
    /// Template contains `{apikey}` but no key was supplied.
    MissingApiKey,
}

impl fmt::Display for AddressingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingError::InvalidBounds(e) => write!(f, "invalid request bounds: {}", e),
            AddressingError::MissingPlaceholder {
                scheme,
                placeholder,
            } => write!(
                f,
                "URL template for {} scheme is missing the {} placeholder",
                scheme, placeholder
            ),
            AddressingError::MissingApiKey => {
                write!(f, "URL template requires an API key but none was supplied")
            }
        }
    }
}

impl std::error::Error for AddressingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AddressingError::InvalidBounds(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CoordError> for AddressingError {
    fn from(e: CoordError) -> Self {
        AddressingError::InvalidBounds(e)
    }
}

/// Inclusive tile index ranges covering an expanded bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
    pub zoom: u8,
}

impl TileRange {
    /// Compute the tile cover for `bbox` at `zoom`.
    ///
    /// The box is first grown by the fractional `margin` in every direction,
    /// then the resulting index ranges gain one extra tile ring. Both steps
    /// clamp to the grid, so a box touching the poles or the antimeridian
    /// simply covers fewer tiles instead of erroring.
    pub fn covering(bbox: &BoundingBox, zoom: u8, margin: f64) -> Result<Self, AddressingError> {
        let expanded = bbox.expanded(margin.max(0.0));

        // Northwest corner gives the minimum indices, southeast the maximum.
        let nw = coord::to_tile_coords(expanded.north, expanded.west, zoom)?;
        let se = coord::to_tile_coords(expanded.south, expanded.east, zoom)?;

        let max_index = (1u32 << zoom) - 1;
        Ok(Self {
            x_min: nw.x.saturating_sub(1),
            x_max: (se.x + 1).min(max_index),
            y_min: nw.y.saturating_sub(1),
            y_max: (se.y + 1).min(max_index),
            zoom,
        })
    }

    /// Number of tile columns in the range.
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    /// Number of tile rows in the range.
    pub fn height(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    /// Total number of tiles in the range.
    pub fn count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Iterate every tile coordinate in the range, row-major, exactly once.
    pub fn tiles(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            next_x: self.x_min,
            next_y: self.y_min,
            done: false,
        }
    }
}

/// Row-major iterator over a [`TileRange`].
pub struct TileRangeIter {
    range: TileRange,
    next_x: u32,
    next_y: u32,
    done: bool,
}

impl Iterator for TileRangeIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        if self.done {
            return None;
        }
        let tile = TileCoord::new(self.next_x, self.next_y, self.range.zoom);

        if self.next_x < self.range.x_max {
            self.next_x += 1;
        } else if self.next_y < self.range.y_max {
            self.next_x = self.range.x_min;
            self.next_y += 1;
        } else {
            self.done = true;
        }
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining_rows = (self.range.y_max - self.next_y) as usize;
        let remaining = remaining_rows * self.range.width() as usize
            + (self.range.x_max - self.next_x) as usize
            + 1;
        (remaining, Some(remaining))
    }
}
