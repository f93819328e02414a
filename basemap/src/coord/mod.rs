//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! Web Mercator tile indices, and Web Mercator metres, as used by slippy-map
//! tile servers.

pub mod quadkey;
mod types;

pub use types::{
    BoundingBox, CoordError, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
    ORIGIN_SHIFT,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);

    let x = ((lon + 180.0) / 360.0 * n) as u32;

    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32;

    // lon == 180.0 / lat == MIN_LAT land exactly on the far grid edge
    let max_index = (n as u32).saturating_sub(1);
    Ok(TileCoord {
        x: x.min(max_index),
        y: y.min(max_index),
        zoom,
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Converts tile coordinates to the Web Mercator metres of the tile's
/// northwest corner.
#[inline]
pub fn tile_to_mercator(tile: &TileCoord) -> (f64, f64) {
    let span = tile_span(tile.zoom);
    let x = -ORIGIN_SHIFT + tile.x as f64 * span;
    let y = ORIGIN_SHIFT - tile.y as f64 * span;
    (x, y)
}

/// Converts geographic degrees to Web Mercator metres.
#[inline]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon / 180.0 * ORIGIN_SHIFT;
    let lat_rad = lat * PI / 180.0;
    let y = lat_rad.tan().asinh() / PI * ORIGIN_SHIFT;
    (x, y)
}

/// Side length of one tile in Web Mercator metres at the given zoom.
#[inline]
pub fn tile_span(zoom: u8) -> f64 {
    2.0 * ORIGIN_SHIFT / 2.0_f64.powi(zoom as i32)
}
