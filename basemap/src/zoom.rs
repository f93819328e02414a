//! Zoom level selection.
//!
//! Chooses the minimal zoom level whose nominal tile resolution is at least
//! as fine as a requested output resolution, capped at the server's maximum.

use crate::coord::{BoundingBox, ORIGIN_SHIFT};

/// Ground resolution in metres per pixel of a 256 px tile at zoom 0.
pub const ZOOM0_RESOLUTION: f64 = 2.0 * ORIGIN_SHIFT / 256.0;

/// Nominal ground resolution (metres per pixel at the equator) at a zoom
/// level, for 256 px tiles. Halves with each zoom increment.
#[inline]
pub fn resolution_for_zoom(zoom: u8) -> f64 {
    ZOOM0_RESOLUTION / 2.0_f64.powi(zoom as i32)
}

/// Select the smallest zoom level whose tile resolution is at least as fine
/// as `target_resolution` (metres per pixel), capped at `max_zoom`.
///
/// Never fails: a target finer than the server can deliver selects
/// `max_zoom` and accepts coarser output. Deterministic for equal inputs,
/// and monotonic: a finer target never yields a lower zoom.
pub fn select_zoom(target_resolution: f64, max_zoom: u8) -> u8 {
    if !(target_resolution.is_finite()) || target_resolution <= 0.0 {
        return max_zoom;
    }
    for zoom in 0..=max_zoom {
        if resolution_for_zoom(zoom) <= target_resolution {
            return zoom;
        }
    }
    max_zoom
}

/// Derive the target ground resolution from a bounding box and the requested
/// output size, in Web Mercator metres per pixel.
///
/// Uses the coarser of the two axes so the selected zoom covers both.
pub fn target_resolution(bbox: &BoundingBox, cols: u32, rows: u32) -> f64 {
    let (west_m, south_m) = crate::coord::lon_lat_to_mercator(bbox.west, bbox.south);
    let (east_m, north_m) = crate::coord::lon_lat_to_mercator(bbox.east, bbox.north);

    let x_res = (east_m - west_m) / cols.max(1) as f64;
    let y_res = (north_m - south_m) / rows.max(1) as f64;
    x_res.max(y_res)
}
