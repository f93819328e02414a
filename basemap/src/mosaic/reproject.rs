//! Coordinate transformation between CRSs.
//!
//! Pure-Rust point transforms through proj4rs. Geographic CRSs operate in
//! radians inside proj4rs, so degree conversion happens at this boundary
//! and nowhere else.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::coord::BoundingBox;
use crate::crs::Crs;

use super::AssemblyError;

/// A one-way point transformer between two CRSs.
pub struct CrsTransformer {
    from: Proj,
    to: Proj,
    from_geographic: bool,
    to_geographic: bool,
}

impl CrsTransformer {
    /// Build a transformer from `from` to `to`.
    ///
    /// # Errors
    ///
    /// `UnsupportedCrs` when either EPSG code is missing from the definition
    /// database, `Reprojection` when its PROJ string fails to parse.
    pub fn new(from: Crs, to: Crs) -> Result<Self, AssemblyError> {
        let from_str = from
            .proj_string()
            .ok_or_else(|| AssemblyError::UnsupportedCrs(from.to_string()))?;
        let to_str = to
            .proj_string()
            .ok_or_else(|| AssemblyError::UnsupportedCrs(to.to_string()))?;

        let from_proj = Proj::from_proj_string(from_str)
            .map_err(|e| AssemblyError::Reprojection(format!("invalid projection {}: {:?}", from, e)))?;
        let to_proj = Proj::from_proj_string(to_str)
            .map_err(|e| AssemblyError::Reprojection(format!("invalid projection {}: {:?}", to, e)))?;

        Ok(Self {
            from: from_proj,
            to: to_proj,
            from_geographic: from.is_geographic(),
            to_geographic: to.is_geographic(),
        })
    }

    /// Transform one point. Degrees in and out for geographic CRSs.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), AssemblyError> {
        let (input_x, input_y) = if self.from_geographic {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        let mut point = (input_x, input_y, 0.0);
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| AssemblyError::Reprojection(format!("transform failed: {:?}", e)))?;

        if self.to_geographic {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

/// Transform a bounding box given in `crs` into WGS84 degrees.
///
/// This is how projected invocation bounds (a host application's working
/// CRS) enter the lon/lat pipeline.
pub fn bbox_to_wgs84(
    crs: Crs,
    west: f64,
    south: f64,
    east: f64,
    north: f64,
) -> Result<BoundingBox, AssemblyError> {
    let (west, south, east, north) = if crs == Crs::WGS84 {
        (west, south, east, north)
    } else {
        let transformer = CrsTransformer::new(crs, Crs::WGS84)?;
        let (w, s) = transformer.transform(west, south)?;
        let (e, n) = transformer.transform(east, north)?;
        (w, s, e, n)
    };

    BoundingBox::new(west, south, east, north)
        .map_err(|e| AssemblyError::Reprojection(format!("transformed bounds invalid: {}", e)))
}
