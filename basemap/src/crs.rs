//! Coordinate reference system identifiers.
//!
//! A thin newtype over EPSG codes, resolved to PROJ strings through the
//! `crs-definitions` database. Actual point transformation lives in
//! [`crate::mosaic::reproject`].

use std::fmt;
use std::str::FromStr;

/// An EPSG-coded coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// WGS84 geographic coordinates (degrees).
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// Web Mercator, the native CRS of slippy-map tiles.
    pub const WEB_MERCATOR: Crs = Crs { epsg: 3857 };

    /// Wrap an EPSG code.
    pub fn from_epsg(epsg: u16) -> Self {
        Self { epsg }
    }

    /// The EPSG code.
    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    /// PROJ string for this CRS, if the definition database knows it.
    pub fn proj_string(&self) -> Option<&'static str> {
        crs_definitions::from_code(self.epsg).map(|def| def.proj4)
    }

    /// Whether this CRS is geographic (lon/lat degrees) rather than
    /// projected. Geographic CRSs need degree/radian conversion around
    /// proj4rs transforms.
    pub fn is_geographic(&self) -> bool {
        match self.proj_string() {
            Some(proj) => proj.contains("+proj=longlat"),
            None => self.epsg == 4326,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Failure to parse a CRS designator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsParseError(String);

impl fmt::Display for CrsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid CRS designator '{}' (expected EPSG:<code>)",
            self.0
        )
    }
}

impl std::error::Error for CrsParseError {}

impl FromStr for Crs {
    type Err = CrsParseError;

    /// Accepts `EPSG:4326`, `epsg:4326`, or a bare numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code_part = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        code_part
            .parse::<u16>()
            .map(Crs::from_epsg)
            .map_err(|_| CrsParseError(s.to_string()))
    }
}
