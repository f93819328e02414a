//! Tile server catalog.
//!
//! A static, read-only registry of known tile servers plus the [`ServerSpec`]
//! type describing one tile source. The registry is built once on first
//! access and never mutated afterwards; user-supplied URL templates produce
//! anonymous specs at invocation time instead.

pub mod template;

pub use template::UrlTemplate;

use std::fmt;
use std::sync::OnceLock;

/// Tile addressing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Slippy-map `{z}/{x}/{y}` addressing.
    Xyz,
    /// Bing-style base-4 quadkey addressing.
    Quadkey,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Xyz => write!(f, "xyz"),
            Scheme::Quadkey => write!(f, "quadkey"),
        }
    }
}

/// Raster format a server delivers tiles in.
///
/// Chooses output file extensions; payload validation accepts any
/// recognisable raster magic since servers are not strict about this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Tiff,
}

impl ImageFormat {
    /// Conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Tiff => "tiff",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Default tile edge length in pixels for both schemes.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default fractional bounding-box expansion margin.
pub const DEFAULT_MARGIN: f64 = 0.10;

/// Description of one tile source.
///
/// Immutable once constructed; catalog entries live for the process
/// lifetime, custom specs for the duration of one import.
#[derive(Debug, Clone)]
pub struct ServerSpec {
    /// Catalog identifier (e.g. `Google_Satellite`), or `Custom`.
    pub id: String,
    /// Human-readable name for listings.
    pub name: String,
    /// URL template with `{z}`/`{x}`/`{y}` or `{quadkey}` placeholders.
    pub url_template: String,
    /// Addressing scheme.
    pub scheme: Scheme,
    /// Finest zoom level the server offers.
    pub max_zoom: u8,
    /// Delivered raster format.
    pub format: ImageFormat,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Fractional bounding-box expansion margin hint.
    pub margin: f64,
}

impl ServerSpec {
    /// Build a spec for a user-supplied URL template.
    ///
    /// The scheme is inferred from the placeholders present: a `{quadkey}`
    /// placeholder selects quadkey addressing, anything else is treated
    /// as XYZ.
    pub fn custom(url_template: impl Into<String>) -> Self {
        let url_template = url_template.into();
        let scheme = if url_template.contains("{quadkey}") {
            Scheme::Quadkey
        } else {
            Scheme::Xyz
        };
        Self {
            id: "Custom".to_string(),
            name: "Custom".to_string(),
            url_template,
            scheme,
            max_zoom: 19,
            format: ImageFormat::Png,
            tile_size: DEFAULT_TILE_SIZE,
            margin: DEFAULT_MARGIN,
        }
    }

    fn entry(
        id: &str,
        name: &str,
        url_template: &str,
        scheme: Scheme,
        max_zoom: u8,
        format: ImageFormat,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url_template: url_template.to_string(),
            scheme,
            max_zoom,
            format,
            tile_size: DEFAULT_TILE_SIZE,
            margin: DEFAULT_MARGIN,
        }
    }
}

/// The process-wide server registry.
pub struct ServerCatalog {
    servers: Vec<ServerSpec>,
}

impl ServerCatalog {
    /// Look up a server by its catalog identifier.
    pub fn lookup(&self, id: &str) -> Option<&ServerSpec> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// All catalog entries in registration order.
    pub fn all(&self) -> &[ServerSpec] {
        &self.servers
    }
}

/// Access the static server catalog, built on first use.
pub fn registry() -> &'static ServerCatalog {
    static CATALOG: OnceLock<ServerCatalog> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

fn build_catalog() -> ServerCatalog {
    use ImageFormat::*;
    use Scheme::*;

    let servers = vec![
        ServerSpec::entry(
            "Google_Satellite",
            "Google Satellite",
            "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}",
            Xyz,
            20,
            Jpeg,
        ),
        ServerSpec::entry(
            "OpenStreetMap",
            "OpenStreetMap",
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            Xyz,
            19,
            Png,
        ),
        ServerSpec::entry(
            "Bing_Aerial",
            "Bing Aerial",
            "https://ecn.t3.tiles.virtualearth.net/tiles/a{quadkey}.jpeg?g=1",
            Quadkey,
            19,
            Jpeg,
        ),
        ServerSpec::entry(
            "ESRI_WorldImagery",
            "ESRI World Imagery",
            "https://services.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            Xyz,
            19,
            Jpeg,
        ),
        ServerSpec::entry(
            "USGS_Topo",
            "USGS Topographic Maps",
            "https://basemap.nationalmap.gov/arcgis/rest/services/USGSTopo/MapServer/tile/{z}/{y}/{x}",
            Xyz,
            16,
            Png,
        ),
        ServerSpec::entry(
            "Google_Terrain",
            "Google Terrain",
            "https://mt1.google.com/vt/lyrs=t&x={x}&y={y}&z={z}",
            Xyz,
            15,
            Png,
        ),
        ServerSpec::entry(
            "Google_Hybrid",
            "Google Hybrid",
            "https://mt1.google.com/vt/lyrs=y&x={x}&y={y}&z={z}",
            Xyz,
            20,
            Jpeg,
        ),
        ServerSpec::entry(
            "Bing_Roads",
            "Bing Road Maps",
            "https://ecn.t3.tiles.virtualearth.net/tiles/r{quadkey}.png?g=1",
            Quadkey,
            19,
            Png,
        ),
        ServerSpec::entry(
            "Stamen_Terrain",
            "Stamen Terrain",
            "https://stamen-tiles-{s}.a.ssl.fastly.net/terrain/{z}/{x}/{y}.png",
            Xyz,
            18,
            Png,
        ),
        ServerSpec::entry(
            "Stamen_Toner",
            "Stamen Toner",
            "https://stamen-tiles-{s}.a.ssl.fastly.net/toner/{z}/{x}/{y}.png",
            Xyz,
            20,
            Png,
        ),
        ServerSpec::entry(
            "Stamen_Watercolor",
            "Stamen Watercolor",
            "https://stamen-tiles-{s}.a.ssl.fastly.net/watercolor/{z}/{x}/{y}.jpg",
            Xyz,
            18,
            Jpeg,
        ),
        ServerSpec::entry(
            "OpenTopoMap",
            "OpenTopoMap",
            "https://tile.opentopomap.org/{z}/{x}/{y}.png",
            Xyz,
            17,
            Png,
        ),
        ServerSpec::entry(
            "OSM_Humanitarian",
            "Humanitarian OpenStreetMap",
            "https://tile-{s}.openstreetmap.fr/hot/{z}/{x}/{y}.png",
            Xyz,
            20,
            Png,
        ),
        ServerSpec::entry(
            "Natural_Earth",
            "National Geographic World Map",
            "https://services.arcgisonline.com/ArcGIS/rest/services/NatGeo_World_Map/MapServer/tile/{z}/{y}/{x}",
            Xyz,
            16,
            Png,
        ),
        ServerSpec::entry(
            "USGS_NAIP",
            "USGS NAIP Imagery",
            "https://imagery.nationalmap.gov/arcgis/rest/services/USGSNAIPImagery/MapServer/tile/{z}/{y}/{x}",
            Xyz,
            18,
            Jpeg,
        ),
        ServerSpec::entry(
            "USGS_3DEP",
            "USGS 3D Elevation Program",
            "https://elevation.nationalmap.gov/arcgis/rest/services/3DEPElevation/ImageServer/tile/{z}/{y}/{x}",
            Xyz,
            15,
            Tiff,
        ),
        ServerSpec::entry(
            "USGS_Hydro",
            "USGS Hydrography",
            "https://basemap.nationalmap.gov/arcgis/rest/services/USGSHydroCached/MapServer/tile/{z}/{y}/{x}",
            Xyz,
            16,
            Png,
        ),
    ];

    ServerCatalog { servers }
}
