//! basemap - import basemap imagery from tiled web map services.
//!
//! Fetches XYZ or quadkey raster tiles covering a bounding box, mosaics
//! them, reprojects into a target CRS and writes a PNG with world-file
//! sidecar georeferencing plus a JSON download manifest.

mod error;
mod progress;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use basemap::catalog::{registry, ServerSpec};
use basemap::mosaic::reproject::bbox_to_wgs84;
use basemap::mosaic::Mosaic;
use basemap::{
    BasemapService, BoundingBox, Crs, DownloadConfig, ImportRequest, Resampling, RetryPolicy,
};

use error::CliError;

/// Import basemaps from tiled web map services.
#[derive(Debug, Parser)]
#[command(name = "basemap", version = basemap::VERSION)]
struct Cli {
    /// List available servers and exit.
    #[arg(short = 'l', long)]
    list_servers: bool,

    /// Output raster path (PNG; a .wld sidecar and .manifest.json are
    /// written next to it).
    #[arg(short, long, required_unless_present = "list_servers")]
    output: Option<PathBuf>,

    /// Bounding box as west,south,east,north.
    #[arg(short, long, value_parser = parse_bbox, allow_hyphen_values = true, required_unless_present = "list_servers")]
    bbox: Option<[f64; 4]>,

    /// CRS the bounding box is expressed in.
    #[arg(long, default_value = "EPSG:4326")]
    bbox_crs: Crs,

    /// Catalog server to fetch from.
    #[arg(short, long, default_value = "OpenStreetMap")]
    server: String,

    /// Custom URL template with {z}/{x}/{y} or {quadkey} placeholders;
    /// overrides --server.
    #[arg(short, long)]
    url: Option<String>,

    /// API key substituted into {apikey} templates.
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum output width in pixels.
    #[arg(long, default_value_t = 1024)]
    maxcols: u32,

    /// Maximum output height in pixels.
    #[arg(long, default_value_t = 1024)]
    maxrows: u32,

    /// Output coordinate reference system.
    #[arg(short, long, default_value = "EPSG:3857")]
    target_crs: Crs,

    /// Resampling method: nearest, bilinear or cubic.
    #[arg(short, long, default_value = "cubic")]
    resampling: Resampling,

    /// Concurrent tile fetches.
    #[arg(short, long, default_value_t = 6)]
    parallel: usize,

    /// Attempts per tile (including the first).
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Per-attempt timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Bounding-box expansion margin override (fraction, e.g. 0.1).
    #[arg(long)]
    margin: Option<f64>,

    /// Seed for the tile download order (reproducible runs).
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the progress bar.
    #[arg(short, long)]
    quiet: bool,
}

/// Parse `west,south,east,north`.
fn parse_bbox(s: &str) -> Result<[f64; 4], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!(
            "expected west,south,east,north (got {} values)",
            parts.len()
        ));
    }
    let mut edges = [0.0f64; 4];
    for (slot, part) in edges.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", part))?;
    }
    Ok(edges)
}

fn list_servers() {
    println!("Available web map servers:");
    println!();
    for spec in registry().all() {
        println!("  {}: {}", spec.id, spec.name);
        println!("    URL:      {}", spec.url_template);
        println!("    Scheme:   {}", spec.scheme);
        println!("    Max zoom: {}", spec.max_zoom);
        println!("    Format:   {}", spec.format);
        println!();
    }
}

fn resolve_server(cli: &Cli) -> Result<ServerSpec, CliError> {
    if let Some(url) = &cli.url {
        return Ok(ServerSpec::custom(url.clone()));
    }
    registry()
        .lookup(&cli.server)
        .cloned()
        .ok_or_else(|| {
            CliError::Args(format!(
                "server '{}' not found; use --list-servers to see the catalog",
                cli.server
            ))
        })
}

fn resolve_bbox(cli: &Cli) -> Result<BoundingBox, CliError> {
    let [west, south, east, north] = cli.bbox.expect("clap enforces presence");
    bbox_to_wgs84(cli.bbox_crs, west, south, east, north)
        .map_err(|e| CliError::Args(format!("invalid bounding box: {}", e)))
}

fn run(cli: Cli) -> Result<(), CliError> {
    let server = resolve_server(&cli)?;
    let bbox = resolve_bbox(&cli)?;
    let output = cli.output.clone().expect("clap enforces presence");

    let download = DownloadConfig::new()
        .with_concurrency(cli.parallel)
        .with_retry(RetryPolicy::fixed(
            cli.retries.max(1),
            Duration::from_millis(500),
        ))
        .with_timeout(Duration::from_secs(cli.timeout));

    let mut request = ImportRequest::new(bbox, server, cli.maxcols, cli.maxrows)
        .with_target_crs(cli.target_crs)
        .with_resampling(cli.resampling)
        .with_download(download);
    if let Some(key) = cli.api_key.clone() {
        request = request.with_api_key(key);
    }
    if let Some(margin) = cli.margin {
        request = request.with_margin(margin);
    }
    if let Some(seed) = cli.seed {
        request = request.with_seed(seed);
    }

    let mut service = BasemapService::new();
    let bar = if cli.quiet {
        None
    } else {
        let (bar, callback) = progress::progress_bar();
        service = service.with_progress(callback);
        Some(bar)
    };

    // Ctrl-C stops scheduling new tiles; completed tiles are kept.
    let cancel = service.cancel_flag();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, stopping downloads...");
        cancel.cancel();
    })
    .map_err(|e| CliError::Args(format!("failed to set signal handler: {}", e)))?;

    println!("Fetching tiles from {}", request.server.name);
    println!(
        "  Bounds:  {:.4},{:.4} to {:.4},{:.4}",
        bbox.west, bbox.south, bbox.east, bbox.north
    );
    println!("  Output:  {} ({}x{}, {})", output.display(), cli.maxcols, cli.maxrows, cli.target_crs);
    println!();

    let outcome = service.import(&request);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let manifest_path = output.with_extension("manifest.json");
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(error) => {
            // A fatal run still leaves its manifest behind for diagnosis.
            if let basemap::ImportError::Assembly { ref report, .. } = error {
                std::fs::write(&manifest_path, report.to_json())?;
                eprintln!("Manifest written to {}", manifest_path.display());
            }
            return Err(error.into());
        }
    };

    outcome.mosaic.write_png(&output)?;
    outcome
        .mosaic
        .write_world_file(&Mosaic::world_file_path(&output))?;
    std::fs::write(&manifest_path, outcome.report.to_json())?;

    info!(output = %output.display(), "wrote raster, world file and manifest");
    println!(
        "Done: {} tiles at zoom {} ({} succeeded, {} failed)",
        outcome.report.requested, outcome.zoom, outcome.report.succeeded, outcome.report.failed
    );
    if outcome.report.failed > 0 {
        println!(
            "Some tiles are missing; see {} for details",
            manifest_path.display()
        );
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    basemap::logging::init(if cli.quiet { "warn" } else { "info" });

    if cli.list_servers {
        list_servers();
        return;
    }

    if let Err(error) = run(cli) {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
}
