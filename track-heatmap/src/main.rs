use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use track_heatmap::render::save_heatmap_to_png;
use track_heatmap::{run, Colormap, GeoBoundingBox, GeoPoint, HeatmapConfig, WebMercator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Heatmap of GPS activities inside a bounding box", long_about = None)]
struct ClArgs {
    /// Path to an activities directory
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    path: PathBuf,

    /// lat,lon to use as the bottom left of output
    #[arg(long, default_value = "-37.83,144.92", allow_hyphen_values = true)]
    bl: GeoPoint,

    /// lat,lon to use as the top right of output
    #[arg(long, default_value = "-37.77, 145.01", allow_hyphen_values = true)]
    tr: GeoPoint,

    /// The year for which data will be plotted (-1 for all years)
    #[arg(long, allow_hyphen_values = true)]
    year: Option<i32>,

    /// Heatmap grid size in pixels
    #[arg(long, default_value_t = 400)]
    width: usize,

    /// Standard deviation of the Gaussian blur, in grid cells
    #[arg(long, default_value_t = 0.75)]
    sigma: f64,

    /// Percentiles of cell values mapped to the ends of the colour scale
    #[arg(long, default_value = "0,90", allow_hyphen_values = true)]
    percentiles: String,

    /// Output PNG file path
    #[arg(short = 'o', long = "output", default_value = "map.png", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Color scheme to use (hot, jet, viridis)
    #[arg(long, default_value = "hot")]
    colormap: String,

    /// Image pixels per grid cell
    #[arg(long, default_value_t = 3)]
    scale: u32,

    /// Verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbosity: u8,
}

fn parse_percentiles(text: &str) -> Result<(f64, f64)> {
    let (low, high) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("expected LOW,HIGH percentiles, got '{}'", text))?;
    let low: f64 = low.trim().parse().with_context(|| format!("bad percentile '{}'", low))?;
    let high: f64 = high.trim().parse().with_context(|| format!("bad percentile '{}'", high))?;
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) {
        return Err(anyhow!("percentiles must lie in [0, 100]"));
    }
    Ok((low, high))
}

fn main() -> Result<()> {
    let args = ClArgs::parse();

    let default_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let colormap = args.colormap.parse::<Colormap>().unwrap_or_else(|e| {
        warn!("{}, using 'hot'", e);
        Colormap::Hot
    });

    let config = HeatmapConfig {
        path: args.path,
        bbox: GeoBoundingBox::new(args.bl, args.tr),
        year: args.year.filter(|&year| year != -1),
        width: args.width,
        sigma: args.sigma,
        percentiles: parse_percentiles(&args.percentiles)?,
    };

    let projection = WebMercator::new();
    let heatmap = run(&config, &projection)
        .with_context(|| format!("failed to build heatmap from {}", config.path.display()))?;

    println!(
        "Grid: {}x{} cells, display range [{}, {}]",
        heatmap.smoothed.width, heatmap.smoothed.height, heatmap.range.vmin, heatmap.range.vmax
    );

    save_heatmap_to_png(&heatmap.smoothed, &heatmap.range, colormap, args.scale, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("Heatmap saved to: {}", args.output.display());
    Ok(())
}
