use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;
use std::str::FromStr;

use crate::error::{HeatmapError, Result};
use crate::grid::Grid;
use crate::range::DisplayRange;

/// Available colormaps for heatmap visualization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Black through red and yellow to white.
    #[default]
    Hot,
    Jet,
    Viridis,
}

impl Colormap {
    /// Map a normalized value [0.0, 1.0] to an RGB color
    pub fn map(&self, value: f64) -> (u8, u8, u8) {
        let v = value.clamp(0.0, 1.0);

        match self {
            Colormap::Hot => hot_colormap(v),
            Colormap::Jet => jet_colormap(v),
            Colormap::Viridis => interpolate(&VIRIDIS, v),
        }
    }
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hot" => Ok(Colormap::Hot),
            "jet" => Ok(Colormap::Jet),
            "viridis" => Ok(Colormap::Viridis),
            other => Err(format!("unknown colormap '{}'", other)),
        }
    }
}

fn to_rgb(r: f64, g: f64, b: f64) -> (u8, u8, u8) {
    ((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// Hot colormap: red ramps up first, then green, then blue
fn hot_colormap(v: f64) -> (u8, u8, u8) {
    const RED_FULL: f64 = 0.365079;
    const GREEN_FULL: f64 = 0.746032;

    let r = (v / RED_FULL).min(1.0);
    let g = ((v - RED_FULL) / (GREEN_FULL - RED_FULL)).clamp(0.0, 1.0);
    let b = ((v - GREEN_FULL) / (1.0 - GREEN_FULL)).clamp(0.0, 1.0);
    to_rgb(r, g, b)
}

/// Jet colormap as a piecewise-linear ramp per channel
fn jet_colormap(v: f64) -> (u8, u8, u8) {
    // each channel peaks at a different centre and falls off with slope 4
    let channel = |centre: f64| (1.5 - (4.0 * (v - centre)).abs()).clamp(0.0, 1.0);
    to_rgb(channel(0.75), channel(0.5), channel(0.25))
}

// evenly spaced stops, linearly interpolated
const VIRIDIS: [(f64, f64, f64); 5] = [
    (0.267004, 0.004874, 0.329415),
    (0.282623, 0.140926, 0.457517),
    (0.163625, 0.471133, 0.558148),
    (0.477504, 0.821444, 0.318195),
    (0.993248, 0.906157, 0.143936),
];

fn interpolate(points: &[(f64, f64, f64)], v: f64) -> (u8, u8, u8) {
    let idx = v * (points.len() - 1) as f64;
    let i = idx.floor() as usize;
    if i >= points.len() - 1 {
        let (r, g, b) = points[points.len() - 1];
        return to_rgb(r, g, b);
    }
    let t = idx - i as f64;
    let (r0, g0, b0) = points[i];
    let (r1, g1, b1) = points[i + 1];
    to_rgb(r0 + t * (r1 - r0), g0 + t * (g1 - g0), b0 + t * (b1 - b0))
}

/// Image size in pixels for `scale` pixels per cell, if it fits the
/// backend's `i32` coordinates.
fn image_size(grid: &Grid<f64>, scale: u32) -> Result<(u32, u32)> {
    let pixels = |cells: usize| {
        u32::try_from(cells)
            .ok()
            .and_then(|cells| cells.checked_mul(scale))
            .filter(|&px| i32::try_from(px).is_ok())
            .ok_or_else(|| HeatmapError::Render(format!("{} cells at scale {} overflow the image size", cells, scale)))
    };
    Ok((pixels(grid.width)?, pixels(grid.height)?))
}

/// Fills one `scale`-sized square per populated cell. Empty cells stay black.
fn draw_cells<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    grid: &Grid<f64>,
    range: &DisplayRange,
    colormap: Colormap,
    scale: u32,
) -> Result<()> {
    let render_err = |e: DrawingAreaErrorKind<DB::ErrorType>| HeatmapError::Render(e.to_string());
    root.fill(&BLACK).map_err(render_err)?;

    let s = scale as i32;
    for (row, values) in grid.rows().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            if value <= 0.0 {
                continue;
            }
            let (r, g, b) = colormap.map(range.normalize(value));
            // in range, image_size already checked the far corner
            let x0 = col as i32 * s;
            let y0 = row as i32 * s;
            let cell = Rectangle::new([(x0, y0), (x0 + s - 1, y0 + s - 1)], RGBColor(r, g, b).filled());
            root.draw(&cell).map_err(render_err)?;
        }
    }
    root.present().map_err(render_err)
}

/// Paint the smoothed grid as a PNG, `scale` pixels per cell. Grid row 0 is
/// the top image row, so with the web-mercator projection north is up.
pub fn save_heatmap_to_png(
    grid: &Grid<f64>,
    range: &DisplayRange,
    colormap: Colormap,
    scale: u32,
    output_path: &Path,
) -> Result<()> {
    let scale = scale.max(1);
    let size = image_size(grid, scale)?;
    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    draw_cells(&root, grid, range, colormap, scale)
}
