//! Display range for the colour scale.

use tracing::warn;

use crate::grid::Grid;

pub const DEFAULT_PERCENTILES: (f64, f64) = (0.0, 90.0);

/// Range used when the requested percentiles coincide.
pub const FALLBACK_RANGE: (f64, f64) = (0.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub vmin: f64,
    pub vmax: f64,
    /// The percentiles coincided and the fallback range was substituted.
    pub degenerate: bool,
}

impl DisplayRange {
    /// Position of `value` within the range, clamped to `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }
}

/// Percentile of already sorted values, interpolating linearly between the
/// two nearest ranks.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (pct / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Picks `(vmin, vmax)` as the given percentiles of all cell values.
pub fn select_range(grid: &Grid<f64>, (low, high): (f64, f64)) -> DisplayRange {
    let mut values = grid.data.clone();
    values.sort_by(|a, b| a.total_cmp(b));

    let vmin = percentile(&values, low);
    let vmax = percentile(&values, high);
    if vmin == vmax {
        warn!("No two points fell in the same cell, use a coarser grid.");
        return DisplayRange {
            vmin: FALLBACK_RANGE.0,
            vmax: FALLBACK_RANGE.1,
            degenerate: true,
        };
    }
    DisplayRange {
        vmin,
        vmax,
        degenerate: false,
    }
}
