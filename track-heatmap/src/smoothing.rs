//! Separable Gaussian blur over a grid.

use crate::grid::Grid;

pub const DEFAULT_SIGMA: f64 = 0.75;

/// Kernel extends this many standard deviations either side of the centre.
const TRUNCATE: f64 = 4.0;

/// Normalised 1-D kernel of length `2 * radius + 1`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Maps an out-of-range index back into `0..n` by mirroring about the
/// edges, repeating the edge sample (`d c b a | a b c d | d c b a`).
fn reflect(index: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = index.rem_euclid(period);
    if m >= n as isize {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Correlates `kernel` along a line of `n` samples read through `get`.
fn filter_line(kernel: &[f64], n: usize, get: impl Fn(usize) -> f64, mut put: impl FnMut(usize, f64)) {
    let radius = (kernel.len() / 2) as isize;
    for i in 0..n {
        let value: f64 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * get(reflect(i as isize + k as isize - radius, n)))
            .sum();
        put(i, value);
    }
}

/// Blurs `grid` with an isotropic Gaussian of standard deviation `sigma`
/// cells. The output has the same shape; a non-positive `sigma` only
/// converts the values.
pub fn gaussian_filter<T: Copy + Into<f64>>(grid: &Grid<T>, sigma: f64) -> Grid<f64> {
    let input: Vec<f64> = grid.data.iter().map(|&v| v.into()).collect();
    if sigma <= 0.0 || input.is_empty() {
        return Grid::from_vec(grid.width, grid.height, input);
    }
    let kernel = gaussian_kernel(sigma);
    let (width, height) = (grid.width, grid.height);

    let mut horizontal = vec![0.0; input.len()];
    for row in 0..height {
        let base = row * width;
        filter_line(&kernel, width, |c| input[base + c], |c, v| horizontal[base + c] = v);
    }

    let mut output = vec![0.0; input.len()];
    for col in 0..width {
        filter_line(&kernel, height, |r| horizontal[r * width + col], |r, v| output[r * width + col] = v);
    }

    Grid::from_vec(width, height, output)
}
