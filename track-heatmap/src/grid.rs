use std::ops::{Index, IndexMut};

use tracing::debug;

use crate::error::{HeatmapError, Result};
use crate::geometry::MapExtent;

/// Dynamic grid stored in row-major order. Row 0 holds the smallest planar y.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<T>,
}

/// Raw point counts per cell.
pub type DensityGrid = Grid<u32>;

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T> Grid<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), width * height, "grid data does not match its shape");
        Self { width, height, data }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, T> {
        self.data.chunks(self.width.max(1))
    }
}

impl Grid<u32> {
    pub fn total(&self) -> u64 {
        self.data.iter().map(|&c| c as u64).sum()
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row * self.width + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[row * self.width + col]
    }
}

/// Cell index along one axis. Points on the upper edge land in the last
/// cell; anything left of the lower edge saturates to 0.
fn cell_index(value: f64, min: f64, span: f64, cells: usize) -> usize {
    let pos = ((value - min) / span * cells as f64).floor() as usize;
    pos.min(cells - 1)
}

/// Bins projected points into a grid `pixels_x` cells wide, with as many
/// rows as keep the cells roughly square. Returns the grid and the extent it
/// covers.
pub fn build_density_grid(
    extent: &MapExtent,
    xs: &[f64],
    ys: &[f64],
    pixels_x: usize,
) -> Result<(DensityGrid, MapExtent)> {
    if pixels_x == 0 {
        return Err(HeatmapError::InvalidWidth);
    }
    let span_x = extent.span_x();
    let span_y = extent.span_y();
    if span_x == 0.0 || span_y == 0.0 {
        return Err(HeatmapError::DegenerateExtent);
    }

    let pixels_y = (span_y / span_x * pixels_x as f64).floor() as usize + 1;
    let mut grid = DensityGrid::new(pixels_x, pixels_y);
    debug!("Binning {} points into {}x{} cells", xs.len(), pixels_x, pixels_y);

    for (&x, &y) in xs.iter().zip(ys) {
        let col = cell_index(x, extent.xmin, span_x, pixels_x);
        let row = cell_index(y, extent.ymin, span_y, pixels_y);
        grid[(row, col)] += 1;
    }

    Ok((grid, *extent))
}
