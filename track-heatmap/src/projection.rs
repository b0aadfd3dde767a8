//! Planar projection of track points.

use std::f64::consts::PI;
use std::path::PathBuf;

use tracing::{span, warn, Level};

use crate::activity_set::ActivityFile;
use crate::error::Result;
use crate::geometry::{GeoBoundingBox, GeoPoint, MapExtent, PlanarPoint};
use crate::track::extract_points;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub trait Projection {
    fn project(&self, longitude: f64, latitude: f64) -> PlanarPoint;

    /// Planar bounds of a geographic box.
    fn extent(&self, bbox: &GeoBoundingBox) -> MapExtent {
        let a = self.project(bbox.bottom_left.longitude, bbox.bottom_left.latitude);
        let b = self.project(bbox.top_right.longitude, bbox.top_right.latitude);
        MapExtent {
            xmin: a.x.min(b.x),
            xmax: a.x.max(b.x),
            ymin: a.y.min(b.y),
            ymax: a.y.max(b.y),
        }
    }
}

/// Web-map tile projection normalised to the unit square: the whole world
/// at zoom level 0. `x` grows eastward and `y` southward.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    pub fn new() -> Self {
        WebMercator
    }
}

impl Projection for WebMercator {
    fn project(&self, longitude: f64, latitude: f64) -> PlanarPoint {
        let lat_rad = latitude.to_radians();
        PlanarPoint {
            x: (longitude + 180.0) / 360.0,
            y: (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
        }
    }
}

// --------------------------------------------------------------------------
// ProjectedPoints

/// In-box points as parallel coordinate sequences, in discovery order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProjectedPoints {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Files that yielded no points at all before box filtering.
    pub empty_files: Vec<PathBuf>,
}

impl ProjectedPoints {
    pub(crate) fn len(&self) -> usize {
        self.xs.len()
    }
}

fn extract_file(file: &ActivityFile, year: Option<i32>) -> Result<Vec<GeoPoint>> {
    let _span = span!(Level::TRACE, "extract_file", path = %file.path.display()).entered();
    let text = file.read_to_string()?;
    extract_points(&text, file.dialect, year)
}

#[cfg(not(feature = "parallel"))]
fn extract_all(files: &[ActivityFile], year: Option<i32>) -> Result<Vec<Vec<GeoPoint>>> {
    files.iter().map(|file| extract_file(file, year)).collect()
}

#[cfg(feature = "parallel")]
fn extract_all(files: &[ActivityFile], year: Option<i32>) -> Result<Vec<Vec<GeoPoint>>> {
    files.par_iter().map(|file| extract_file(file, year)).collect()
}

/// Extracts every file, projects its points, and keeps those inside `bbox`.
pub fn project_points<P: Projection + ?Sized>(
    files: &[ActivityFile],
    bbox: &GeoBoundingBox,
    year: Option<i32>,
    projection: &P,
) -> Result<ProjectedPoints> {
    let extracted = extract_all(files, year)?;

    let mut out = ProjectedPoints::default();
    for (file, points) in files.iter().zip(extracted) {
        if points.is_empty() {
            warn!("No points found in: {}", file.path.display());
            out.empty_files.push(file.path.clone());
            continue;
        }
        for point in points {
            let planar = projection.project(point.longitude, point.latitude);
            if bbox.contains(&point) {
                out.xs.push(planar.x);
                out.ys.push(planar.y);
            }
        }
    }
    Ok(out)
}
