use std::fmt;
use std::str::FromStr;

use crate::error::HeatmapError;

// --------------------------------------------------------------------------
// GeoPoint

/// A position in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Same `lat,lon` form that `FromStr` accepts.
impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses `"lat,lon"`; whitespace around either number is ignored.
impl FromStr for GeoPoint {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HeatmapError::InvalidPoint(s.to_string());
        let (lat, lon) = s.trim().split_once(',').ok_or_else(invalid)?;
        let latitude = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let longitude = lon.trim().parse::<f64>().map_err(|_| invalid())?;
        Ok(GeoPoint { latitude, longitude })
    }
}


// --------------------------------------------------------------------------
// PlanarPoint

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}


// --------------------------------------------------------------------------
// GeoBoundingBox

/// Region of interest. The corners are taken as given; a box whose
/// bottom-left is not strictly below and left of its top-right simply
/// contains nothing (or collapses the extent, which the grid builder rejects).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBoundingBox {
    pub bottom_left: GeoPoint,
    pub top_right: GeoPoint,
}

impl GeoBoundingBox {
    pub fn new(bottom_left: GeoPoint, top_right: GeoPoint) -> Self {
        Self { bottom_left, top_right }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.bottom_left.latitude <= point.latitude
            && point.latitude <= self.top_right.latitude
            && self.bottom_left.longitude <= point.longitude
            && point.longitude <= self.top_right.longitude
    }
}


// --------------------------------------------------------------------------
// MapExtent

/// Bounds of a region in projected map units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapExtent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl MapExtent {
    pub fn span_x(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn span_y(&self) -> f64 {
        self.ymax - self.ymin
    }
}

impl fmt::Display for MapExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ x: [{}, {}], y: [{}, {}] }}",
            self.xmin, self.xmax, self.ymin, self.ymax
        )
    }
}
