//! Line-oriented extraction of track points from TCX and GPX text.
//!
//! Neither format is parsed as XML. Each line is tested against one fixed
//! shape per dialect, which is how Garmin-style exports lay out their track
//! points. Lines that do not have that shape are ignored.

use std::path::Path;

use tracing::{debug, trace};

use crate::error::{HeatmapError, Result};
use crate::geometry::GeoPoint;

const TCX_POSITION_OPEN: &str = "<Position><LatitudeDegrees>";
const TCX_LAT_CLOSE: &str = "</LatitudeDegrees><LongitudeDegrees>";
const TCX_POSITION_CLOSE: &str = "</LongitudeDegrees></Position>";

const GPX_TRKPT_OPEN: &str = "<trkpt";
const TIME_MARKER: &str = "ime>";


// --------------------------------------------------------------------------
// Dialect

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// `<Position><LatitudeDegrees>..</LatitudeDegrees><LongitudeDegrees>..</LongitudeDegrees></Position>`
    Tcx,
    /// `  <trkpt lat=".." lon="..">`
    Gpx,
}

/// Result of testing one line against a dialect. The coordinates are still
/// unparsed text at this point.
#[derive(Debug, PartialEq, Eq)]
pub enum PointMatch<'a> {
    Matched { lat: &'a str, lon: &'a str },
    NoMatch,
}

impl<'a> From<Option<(&'a str, &'a str)>> for PointMatch<'a> {
    fn from(value: Option<(&'a str, &'a str)>) -> Self {
        match value {
            Some((lat, lon)) => PointMatch::Matched { lat, lon },
            None => PointMatch::NoMatch,
        }
    }
}

impl Dialect {
    /// Dialect for a (decompressed) file name, if it is a track file at all.
    pub fn from_path(path: &Path) -> Option<Dialect> {
        let name = path.to_str()?;
        if name.ends_with(".tcx") {
            Some(Dialect::Tcx)
        } else if name.ends_with(".gpx") {
            Some(Dialect::Gpx)
        } else {
            None
        }
    }

    pub fn match_line<'a>(&self, line: &'a str) -> PointMatch<'a> {
        match self {
            Dialect::Tcx => match_tcx(line).into(),
            Dialect::Gpx => match_gpx(line).into(),
        }
    }
}

fn is_coordinate_char(c: char) -> bool {
    c == '-' || c == '.' || c.is_ascii_digit()
}

/// Splits a non-empty run of coordinate characters off the front of `s`.
fn take_coordinate(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c| !is_coordinate_char(c)).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some(s.split_at(end))
}

/// Skips at least one whitespace character.
fn skip_whitespace(s: &str) -> Option<&str> {
    let rest = s.trim_start();
    (rest.len() < s.len()).then_some(rest)
}

/// A TCX position may sit anywhere on the line; if there are several, the
/// last complete one wins.
fn match_tcx(line: &str) -> Option<(&str, &str)> {
    line.rmatch_indices(TCX_POSITION_OPEN).find_map(|(start, _)| {
        let rest = &line[start + TCX_POSITION_OPEN.len()..];
        let (lat, rest) = take_coordinate(rest)?;
        let rest = rest.strip_prefix(TCX_LAT_CLOSE)?;
        let (lon, rest) = take_coordinate(rest)?;
        rest.strip_prefix(TCX_POSITION_CLOSE)?;
        Some((lat, lon))
    })
}

/// A GPX track point must be indented and open the line.
fn match_gpx(line: &str) -> Option<(&str, &str)> {
    let rest = skip_whitespace(line)?;
    let rest = rest.strip_prefix(GPX_TRKPT_OPEN)?;
    let rest = skip_whitespace(rest)?.strip_prefix("lat=\"")?;
    let (lat, rest) = take_coordinate(rest)?;
    let rest = rest.strip_prefix('"')?;
    let rest = skip_whitespace(rest)?.strip_prefix("lon=\"")?;
    let (lon, rest) = take_coordinate(rest)?;
    rest.strip_prefix("\">")?;
    Some((lat, lon))
}

/// Year of the last `Time>`/`time>` marker on the line that is followed by
/// four digits.
pub fn timestamp_year(line: &str) -> Option<i32> {
    line.rmatch_indices(TIME_MARKER).find_map(|(start, _)| {
        if !matches!(line[..start].chars().next_back(), Some('T' | 't')) {
            return None;
        }
        let digits = line[start + TIME_MARKER.len()..].trim_start();
        let year = digits.get(..4)?;
        if !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        year.parse().ok()
    })
}


// --------------------------------------------------------------------------
// YearFilter

/// Per-file year gate. Only the first timestamp in a file is checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum YearFilter {
    Unconstrained,
    Pending(i32),
    Matched,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum YearStep {
    Continue(YearFilter),
    /// The first timestamp carried another year; the file contributes nothing.
    Abort { found: i32 },
}

impl YearFilter {
    pub fn new(year: Option<i32>) -> Self {
        match year {
            Some(year) => YearFilter::Pending(year),
            None => YearFilter::Unconstrained,
        }
    }

    pub fn step(self, line: &str) -> YearStep {
        match self {
            YearFilter::Pending(wanted) => match timestamp_year(line) {
                Some(found) if found == wanted => YearStep::Continue(YearFilter::Matched),
                Some(found) => YearStep::Abort { found },
                None => YearStep::Continue(self),
            },
            _ => YearStep::Continue(self),
        }
    }

    pub fn is_collecting(&self) -> bool {
        !matches!(self, YearFilter::Pending(_))
    }
}


// --------------------------------------------------------------------------
// Extraction

/// Splits on `\n`, `\r\n` and a bare `\r`.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

fn parse_coordinate(text: &str, line: usize) -> Result<f64> {
    text.parse::<f64>().map_err(|_| HeatmapError::Coordinate {
        line,
        text: text.to_string(),
    })
}

/// Extracts points in line order. With `year` set, points are collected from
/// the first timestamp line onwards only if that timestamp is in `year`.
pub fn extract_points(text: &str, dialect: Dialect, year: Option<i32>) -> Result<Vec<GeoPoint>> {
    let mut points = Vec::new();
    let mut filter = YearFilter::new(year);

    for (index, line) in split_lines(text).enumerate() {
        filter = match filter.step(line) {
            YearStep::Continue(next) => next,
            YearStep::Abort { found } => {
                debug!("Skipping activity from {} (wanted {:?})", found, year);
                return Ok(Vec::new());
            }
        };
        if !filter.is_collecting() {
            continue;
        }
        if let PointMatch::Matched { lat, lon } = dialect.match_line(line) {
            points.push(GeoPoint {
                latitude: parse_coordinate(lat, index + 1)?,
                longitude: parse_coordinate(lon, index + 1)?,
            });
        }
    }

    if let YearFilter::Pending(wanted) = filter {
        debug!("No timestamp found while filtering for {}", wanted);
    }
    trace!("Extracted {} {:?} points", points.len(), dialect);
    Ok(points)
}
