//! Density heatmaps of GPS activity exports.
//!
//! The pipeline reads every TCX/GPX file (optionally gzipped) in a directory,
//! keeps the points inside a geographic box, bins their projected positions
//! into a grid, blurs it, and picks a colour range from the result:
//!
//! ```text
//! activity_set -> track -> projection -> grid -> smoothing -> range -> render
//! ```

pub mod activity_set;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod potentially_compressed;
pub mod projection;
pub mod range;
pub mod render;
pub mod smoothing;
pub mod track;

use std::path::PathBuf;

use tracing::{debug, info, span, Level};

pub use error::{HeatmapError, Result};
pub use geometry::{GeoBoundingBox, GeoPoint, MapExtent, PlanarPoint};
pub use grid::{DensityGrid, Grid};
pub use projection::{Projection, WebMercator};
pub use range::DisplayRange;
pub use render::Colormap;

use activity_set::find_activity_files;
use grid::build_density_grid;
use projection::project_points;
use range::{select_range, DEFAULT_PERCENTILES};
use smoothing::{gaussian_filter, DEFAULT_SIGMA};

/// Inputs of one heatmap run.
#[derive(Debug, Clone)]
pub struct HeatmapConfig {
    /// Directory holding the activity files.
    pub path: PathBuf,
    pub bbox: GeoBoundingBox,
    /// Only use activities whose first timestamp falls in this year.
    pub year: Option<i32>,
    /// Grid width in cells.
    pub width: usize,
    pub sigma: f64,
    pub percentiles: (f64, f64),
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            bbox: GeoBoundingBox::new(GeoPoint::new(-37.83, 144.92), GeoPoint::new(-37.77, 145.01)),
            year: None,
            width: 400,
            sigma: DEFAULT_SIGMA,
            percentiles: DEFAULT_PERCENTILES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Heatmap {
    /// Raw counts before smoothing.
    pub counts: DensityGrid,
    pub smoothed: Grid<f64>,
    /// Planar bounds covered by the grid.
    pub extent: MapExtent,
    pub range: DisplayRange,
    pub point_count: usize,
    /// Activity files that yielded no points.
    pub empty_files: Vec<PathBuf>,
}

/// Runs the whole pipeline. Nothing is written to disk.
pub fn run<P: Projection + ?Sized>(config: &HeatmapConfig, projection: &P) -> Result<Heatmap> {
    let _span = span!(Level::INFO, "heatmap", path = %config.path.display()).entered();

    if !config.path.is_dir() {
        return Err(HeatmapError::MissingDirectory(config.path.clone()));
    }

    let extent = projection.extent(&config.bbox);
    debug!(
        "Map extent {} for box {} to {}",
        extent, config.bbox.bottom_left, config.bbox.top_right
    );
    let files = find_activity_files(&config.path)?;
    info!("Reading {} activity files", files.len());

    let points = project_points(&files, &config.bbox, config.year, projection)?;
    info!("Number of points found: {}", points.len());

    let (counts, extent) = build_density_grid(&extent, &points.xs, &points.ys, config.width)?;
    let smoothed = gaussian_filter(&counts, config.sigma);
    let range = select_range(&smoothed, config.percentiles);

    Ok(Heatmap {
        counts,
        smoothed,
        extent,
        range,
        point_count: points.len(),
        empty_files: points.empty_files,
    })
}

/// Captures what the crate logs while a closure runs.
#[cfg(test)]
pub(crate) mod log_capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuf {
        type Writer = SharedBuf;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    pub(crate) fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buf = SharedBuf::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buf.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        (out, logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::Path;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx creator="test">
 <metadata>
  <time>2019-06-01T07:00:00Z</time>
 </metadata>
 <trk>
  <trkseg>
   <trkpt lat="-37.80" lon="144.95">
    <ele>12.0</ele>
   </trkpt>
   <trkpt lat="-37.81" lon="144.96">
    <ele>12.4</ele>
   </trkpt>
  </trkseg>
 </trk>
</gpx>
"#;

    const TCX: &str = "<Activity Sport=\"Biking\">
 <Id>2020-02-02T08:00:00Z</Id>
 <Lap StartTime=\"2020-02-02T08:00:00Z\">
  <Trackpoint>
   <Time>2020-02-02T08:00:00Z</Time>
   <Position><LatitudeDegrees>-37.790</LatitudeDegrees><LongitudeDegrees>144.990</LongitudeDegrees></Position>
  </Trackpoint>
  <Trackpoint>
   <Time>2020-02-02T08:00:01Z</Time>
   <Position><LatitudeDegrees>-37.790</LatitudeDegrees><LongitudeDegrees>144.990</LongitudeDegrees></Position>
  </Trackpoint>
  <Trackpoint>
   <Time>2020-02-02T08:00:02Z</Time>
   <Position><LatitudeDegrees>-33.860</LatitudeDegrees><LongitudeDegrees>151.210</LongitudeDegrees></Position>
  </Trackpoint>
 </Lap>
</Activity>
";

    fn write_gz(path: &Path, text: &str) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        std::fs::write(path, encoder.finish().unwrap()).unwrap();
    }

    fn export_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_morning.gpx"), GPX).unwrap();
        write_gz(&dir.path().join("b_ride.tcx.gz"), TCX);
        std::fs::write(dir.path().join("c_empty.gpx"), "<gpx>\n</gpx>\n").unwrap();
        std::fs::write(dir.path().join("activities.csv"), "id,name\n1,ride\n").unwrap();
        dir
    }

    fn config(dir: &Path) -> HeatmapConfig {
        HeatmapConfig {
            path: dir.to_path_buf(),
            width: 10,
            ..HeatmapConfig::default()
        }
    }

    #[test]
    fn two_gpx_points_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.gpx"), GPX).unwrap();

        let (heatmap, logs) = log_capture::with_logs(|| run(&config(dir.path()), &WebMercator));
        let heatmap = heatmap.unwrap();
        assert_eq!(heatmap.point_count, 2);
        assert_eq!(logs.matches("Number of points found: 2").count(), 1);
        assert!(logs.contains(&format!(
            "Map extent {} for box -37.83,144.92 to -37.77,145.01",
            heatmap.extent
        )));
        assert_eq!(heatmap.counts.total(), 2);
        assert_eq!(heatmap.counts.width, 10);
        assert_eq!(heatmap.smoothed.shape(), heatmap.counts.shape());
        assert!((heatmap.smoothed.data.iter().sum::<f64>() - 2.0).abs() < 1e-9);
        assert!(heatmap.range.vmin < heatmap.range.vmax);
        assert!(heatmap.empty_files.is_empty());
    }

    #[test]
    fn mixed_directory() {
        let dir = export_dir();
        let heatmap = run(&config(dir.path()), &WebMercator).unwrap();

        // two GPX points plus two identical in-box TCX points; Sydney is dropped
        assert_eq!(heatmap.point_count, 4);
        assert_eq!(heatmap.counts.total(), 4);
        assert_eq!(heatmap.counts.data.iter().copied().max(), Some(2));
        assert_eq!(heatmap.empty_files, vec![dir.path().join("c_empty.gpx")]);
        assert!(!dir.path().join("b_ride.tcx").exists());
    }

    #[test]
    fn year_filter_selects_activities() {
        let dir = export_dir();
        let only_2020 = HeatmapConfig {
            year: Some(2020),
            ..config(dir.path())
        };
        let heatmap = run(&only_2020, &WebMercator).unwrap();
        assert_eq!(heatmap.point_count, 2);
        // the 2019 file now yields nothing and is reported
        assert_eq!(
            heatmap.empty_files,
            vec![dir.path().join("a_morning.gpx"), dir.path().join("c_empty.gpx")]
        );

        let nothing = HeatmapConfig {
            year: Some(2005),
            ..config(dir.path())
        };
        let heatmap = run(&nothing, &WebMercator).unwrap();
        assert_eq!(heatmap.point_count, 0);
        assert!(heatmap.range.degenerate);
        assert_eq!((heatmap.range.vmin, heatmap.range.vmax), (0.0, 1.0));
    }

    #[test]
    fn missing_directory_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let missing = config(&dir.path().join("missing"));
        assert!(matches!(
            run(&missing, &WebMercator),
            Err(HeatmapError::MissingDirectory(_))
        ));
    }

    #[test]
    fn zero_width_box_is_fatal() {
        let dir = export_dir();
        let flat = HeatmapConfig {
            bbox: GeoBoundingBox::new(GeoPoint::new(-37.83, 144.95), GeoPoint::new(-37.77, 144.95)),
            ..config(dir.path())
        };
        assert!(matches!(run(&flat, &WebMercator), Err(HeatmapError::DegenerateExtent)));
    }
}
