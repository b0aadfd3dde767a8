//! Discovery of activity files in an export directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, span, Level};

use crate::error::{HeatmapError, Result};
use crate::potentially_compressed::{CompressionType, PotentiallyCompressedStream, GZIP_SUFFIX};
use crate::track::Dialect;

/// One track file, possibly gzip-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFile {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub compression: CompressionType,
}

impl ActivityFile {
    /// Classifies `path` by name; `None` if it is not a TCX/GPX file.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.to_str()?;
        let compression = CompressionType::from_file_name(name);
        let dialect = match compression {
            CompressionType::Gzip => Dialect::from_path(Path::new(&name[..name.len() - GZIP_SUFFIX.len()]))?,
            CompressionType::None => Dialect::from_path(&path)?,
        };
        Some(Self {
            path,
            dialect,
            compression,
        })
    }

    pub fn open(&self) -> Result<PotentiallyCompressedStream<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| HeatmapError::io(&self.path, e))?;
        Ok(PotentiallyCompressedStream::new(BufReader::new(file), self.compression))
    }

    /// Full decompressed text of the file.
    pub fn read_to_string(&self) -> Result<String> {
        self.open()?
            .read_text()
            .map_err(|e| HeatmapError::io(&self.path, e))
    }
}

/// Lists the track files directly inside `dir`, ordered by file name.
pub fn find_activity_files(dir: &Path) -> Result<Vec<ActivityFile>> {
    let _span = span!(Level::DEBUG, "find_activity_files", dir = %dir.display()).entered();

    let entries = std::fs::read_dir(dir).map_err(|e| HeatmapError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HeatmapError::io(dir, e))?;
        // follows symlinks, so linked track files are listed too
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match ActivityFile::from_path(path.clone()) {
            Some(file) => files.push(file),
            None => debug!("Skipping {}", path.display()),
        }
    }
    debug!("Found {} activity files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn classifies_by_name() {
        let gz = ActivityFile::from_path(PathBuf::from("x/ride.tcx.gz")).unwrap();
        assert_eq!(gz.dialect, Dialect::Tcx);
        assert_eq!(gz.compression, CompressionType::Gzip);

        let plain = ActivityFile::from_path(PathBuf::from("x/run.gpx")).unwrap();
        assert_eq!(plain.dialect, Dialect::Gpx);
        assert_eq!(plain.compression, CompressionType::None);

        assert!(ActivityFile::from_path(PathBuf::from("x/ride.fit.gz")).is_none());
        assert!(ActivityFile::from_path(PathBuf::from("x/activities.csv")).is_none());
    }

    #[test]
    fn lists_only_track_files_non_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.gpx"), "<gpx/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<tcx/>").unwrap();
        std::fs::write(dir.path().join("a.tcx.gz"), encoder.finish().unwrap()).unwrap();
        std::fs::create_dir(dir.path().join("nested.gpx")).unwrap();
        std::fs::write(dir.path().join("nested.gpx").join("c.gpx"), "<gpx/>").unwrap();

        let files = find_activity_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.tcx.gz", "b.gpx"]);

        assert_eq!(files[0].read_to_string().unwrap(), "<tcx/>");
        assert_eq!(files[1].read_to_string().unwrap(), "<gpx/>");
        // decompression happens in memory
        assert!(!dir.path().join("a.tcx").exists());
    }

    #[cfg(unix)]
    #[test]
    fn lists_symlinked_track_files() {
        let store = tempfile::tempdir().unwrap();
        std::fs::write(store.path().join("real.gpx"), "<gpx/>").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(store.path().join("real.gpx"), dir.path().join("linked.gpx")).unwrap();
        // dangling links are not files
        std::os::unix::fs::symlink(store.path().join("gone.gpx"), dir.path().join("broken.gpx")).unwrap();

        let files = find_activity_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, dir.path().join("linked.gpx"));
        assert_eq!(files[0].read_to_string().unwrap(), "<gpx/>");
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(find_activity_files(&missing), Err(HeatmapError::Io { .. })));
    }
}
