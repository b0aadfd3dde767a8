use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("invalid path: {0}")]
    MissingDirectory(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed coordinate '{text}' on line {line}")]
    Coordinate { line: usize, text: String },
    #[error("invalid lat,lon pair: {0}")]
    InvalidPoint(String),
    #[error("grid width must be at least one pixel")]
    InvalidWidth,
    #[error("map extent has zero width or height")]
    DegenerateExtent,
    #[error("failed to render heatmap: {0}")]
    Render(String),
}

impl HeatmapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HeatmapError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HeatmapError>;
