use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or writing chart artifacts.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested output format is not supported.
    #[error("Unrecognized output format {0:?}")]
    UnknownFormat(String),
    /// The figure cannot be drawn in the requested format.
    #[error("{format} output does not support {what}")]
    Unsupported {
        format: &'static str,
        what: &'static str,
    },
    /// The vector backend failed while drawing.
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    /// Serializing the figure description failed.
    #[error("Failed to serialize figure: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Writing an artifact failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Reading the local plotly.js bundle failed.
    #[error("Failed to read plotly.js bundle {path}: {source}")]
    ReadBundle {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Creating an output directory failed.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Parallel coordinate arrays of one trace differ in length.
    #[error("Trace {series:?} has {found} values where {expected} were expected")]
    LengthMismatch {
        series: String,
        expected: usize,
        found: usize,
    },
    /// There is nothing to draw.
    #[error("Figure {0:?} has no traces")]
    EmptyFigure(String),
    /// Launching a viewer for the artifact failed.
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}
