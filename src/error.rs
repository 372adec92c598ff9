//! Error type shared by every stage of the scan → diagram → distance pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading scans, building complexes or comparing diagrams
#[derive(Debug, Error)]
pub enum TdaError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported scan format `{0}`")]
    UnsupportedFormat(String),

    #[error("{path}: parse error at {location}: {message}")]
    Parse {
        path: PathBuf,
        location: String,
        message: String,
    },

    #[error("{path}: VTK import failed: {message}")]
    Vtk { path: PathBuf, message: String },

    #[error("scan contains no points")]
    EmptyScan,

    #[error("scan height is degenerate ({0})")]
    DegenerateScan(f64),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("filtration would exceed {limit} simplices; subsample the scan or lower max_edge_length")]
    ComplexTooLarge { limit: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TdaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TdaError::Io { path: path.into(), source }
    }

    pub(crate) fn parse(
        path: impl Into<PathBuf>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        TdaError::Parse {
            path: path.into(),
            location: location.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TdaError>;
