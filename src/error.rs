//! Error types for HRA Flux

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during a batch run
///
/// Degenerate numeric cases never surface here: descriptors fall back to `0.0`.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Required path not found: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed interval file {}: {reason}", path.display())]
    MalformedInput { path: PathBuf, reason: String },

    #[error("Variable '{variable}' not found in {}", path.display())]
    MissingVariable { path: PathBuf, variable: String },

    #[error("Unsupported interval file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ComputeError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ComputeError::Io {
            path: path.into(),
            source,
        }
    }
}
