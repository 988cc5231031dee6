//! Interval file adapters
//!
//! This module provides adapters that read one subject-recording file and return
//! its RR intervals (milliseconds) as a flat sequence. The adapter is chosen by
//! file extension.

mod json;
mod mat;
mod text;

pub use json::JsonAdapter;
pub use mat::MatAdapter;
pub use text::TextAdapter;

use std::path::Path;

use crate::error::ComputeError;

/// Default name of the interval array inside a data file
pub const DEFAULT_VARIABLE: &str = "rr_intervals";

/// Trait for interval file adapters
pub trait IntervalFileAdapter: Send + Sync {
    /// Read the array named `variable` from `path` as a flat sequence
    fn load(&self, path: &Path, variable: &str) -> Result<Vec<f64>, ComputeError>;
}

/// Pick the adapter for a file extension (with or without the leading dot)
pub fn adapter_for_extension(extension: &str) -> Result<Box<dyn IntervalFileAdapter>, ComputeError> {
    match extension
        .trim_start_matches('.')
        .to_ascii_lowercase()
        .as_str()
    {
        "mat" => Ok(Box::new(MatAdapter)),
        "json" => Ok(Box::new(JsonAdapter)),
        "txt" | "csv" | "rr" => Ok(Box::new(TextAdapter)),
        other => Err(ComputeError::UnsupportedFormat(other.to_string())),
    }
}

/// Load intervals from `path`, dispatching on its extension
pub fn load_intervals(path: &Path, variable: &str) -> Result<Vec<f64>, ComputeError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();
    adapter_for_extension(&extension)?.load(path, variable)
}
