//! MATLAB level-5 adapter
//!
//! Reads the named numeric array from a `.mat` file. Any real numeric class is
//! accepted and widened to `f64`; complex arrays are rejected.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use matfile::{MatFile, NumericData};

use super::IntervalFileAdapter;
use crate::error::ComputeError;

/// `.mat` file adapter
pub struct MatAdapter;

impl IntervalFileAdapter for MatAdapter {
    fn load(&self, path: &Path, variable: &str) -> Result<Vec<f64>, ComputeError> {
        let file = File::open(path).map_err(|e| ComputeError::io(path, e))?;
        let mat = MatFile::parse(BufReader::new(file)).map_err(|e| ComputeError::MalformedInput {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        })?;

        let array = mat
            .find_by_name(variable)
            .ok_or_else(|| ComputeError::MissingVariable {
                path: path.to_path_buf(),
                variable: variable.to_string(),
            })?;

        widen(array.data()).ok_or_else(|| ComputeError::MalformedInput {
            path: path.to_path_buf(),
            reason: format!("variable '{variable}' is complex"),
        })
    }
}

fn real_values<T: Copy + Into<f64>>(real: &[T], imag: &Option<Vec<T>>) -> Option<Vec<f64>> {
    if imag.is_some() {
        return None;
    }
    Some(real.iter().map(|&v| v.into()).collect())
}

/// Real part of any numeric class as `f64`; `None` for complex data
fn widen(data: &NumericData) -> Option<Vec<f64>> {
    match data {
        NumericData::Double { real, imag } => real_values(real, imag),
        NumericData::Single { real, imag } => real_values(real, imag),
        NumericData::Int8 { real, imag } => real_values(real, imag),
        NumericData::UInt8 { real, imag } => real_values(real, imag),
        NumericData::Int16 { real, imag } => real_values(real, imag),
        NumericData::UInt16 { real, imag } => real_values(real, imag),
        NumericData::Int32 { real, imag } => real_values(real, imag),
        NumericData::UInt32 { real, imag } => real_values(real, imag),
        NumericData::Int64 { real, imag } => {
            (imag.is_none()).then(|| real.iter().map(|&v| v as f64).collect())
        }
        NumericData::UInt64 { real, imag } => {
            (imag.is_none()).then(|| real.iter().map(|&v| v as f64).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widen_real_classes() {
        let double = NumericData::Double {
            real: vec![800.0, 810.5],
            imag: None,
        };
        assert_eq!(widen(&double), Some(vec![800.0, 810.5]));

        let uint16 = NumericData::UInt16 {
            real: vec![800, 812],
            imag: None,
        };
        assert_eq!(widen(&uint16), Some(vec![800.0, 812.0]));
    }

    #[test]
    fn test_widen_rejects_complex() {
        let complex = NumericData::Double {
            real: vec![1.0],
            imag: Some(vec![0.5]),
        };
        assert_eq!(widen(&complex), None);
    }

    #[test]
    fn test_garbage_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1_a.mat");
        std::fs::write(&path, b"not a mat file").unwrap();
        let err = MatAdapter.load(&path, "rr_intervals").unwrap_err();
        assert!(matches!(err, ComputeError::MalformedInput { .. }));
    }
}
