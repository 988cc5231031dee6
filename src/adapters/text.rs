//! Plain text adapter
//!
//! One interval per line. Blank lines are skipped, and a non-numeric first line
//! is read as a header. Any other line that is not a number makes the file
//! malformed, as does a file without a single value. The variable name is
//! ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::IntervalFileAdapter;
use crate::error::ComputeError;

/// `.txt` / `.csv` / `.rr` file adapter
pub struct TextAdapter;

impl IntervalFileAdapter for TextAdapter {
    fn load(&self, path: &Path, _variable: &str) -> Result<Vec<f64>, ComputeError> {
        let file = File::open(path).map_err(|e| ComputeError::io(path, e))?;
        let malformed = |reason: String| ComputeError::MalformedInput {
            path: path.to_path_buf(),
            reason,
        };

        let mut intervals = Vec::new();
        let mut seen_content = false;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| ComputeError::io(path, e))?;
            let field = line.trim();
            if field.is_empty() {
                continue;
            }
            match field.parse::<f64>() {
                Ok(value) => intervals.push(value),
                Err(_) if !seen_content => {}
                Err(_) => {
                    return Err(malformed(format!(
                        "line {}: '{}' is not a number",
                        index + 1,
                        field.escape_debug()
                    )))
                }
            }
            seen_content = true;
        }

        if intervals.is_empty() {
            return Err(malformed("no interval values".to_string()));
        }
        Ok(intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(name: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_reads_one_value_per_line() {
        let (_dir, path) = write("4_rec.txt", "rr_ms\n800\n 812.5 \n\n790\n");
        assert_eq!(
            TextAdapter.load(&path, "ignored").unwrap(),
            vec![800.0, 812.5, 790.0]
        );
    }

    #[test]
    fn test_garbage_after_header_is_malformed() {
        let (_dir, path) = write("5_rec.txt", "garbage\n\x00\x01binary\n800;900\n");
        let err = TextAdapter.load(&path, "ignored").unwrap_err();
        assert!(matches!(err, ComputeError::MalformedInput { .. }));
    }

    #[test]
    fn test_non_numeric_line_between_values_is_malformed() {
        let (_dir, path) = write("6_rec.rr", "800\n810\nn/a\n820\n");
        match TextAdapter.load(&path, "ignored").unwrap_err() {
            ComputeError::MalformedInput { reason, .. } => assert!(reason.contains("line 3")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_without_values_is_malformed() {
        for content in ["", "\n\n", "rr_ms\n"] {
            let (_dir, path) = write("7_rec.txt", content);
            assert!(matches!(
                TextAdapter.load(&path, "ignored"),
                Err(ComputeError::MalformedInput { .. })
            ));
        }
    }
}
