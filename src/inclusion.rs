//! Cohort inclusion lists
//!
//! An inclusion list is a delimited text file whose first column holds integer
//! subject identifiers. A non-numeric first row is a header; other non-numeric
//! rows are skipped.

use std::collections::BTreeSet;
use std::path::Path;

use log::debug;

use crate::error::ComputeError;

/// Parse subject identifiers from any CSV reader
pub fn parse_subject_ids<R: std::io::Read>(reader: R) -> Result<BTreeSet<u64>, ComputeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut ids = BTreeSet::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let Some(field) = record.get(0) else {
            continue;
        };
        match field.parse::<u64>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) if row == 0 => debug!("treating first row '{field}' as header"),
            Err(_) => debug!("skipping non-numeric inclusion row {row}: '{field}'"),
        }
    }
    Ok(ids)
}

/// Load the inclusion set of a cohort
pub fn load_subject_ids(path: &Path) -> Result<BTreeSet<u64>, ComputeError> {
    if !path.exists() {
        return Err(ComputeError::MissingPath(path.to_path_buf()));
    }
    let file = std::fs::File::open(path).map_err(|e| ComputeError::io(path, e))?;
    parse_subject_ids(file)
}
