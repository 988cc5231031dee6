//! Output table encoding
//!
//! Tables are CSV: a header with the nine descriptor names followed by one row
//! per subject. Percentage descriptors are scaled by 100 on write and unscaled
//! on read. Values use Rust's shortest round-trip decimal formatting.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ComputeError;
use crate::types::{Descriptor, DescriptorRow, OutputTable};

/// `<prefix>_<minutes>min_<bins>bins.csv`
pub fn table_file_name(prefix: &str, timescale_minutes: u32, bins: usize) -> String {
    format!("{prefix}_{timescale_minutes}min_{bins}bins.csv")
}

/// Folder holding all tables of one timescale
pub fn timescale_folder(comparison_dir: &Path, timescale_minutes: u32) -> PathBuf {
    comparison_dir.join(format!("{timescale_minutes}min"))
}

/// Encoder for descriptor tables
pub struct TableEncoder;

impl TableEncoder {
    /// Encode a table to CSV bytes
    pub fn encode(table: &OutputTable) -> Result<Vec<u8>, ComputeError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(Descriptor::header())?;
        for row in &table.rows {
            writer.write_record(row.export_values().iter().map(f64::to_string))?;
        }
        writer
            .into_inner()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Encode the table in memory, then write it in one call
    pub fn write(table: &OutputTable, path: &Path) -> Result<(), ComputeError> {
        let bytes = Self::encode(table)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ComputeError::io(parent, e))?;
        }
        fs::write(path, bytes).map_err(|e| ComputeError::io(path, e))
    }

    /// Decode rows from CSV written by [`TableEncoder::encode`]
    pub fn decode<R: std::io::Read>(reader: R) -> Result<Vec<DescriptorRow>, ComputeError> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let header: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        if header != Descriptor::header() {
            return Err(ComputeError::EncodingError(format!(
                "unexpected table header: {}",
                header.join(",")
            )));
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut values = [0.0; 9];
            if record.len() != values.len() {
                return Err(ComputeError::EncodingError(format!(
                    "expected {} columns, found {}",
                    values.len(),
                    record.len()
                )));
            }
            for (slot, field) in values.iter_mut().zip(record.iter()) {
                *slot = field.parse().map_err(|_| {
                    ComputeError::EncodingError(format!("non-numeric table value '{field}'"))
                })?;
            }
            rows.push(DescriptorRow::from_export_values(values));
        }
        Ok(rows)
    }

    pub fn read(path: &Path) -> Result<Vec<DescriptorRow>, ComputeError> {
        let file = fs::File::open(path).map_err(|e| ComputeError::io(path, e))?;
        Self::decode(file)
    }
}
