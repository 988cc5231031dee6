//! Run manifest
//!
//! A JSON record of one batch run, written next to the tables it describes:
//! which tables were produced, how many rows each holds, and which files were
//! left out of a cohort and why.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::error::ComputeError;
use crate::selector::ExclusionReason;
use crate::{HRA_FLUX_VERSION, PRODUCER_NAME};

/// File name of the manifest inside the comparison folder
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// One persisted output table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub cohort: String,
    pub timescale_minutes: u32,
    pub bins: usize,
    pub path: PathBuf,
    pub rows: usize,
}

/// One file left out of a cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    pub cohort: String,
    pub timescale_minutes: u32,
    pub file_name: String,
    pub reason: ExclusionReason,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub producer: String,
    pub version: String,
    pub comparison: String,
    pub config: RunConfig,
    pub tables: Vec<TableRecord>,
    pub exclusions: Vec<ExclusionRecord>,
}

impl RunManifest {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            producer: PRODUCER_NAME.to_string(),
            version: HRA_FLUX_VERSION.to_string(),
            comparison: config.comparison_name(),
            config: config.clone(),
            tables: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    /// Tables written for one cohort
    pub fn tables_for<'a>(&'a self, cohort: &'a str) -> impl Iterator<Item = &'a TableRecord> + 'a {
        self.tables.iter().filter(move |t| t.cohort == cohort)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write `manifest.json` into `dir`
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ComputeError> {
        std::fs::create_dir_all(dir).map_err(|e| ComputeError::io(dir, e))?;
        let path = dir.join(MANIFEST_FILE_NAME);
        std::fs::write(&path, self.to_json()?).map_err(|e| ComputeError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComparisonPreset;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_manifest_json() {
        let config = ComparisonPreset::OhsVsChf.config(Path::new("/study"));
        let mut manifest = RunManifest::new(&config);
        manifest.tables.push(TableRecord {
            cohort: "oHS".to_string(),
            timescale_minutes: 5,
            bins: 25,
            path: PathBuf::from("/study/out/5min/oHS_5min_25bins.csv"),
            rows: 12,
        });
        manifest.exclusions.push(ExclusionRecord {
            cohort: "CHF".to_string(),
            timescale_minutes: 5,
            file_name: "readme.mat".to_string(),
            reason: ExclusionReason::NoSubjectId,
        });

        let json = manifest.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["producer"], "hra-flux");
        assert_eq!(value["comparison"], "oHS_vs_CHF");
        assert_eq!(value["tables"][0]["rows"], 12);
        assert_eq!(value["exclusions"][0]["reason"], "no_subject_id");

        let parsed = RunManifest::from_json(&json).unwrap();
        assert_eq!(parsed.run_id, manifest.run_id);
        assert_eq!(parsed.tables, manifest.tables);
        assert_eq!(parsed.tables_for("oHS").count(), 1);
        assert_eq!(parsed.tables_for("CHF").count(), 0);
    }
}
