//! Run configuration
//!
//! A [`RunConfig`] describes one batch run: the two cohorts being compared, the
//! physiological bounds, the density grid size and the histogram resolutions.
//! It is built once per invocation (from TOML or a [`ComparisonPreset`]) and
//! handed to the [`BatchProcessor`](crate::pipeline::BatchProcessor).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adapters::{adapter_for_extension, DEFAULT_VARIABLE};
use crate::density::DEFAULT_GRID_SIZE;
use crate::error::ComputeError;
use crate::types::Bounds;

/// Histogram resolutions used when none are configured
pub const DEFAULT_BIN_COUNTS: [usize; 8] = [25, 50, 100, 150, 200, 300, 500, 1000];

/// Number of cohorts a comparison run expects
pub const COHORT_COUNT: usize = 2;

fn default_export_dir() -> PathBuf {
    PathBuf::from("results").join("nonlinear_measures")
}

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

fn default_bin_counts() -> Vec<usize> {
    DEFAULT_BIN_COUNTS.to_vec()
}

fn default_extension() -> String {
    "mat".to_string()
}

fn default_variable() -> String {
    DEFAULT_VARIABLE.to_string()
}

/// One cohort of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortConfig {
    /// Short label, e.g. "oHS"
    pub label: String,
    /// Prefix of output file names; defaults to the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_prefix: Option<String>,
    /// Folder holding one subfolder per timescale
    pub base_dir: PathBuf,
    /// Inclusion list (first column = subject id)
    pub ids_path: PathBuf,
}

impl CohortConfig {
    pub fn new(label: &str, base_dir: impl Into<PathBuf>, ids_path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.to_string(),
            file_prefix: None,
            base_dir: base_dir.into(),
            ids_path: ids_path.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        self.file_prefix.as_deref().unwrap_or(&self.label)
    }
}

/// Configuration of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// Side length of the density evaluation grid
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Histogram bins per axis, ascending
    #[serde(default = "default_bin_counts")]
    pub bin_counts: Vec<usize>,
    /// Extension of interval-data files
    #[serde(default = "default_extension")]
    pub data_extension: String,
    /// Name of the interval array inside each data file
    #[serde(default = "default_variable")]
    pub variable_name: String,
    #[serde(default)]
    pub bounds: Bounds,
    pub cohorts: Vec<CohortConfig>,
}

impl RunConfig {
    /// Configuration with default knobs for the given cohorts
    pub fn new(cohorts: Vec<CohortConfig>) -> Self {
        Self {
            cohorts,
            export_dir: default_export_dir(),
            bounds: Bounds::default(),
            grid_size: default_grid_size(),
            bin_counts: default_bin_counts(),
            data_extension: default_extension(),
            variable_name: default_variable(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ComputeError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file. Relative cohort and export paths resolve against
    /// the file's folder.
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ComputeError::io(path, e))?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(root) = path.parent() {
            config.resolve_relative_to(root);
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ComputeError> {
        toml::to_string_pretty(self).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ComputeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ComputeError::io(parent, e))?;
        }
        std::fs::write(path, self.to_toml_string()?).map_err(|e| ComputeError::io(path, e))
    }

    fn resolve_relative_to(&mut self, root: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        resolve(&mut self.export_dir);
        for cohort in &mut self.cohorts {
            resolve(&mut cohort.base_dir);
            resolve(&mut cohort.ids_path);
        }
    }

    /// Replace the resolutions, sorted ascending without duplicates
    pub fn with_bin_counts(mut self, mut bins: Vec<usize>) -> Self {
        bins.sort_unstable();
        bins.dedup();
        self.bin_counts = bins;
        self
    }

    /// Check the numeric knobs and cohort set
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.cohorts.len() != COHORT_COUNT {
            return Err(ComputeError::InvalidConfig(format!(
                "expected {COHORT_COUNT} cohorts, found {}",
                self.cohorts.len()
            )));
        }
        if self.cohorts.iter().any(|c| c.label.trim().is_empty()) {
            return Err(ComputeError::InvalidConfig(
                "cohort labels must not be empty".to_string(),
            ));
        }
        if self.cohorts[0].prefix() == self.cohorts[1].prefix() {
            return Err(ComputeError::InvalidConfig(format!(
                "cohorts share the output prefix '{}'",
                self.cohorts[0].prefix()
            )));
        }
        if !self.bounds.is_valid() {
            return Err(ComputeError::InvalidConfig(format!(
                "invalid bounds [{}, {}]",
                self.bounds.lower_ms, self.bounds.upper_ms
            )));
        }
        if self.grid_size < 2 {
            return Err(ComputeError::InvalidConfig(
                "grid_size must be at least 2".to_string(),
            ));
        }
        if self.bin_counts.is_empty() || self.bin_counts.contains(&0) {
            return Err(ComputeError::InvalidConfig(
                "bin_counts must be a non-empty list of positive counts".to_string(),
            ));
        }
        if self.bin_counts.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ComputeError::InvalidConfig(
                "bin_counts must be strictly ascending".to_string(),
            ));
        }
        adapter_for_extension(&self.data_extension)?;
        Ok(())
    }

    /// Every cohort base folder and inclusion list must exist
    pub fn validate_paths(&self) -> Result<(), ComputeError> {
        for cohort in &self.cohorts {
            for path in [&cohort.base_dir, &cohort.ids_path] {
                if !path.exists() {
                    return Err(ComputeError::MissingPath(path.clone()));
                }
            }
        }
        Ok(())
    }

    /// `<label1>_vs_<label2>`
    pub fn comparison_name(&self) -> String {
        self.cohorts
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join("_vs_")
    }

    /// Folder receiving all tables of this run
    pub fn comparison_dir(&self) -> PathBuf {
        self.export_dir.join(self.comparison_name())
    }
}

/// The two cohort comparisons of the `input_data/` study layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonPreset {
    /// Older healthy subjects vs. congestive heart failure
    OhsVsChf,
    /// Younger vs. older healthy subjects
    YhsVsOhs,
}

impl ComparisonPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonPreset::OhsVsChf => "ohs-vs-chf",
            ComparisonPreset::YhsVsOhs => "yhs-vs-ohs",
        }
    }

    /// Build a run configuration for the `input_data/` layout under `root`
    pub fn config(&self, root: &Path) -> RunConfig {
        let ids = root.join("input_data").join("IDs");
        let hrv = root.join("input_data").join("HRV");
        let cohort = |label: &str, group_dir: &str, prefix: &str| CohortConfig {
            file_prefix: Some(prefix.to_string()),
            ..CohortConfig::new(
                label,
                hrv.join(group_dir),
                ids.join(format!("IDs-{label}.csv")),
            )
        };

        // Tables are named g1_/g2_ for the downstream statistics stage
        let cohorts = match self {
            ComparisonPreset::OhsVsChf => vec![
                cohort("oHS", "HS", "g1"),
                cohort("CHF", "CHF", "g2"),
            ],
            ComparisonPreset::YhsVsOhs => vec![
                cohort("yHS", "HS", "g1"),
                cohort("oHS", "HS", "g2"),
            ],
        };

        let mut config = RunConfig::new(cohorts);
        config.export_dir = root.join(default_export_dir());
        config
    }
}

impl fmt::Display for ComparisonPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonPreset {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ohs-vs-chf" | "1" => Ok(ComparisonPreset::OhsVsChf),
            "yhs-vs-ohs" | "2" => Ok(ComparisonPreset::YhsVsOhs),
            other => Err(ComputeError::InvalidConfig(format!(
                "unknown comparison preset '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_toml() -> &'static str {
        r#"
            export_dir = "out"
            grid_size = 200
            bin_counts = [25, 50]

            [bounds]
            lower_ms = 250.0
            upper_ms = 1800.0

            [[cohorts]]
            label = "oHS"
            base_dir = "data/HS"
            ids_path = "ids/IDs-oHS.csv"

            [[cohorts]]
            label = "CHF"
            file_prefix = "g2"
            base_dir = "data/CHF"
            ids_path = "ids/IDs-CHF.csv"
        "#
    }

    #[test]
    fn test_parse_toml() {
        let config = RunConfig::from_toml_str(sample_toml()).unwrap();
        assert_eq!(config.grid_size, 200);
        assert_eq!(config.bin_counts, vec![25, 50]);
        assert_eq!(config.bounds, Bounds::new(250.0, 1800.0));
        assert_eq!(config.data_extension, "mat");
        assert_eq!(config.variable_name, "rr_intervals");
        assert_eq!(config.cohorts[0].prefix(), "oHS");
        assert_eq!(config.cohorts[1].prefix(), "g2");
        assert_eq!(config.comparison_dir(), PathBuf::from("out/oHS_vs_CHF"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_apply() {
        let config = RunConfig::from_toml_str(
            r#"
                [[cohorts]]
                label = "a"
                base_dir = "a"
                ids_path = "a.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(config.bin_counts, DEFAULT_BIN_COUNTS.to_vec());
        assert_eq!(config.bounds, Bounds::default());
        // a single cohort cannot be compared
        assert!(matches!(
            config.validate(),
            Err(ComputeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ComparisonPreset::YhsVsOhs.config(Path::new("/study"));
        let text = config.to_toml_string().unwrap();
        assert_eq!(RunConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_validation_rejects_bad_knobs() {
        let base = ComparisonPreset::OhsVsChf.config(Path::new("/study"));

        let mut config = base.clone();
        config.bounds = Bounds::new(2000.0, 300.0);
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.bin_counts = vec![50, 25];
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.bin_counts.clear();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.grid_size = 1;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.data_extension = "edf".to_string();
        assert!(config.validate().is_err());

        assert!(base.validate().is_ok());
    }

    #[test]
    fn test_with_bin_counts_sorts() {
        let config = ComparisonPreset::OhsVsChf
            .config(Path::new("/study"))
            .with_bin_counts(vec![100, 25, 100, 50]);
        assert_eq!(config.bin_counts, vec![25, 50, 100]);
    }

    #[test]
    fn test_presets() {
        let config = ComparisonPreset::OhsVsChf.config(Path::new("/study"));
        assert_eq!(config.comparison_name(), "oHS_vs_CHF");
        assert_eq!(config.cohorts[0].prefix(), "g1");
        assert_eq!(config.cohorts[1].prefix(), "g2");
        assert_eq!(config.cohorts[1].label, "CHF");
        assert_eq!(
            config.cohorts[1].ids_path,
            PathBuf::from("/study/input_data/IDs/IDs-CHF.csv")
        );
        assert_eq!(
            "2".parse::<ComparisonPreset>().unwrap(),
            ComparisonPreset::YhsVsOhs
        );
        assert!("3".parse::<ComparisonPreset>().is_err());
    }

    #[test]
    fn test_missing_paths_are_reported() {
        let config = ComparisonPreset::OhsVsChf.config(Path::new("/nonexistent"));
        assert!(matches!(
            config.validate_paths(),
            Err(ComputeError::MissingPath(_))
        ));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hra.toml");
        std::fs::write(&path, sample_toml()).unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.export_dir, dir.path().join("out"));
        assert_eq!(config.cohorts[0].base_dir, dir.path().join("data/HS"));
    }
}
