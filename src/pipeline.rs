//! Batch orchestration
//!
//! This module provides the public API for HRA Flux. It drives the full run from
//! cohort folders to descriptor tables:
//!
//! 1. Preconditions - base folders and inclusion lists must exist
//! 2. Selection - timescale folders, inclusion-filtered subject files
//! 3. Loading - adapter + physiological filter per subject
//! 4. Density - KDE AMI once per subject, cached
//! 5. Resolutions - one table per bin count, written before the next one starts
//! 6. Manifest - summary of tables and exclusions

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::adapters::load_intervals;
use crate::cache::{DensityCache, DensityKey};
use crate::config::{CohortConfig, RunConfig};
use crate::density::density_ami;
use crate::descriptors::{compute_row, MIN_POINTS};
use crate::error::ComputeError;
use crate::export::{table_file_name, timescale_folder, TableEncoder};
use crate::filter::filter_intervals;
use crate::inclusion::load_subject_ids;
use crate::manifest::{ExclusionRecord, RunManifest, TableRecord};
use crate::selector::{select_cohort_files, timescale_dirs};
use crate::types::{Bounds, DescriptorRow, OutputTable, SubjectFile};

/// A cohort with its inclusion set loaded
#[derive(Debug, Clone)]
pub struct Cohort {
    pub config: CohortConfig,
    pub ids: BTreeSet<u64>,
}

impl Cohort {
    pub fn load(config: &CohortConfig) -> Result<Self, ComputeError> {
        let ids = load_subject_ids(&config.ids_path)?;
        info!(
            "Loaded {} subject ids for cohort {}",
            ids.len(),
            config.label
        );
        Ok(Self {
            config: config.clone(),
            ids,
        })
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }
}

/// A subject file with its filtered intervals
pub type LoadedSubject = (SubjectFile, Vec<f64>);

/// Descriptors of one recording at one resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionDescriptors {
    pub bins: usize,
    pub descriptors: DescriptorRow,
}

/// Load one interval file and clamp it to `bounds`
pub fn load_filtered(path: &Path, variable: &str, bounds: Bounds) -> Result<Vec<f64>, ComputeError> {
    let raw = load_intervals(path, variable)?;
    let filtered = filter_intervals(&raw, bounds);
    debug!(
        "{}: kept {} of {} intervals",
        path.display(),
        filtered.len(),
        raw.len()
    );
    Ok(filtered)
}

/// Compute all descriptors of one recording for each bin count.
///
/// The density AMI is computed once and shared by every resolution.
pub fn describe_recording(
    path: &Path,
    variable: &str,
    bounds: Bounds,
    grid_size: usize,
    bin_counts: &[usize],
) -> Result<Vec<ResolutionDescriptors>, ComputeError> {
    let intervals = load_filtered(path, variable, bounds)?;
    let kde_ami = density_ami(&intervals, grid_size, bounds);

    Ok(bin_counts
        .iter()
        .map(|&bins| ResolutionDescriptors {
            bins,
            descriptors: compute_row(&intervals, bins, bounds, kde_ami),
        })
        .collect())
}

/// Batch processor for a two-cohort comparison
pub struct BatchProcessor {
    config: RunConfig,
}

impl BatchProcessor {
    /// Create a processor; the configuration knobs are validated here
    pub fn new(config: RunConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every cohort, timescale and resolution, then write the manifest.
    ///
    /// Missing folders or inclusion lists abort before any computation; any
    /// unreadable interval file aborts the run.
    pub fn run(&self) -> Result<RunManifest, ComputeError> {
        self.config.validate_paths()?;

        let cohorts = self
            .config
            .cohorts
            .iter()
            .map(Cohort::load)
            .collect::<Result<Vec<_>, _>>()?;

        let comparison_dir = self.config.comparison_dir();
        let mut manifest = RunManifest::new(&self.config);

        for cohort in &cohorts {
            self.process_cohort(cohort, &comparison_dir, &mut manifest)?;
            info!("Finished cohort {}", cohort.label());
        }

        let manifest_path = manifest.write(&comparison_dir)?;
        info!(
            "Wrote {} tables, manifest at {}",
            manifest.tables.len(),
            manifest_path.display()
        );
        Ok(manifest)
    }

    fn process_cohort(
        &self,
        cohort: &Cohort,
        comparison_dir: &Path,
        manifest: &mut RunManifest,
    ) -> Result<(), ComputeError> {
        for timescale in timescale_dirs(&cohort.config.base_dir)? {
            let minutes = timescale.minutes;
            let selection =
                select_cohort_files(&timescale.path, &self.config.data_extension, &cohort.ids)?;

            manifest
                .exclusions
                .extend(selection.excluded.iter().map(|e| ExclusionRecord {
                    cohort: cohort.label().to_string(),
                    timescale_minutes: minutes,
                    file_name: e.file_name.clone(),
                    reason: e.reason,
                }));

            if selection.eligible.is_empty() {
                info!(
                    "No eligible files for {} at {}min, skipping",
                    cohort.label(),
                    minutes
                );
                continue;
            }

            let subjects = self.load_subjects(&selection.eligible)?;

            info!(
                "KDE AMI {} {}min: {} subjects",
                cohort.label(),
                minutes,
                subjects.len()
            );
            let cache = DensityCache::populate(
                cohort.label(),
                minutes,
                &subjects,
                self.config.grid_size,
                self.config.bounds,
            );

            for &bins in &self.config.bin_counts {
                let table = self.build_table(cohort.label(), minutes, bins, &subjects, &cache);
                let path = self.table_path(comparison_dir, &cohort.config, minutes, bins);
                TableEncoder::write(&table, &path)?;
                info!(
                    "Indices {} {}min_{}bins: wrote {} rows to {}",
                    cohort.label(),
                    minutes,
                    bins,
                    table.rows.len(),
                    path.display()
                );

                manifest.tables.push(TableRecord {
                    cohort: cohort.label().to_string(),
                    timescale_minutes: minutes,
                    bins,
                    path,
                    rows: table.rows.len(),
                });
            }
        }
        Ok(())
    }

    fn load_subjects(&self, files: &[SubjectFile]) -> Result<Vec<LoadedSubject>, ComputeError> {
        files
            .iter()
            .map(|file| -> Result<LoadedSubject, ComputeError> {
                let intervals =
                    load_filtered(&file.path, &self.config.variable_name, self.config.bounds)?;
                if intervals.len() < MIN_POINTS {
                    debug!(
                        "{} has {} intervals after filtering; descriptors will be zero",
                        file.file_name,
                        intervals.len()
                    );
                }
                Ok((file.clone(), intervals))
            })
            .collect()
    }

    /// Build one table; rows follow the order of `subjects`
    pub fn build_table(
        &self,
        cohort: &str,
        timescale_minutes: u32,
        bins: usize,
        subjects: &[LoadedSubject],
        cache: &DensityCache,
    ) -> OutputTable {
        let rows = subjects
            .par_iter()
            .map(|(subject, intervals)| {
                let kde_ami = cache
                    .get(&DensityKey::new(cohort, timescale_minutes, subject))
                    .unwrap_or(0.0);
                compute_row(intervals, bins, self.config.bounds, kde_ami)
            })
            .collect();

        OutputTable {
            cohort: cohort.to_string(),
            timescale_minutes,
            bins,
            rows,
        }
    }

    fn table_path(
        &self,
        comparison_dir: &Path,
        cohort: &CohortConfig,
        timescale_minutes: u32,
        bins: usize,
    ) -> PathBuf {
        timescale_folder(comparison_dir, timescale_minutes).join(table_file_name(
            cohort.prefix(),
            timescale_minutes,
            bins,
        ))
    }
}
