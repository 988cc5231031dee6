//! Cohort file selection
//!
//! A cohort base directory holds one subfolder per timescale (`"5min"`,
//! `"15 min"`, ...). Each subfolder holds interval-data files named with a
//! leading subject identifier (`"123_record.mat"`). Files are admitted when that
//! identifier is in the cohort's inclusion set.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::types::SubjectFile;

static LEADING_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)").unwrap());

/// A timescale subfolder of a cohort base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimescaleDir {
    pub minutes: u32,
    pub path: PathBuf,
}

/// Why a file in a timescale folder was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    NoSubjectId,
    /// Leading digits too long for a subject id
    IdOutOfRange,
    NotInCohort,
}

/// A file left out of a cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub file_name: String,
    pub reason: ExclusionReason,
}

/// Result of selecting a cohort's files in one timescale folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub eligible: Vec<SubjectFile>,
    pub excluded: Vec<Exclusion>,
}

fn timescale_digits(name: &str) -> String {
    name.chars().filter(char::is_ascii_digit).collect()
}

/// Timescale in minutes: all decimal digits of the folder name, concatenated
pub fn timescale_minutes(name: &str) -> Option<u32> {
    let digits = timescale_digits(name);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Leading decimal integer of a file name
pub fn subject_id(file_name: &str) -> Option<u64> {
    leading_digits(file_name).and_then(|digits| digits.parse().ok())
}

fn leading_digits(file_name: &str) -> Option<&str> {
    LEADING_ID
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, ComputeError> {
    let mut paths = fs::read_dir(dir)
        .map_err(|e| ComputeError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ComputeError::io(dir, e))?;
    paths.sort();
    Ok(paths)
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Timescale subfolders of `base`, ascending by minutes (ties broken by name).
/// Folders whose name has no digits are skipped.
pub fn timescale_dirs(base: &Path) -> Result<Vec<TimescaleDir>, ComputeError> {
    if !base.is_dir() {
        return Err(ComputeError::MissingPath(base.to_path_buf()));
    }

    let mut dirs: Vec<TimescaleDir> = read_dir_sorted(base)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter_map(|path| {
            let name = file_name_of(&path)?;
            match timescale_minutes(&name) {
                Some(minutes) => Some(TimescaleDir { minutes, path }),
                None if timescale_digits(&name).is_empty() => {
                    info!("skipping folder without timescale: {}", path.display());
                    None
                }
                None => {
                    warn!("skipping folder with out-of-range timescale: {}", path.display());
                    None
                }
            }
        })
        .collect();

    dirs.sort_by(|a, b| a.minutes.cmp(&b.minutes).then_with(|| a.path.cmp(&b.path)));
    Ok(dirs)
}

/// Regular files in `dir` with the given extension (case-insensitive), sorted by file name
pub fn list_interval_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ComputeError> {
    let wanted = extension.trim_start_matches('.');
    let mut files: Vec<PathBuf> = read_dir_sorted(dir)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
                .unwrap_or(false)
        })
        .collect();
    files.sort_by_key(|p| file_name_of(p));
    Ok(files)
}

/// Admit the files of one timescale folder whose subject id is in `ids`
pub fn select_cohort_files(
    dir: &Path,
    extension: &str,
    ids: &BTreeSet<u64>,
) -> Result<Selection, ComputeError> {
    let mut selection = Selection::default();

    for path in list_interval_files(dir, extension)? {
        let Some(file_name) = file_name_of(&path) else {
            continue;
        };
        match subject_id(&file_name) {
            Some(id) if ids.contains(&id) => selection.eligible.push(SubjectFile {
                path,
                file_name,
                subject_id: id,
            }),
            Some(_) => selection.excluded.push(Exclusion {
                file_name,
                reason: ExclusionReason::NotInCohort,
            }),
            None => {
                let reason = if leading_digits(&file_name).is_some() {
                    ExclusionReason::IdOutOfRange
                } else {
                    ExclusionReason::NoSubjectId
                };
                selection.excluded.push(Exclusion { file_name, reason });
            }
        }
    }

    for exclusion in &selection.excluded {
        info!(
            "excluded {} from {}: {:?}",
            exclusion.file_name,
            dir.display(),
            exclusion.reason
        );
    }
    Ok(selection)
}
