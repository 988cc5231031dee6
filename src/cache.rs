//! Density estimate cache
//!
//! The density-based AMI does not depend on the histogram resolution, so it is
//! computed once per subject before the resolution loop and read from here by
//! every resolution pass of that timescale.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::density::density_ami;
use crate::types::{Bounds, SubjectFile};

/// Identity of one cached density estimate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DensityKey {
    pub cohort: String,
    pub timescale_minutes: u32,
    pub subject_id: u64,
    /// Disambiguates several recordings of one subject in a timescale folder
    pub file_name: String,
}

impl DensityKey {
    pub fn new(cohort: &str, timescale_minutes: u32, subject: &SubjectFile) -> Self {
        Self {
            cohort: cohort.to_string(),
            timescale_minutes,
            subject_id: subject.subject_id,
            file_name: subject.file_name.clone(),
        }
    }
}

/// Read-only lookup of density AMI values
#[derive(Debug, Clone, Default)]
pub struct DensityCache {
    values: HashMap<DensityKey, f64>,
}

impl DensityCache {
    /// Compute the density AMI of every subject of one (cohort, timescale), in parallel.
    ///
    /// `subjects` pairs each file with its filtered intervals.
    pub fn populate(
        cohort: &str,
        timescale_minutes: u32,
        subjects: &[(SubjectFile, Vec<f64>)],
        grid_size: usize,
        bounds: Bounds,
    ) -> Self {
        let values = subjects
            .par_iter()
            .map(|(subject, intervals)| {
                (
                    DensityKey::new(cohort, timescale_minutes, subject),
                    density_ami(intervals, grid_size, bounds),
                )
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &DensityKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn subject(id: u64, name: &str) -> SubjectFile {
        SubjectFile {
            path: PathBuf::from(name),
            file_name: name.to_string(),
            subject_id: id,
        }
    }

    #[test]
    fn test_populate_and_lookup() {
        let jitter: Vec<f64> = (0..30)
            .map(|i| 800.0 + 15.0 * ((i * 7) % 5) as f64 + 4.0 * (i % 3) as f64)
            .collect();
        let subjects = vec![
            (subject(1, "1_a.mat"), jitter.clone()),
            (subject(2, "2_a.mat"), vec![800.0]),
        ];
        let cache = DensityCache::populate("oHS", 5, &subjects, 40, Bounds::default());

        assert_eq!(cache.len(), 2);
        let first = cache
            .get(&DensityKey::new("oHS", 5, &subjects[0].0))
            .unwrap();
        assert_eq!(first, density_ami(&jitter, 40, Bounds::default()));
        assert_eq!(
            cache.get(&DensityKey::new("oHS", 5, &subjects[1].0)),
            Some(0.0)
        );
        assert_eq!(cache.get(&DensityKey::new("CHF", 5, &subjects[0].0)), None);
    }
}
