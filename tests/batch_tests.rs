//! End-to-end batch runs over a small two-cohort study tree

use std::fs;
use std::path::Path;

use hra_flux::export::TableEncoder;
use hra_flux::manifest::MANIFEST_FILE_NAME;
use hra_flux::selector::ExclusionReason;
use hra_flux::{BatchProcessor, ComparisonPreset, DescriptorRow, RunConfig, RunManifest};

fn series(seed: u32, len: u32) -> Vec<f64> {
    (0..len)
        .map(|i| 700.0 + ((i * 41 + seed * 13) % 113) as f64 + 3.0 * (i % 4) as f64)
        .collect()
}

fn write_recording(dir: &Path, name: &str, intervals: &[f64]) {
    fs::create_dir_all(dir).unwrap();
    let body = serde_json::json!({ "rr_intervals": intervals });
    fs::write(dir.join(name), body.to_string()).unwrap();
}

/// Two cohorts, two timescales; CHF has no files at 10min
fn study(root: &Path) -> RunConfig {
    let mut config = ComparisonPreset::OhsVsChf.config(root);
    config.data_extension = "json".to_string();
    config.grid_size = 30;
    config.bin_counts = vec![10, 25];

    let ids_dir = root.join("input_data").join("IDs");
    fs::create_dir_all(&ids_dir).unwrap();
    fs::write(ids_dir.join("IDs-oHS.csv"), "subject\n1\n2\n3\n").unwrap();
    fs::write(ids_dir.join("IDs-CHF.csv"), "subject\n7\n8\n").unwrap();

    let ohs = &config.cohorts[0].base_dir;
    write_recording(&ohs.join("5min"), "1_rec.json", &series(1, 60));
    write_recording(&ohs.join("5min"), "2_rec.json", &series(1, 60));
    write_recording(&ohs.join("5min"), "3_rec.json", &[810.0, 2500.0]);
    write_recording(&ohs.join("5min"), "4_rec.json", &series(4, 60));
    write_recording(&ohs.join("5min"), "notes.json", &series(5, 10));
    write_recording(&ohs.join("10min"), "1_rec.json", &series(2, 120));

    let chf = &config.cohorts[1].base_dir;
    write_recording(&chf.join("5min"), "7_rec.json", &series(7, 60));
    write_recording(&chf.join("5min"), "8_rec.json", &series(8, 60));
    fs::create_dir_all(chf.join("10min")).unwrap();

    config
}

#[test]
fn test_full_run_writes_every_table() {
    let root = tempfile::tempdir().unwrap();
    let config = study(root.path());
    let comparison_dir = config.comparison_dir();

    let manifest = BatchProcessor::new(config).unwrap().run().unwrap();

    // oHS: 2 timescales x 2 bin counts; CHF: 5min only
    assert_eq!(manifest.tables.len(), 6);
    assert_eq!(manifest.tables_for("oHS").count(), 4);
    assert_eq!(manifest.tables_for("CHF").count(), 2);

    for name in [
        "5min/g1_5min_10bins.csv",
        "5min/g1_5min_25bins.csv",
        "10min/g1_10min_10bins.csv",
        "10min/g1_10min_25bins.csv",
        "5min/g2_5min_10bins.csv",
        "5min/g2_5min_25bins.csv",
    ] {
        assert!(comparison_dir.join(name).exists(), "missing {name}");
    }
    assert!(!comparison_dir.join("10min/g2_10min_10bins.csv").exists());
    assert!(comparison_dir.join(MANIFEST_FILE_NAME).exists());
}

#[test]
fn test_rows_follow_eligible_files() {
    let root = tempfile::tempdir().unwrap();
    let config = study(root.path());
    let table_path = config
        .comparison_dir()
        .join("5min")
        .join("g1_5min_25bins.csv");

    BatchProcessor::new(config).unwrap().run().unwrap();
    let rows = TableEncoder::read(&table_path).unwrap();

    // 1, 2 and 3 are eligible; 4 is not in the cohort and notes.json has no id
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], rows[1]);
    assert_eq!(rows[2], DescriptorRow::zeros());
    assert!(rows[0].sd1 > 0.0);
    assert!(rows[0].sd2 > 0.0);
    assert!((0.0..=1.0).contains(&rows[0].hb_ami));
    assert!((0.0..=1.0).contains(&rows[0].kde_ami));
}

#[test]
fn test_density_ami_shared_across_resolutions() {
    let root = tempfile::tempdir().unwrap();
    let config = study(root.path());
    let dir = config.comparison_dir().join("5min");

    BatchProcessor::new(config).unwrap().run().unwrap();
    let coarse = TableEncoder::read(&dir.join("g2_5min_10bins.csv")).unwrap();
    let fine = TableEncoder::read(&dir.join("g2_5min_25bins.csv")).unwrap();

    assert_eq!(coarse.len(), fine.len());
    for (a, b) in coarse.iter().zip(&fine) {
        assert_eq!(a.kde_ami, b.kde_ami);
        assert_eq!(a.sd1, b.sd1);
        assert_eq!(a.porta_index, b.porta_index);
    }
}

#[test]
fn test_manifest_records_exclusions() {
    let root = tempfile::tempdir().unwrap();
    let config = study(root.path());
    let manifest_path = config.comparison_dir().join(MANIFEST_FILE_NAME);

    BatchProcessor::new(config).unwrap().run().unwrap();
    let manifest = RunManifest::from_json(&fs::read_to_string(manifest_path).unwrap()).unwrap();

    assert_eq!(manifest.comparison, "oHS_vs_CHF");
    let mut reasons: Vec<_> = manifest
        .exclusions
        .iter()
        .map(|e| (e.file_name.as_str(), e.reason))
        .collect();
    reasons.sort_by_key(|(name, _)| *name);
    assert_eq!(
        reasons,
        vec![
            ("4_rec.json", ExclusionReason::NotInCohort),
            ("notes.json", ExclusionReason::NoSubjectId),
        ]
    );

    let ohs_5min_rows: Vec<_> = manifest
        .tables_for("oHS")
        .filter(|t| t.timescale_minutes == 5)
        .map(|t| t.rows)
        .collect();
    assert_eq!(ohs_5min_rows, vec![3, 3]);
}

#[test]
fn test_config_file_round_trip_drives_run() {
    let root = tempfile::tempdir().unwrap();
    let config = study(root.path());
    let config_path = root.path().join("hra.toml");
    config.save(&config_path).unwrap();

    let loaded = RunConfig::load(&config_path).unwrap();
    assert_eq!(loaded.bin_counts, vec![10, 25]);
    assert_eq!(loaded.comparison_dir(), config.comparison_dir());

    let manifest = BatchProcessor::new(loaded).unwrap().run().unwrap();
    assert_eq!(manifest.tables.len(), 6);
}
