//! Core types for the HRA Flux pipeline
//!
//! This module defines the data structures that flow through each stage of a
//! batch run: physiological bounds, subject files, descriptor rows and the
//! per-combination output tables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default lower RR bound (ms)
pub const DEFAULT_LOWER_BOUND_MS: f64 = 300.0;

/// Default upper RR bound (ms)
pub const DEFAULT_UPPER_BOUND_MS: f64 = 2000.0;

/// Closed physiological bound `[lower_ms, upper_ms]` for RR intervals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower_ms: f64,
    pub upper_ms: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            lower_ms: DEFAULT_LOWER_BOUND_MS,
            upper_ms: DEFAULT_UPPER_BOUND_MS,
        }
    }
}

impl Bounds {
    pub fn new(lower_ms: f64, upper_ms: f64) -> Self {
        Self { lower_ms, upper_ms }
    }

    /// Whether `value` lies inside the closed bound
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_ms && value <= self.upper_ms
    }

    pub fn span(&self) -> f64 {
        self.upper_ms - self.lower_ms
    }

    pub fn is_valid(&self) -> bool {
        self.lower_ms.is_finite() && self.upper_ms.is_finite() && self.lower_ms < self.upper_ms
    }
}

/// The nine exported descriptors, in table column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptor {
    Sd1,
    Sd2,
    PortaIndex,
    GuzikIndex,
    AsymmetricSpreadIndex,
    AreaIndex,
    SlopeIndex,
    HbAmi,
    KdeAmi,
}

impl Descriptor {
    /// All descriptors in the fixed column order of an output table
    pub const ALL: [Descriptor; 9] = [
        Descriptor::Sd1,
        Descriptor::Sd2,
        Descriptor::PortaIndex,
        Descriptor::GuzikIndex,
        Descriptor::AsymmetricSpreadIndex,
        Descriptor::AreaIndex,
        Descriptor::SlopeIndex,
        Descriptor::HbAmi,
        Descriptor::KdeAmi,
    ];

    /// Column header used in output tables
    pub fn name(&self) -> &'static str {
        match self {
            Descriptor::Sd1 => "SD1",
            Descriptor::Sd2 => "SD2",
            Descriptor::PortaIndex => "Porta Index",
            Descriptor::GuzikIndex => "Guzik Index",
            Descriptor::AsymmetricSpreadIndex => "Asymmetric Spread Index",
            Descriptor::AreaIndex => "Area Index",
            Descriptor::SlopeIndex => "Slope Index",
            Descriptor::HbAmi => "HB AMI",
            Descriptor::KdeAmi => "KDE AMI",
        }
    }

    /// Whether the value is multiplied by 100 on export
    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            Descriptor::PortaIndex
                | Descriptor::GuzikIndex
                | Descriptor::AreaIndex
                | Descriptor::SlopeIndex
                | Descriptor::HbAmi
                | Descriptor::KdeAmi
        )
    }

    /// Poincaré plot spread measures (the first two columns)
    pub fn is_poincare(&self) -> bool {
        matches!(self, Descriptor::Sd1 | Descriptor::Sd2)
    }

    pub fn header() -> Vec<&'static str> {
        Self::ALL.iter().map(Descriptor::name).collect()
    }
}

/// One subject's descriptor values (unscaled, ratios in `[0, 1]`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorRow {
    pub sd1: f64,
    pub sd2: f64,
    pub porta_index: f64,
    pub guzik_index: f64,
    pub asymmetric_spread_index: f64,
    pub area_index: f64,
    pub slope_index: f64,
    pub hb_ami: f64,
    pub kde_ami: f64,
}

impl DescriptorRow {
    /// Row used for subjects with too few filtered intervals
    pub fn zeros() -> Self {
        Self::default()
    }

    pub fn get(&self, descriptor: Descriptor) -> f64 {
        match descriptor {
            Descriptor::Sd1 => self.sd1,
            Descriptor::Sd2 => self.sd2,
            Descriptor::PortaIndex => self.porta_index,
            Descriptor::GuzikIndex => self.guzik_index,
            Descriptor::AsymmetricSpreadIndex => self.asymmetric_spread_index,
            Descriptor::AreaIndex => self.area_index,
            Descriptor::SlopeIndex => self.slope_index,
            Descriptor::HbAmi => self.hb_ami,
            Descriptor::KdeAmi => self.kde_ami,
        }
    }

    /// Values in column order, percentage descriptors scaled by 100
    pub fn export_values(&self) -> [f64; 9] {
        Descriptor::ALL.map(|d| {
            let value = self.get(d);
            if d.is_percentage() {
                value * 100.0
            } else {
                value
            }
        })
    }

    /// Inverse of [`DescriptorRow::export_values`]
    pub fn from_export_values(values: [f64; 9]) -> Self {
        let [sd1, sd2, porta, guzik, asi, area, slope, hb, kde] = values;
        Self {
            sd1,
            sd2,
            porta_index: porta / 100.0,
            guzik_index: guzik / 100.0,
            asymmetric_spread_index: asi,
            area_index: area / 100.0,
            slope_index: slope / 100.0,
            hb_ami: hb / 100.0,
            kde_ami: kde / 100.0,
        }
    }
}

/// An interval-data file admitted to a cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectFile {
    pub path: PathBuf,
    pub file_name: String,
    pub subject_id: u64,
}

/// One table per (cohort, timescale, bin count)
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub cohort: String,
    pub timescale_minutes: u32,
    pub bins: usize,
    pub rows: Vec<DescriptorRow>,
}
