//! HRA Flux - Batch compute engine for Poincaré plot and heart rate asymmetry descriptors
//!
//! HRA Flux turns per-subject RR-interval recordings of two cohorts into
//! descriptor tables through a deterministic pipeline: cohort file selection →
//! interval loading and filtering → density estimation (cached) → descriptor
//! computation per histogram resolution → CSV export.
//!
//! ## Descriptors
//!
//! - **Poincaré plot**: SD1, SD2
//! - **Heart rate asymmetry**: Porta, Guzik, Asymmetric Spread, Area and Slope
//!   indices, plus histogram- and density-based AMI scores

pub mod adapters;
pub mod asymmetry;
pub mod cache;
pub mod config;
pub mod density;
pub mod descriptors;
pub mod error;
pub mod export;
pub mod filter;
pub mod inclusion;
pub mod manifest;
pub mod pipeline;
pub mod selector;
pub mod types;

pub use config::{CohortConfig, ComparisonPreset, RunConfig};
pub use error::ComputeError;
pub use manifest::RunManifest;
pub use pipeline::{describe_recording, BatchProcessor};
pub use types::{Bounds, Descriptor, DescriptorRow, OutputTable};

/// HRA Flux version recorded in every run manifest
pub const HRA_FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for run manifests
pub const PRODUCER_NAME: &str = "hra-flux";
