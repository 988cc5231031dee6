//! HRA CLI - Command-line interface for HRA Flux
//!
//! Commands:
//! - compute: Run a two-cohort batch and write descriptor tables
//! - describe: Compute all descriptors for a single recording
//! - doctor: Check configuration, folders and eligible files without computing
//! - init: Write a configuration file for one of the study presets

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hra_flux::adapters::DEFAULT_VARIABLE;
use hra_flux::config::DEFAULT_BIN_COUNTS;
use hra_flux::density::DEFAULT_GRID_SIZE;
use hra_flux::inclusion::load_subject_ids;
use hra_flux::selector::{select_cohort_files, timescale_dirs};
use hra_flux::types::{DEFAULT_LOWER_BOUND_MS, DEFAULT_UPPER_BOUND_MS};
use hra_flux::{
    describe_recording, BatchProcessor, Bounds, ComparisonPreset, Descriptor, RunConfig,
    HRA_FLUX_VERSION, PRODUCER_NAME,
};

/// HRA - Poincaré plot and heart rate asymmetry descriptors for RR-interval cohorts
#[derive(Parser)]
#[command(name = "hra")]
#[command(version = HRA_FLUX_VERSION)]
#[command(about = "Compute nonlinear HRV descriptors for two cohorts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch and write one table per cohort, timescale and bin count
    Compute {
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Override the export directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Override the density grid size
        #[arg(long)]
        grid_size: Option<usize>,

        /// Override the histogram bin counts
        #[arg(long, value_delimiter = ',')]
        bins: Option<Vec<usize>>,

        /// Print the run manifest as JSON on completion
        #[arg(long)]
        json: bool,
    },

    /// Compute all descriptors for a single recording
    Describe {
        /// Interval-data file (.mat, .json, .txt)
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the interval array inside the file
        #[arg(long, default_value = DEFAULT_VARIABLE)]
        variable: String,

        /// Histogram bin counts
        #[arg(long, value_delimiter = ',')]
        bins: Option<Vec<usize>>,

        /// Density grid size
        #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
        grid_size: usize,

        /// Lower RR bound (ms)
        #[arg(long, default_value_t = DEFAULT_LOWER_BOUND_MS)]
        lower_ms: f64,

        /// Upper RR bound (ms)
        #[arg(long, default_value_t = DEFAULT_UPPER_BOUND_MS)]
        upper_ms: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration, folders and eligible files
    Doctor {
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a configuration file for a study preset
    Init {
        /// Cohort comparison
        #[arg(long, value_enum)]
        preset: PresetArg,

        /// Study root holding input_data/
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output configuration path
        #[arg(short, long, default_value = "hra.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum PresetArg {
    /// Older healthy subjects vs. congestive heart failure
    OhsVsChf,
    /// Younger vs. older healthy subjects
    YhsVsOhs,
}

impl From<PresetArg> for ComparisonPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::OhsVsChf => ComparisonPreset::OhsVsChf,
            PresetArg::YhsVsOhs => ComparisonPreset::YhsVsOhs,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), HraCliError> {
    match cli.command {
        Commands::Compute {
            config,
            export_dir,
            grid_size,
            bins,
            json,
        } => cmd_compute(&config, export_dir, grid_size, bins, json),

        Commands::Describe {
            input,
            variable,
            bins,
            grid_size,
            lower_ms,
            upper_ms,
            json,
        } => cmd_describe(
            &input,
            &variable,
            bins,
            grid_size,
            Bounds::new(lower_ms, upper_ms),
            json,
        ),

        Commands::Doctor { config, json } => cmd_doctor(&config, json),

        Commands::Init {
            preset,
            root,
            output,
        } => cmd_init(preset.into(), &root, &output),
    }
}

fn cmd_compute(
    config_path: &Path,
    export_dir: Option<PathBuf>,
    grid_size: Option<usize>,
    bins: Option<Vec<usize>>,
    json: bool,
) -> Result<(), HraCliError> {
    let mut config = RunConfig::load(config_path)?;
    if let Some(dir) = export_dir {
        config.export_dir = dir;
    }
    if let Some(size) = grid_size {
        config.grid_size = size;
    }
    if let Some(bins) = bins {
        config = config.with_bin_counts(bins);
    }

    let processor = BatchProcessor::new(config)?;
    let manifest = processor.run()?;

    if json {
        println!("{}", manifest.to_json()?);
    } else {
        println!("Run {}", manifest.run_id);
        println!("Comparison: {}", manifest.comparison);
        println!("Tables:     {}", manifest.tables.len());
        println!("Excluded:   {}", manifest.exclusions.len());
        for cohort in &processor.config().cohorts {
            println!(
                "  {}: {} tables",
                cohort.label,
                manifest.tables_for(&cohort.label).count()
            );
        }
    }
    Ok(())
}

fn cmd_describe(
    input: &Path,
    variable: &str,
    bins: Option<Vec<usize>>,
    grid_size: usize,
    bounds: Bounds,
    json: bool,
) -> Result<(), HraCliError> {
    if !bounds.is_valid() {
        return Err(HraCliError::Usage(format!(
            "invalid bounds [{}, {}]",
            bounds.lower_ms, bounds.upper_ms
        )));
    }
    let mut bins = bins.unwrap_or_else(|| DEFAULT_BIN_COUNTS.to_vec());
    bins.sort_unstable();
    bins.dedup();
    if bins.contains(&0) {
        return Err(HraCliError::Usage("bin counts must be positive".to_string()));
    }

    let described = describe_recording(input, variable, bounds, grid_size, &bins)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&described)?);
        return Ok(());
    }

    println!("Descriptors for {}", input.display());
    println!("==============={}", "=".repeat(input.display().to_string().len()));
    print!("{:>6}", "bins");
    for (index, descriptor) in Descriptor::ALL.into_iter().enumerate() {
        print!("{}{:>12}", column_separator(index), short_name(descriptor));
    }
    println!();
    for entry in &described {
        print!("{:>6}", entry.bins);
        for (index, value) in entry.descriptors.export_values().into_iter().enumerate() {
            print!("{}{:>12.4}", column_separator(index), value);
        }
        println!();
    }
    Ok(())
}

/// Poincaré columns are set apart from the asymmetry columns
fn column_separator(index: usize) -> &'static str {
    let starts_asymmetry = index > 0
        && Descriptor::ALL[index - 1].is_poincare()
        && !Descriptor::ALL[index].is_poincare();
    if starts_asymmetry {
        "  |"
    } else {
        "  "
    }
}

fn short_name(descriptor: Descriptor) -> &'static str {
    match descriptor {
        Descriptor::AsymmetricSpreadIndex => "ASI",
        Descriptor::PortaIndex => "PI",
        Descriptor::GuzikIndex => "GI",
        Descriptor::AreaIndex => "AI",
        Descriptor::SlopeIndex => "SI",
        other => other.name(),
    }
}

fn cmd_doctor(config_path: &Path, json: bool) -> Result<(), HraCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "hra_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("HRA Flux version {}", HRA_FLUX_VERSION),
    });

    let config = match RunConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            });
            return finish_doctor(checks, json);
        }
    };

    checks.push(match config.validate() {
        Ok(()) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} ({} bin counts, grid {})",
                config.comparison_name(),
                config.bin_counts.len(),
                config.grid_size
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    for cohort in &config.cohorts {
        let ids = match load_subject_ids(&cohort.ids_path) {
            Ok(ids) => {
                checks.push(DoctorCheck {
                    name: format!("{}.ids", cohort.label),
                    status: CheckStatus::Ok,
                    message: format!("{} subject ids", ids.len()),
                });
                ids
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: format!("{}.ids", cohort.label),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let timescales = match timescale_dirs(&cohort.base_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                checks.push(DoctorCheck {
                    name: format!("{}.base_dir", cohort.label),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if timescales.is_empty() {
            checks.push(DoctorCheck {
                name: format!("{}.base_dir", cohort.label),
                status: CheckStatus::Warning,
                message: "No timescale folders found".to_string(),
            });
        }

        for timescale in timescales {
            let name = format!("{}.{}min", cohort.label, timescale.minutes);
            checks.push(
                match select_cohort_files(&timescale.path, &config.data_extension, &ids) {
                    Ok(selection) if selection.eligible.is_empty() => DoctorCheck {
                        name,
                        status: CheckStatus::Warning,
                        message: format!(
                            "No eligible files ({} excluded)",
                            selection.excluded.len()
                        ),
                    },
                    Ok(selection) => DoctorCheck {
                        name,
                        status: CheckStatus::Ok,
                        message: format!(
                            "{} eligible, {} excluded",
                            selection.eligible.len(),
                            selection.excluded.len()
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name,
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
            );
        }
    }

    finish_doctor(checks, json)
}

fn finish_doctor(checks: Vec<DoctorCheck>, json: bool) -> Result<(), HraCliError> {
    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: HRA_FLUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("HRA Doctor Report");
        println!("=================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(HraCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_init(preset: ComparisonPreset, root: &Path, output: &Path) -> Result<(), HraCliError> {
    let config = preset.config(root);
    config.save(output)?;
    println!("Wrote {} configuration to {}", preset, output.display());
    Ok(())
}

// Error types

#[derive(Debug)]
enum HraCliError {
    Io(io::Error),
    Compute(hra_flux::ComputeError),
    Json(serde_json::Error),
    Usage(String),
    DoctorFailed,
}

impl From<io::Error> for HraCliError {
    fn from(e: io::Error) -> Self {
        HraCliError::Io(e)
    }
}

impl From<hra_flux::ComputeError> for HraCliError {
    fn from(e: hra_flux::ComputeError) -> Self {
        HraCliError::Compute(e)
    }
}

impl From<serde_json::Error> for HraCliError {
    fn from(e: serde_json::Error) -> Self {
        HraCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HraCliError> for CliError {
    fn from(e: HraCliError) -> Self {
        use hra_flux::ComputeError;

        match e {
            HraCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HraCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::MissingPath(_) => (
                        "MISSING_PATH",
                        "Run 'hra doctor' to check cohort folders and inclusion lists",
                    ),
                    ComputeError::InvalidConfig(_) | ComputeError::TomlError(_) => {
                        ("INVALID_CONFIG", "Review the run configuration file")
                    }
                    ComputeError::MalformedInput { .. }
                    | ComputeError::MissingVariable { .. }
                    | ComputeError::UnsupportedFormat(_) => (
                        "MALFORMED_INPUT",
                        "Check the interval file format and variable name",
                    ),
                    _ => ("COMPUTE_ERROR", "Re-run with RUST_LOG=debug for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            HraCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            HraCliError::Usage(msg) => CliError {
                code: "USAGE_ERROR".to_string(),
                message: msg,
                hint: Some("See 'hra --help'".to_string()),
            },
            HraCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
