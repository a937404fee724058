//! falltrace CLI - Command-line interface for fall-trace
//!
//! Commands:
//! - synthesize: Write synthesized scenario traces
//! - normalize: Mirror raw-log directories into canonical files
//! - convert: Normalize a single raw log
//! - inspect: Report fall signatures of a canonical file
//! - scenarios: List built-in scenarios or dump one as JSON

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fall_trace::encoder::decode_document;
use fall_trace::pipeline::{normalize_file, write_scenario, BatchReport, TreeNormalizer};
use fall_trace::{
    FallSignatures, FallTraceError, Scenario, ScenarioConfig, SignatureThresholds,
    FALL_TRACE_VERSION,
};
use tracing_subscriber::EnvFilter;

/// falltrace - Labeled motion-sensor traces for fall-detection validation
#[derive(Parser)]
#[command(name = "falltrace")]
#[command(version = FALL_TRACE_VERSION)]
#[command(about = "Synthesize and normalize accelerometer/gyroscope traces", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write synthesized scenario traces
    Synthesize {
        /// Built-in scenario to write (all when omitted)
        #[arg(long, value_enum)]
        scenario: Option<ScenarioArg>,

        /// Load the scenario from a JSON file instead
        #[arg(long, conflicts_with = "scenario")]
        scenario_file: Option<PathBuf>,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory (created if absent)
        #[arg(short, long, default_value = "FallDetectionResults/script_generated")]
        output_dir: PathBuf,
    },

    /// Mirror raw-log directories into canonical files
    Normalize {
        /// Source directories; each keeps its name under the output root
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Output root (files already under it are never reprocessed)
        #[arg(short, long)]
        output_root: PathBuf,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize a single raw log
    Convert {
        /// Raw log path
        #[arg(short, long)]
        input: PathBuf,

        /// Canonical output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Report fall signatures of a canonical file
    Inspect {
        /// Canonical file path
        input: PathBuf,

        /// Vertical rate (m/s² per s) a deceleration must stay below
        #[arg(long, default_value = "-15.0", allow_hyphen_values = true)]
        deceleration_slope: f64,

        /// SVM (m/s²) freefall samples must stay below
        #[arg(long, default_value = "2.0")]
        freefall_ceiling: f64,

        /// SVM (m/s²) an impact sample must exceed
        #[arg(long, default_value = "25.0")]
        impact_floor: f64,

        /// Minimum sustained duration (s)
        #[arg(long, default_value = "0.2")]
        min_event_duration: f64,
    },

    /// List built-in scenarios or dump one as JSON
    Scenarios {
        /// Scenario to dump as a JSON configuration
        #[arg(long, value_enum)]
        dump: Option<ScenarioArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioArg {
    /// Deceleration, freefall, impact, person stays down
    RealFall,
    /// Same fall, person gets up and moves
    RecoveredFall,
    /// Dropped device: impact without the fall signatures
    LookAlike,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::RealFall => Scenario::RealFall,
            ScenarioArg::RecoveredFall => Scenario::RecoveredFall,
            ScenarioArg::LookAlike => Scenario::LookAlike,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), TraceCliError> {
    match cli.command {
        Commands::Synthesize {
            scenario,
            scenario_file,
            seed,
            output_dir,
        } => cmd_synthesize(scenario, scenario_file.as_deref(), seed, &output_dir),

        Commands::Normalize {
            sources,
            output_root,
            json,
        } => cmd_normalize(sources, &output_root, json),

        Commands::Convert { input, output } => cmd_convert(&input, &output),

        Commands::Inspect {
            input,
            deceleration_slope,
            freefall_ceiling,
            impact_floor,
            min_event_duration,
        } => cmd_inspect(
            &input,
            SignatureThresholds {
                deceleration_slope,
                freefall_ceiling,
                impact_floor,
                min_event_duration_s: min_event_duration,
            },
        ),

        Commands::Scenarios { dump } => cmd_scenarios(dump),
    }
}

fn cmd_synthesize(
    scenario: Option<ScenarioArg>,
    scenario_file: Option<&Path>,
    seed: Option<u64>,
    output_dir: &Path,
) -> Result<(), TraceCliError> {
    // (config, file name) pairs to write
    let mut jobs: Vec<(ScenarioConfig, String)> = Vec::new();

    if let Some(path) = scenario_file {
        let config = ScenarioConfig::from_json(&fs::read_to_string(path)?)?;
        let file_name = format!("{}.csv", config.name);
        jobs.push((config, file_name));
    } else {
        let selected: Vec<Scenario> = match scenario {
            Some(arg) => vec![arg.into()],
            None => Scenario::ALL.to_vec(),
        };
        for scenario in selected {
            jobs.push((scenario.config()?, scenario.file_name().to_string()));
        }
    }

    for (config, file_name) in jobs {
        let config = match seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        };
        let path = output_dir.join(file_name);
        let rows = write_scenario(&config, &path)?;
        println!("{}\t{} rows\t{}", config.name, rows, path.display());
    }

    Ok(())
}

fn cmd_normalize(sources: Vec<PathBuf>, output_root: &Path, json: bool) -> Result<(), TraceCliError> {
    let report = TreeNormalizer::new(sources, output_root).run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_batch_summary(&report);
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(TraceCliError::BatchFailed(report.failed.len()))
    }
}

fn print_batch_summary(report: &BatchReport) {
    for outcome in &report.normalized {
        println!(
            "ok\t{}\t{} rows ({} dropped)",
            outcome.target.display(),
            outcome.report.rows_kept,
            outcome.report.rows_skipped()
        );
    }
    for failure in &report.failed {
        println!("failed\t{}\t{}", failure.source.display(), failure.error);
    }
    for dir in &report.skipped_dirs {
        println!("skipped\t{}", dir.display());
    }
}

fn cmd_convert(input: &Path, output: &Path) -> Result<(), TraceCliError> {
    let report = normalize_file(input, output)?;
    println!(
        "{}\t{} rows ({} dropped)",
        output.display(),
        report.rows_kept,
        report.rows_skipped()
    );
    Ok(())
}

fn cmd_inspect(input: &Path, thresholds: SignatureThresholds) -> Result<(), TraceCliError> {
    let text = fs::read_to_string(input)?;
    let records = decode_document(&text);
    if records.is_empty() {
        return Err(TraceCliError::NoRows);
    }

    let signatures = FallSignatures::measure(&records, &thresholds);
    let report = InspectReport {
        file: input.display().to_string(),
        thresholds,
        fall_pattern: signatures.is_fall_pattern(),
        signatures,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_scenarios(dump: Option<ScenarioArg>) -> Result<(), TraceCliError> {
    match dump {
        Some(arg) => {
            let config = Scenario::from(arg).config()?;
            println!("{}", config.to_json_pretty()?);
        }
        None => {
            for scenario in Scenario::ALL {
                println!(
                    "{}\tseed {}\t{}\t{}",
                    scenario.as_str(),
                    scenario.seed(),
                    scenario.file_name(),
                    scenario.description()
                );
            }
        }
    }
    Ok(())
}

// Report types

#[derive(serde::Serialize)]
struct InspectReport {
    file: String,
    thresholds: SignatureThresholds,
    fall_pattern: bool,
    signatures: FallSignatures,
}

// Error types

#[derive(Debug)]
enum TraceCliError {
    Io(io::Error),
    Trace(FallTraceError),
    Json(serde_json::Error),
    BatchFailed(usize),
    NoRows,
}

impl From<io::Error> for TraceCliError {
    fn from(e: io::Error) -> Self {
        TraceCliError::Io(e)
    }
}

impl From<FallTraceError> for TraceCliError {
    fn from(e: FallTraceError) -> Self {
        TraceCliError::Trace(e)
    }
}

impl From<serde_json::Error> for TraceCliError {
    fn from(e: serde_json::Error) -> Self {
        TraceCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TraceCliError> for CliError {
    fn from(e: TraceCliError) -> Self {
        match e {
            TraceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TraceCliError::Trace(e) => {
                let hint = match &e {
                    FallTraceError::InvalidPhaseTable(_) | FallTraceError::InvalidScenario(_) => {
                        "Phases must cover [0, sample_count) without gaps or overlaps"
                    }
                    FallTraceError::UnknownScenario(_) => "Run 'falltrace scenarios' for the list",
                    FallTraceError::Io { .. } => "Check file paths and permissions",
                    FallTraceError::Json(_) => "Check JSON syntax",
                    FallTraceError::Encoding(_) => "Check input values are finite numbers",
                };
                CliError {
                    code: "TRACE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TraceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TraceCliError::BatchFailed(count) => CliError {
                code: "BATCH_FAILED".to_string(),
                message: format!("{} files failed to normalize", count),
                hint: Some("Other files were written; see the log for details".to_string()),
            },
            TraceCliError::NoRows => CliError {
                code: "NO_ROWS".to_string(),
                message: "No canonical rows found in input".to_string(),
                hint: Some("Inspect expects a file in the canonical 9-column layout".to_string()),
            },
        }
    }
}
