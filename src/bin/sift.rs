//! Sift CLI - Command-line interface for Claimsift
//!
//! Commands:
//! - derive: Run the full derivation pipeline over a JSONL capture
//! - signal: Evaluate one signal spec into a report
//! - validate: Check a JSONL capture against the strict input contract
//! - schema: Print accepted schema versions

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use claimsift::normalizer::parse_records;
use claimsift::pipeline::{self, DeriveConfig, MANIFEST_ARTIFACT};
use claimsift::schema::{RuleSetSpec, SignalSpec, RULESET_SCHEMA, SIGNAL_SCHEMA};
use claimsift::signals::run_signal;
use claimsift::types::{
    CLAIMS_SCHEMA, LABELS_SCHEMA, LINKS_SCHEMA, MANIFEST_SCHEMA, NORMALIZED_SCHEMA,
    SIGNAL_REPORT_SCHEMA, TONE_SCHEMA, WINDOWS_SCHEMA,
};
use claimsift::{DeriveError, SIFT_VERSION};

/// Sift - Deterministic claim and behavior-window derivation
#[derive(Parser)]
#[command(name = "sift")]
#[command(version = SIFT_VERSION)]
#[command(about = "Derive auditable claims from captured text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full derivation pipeline over a JSONL capture
    Derive {
        /// Input JSONL file
        #[arg(short, long)]
        input: PathBuf,

        /// Topic-axis ruleset spec (JSON)
        #[arg(long)]
        topics: PathBuf,

        /// Optional tone polarity ruleset spec (JSON)
        #[arg(long)]
        polarity: Option<PathBuf>,

        /// Optional tone intensity ruleset spec (JSON)
        #[arg(long)]
        intensity: Option<PathBuf>,

        /// Output directory for artifacts and the manifest
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Per-claim evidence cap
        #[arg(long)]
        evidence_cap: Option<usize>,
    },

    /// Evaluate one signal spec over a JSONL capture
    Signal {
        /// Signal spec file (JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Input JSONL file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the report
        #[arg(short, long)]
        out_dir: PathBuf,
    },

    /// Check a JSONL capture against the strict input contract
    Validate {
        /// Input JSONL file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print accepted schema versions
    Schema,
}

enum CliError {
    Derive(DeriveError),
    Io(std::io::Error),
}

impl From<DeriveError> for CliError {
    fn from(e: DeriveError) -> Self {
        CliError::Derive(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Derive(e)) => {
            eprintln!("[{}] FATAL: {}", e.stage(), e);
            ExitCode::from(2)
        }
        Err(CliError::Io(e)) => {
            eprintln!("[io] FATAL: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Derive {
            input,
            topics,
            polarity,
            intensity,
            out_dir,
            evidence_cap,
        } => cmd_derive(
            &input,
            &topics,
            polarity.as_deref(),
            intensity.as_deref(),
            &out_dir,
            evidence_cap,
        ),

        Commands::Signal {
            spec,
            input,
            out_dir,
        } => cmd_signal(&spec, &input, &out_dir),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Schema => cmd_schema(),
    }
}

fn load_ruleset(path: &Path) -> Result<RuleSetSpec, CliError> {
    let json = fs::read_to_string(path)?;
    Ok(RuleSetSpec::from_json(&path.to_string_lossy(), &json)?)
}

fn cmd_derive(
    input: &Path,
    topics: &Path,
    polarity: Option<&Path>,
    intensity: Option<&Path>,
    out_dir: &Path,
    evidence_cap: Option<usize>,
) -> Result<(), CliError> {
    let input_data = fs::read_to_string(input)?;

    let mut config = DeriveConfig::new(load_ruleset(topics)?);
    if let Some(path) = polarity {
        config.polarity = Some(load_ruleset(path)?);
    }
    if let Some(path) = intensity {
        config.intensity = Some(load_ruleset(path)?);
    }
    if let Some(cap) = evidence_cap {
        config.evidence_cap = cap;
    }

    let out = pipeline::run(&input.to_string_lossy(), &input_data, &config)?;

    // All artifacts are rendered before anything touches disk, so a failed
    // run leaves no partial output.
    fs::create_dir_all(out_dir)?;
    for (name, content) in &out.artifacts {
        fs::write(out_dir.join(name), content)?;
    }
    let mut manifest_json = serde_json::to_string_pretty(&out.manifest).map_err(DeriveError::from)?;
    manifest_json.push('\n');
    fs::write(out_dir.join(MANIFEST_ARTIFACT), manifest_json)?;

    println!(
        "{}: {} records, {} artifacts written to {}",
        out.run_id,
        out.records.len(),
        out.artifacts.len() + 1,
        out_dir.display()
    );
    Ok(())
}

fn cmd_signal(spec: &Path, input: &Path, out_dir: &Path) -> Result<(), CliError> {
    let spec_json = fs::read_to_string(spec)?;
    let spec = SignalSpec::from_json(&spec.to_string_lossy(), &spec_json)?;

    let input_data = fs::read_to_string(input)?;
    let records = parse_records(&input_data)?;
    let report = run_signal(&spec, &records)?;

    fs::create_dir_all(out_dir)?;
    let mut report_json = serde_json::to_string_pretty(&report).map_err(DeriveError::from)?;
    report_json.push('\n');
    let name = format!("{}.json", report.signal_id);
    fs::write(out_dir.join(&name), report_json)?;

    println!(
        "{}: {} examples, report written to {}",
        report.signal_id,
        report.examples.len(),
        out_dir.join(&name).display()
    );
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), CliError> {
    let input_data = fs::read_to_string(input)?;
    let records = parse_records(&input_data)?;

    let threads: std::collections::BTreeSet<&str> =
        records.iter().map(|r| r.thread_id.as_str()).collect();
    println!(
        "ok: {} records across {} threads",
        records.len(),
        threads.len()
    );
    Ok(())
}

fn cmd_schema() -> Result<(), CliError> {
    let schemas = serde_json::json!({
        "accepted_specs": {
            "ruleset": RULESET_SCHEMA,
            "signal": SIGNAL_SCHEMA,
        },
        "produced_documents": {
            "normalized_record": NORMALIZED_SCHEMA,
            "labels": LABELS_SCHEMA,
            "tone": TONE_SCHEMA,
            "claims": CLAIMS_SCHEMA,
            "behavior_windows": WINDOWS_SCHEMA,
            "claim_links": LINKS_SCHEMA,
            "manifest": MANIFEST_SCHEMA,
            "signal_report": SIGNAL_REPORT_SCHEMA,
        },
    });
    let rendered = serde_json::to_string_pretty(&schemas).map_err(DeriveError::from)?;
    println!("{}", rendered);
    Ok(())
}
