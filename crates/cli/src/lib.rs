//! CLI for Benchwatch.
//!
//! This crate provides the `benchwatch` command used from CI jobs: it
//! appends a run's results to the published benchmark artifact, reports
//! regressions against recent history, and inspects the ledger.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod logging;
pub mod output;
pub mod settings;

use anyhow::{bail, Context, Result};
use benchwatch_core::codec::decode_entry;
use benchwatch_core::regression::DetectionReport;
use benchwatch_core::{CommitEntry, RegressionDetector};
use benchwatch_storage::io::{self, DEFAULT_DATA_FILE};
use clap::{Parser, Subcommand};
use logging::LogFormat;
use output::SeriesPoint;
use settings::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Benchwatch CLI.
#[derive(Parser, Debug)]
#[command(name = "benchwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./benchwatch.toml if present).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty benchmark artifact.
    Init {
        /// Artifact path.
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Repository URL recorded in the artifact.
        #[arg(long)]
        repo_url: Option<String>,

        /// Overwrite an existing artifact.
        #[arg(long)]
        force: bool,
    },

    /// Check a new run for regressions and append it to the artifact.
    ///
    /// The artifact is created if missing, in which case a repository URL
    /// must be available from `--repo-url` or the configuration.
    Append {
        /// Artifact path.
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// JSON document with the run's commit entry.
        #[arg(long, value_name = "FILE")]
        entry: PathBuf,

        /// Series to append to; must match the entry's tool.
        #[arg(long)]
        tool: Option<String>,

        /// Repository URL for a newly created artifact.
        #[arg(long)]
        repo_url: Option<String>,

        /// Exit with status 2 after writing if a failing regression was found.
        #[arg(long)]
        fail_on_alert: bool,

        /// Append without running regression detection.
        #[arg(long, conflicts_with = "fail_on_alert")]
        skip_detect: bool,

        /// Print the detection report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check a new run for regressions without modifying the artifact.
    Detect {
        /// Artifact path.
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// JSON document with the run's commit entry.
        #[arg(long, value_name = "FILE")]
        entry: PathBuf,

        /// Print the detection report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the recorded values of one benchmark.
    Series {
        /// Artifact path.
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Tool the benchmark belongs to.
        #[arg(long)]
        tool: String,

        /// Benchmark name.
        #[arg(long)]
        name: String,

        /// Print as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Show what the artifact contains.
    Status {
        /// List every benchmark per tool.
        #[arg(short, long)]
        detailed: bool,

        /// Artifact path.
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
    },
}

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report.
    Success,
    /// `--fail-on-alert` was set and a failing regression was found.
    RegressionsFound,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::RegressionsFound => 2,
        }
    }
}

/// Parse the process arguments and run.
pub fn run() -> Result<Outcome> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format)?;
    let settings = Settings::load(cli.config.as_deref())?;
    execute(cli.command, &settings)
}

/// Run one command against already loaded settings.
pub fn execute(command: Commands, settings: &Settings) -> Result<Outcome> {
    match command {
        Commands::Init {
            data,
            repo_url,
            force,
        } => {
            let path = data_path(data, settings);
            let Some(repo_url) = repo_url.or_else(|| settings.repo_url.clone()) else {
                bail!("a repository URL is required (--repo-url or repo_url in the configuration)");
            };
            io::init(&path, &repo_url, force)?;
            println!("Initialized {} for {}", path.display(), repo_url);
            Ok(Outcome::Success)
        }

        Commands::Append {
            data,
            entry,
            tool,
            repo_url,
            fail_on_alert,
            skip_detect,
            json,
        } => {
            let path = data_path(data, settings);
            let entry = read_entry(&entry)?;
            let tool = tool.unwrap_or_else(|| entry.tool().to_string());
            let detector = RegressionDetector::new(settings.detector.clone())?;

            let repo_url = repo_url.or_else(|| settings.repo_url.clone());
            if repo_url.is_none() && !path.exists() {
                bail!(
                    "{} does not exist; pass --repo-url to create it",
                    path.display()
                );
            }
            let repo_url = repo_url.unwrap_or_default();

            let commit_id = entry.commit().short_id().to_string();
            let report = io::update(&path, &repo_url, |store| -> Result<DetectionReport> {
                let report = if skip_detect {
                    DetectionReport::default()
                } else {
                    detector.analyze(store, &tool, &entry)
                };
                store
                    .append(&tool, entry)
                    .with_context(|| format!("cannot append commit {commit_id}"))?;
                Ok(report)
            })?;
            info!(tool = %tool, commit = %commit_id, path = %path.display(), "Appended entry");

            if !skip_detect {
                print_report(&report, &detector, json)?;
            }
            if fail_on_alert && report.failures(detector.config()).next().is_some() {
                return Ok(Outcome::RegressionsFound);
            }
            Ok(Outcome::Success)
        }

        Commands::Detect { data, entry, json } => {
            let path = data_path(data, settings);
            let entry = read_entry(&entry)?;
            let detector = RegressionDetector::new(settings.detector.clone())?;
            let store = io::load(&path)?;
            let report = detector.analyze(&store, entry.tool(), &entry);
            print_report(&report, &detector, json)?;
            Ok(Outcome::Success)
        }

        Commands::Series {
            data,
            tool,
            name,
            json,
        } => {
            let store = io::load(data_path(data, settings))?;
            let points: Vec<SeriesPoint> = store
                .series_for(&tool, &name)
                .map(|(date, value)| SeriesPoint { date, value })
                .collect();
            if points.is_empty() {
                bail!("no values recorded for '{name}' under tool '{tool}'");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                let unit = store
                    .entries_for(&tool)
                    .iter()
                    .rev()
                    .find_map(|entry| entry.bench(&name))
                    .map(|record| record.unit())
                    .unwrap_or_default();
                print!("{}", output::render_series(&points, unit));
            }
            Ok(Outcome::Success)
        }

        Commands::Status { detailed, data } => {
            let store = io::load(data_path(data, settings))?;
            print!("{}", output::render_status(&store, detailed));
            if detailed {
                println!("\nDetector configuration:");
                println!("{}", serde_json::to_string_pretty(&settings.detector)?);
            }
            Ok(Outcome::Success)
        }
    }
}

fn data_path(data: Option<PathBuf>, settings: &Settings) -> PathBuf {
    data.or_else(|| settings.data_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

fn read_entry(path: &Path) -> Result<CommitEntry> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read entry {}", path.display()))?;
    let entry =
        decode_entry(&text).with_context(|| format!("invalid entry {}", path.display()))?;
    debug!(
        tool = entry.tool(),
        commit = entry.commit().short_id(),
        benches = entry.benches().len(),
        "Read entry"
    );
    Ok(entry)
}

fn print_report(report: &DetectionReport, detector: &RegressionDetector, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", output::render_report(report, detector.config()));
    }
    Ok(())
}
