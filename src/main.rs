use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use env_logger::Env;
use log::{error, info, warn};
use serde_json::json;

use aidl_preprocess::dispatch::{self, DispatchOptions};
use aidl_preprocess::generator::ScanStats;
use aidl_preprocess::{CancellationToken, Outcome, Project};

/// Generate the aidl preprocess file listing a project's Parcelable classes
#[derive(Parser, Debug)]
#[command(name = "aidl-preprocess", version, about)]
struct Cli {
    /// Project directories to process
    #[arg(default_value = ".")]
    projects: Vec<PathBuf>,

    /// Settings file to use instead of each project's aidl-preprocess.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fully-qualified name of the marker interface
    #[arg(long)]
    marker: Option<String>,

    /// Print one JSON report per project to stdout
    #[arg(long)]
    json: bool,

    /// Do not draw progress spinners
    #[arg(long)]
    no_progress: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Cancellation requested, stopping scans");
                token.cancel();
            }
        });
    }

    let mut seen = HashSet::new();
    let projects: Vec<Project> = cli.projects.iter()
        .map(Project::from_path)
        .filter(|project| seen.insert(project.root.clone()))
        .collect();
    let options = DispatchOptions {
        config: cli.config.clone(),
        marker: cli.marker.clone(),
        show_progress: !cli.no_progress && !cli.json,
    };

    let results = dispatch::run_projects(projects, options, token).await;

    let mut failed = 0;
    let mut totals = ScanStats::default();
    let mut reports = Vec::with_capacity(results.len());

    for entry in &results {
        match &entry.result {
            Ok(report) => {
                totals.merge(&report.stats);
                match report.outcome {
                    Outcome::Written => info!("{}: wrote {}", report.project, report.artifact.display()),
                    Outcome::Skipped => info!("{}: no parcelable classes, nothing written", report.project),
                    Outcome::Cancelled => warn!("{}: cancelled, nothing written", report.project),
                }
                match serde_json::to_value(report) {
                    Ok(value) => reports.push(value),
                    Err(err) => error!("Failed to serialize report for {}: {}", report.project, err),
                }
            }
            Err(err) => {
                failed += 1;
                error!("{:#}", err);
                reports.push(json!({
                    "project": entry.project.name,
                    "error": format!("{:#}", err),
                }));
            }
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{}", text),
            Err(err) => error!("Failed to serialize reports: {}", err),
        }
    }

    info!(
        "{} projects, {} failed, {} parcelable types in {} compilation units",
        results.len(), failed, totals.parcelables, totals.compilation_units
    );

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
