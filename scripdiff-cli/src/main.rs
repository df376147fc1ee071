//! ScripDiff CLI — reconcile the Upstox and Dhan NSE equity catalogs.
//!
//! One command:
//! - `run` — fetch both provider snapshots, reconcile them, write the three
//!   partition CSVs, the run report, and the persistence sinks.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scripdiff_etl::config::PipelineConfig;
use scripdiff_etl::fetch::{FileSource, HttpSource, SnapshotSource};
use scripdiff_etl::pipeline::{run_pipeline, RunOutcome};

#[derive(Parser)]
#[command(
    name = "scripdiff",
    about = "ScripDiff — reconcile Upstox and Dhan NSE equity catalogs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full reconciliation pipeline.
    Run {
        /// Path to a TOML config file. Defaults cover the live endpoints.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for artifacts (overrides config).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Use a local Upstox snapshot instead of downloading (.gz or plain CSV).
        #[arg(long)]
        upstox_file: Option<PathBuf>,

        /// Use a local Dhan snapshot instead of downloading.
        #[arg(long)]
        dhan_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            upstox_file,
            dhan_file,
        } => run_cmd(config, output_dir, upstox_file, dhan_file),
    }
}

fn run_cmd(
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    upstox_file: Option<PathBuf>,
    dhan_file: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let upstox: Box<dyn SnapshotSource> = match upstox_file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(HttpSource::new(config.upstox_url.clone(), true)),
    };
    let dhan: Box<dyn SnapshotSource> = match dhan_file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(HttpSource::new(config.dhan_url.clone(), false)),
    };

    println!("Fetching {} ...", upstox.describe());
    println!("Fetching {} ...", dhan.describe());

    let outcome = run_pipeline(&config, upstox.as_ref(), dhan.as_ref())?;
    print_summary(&outcome);

    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    let report = &outcome.report;

    println!();
    println!("=== Reconciliation Result ===");
    println!(
        "Upstox:         {} raw rows, {} kept, {} unique keys",
        report.upstox.projection.raw_rows, report.upstox.projection.kept_rows, report.reconcile.a_keys
    );
    println!(
        "Dhan:           {} raw rows, {} kept, {} unique keys",
        report.dhan.projection.raw_rows, report.dhan.projection.kept_rows, report.reconcile.b_keys
    );
    println!();
    println!("--- Partition ---");
    println!("Common:         {}", report.reconcile.common_rows);
    println!("Only in Upstox: {}", report.reconcile.only_a_rows);
    println!("Only in Dhan:   {}", report.reconcile.only_b_rows);
    println!();
    println!("--- Sinks ---");
    println!(
        "Document store: {} written, {} skipped (no instrument_key)",
        report.doc_store.written, report.doc_store.skipped_missing_key
    );
    println!("SQLite:         {} rows upserted", report.sqlite_rows);

    for warn in report.warnings() {
        println!("WARNING: {warn}");
    }

    println!();
    for path in &outcome.artifact_paths {
        println!("Wrote: {}", path.display());
    }
}
