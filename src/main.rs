//! Electricity market dataset builder
//!
//! raw exports -> refined -> optimized -> finalized hourly/daily/weekly tables

use clap::{Parser, Subcommand};
use energy_dataset::{Config, FinalizeReport, Pipeline, StageReport};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "energy-dataset")]
#[command(about = "Build feature-enriched electricity market datasets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to energy-dataset.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Raw source CSVs -> refined CSVs
    Refine,
    /// Refined CSVs -> optimized CSVs
    Normalize,
    /// Optimized CSVs -> finalized hourly/daily/weekly CSVs
    Finalize {
        /// Directory of the optimized feed files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory for the finalized files
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// All three stages in order
    Run,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Refine => {
            let report = Pipeline::new(config).refine()?;
            print_stage("refine", &report);
        }
        Commands::Normalize => {
            let report = Pipeline::new(config).normalize()?;
            print_stage("normalize", &report);
        }
        Commands::Finalize {
            data_dir,
            output_dir,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            let report = Pipeline::new(config).finalize()?;
            print_finalize(&report);
        }
        Commands::Run => {
            let report = Pipeline::new(config).run()?;
            print_finalize(&report);
        }
    }

    Ok(())
}

fn print_stage(stage: &str, report: &StageReport) {
    println!(
        "{}: {} processed, {} skipped, {} failed",
        stage,
        report.processed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for name in &report.failed {
        println!("  failed: {}", name);
    }
}

fn print_finalize(report: &FinalizeReport) {
    println!(
        "finalize: {} rows x {} columns, {} cadence gaps",
        report.rows,
        report.columns,
        report.cadence.gaps.len()
    );
    for path in &report.outputs {
        println!("  wrote {}", path.display());
    }
}
