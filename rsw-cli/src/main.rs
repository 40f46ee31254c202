//! Sachs-Wolfe column integrals from the command line
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rsw-cli -- run.toml --output-dir results/ --derivatives
//! ```
//!
//! Log output goes to stderr; `RUST_LOG` overrides the default `info` level.

use clap::Parser;
use log::{error, info};
use rsw_core::config::RunConfig;
use rsw_core::errors::RSWResult;
use rsw_core::run::{run, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode;

/// Compute Sachs-Wolfe line-of-sight integrals for every column of a simulation grid
#[derive(Parser, Debug)]
#[command(name = "rsw")]
#[command(version, about)]
struct Args {
    /// TOML run configuration
    config: PathBuf,

    /// Directory for the output tables, overriding `[output] directory`
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write the radial derivative table of the exact field
    #[arg(long)]
    derivatives: bool,

    /// Log per-column progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match execute(&args) {
        Ok(summary) => {
            for (variant, path) in &summary.integral_tables {
                info!("{}: {}", variant, path.display());
            }
            if let Some(path) = &summary.derivative_table {
                info!("derivatives: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> RSWResult<RunSummary> {
    let mut config = RunConfig::from_file(&args.config)?;
    info!("Loaded configuration from {}", args.config.display());

    if let Some(directory) = &args.output_dir {
        config.output.directory = directory.clone();
    }
    if args.derivatives {
        config.derivative.enabled = true;
    }

    run(&config)
}
