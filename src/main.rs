//! jarshade - Shadow jar builder CLI tool
//!
//! Merges compiled classes with their dependency jars into one jar,
//! relocating selected packages under a private namespace:
//! - Maven dependencies (resolved transitively) and local jars
//! - Path and class file reference relocation
//! - Exclusions, duplicate and conflict handling

use anyhow::Context;
use clap::Parser;
use jarshade::cli::CliArgs;
use jarshade::config::{ShadeConfig, ShadePlan};
use jarshade::error::{AppError, ConfigError};
use jarshade::orchestrator::Orchestrator;
use jarshade::output::{create_formatter, OutputConfig};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose, args.quiet);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = e.downcast_ref::<AppError>().map_or(1, AppError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over the flags
fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else if verbose {
            EnvFilter::new("jarshade=debug,info")
        } else {
            EnvFilter::new("jarshade=warn,error")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose)
        .compact()
        .init();
}

/// Load the configuration file (if any), overlay the CLI and validate
fn load_plan(args: &CliArgs) -> Result<ShadePlan, ConfigError> {
    let mut config = match args.config_path() {
        Some(path) => ShadeConfig::load(&path)?,
        None => ShadeConfig::default(),
    };
    config.apply_cli(args);
    config.into_plan(args.dry_run)
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<()> {
    let plan = load_plan(&args).map_err(AppError::from)?;

    // Print plan info in verbose mode
    if args.verbose {
        eprintln!("jarshade v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Input: {}", plan.input.display());
        eprintln!("Output: {}", plan.output.display());
        for rule in plan.relocator.rules() {
            eprintln!("Relocate: {}", rule);
        }
        if args.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let show_progress = !args.quiet && !args.json && io::stderr().is_terminal();
    let report = Orchestrator::new(plan)
        .run_with_progress(show_progress)
        .await?;

    // Create output formatter based on CLI options
    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.dry_run);
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter
        .format(&report, &mut stdout)
        .context("Failed to write report")?;
    stdout.flush()?;

    Ok(())
}
