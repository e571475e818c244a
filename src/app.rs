//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs the grid search
//! - prints reports
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, FamiliesArgs, FitArgs};
use crate::domain::FitConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `isofit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Families(args) => handle_families(&args),
    }
}

/// Log to stderr. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = FitConfig::from(args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.system, &run.family, &run.search, &config)
    );
    println!("{}", crate::report::format_top(&run.search, config.top_n));

    if config.show_residuals {
        if let Some(residuals) = &run.best_residuals {
            println!("{}", crate::report::format_residuals(residuals));
        }
    }

    if let Some(path) = &config.export {
        crate::io::export::write_results_table(path, &run.search)?;
        tracing::info!(path = %path.display(), "wrote likelihood table");
    }

    Ok(())
}

fn handle_families(args: &FamiliesArgs) -> Result<(), AppError> {
    let registry = pipeline::load_registry(args.registry.as_deref())?;
    print!("{}", crate::report::format_families(&registry));
    Ok(())
}
