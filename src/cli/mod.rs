//! Command-line parsing for the isochrone fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code. Everything here ends up in a `FitConfig`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{FitConfig, Property};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "isofit", version, about = "Fit stars and stellar systems to isochrone grids")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins if set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search a family's grid for the maximum-likelihood isochrone.
    Fit(FitArgs),
    /// List known model families and their grid sizes.
    Families(FamiliesArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Star or system JSON file.
    #[arg(short, long, value_name = "JSON")]
    pub system: PathBuf,

    /// Model family (name or alias, case-insensitive).
    #[arg(short, long, default_value = "Dartmouth")]
    pub family: String,

    /// Interpolation axis: mass, teff, radius, luminosity or logg.
    #[arg(short, long, default_value = "mass", value_parser = parse_property)]
    pub independent: Property,

    /// Properties to compare (comma separated). Defaults to all but the independent one.
    #[arg(short, long, value_delimiter = ',', value_parser = parse_property)]
    pub compare: Vec<Property>,

    /// Model grid directory. Defaults to the family's environment variable.
    #[arg(long, value_name = "DIR")]
    pub model_root: Option<PathBuf>,

    /// JSON family registry replacing the built-in families.
    #[arg(long, value_name = "JSON")]
    pub registry: Option<PathBuf>,

    /// Write the per-grid-point likelihood table here.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Evaluate grid points in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Show the top-N grid points.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Print the per-star residual breakdown at the best grid point.
    #[arg(long)]
    pub residuals: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct FamiliesArgs {
    /// JSON family registry replacing the built-in families.
    #[arg(long, value_name = "JSON")]
    pub registry: Option<PathBuf>,
}

fn parse_property(s: &str) -> Result<Property, String> {
    s.parse::<Property>().map_err(|e| e.to_string())
}

impl From<&FitArgs> for FitConfig {
    fn from(args: &FitArgs) -> Self {
        FitConfig {
            system_path: args.system.clone(),
            family: args.family.clone(),
            independent: args.independent,
            compare: (!args.compare.is_empty()).then(|| args.compare.clone()),
            model_root: args.model_root.clone(),
            registry_path: args.registry.clone(),
            export: args.export.clone(),
            parallel: args.parallel,
            top_n: args.top,
            show_residuals: args.residuals,
        }
    }
}
