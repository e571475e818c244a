//! Run configuration as understood by the pipeline.

use std::path::PathBuf;

use crate::domain::Property;

/// A full run's configuration.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// JSON file describing the star or system to fit.
    pub system_path: PathBuf,
    /// Model family name, resolved against the registry.
    pub family: String,
    /// Interpolation axis.
    pub independent: Property,
    /// Explicit comparison list; `None` means every other interpolable property.
    pub compare: Option<Vec<Property>>,
    /// Model grid root directory. Falls back to the family's environment variable.
    pub model_root: Option<PathBuf>,
    /// Optional JSON registry replacing the built-in families.
    pub registry_path: Option<PathBuf>,
    /// Write the full likelihood table here.
    pub export: Option<PathBuf>,
    /// Evaluate grid points on the rayon pool.
    pub parallel: bool,
    /// Number of top-ranked grid points to print.
    pub top_n: usize,
    /// Print the residual breakdown at the best grid point.
    pub show_residuals: bool,
}
