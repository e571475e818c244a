//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! registry -> system JSON -> grid search -> residuals at the best point
//!
//! The CLI then only deals with presentation.

use std::path::Path;

use tracing::{debug, info};

use crate::domain::{FitConfig, StellarSystem};
use crate::error::AppError;
use crate::fit::{best_fit_all, compute_residuals, GridSearch, ResidualTable, SearchOptions};
use crate::io::read_system_json;
use crate::models::{FamilyDescriptor, FamilyRegistry, FileLoader, ModelInstance, ModelLoader};

/// All computed outputs of a single `isofit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub system: StellarSystem,
    pub family: FamilyDescriptor,
    pub search: GridSearch,
    /// Residuals at the best grid point.
    pub best_residuals: Option<ResidualTable>,
}

/// Built-in families, or the registry file when one is given.
pub fn load_registry(path: Option<&Path>) -> Result<FamilyRegistry, AppError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading family registry");
            FamilyRegistry::from_json_file(path)
        }
        None => Ok(FamilyRegistry::builtin()),
    }
}

/// Execute the full fitting pipeline against model files on disk.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let registry = load_registry(config.registry_path.as_deref())?;
    let system = read_system_json(&config.system_path)?;
    let loader = match &config.model_root {
        Some(root) => FileLoader::new(Some(root.clone())),
        None => FileLoader::from_env(),
    };
    run_fit_with(config, &registry, system, &loader)
}

/// Execute the fitting pipeline with an explicit registry, subject and loader.
pub fn run_fit_with<L>(
    config: &FitConfig,
    registry: &FamilyRegistry,
    system: StellarSystem,
    loader: &L,
) -> Result<RunOutput, AppError>
where
    L: ModelLoader + ?Sized,
{
    let family = registry.get(&config.family)?.clone();
    let options = SearchOptions {
        independent: config.independent,
        compare: config.compare.clone(),
        parallel: config.parallel,
    };

    let search = best_fit_all(&system, &family, loader, &options)?;

    // Tables are not kept between grid points, so reload the winner.
    let best = search.best().point;
    let best_residuals = match loader.load(&family, &best) {
        Ok(table) => {
            let model = ModelInstance::new(best, table);
            Some(compute_residuals(&system, &model, options.independent, options.compare.as_deref())?)
        }
        Err(e) => {
            debug!(point = %best, error = %e, "could not reload best grid point");
            None
        }
    };

    Ok(RunOutput {
        system,
        family,
        search,
        best_residuals,
    })
}
