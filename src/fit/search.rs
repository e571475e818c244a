//! Exhaustive maximum-likelihood search over a family's grid.
//!
//! Grid points are visited [alpha/Fe] outer, [Fe/H] middle, age inner. Each
//! point is loaded, compared and scored independently; the running maximum
//! uses a strict `>` so the first point seen wins a tie. In parallel mode the
//! points are evaluated on the rayon pool and selection still runs in
//! enumeration order, so both modes pick the same point.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{Comparable, Property};
use crate::error::{AppError, EXIT_SEARCH};
use crate::fit::likelihood::{likelihood, Likelihood};
use crate::fit::residuals::{compute_residuals, resolve_comparisons, ResidualTable};
use crate::models::{FamilyDescriptor, GridPoint, LoadError, ModelInstance, ModelLoader};

/// Number of leading theory values kept per grid point.
pub const THEORY_COLUMNS: usize = 4;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub independent: Property,
    /// `None` compares every interpolable property except the independent one.
    pub compare: Option<Vec<Property>>,
    pub parallel: bool,
}

impl SearchOptions {
    pub fn new(independent: Property) -> Self {
        Self {
            independent,
            compare: None,
            parallel: false,
        }
    }

    pub fn with_compare(mut self, compare: Vec<Property>) -> Self {
        self.compare = Some(compare);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Score of one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPointRecord {
    pub point: GridPoint,
    pub likelihood: Likelihood,
    /// The primary star's first theory values, in comparison order.
    pub theory: [Option<f64>; THEORY_COLUMNS],
}

impl GridPointRecord {
    pub fn age_gyr(&self) -> f64 {
        self.point.age_gyr()
    }

    pub fn feh(&self) -> f64 {
        self.point.feh
    }

    pub fn afe(&self) -> f64 {
        self.point.afe
    }

    fn from_residuals(point: GridPoint, residuals: &ResidualTable) -> Self {
        let mut theory = [None; THEORY_COLUMNS];
        if let Some(primary) = residuals.rows.first() {
            for (slot, record) in theory.iter_mut().zip(primary.records.iter()) {
                *slot = record.theory.value();
            }
        }
        Self {
            point,
            likelihood: likelihood(residuals),
            theory,
        }
    }
}

/// A grid point whose table could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Unavailable {
    pub point: GridPoint,
    pub reason: LoadError,
}

/// Full search output.
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub family: String,
    /// Index into `records` of the maximum-likelihood point.
    pub best_index: usize,
    /// Scored points in enumeration order.
    pub records: Vec<GridPointRecord>,
    /// Points skipped because their table was unavailable.
    pub unavailable: Vec<Unavailable>,
    pub grid_size: usize,
}

impl GridSearch {
    pub fn best(&self) -> &GridPointRecord {
        &self.records[self.best_index]
    }

    pub fn into_best(mut self) -> GridPointRecord {
        self.records.swap_remove(self.best_index)
    }

    /// Records sorted by descending likelihood; ties keep enumeration order.
    pub fn ranked(&self) -> Vec<&GridPointRecord> {
        let mut ranked: Vec<&GridPointRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| b.likelihood.ln_value.total_cmp(&a.likelihood.ln_value));
        ranked
    }
}

enum Outcome {
    Scored(GridPointRecord),
    Unavailable(Unavailable),
}

/// Best grid point only.
pub fn best_fit<S, L>(
    subject: &S,
    family: &FamilyDescriptor,
    loader: &L,
    options: &SearchOptions,
) -> Result<GridPointRecord, AppError>
where
    S: Comparable + Sync + ?Sized,
    L: ModelLoader + ?Sized,
{
    best_fit_all(subject, family, loader, options).map(GridSearch::into_best)
}

/// Every grid point, plus the index of the best one.
pub fn best_fit_all<S, L>(
    subject: &S,
    family: &FamilyDescriptor,
    loader: &L,
    options: &SearchOptions,
) -> Result<GridSearch, AppError>
where
    S: Comparable + Sync + ?Sized,
    L: ModelLoader + ?Sized,
{
    // Reject bad options once, before touching any table.
    resolve_comparisons(options.independent, options.compare.as_deref())?;

    let points = family.grid_points();
    info!(
        family = %family.name,
        grid_size = points.len(),
        independent = %options.independent,
        parallel = options.parallel,
        "starting grid search"
    );

    let evaluate = |point: &GridPoint| evaluate_point(subject, family, loader, *point, options);
    let outcomes: Vec<Outcome> = if options.parallel {
        points.par_iter().map(evaluate).collect::<Result<_, _>>()?
    } else {
        points.iter().map(evaluate).collect::<Result<_, _>>()?
    };

    let mut records: Vec<GridPointRecord> = Vec::with_capacity(outcomes.len());
    let mut unavailable = Vec::new();
    let mut best_index: Option<usize> = None;
    for outcome in outcomes {
        match outcome {
            Outcome::Unavailable(u) => {
                debug!(point = %u.point, reason = %u.reason, "grid point unavailable");
                unavailable.push(u);
            }
            Outcome::Scored(record) => {
                let better = match best_index {
                    None => true,
                    // ln is monotonic and does not underflow.
                    Some(b) => record.likelihood.ln_value > records[b].likelihood.ln_value,
                };
                if better {
                    best_index = Some(records.len());
                }
                records.push(record);
            }
        }
    }

    let Some(best_index) = best_index else {
        return Err(AppError::new(
            EXIT_SEARCH,
            format!(
                "No grid point of {} could be scored ({} of {} unavailable).",
                family.name,
                unavailable.len(),
                points.len()
            ),
        ));
    };

    let search = GridSearch {
        family: family.name.clone(),
        best_index,
        records,
        unavailable,
        grid_size: points.len(),
    };
    let best = search.best();
    info!(
        best = %best.point,
        likelihood = best.likelihood.value,
        used = best.likelihood.used,
        expected = best.likelihood.expected,
        scored = search.records.len(),
        unavailable = search.unavailable.len(),
        "grid search finished"
    );
    if best.likelihood.is_degenerate() {
        warn!(best = %best.point, "best grid point has no usable comparison");
    }
    Ok(search)
}

fn evaluate_point<S, L>(
    subject: &S,
    family: &FamilyDescriptor,
    loader: &L,
    point: GridPoint,
    options: &SearchOptions,
) -> Result<Outcome, AppError>
where
    S: Comparable + ?Sized,
    L: ModelLoader + ?Sized,
{
    let table = match loader.load(family, &point) {
        Ok(table) => table,
        Err(reason) => return Ok(Outcome::Unavailable(Unavailable { point, reason })),
    };
    let model = ModelInstance::new(point, table);
    let residuals = compute_residuals(subject, &model, options.independent, options.compare.as_deref())?;
    Ok(Outcome::Scored(GridPointRecord::from_residuals(point, &residuals)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Star, StellarSystem};
    use crate::error::EXIT_USAGE;
    use crate::fit::fixtures::{family, shifted_table, solar_star, solar_table};
    use crate::models::MemoryLoader;

    #[test]
    fn single_point_grid_returns_that_point() {
        let fam = family(vec![1.0e9], vec![0.0], vec![0.0]);
        let loader = MemoryLoader::new().with(GridPoint::new(1.0e9, 0.0, 0.0), solar_table());
        for parallel in [false, true] {
            let options = SearchOptions::new(Property::Mass).with_parallel(parallel);
            let best = best_fit(&solar_star(), &fam, &loader, &options).unwrap();
            assert!(best.point.matches(&GridPoint::new(1.0e9, 0.0, 0.0)));

            let all = best_fit_all(&solar_star(), &fam, &loader, &options).unwrap();
            assert_eq!(all.best_index, 0);
            assert_eq!(all.records.len(), 1);
            assert_eq!(all.records[0], best);
        }
    }

    #[test]
    fn solar_star_prefers_the_matching_grid_point() {
        let fam = family(vec![1.0e9], vec![0.0, 0.3], vec![0.0]);
        let loader = MemoryLoader::new()
            .with(GridPoint::new(1.0e9, 0.0, 0.0), solar_table())
            .with(GridPoint::new(1.0e9, 0.3, 0.0), shifted_table());
        let search = best_fit_all(&solar_star(), &fam, &loader, &SearchOptions::new(Property::Mass)).unwrap();

        assert_eq!(search.best_index, 0);
        let (good, worse) = (&search.records[0], &search.records[1]);
        assert_eq!(good.feh(), 0.0);
        assert_eq!(worse.feh(), 0.3);
        assert!(good.likelihood.value > worse.likelihood.value);
        assert_eq!(good.theory, [Some(5800.0), Some(1.0), Some(1.0), None]);
        // teff, radius, luminosity and Z/X; logg is unobserved.
        assert_eq!((good.likelihood.used, good.likelihood.expected), (4, 5));
    }

    #[test]
    fn out_of_domain_star_scores_exactly_one() {
        let fam = family(vec![1.0e9], vec![0.0], vec![0.0]);
        let loader = MemoryLoader::new().with(GridPoint::new(1.0e9, 0.0, 0.0), solar_table());
        let star = solar_star().with(Property::Mass, 1.5, 0.1);
        let best = best_fit(&star, &fam, &loader, &SearchOptions::new(Property::Mass)).unwrap();
        assert_eq!(best.likelihood.value, 1.0);
        assert!(best.likelihood.is_degenerate());
        assert_eq!(best.theory, [None; THEORY_COLUMNS]);
    }

    #[test]
    fn ties_go_to_the_first_point_in_both_modes() {
        let ages = vec![1.0e9, 2.0e9, 3.0e9];
        let fam = family(ages.clone(), vec![-0.5, 0.0], vec![0.0, 0.2]);
        let mut loader = MemoryLoader::new();
        for point in fam.grid_points() {
            loader.insert(point, solar_table());
        }
        let seq = best_fit_all(&solar_star(), &fam, &loader, &SearchOptions::new(Property::Mass)).unwrap();
        let par = best_fit_all(
            &solar_star(),
            &fam,
            &loader,
            &SearchOptions::new(Property::Mass).with_parallel(true),
        )
        .unwrap();

        assert_eq!(seq.records.len(), fam.grid_size());
        assert_eq!(seq.records, par.records);
        assert_eq!(seq.best_index, par.best_index);
        // Z/X prefers [Fe/H] = 0 over -0.5; ages tie, so the first age wins.
        let best = seq.best();
        assert_eq!((best.age_gyr(), best.feh(), best.afe()), (1.0, 0.0, 0.0));
        assert_eq!(seq.best_index, 3);
    }

    #[test]
    fn unavailable_points_are_recorded_and_skipped() {
        let fam = family(vec![1.0e9, 2.0e9], vec![0.0], vec![0.0]);
        let loader = MemoryLoader::new().with(GridPoint::new(2.0e9, 0.0, 0.0), solar_table());
        let search = best_fit_all(&solar_star(), &fam, &loader, &SearchOptions::new(Property::Mass)).unwrap();
        assert_eq!(search.records.len(), 1);
        assert_eq!(search.unavailable.len(), 1);
        assert!(matches!(search.unavailable[0].reason, LoadError::MissingGridPoint { .. }));
        assert_eq!(search.best().age_gyr(), 2.0);
    }

    #[test]
    fn nothing_scorable_is_a_search_error() {
        let fam = family(vec![1.0e9], vec![0.0], vec![0.0]);
        let err = best_fit(&solar_star(), &fam, &MemoryLoader::new(), &SearchOptions::new(Property::Mass)).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_SEARCH);
    }

    #[test]
    fn invalid_options_fail_before_loading() {
        let fam = family(vec![1.0e9], vec![0.0], vec![0.0]);
        let options = SearchOptions::new(Property::FeH);
        let err = best_fit(&solar_star(), &fam, &MemoryLoader::new(), &options).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn binary_search_uses_every_component() {
        let fam = family(vec![1.0e9], vec![0.0, 0.3], vec![0.0]);
        let loader = MemoryLoader::new()
            .with(GridPoint::new(1.0e9, 0.0, 0.0), solar_table())
            .with(GridPoint::new(1.0e9, 0.3, 0.0), shifted_table());
        let secondary = Star::new("B")
            .with(Property::Mass, 0.9, 0.05)
            .with(Property::Teff, 5690.0, 40.0)
            .with(Property::FeH, 0.0, 0.05);
        let system = StellarSystem::binary("AB", solar_star(), secondary);
        let search = best_fit_all(&system, &fam, &loader, &SearchOptions::new(Property::Mass)).unwrap();
        let best = search.best();
        assert_eq!(best.feh(), 0.0);
        // primary: 4 + secondary: teff, Z/X, delta_teff; primary delta_teff is not expected.
        assert_eq!(best.likelihood.used, 7);
    }
}
