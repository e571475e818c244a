//! Interpolation and residuals for one model instance.
//!
//! For every star of a `Comparable` subject the model table is interpolated at
//! the star's observed independent value, and each comparison gets a residual
//! record: theory, relative error `(obs - theory) / obs` and standardized error
//! `(obs - theory) / sigma`. Per-entry failures are carried as
//! `Estimate::Undefined` and never abort the table.

use tracing::debug;

use crate::domain::{Comparable, Comparison, Estimate, Measurement, Property, Star, UndefinedReason};
use crate::error::AppError;
use crate::math::{z_over_x, z_over_x_sigma, LinearInterpolant};
use crate::models::ModelInstance;

/// Residuals of one (star, comparison) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualRecord {
    pub theory: Estimate,
    pub error: Estimate,
    pub nsigma: Estimate,
    /// Uncertainty the standardized error was divided by.
    pub sigma: Estimate,
}

impl ResidualRecord {
    pub fn undefined(reason: UndefinedReason) -> Self {
        let u = Estimate::Undefined(reason);
        Self {
            theory: u,
            error: u,
            nsigma: u,
            sigma: u,
        }
    }

    /// Compare an observation with a theory value.
    fn compare(observed: Measurement, theory: Estimate) -> Self {
        let error = theory.and_then(|t| Estimate::ratio(observed.value - t, observed.value));
        let nsigma = theory.and_then(|t| Estimate::ratio(observed.value - t, observed.sigma));
        let sigma = if observed.sigma > 0.0 {
            Estimate::Value(observed.sigma)
        } else {
            Estimate::Undefined(UndefinedReason::SingularRatio)
        };
        Self {
            theory,
            error,
            nsigma,
            sigma,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarResiduals {
    pub name: String,
    /// One record per entry of `ResidualTable::comparison_vars`.
    pub records: Vec<ResidualRecord>,
}

/// Residuals of a whole subject against one model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualTable {
    pub independent: Property,
    pub comparison_vars: Vec<Comparison>,
    /// One row per star, primary first.
    pub rows: Vec<StarResiduals>,
}

impl ResidualTable {
    pub fn n_stars(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, comparison: Comparison) -> Option<usize> {
        self.comparison_vars.iter().position(|c| *c == comparison)
    }

    pub fn theory(&self) -> Vec<Vec<Estimate>> {
        self.project(|r| r.theory)
    }

    pub fn errors(&self) -> Vec<Vec<Estimate>> {
        self.project(|r| r.error)
    }

    pub fn nsigma(&self) -> Vec<Vec<Estimate>> {
        self.project(|r| r.nsigma)
    }

    pub fn records(&self) -> impl Iterator<Item = (&Comparison, &ResidualRecord)> {
        self.rows
            .iter()
            .flat_map(|row| self.comparison_vars.iter().zip(row.records.iter()))
    }

    fn project(&self, f: impl Fn(&ResidualRecord) -> Estimate) -> Vec<Vec<Estimate>> {
        self.rows
            .iter()
            .map(|row| row.records.iter().map(&f).collect())
            .collect()
    }
}

/// Properties compared against the model, in canonical column order.
///
/// `compare` narrows the default set (every interpolable property except the
/// independent one). `[Fe/H]` is always compared through `Z/X` and cannot be
/// listed explicitly.
pub fn resolve_comparisons(independent: Property, compare: Option<&[Property]>) -> Result<Vec<Property>, AppError> {
    if !independent.is_interpolable() {
        return Err(AppError::unsupported("independent variable", independent.name()));
    }
    if let Some(list) = compare {
        if let Some(p) = list.iter().find(|p| !p.is_interpolable()) {
            return Err(AppError::unsupported("comparison property", p.name()));
        }
    }
    Ok(Property::INTERPOLABLE
        .iter()
        .copied()
        .filter(|p| *p != independent)
        .filter(|p| compare.is_none_or(|list| list.contains(p)))
        .collect())
}

/// Column layout for a subject with `n_stars` components.
pub fn comparison_vars(properties: &[Property], n_stars: usize) -> Vec<Comparison> {
    let mut vars: Vec<Comparison> = properties.iter().map(|p| Comparison::Property(*p)).collect();
    vars.push(Comparison::ZOverX);
    if n_stars > 1 {
        vars.push(Comparison::TeffDifference);
    }
    vars
}

/// Interpolants for one model instance, built once and shared by every star.
struct Interpolants {
    independent: Property,
    axis: Option<(f64, f64)>,
    properties: Vec<(Property, Option<LinearInterpolant>)>,
    teff: Option<LinearInterpolant>,
}

impl Interpolants {
    fn build(model: &ModelInstance, independent: Property, properties: &[Property], need_teff: bool) -> Self {
        let axis_values = model.table.property(independent);
        let axis = axis_values.as_deref().and_then(finite_range);
        let build_one = |p: Property| -> Option<LinearInterpolant> {
            let x = axis_values.as_deref()?;
            let y = model.table.property(p)?;
            let interp = LinearInterpolant::new(x, &y);
            if interp.is_none() {
                debug!(point = %model.point, property = %p, "no finite samples to interpolate");
            }
            interp
        };
        Self {
            independent,
            axis,
            properties: properties.iter().map(|&p| (p, build_one(p))).collect(),
            teff: if need_teff && independent != Property::Teff {
                build_one(Property::Teff)
            } else {
                None
            },
        }
    }

    /// The star's independent value, if the star sits on the table's axis.
    fn locate(&self, star: &Star) -> Result<f64, UndefinedReason> {
        let x = star
            .get(self.independent)
            .ok_or(UndefinedReason::MissingObservation)?
            .value;
        let (lo, hi) = self.axis.ok_or(UndefinedReason::MissingColumn)?;
        if x.is_finite() && x >= lo && x <= hi {
            Ok(x)
        } else {
            Err(UndefinedReason::OutOfDomain)
        }
    }

    /// Model temperature for `star`.
    fn model_teff(&self, star: &Star) -> Estimate {
        if self.independent == Property::Teff {
            return match star.teff {
                Some(m) => Estimate::finite(m.value),
                None => Estimate::Undefined(UndefinedReason::MissingObservation),
            };
        }
        let x = match self.locate(star) {
            Ok(x) => x,
            Err(reason) => return Estimate::Undefined(reason),
        };
        match &self.teff {
            Some(f) => f.eval(x).into(),
            None => Estimate::Undefined(UndefinedReason::MissingColumn),
        }
    }
}

/// Compare every star of `subject` with `model`.
///
/// Fails only on unsupported options; everything numeric is recorded per entry.
pub fn compute_residuals<S>(
    subject: &S,
    model: &ModelInstance,
    independent: Property,
    compare: Option<&[Property]>,
) -> Result<ResidualTable, AppError>
where
    S: Comparable + ?Sized,
{
    let properties = resolve_comparisons(independent, compare)?;
    let stars = subject.stars();
    let comparison_vars = comparison_vars(&properties, stars.len());
    let interps = Interpolants::build(model, independent, &properties, stars.len() > 1);
    let model_zx = z_over_x(model.point.feh);
    let primary_teff = stars.first().map(|s| interps.model_teff(s));

    let rows = stars
        .iter()
        .enumerate()
        .map(|(i, star)| {
            let x = match interps.locate(star) {
                Ok(x) => x,
                Err(reason) => {
                    return StarResiduals {
                        name: star.name.clone(),
                        records: comparison_vars
                            .iter()
                            .map(|c| match (c, i) {
                                (Comparison::TeffDifference, 0) => {
                                    ResidualRecord::undefined(UndefinedReason::NotApplicable)
                                }
                                _ => ResidualRecord::undefined(reason),
                            })
                            .collect(),
                    };
                }
            };

            let mut records: Vec<ResidualRecord> = interps
                .properties
                .iter()
                .map(|(p, interp)| match (star.get(*p), interp) {
                    (None, _) => ResidualRecord::undefined(UndefinedReason::MissingObservation),
                    (Some(_), None) => ResidualRecord::undefined(UndefinedReason::MissingColumn),
                    (Some(obs), Some(f)) => ResidualRecord::compare(obs, f.eval(x).into()),
                })
                .collect();

            records.push(match star.feh {
                None => ResidualRecord::undefined(UndefinedReason::MissingObservation),
                Some(feh) => {
                    let observed = Measurement::new(z_over_x(feh.value), z_over_x_sigma(feh.value, feh.sigma));
                    let mut record = ResidualRecord::compare(observed, Estimate::finite(model_zx));
                    if feh.sigma == 0.0 {
                        record.nsigma = Estimate::Undefined(UndefinedReason::SingularRatio);
                        record.sigma = Estimate::Undefined(UndefinedReason::SingularRatio);
                    }
                    record
                }
            });

            if stars.len() > 1 {
                records.push(if i == 0 {
                    ResidualRecord::undefined(UndefinedReason::NotApplicable)
                } else {
                    match (subject.teff_difference(i), primary_teff) {
                        (None, _) => ResidualRecord::undefined(UndefinedReason::MissingObservation),
                        (Some(observed), Some(tp)) => {
                            let theory = tp.and_then(|tp| {
                                interps.model_teff(star).and_then(|ti| Estimate::finite(tp - ti))
                            });
                            ResidualRecord::compare(observed, theory)
                        }
                        (Some(_), None) => ResidualRecord::undefined(UndefinedReason::MissingObservation),
                    }
                });
            }

            StarResiduals {
                name: star.name.clone(),
                records,
            }
        })
        .collect();

    Ok(ResidualTable {
        independent,
        comparison_vars,
        rows,
    })
}

fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
