//! Gaussian likelihood of a residual table.
//!
//! Every (comparison, star) pair with a defined standardized error `z` and a
//! positive uncertainty `sigma` contributes `z^2` to chi-square and
//! `1 / (sqrt(2 pi) sigma)` to the prefactor product:
//!
//! `L = prod(prefactor) * exp(-chi2 / 2)`
//!
//! The product is accumulated as a sum of logs. Undefined pairs are skipped.

use crate::domain::{Estimate, UndefinedReason};
use crate::fit::residuals::{ResidualRecord, ResidualTable};

/// `ln(sqrt(2 pi))`
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Likelihood {
    pub value: f64,
    pub ln_value: f64,
    pub chi_square: f64,
    /// Pairs that contributed.
    pub used: usize,
    /// Pairs that could have contributed (everything except not-applicable ones).
    pub expected: usize,
}

impl Likelihood {
    /// No comparison contributed; `value` is exactly 1 and carries no information.
    pub fn is_degenerate(&self) -> bool {
        self.used == 0
    }
}

/// Aggregate every record of `table`.
pub fn likelihood(table: &ResidualTable) -> Likelihood {
    likelihood_of(table.records().map(|(_, r)| r))
}

/// Aggregate an arbitrary set of residual records.
pub fn likelihood_of<'a>(records: impl IntoIterator<Item = &'a ResidualRecord>) -> Likelihood {
    let mut chi_square = 0.0;
    let mut ln_prefactor = 0.0;
    let mut used = 0;
    let mut expected = 0;

    for record in records {
        if record.theory == Estimate::Undefined(UndefinedReason::NotApplicable) {
            continue;
        }
        expected += 1;
        let (Estimate::Value(z), Estimate::Value(sigma)) = (record.nsigma, record.sigma) else {
            continue;
        };
        if !(sigma > 0.0 && z.is_finite()) {
            continue;
        }
        chi_square += z * z;
        ln_prefactor -= LN_SQRT_2PI + sigma.ln();
        used += 1;
    }

    let ln_value = ln_prefactor - 0.5 * chi_square;
    Likelihood {
        value: ln_value.exp(),
        ln_value,
        chi_square,
        used,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comparison, Property};
    use crate::fit::residuals::StarResiduals;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn record(z: f64, sigma: f64) -> ResidualRecord {
        ResidualRecord {
            theory: Estimate::Value(1.0),
            error: Estimate::Value(0.0),
            nsigma: Estimate::Value(z),
            sigma: Estimate::Value(sigma),
        }
    }

    fn table(vars: Vec<Comparison>, rows: Vec<Vec<ResidualRecord>>) -> ResidualTable {
        ResidualTable {
            independent: Property::Mass,
            comparison_vars: vars,
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, records)| StarResiduals {
                    name: format!("star{i}"),
                    records,
                })
                .collect(),
        }
    }

    #[test]
    fn matches_direct_gaussian_product() {
        let records = [record(0.5, 2.0), record(-1.0, 0.1)];
        let l = likelihood_of(&records);
        let norm = |s: f64| 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * s);
        let direct = norm(2.0) * norm(0.1) * (-(0.25 + 1.0) / 2.0f64).exp();
        assert!((l.value - direct).abs() < 1e-12 * direct);
        assert_eq!(l.chi_square, 1.25);
        assert_eq!((l.used, l.expected), (2, 2));
    }

    #[test]
    fn undefined_entries_are_skipped_not_zeroed() {
        let missing = ResidualRecord::undefined(UndefinedReason::MissingObservation);
        let with = likelihood_of(&[record(1.0, 0.5), missing]);
        let without = likelihood_of(&[record(1.0, 0.5)]);
        assert_eq!(with.value, without.value);
        assert_eq!((with.used, with.expected), (1, 2));

        let not_applicable = ResidualRecord::undefined(UndefinedReason::NotApplicable);
        assert_eq!(likelihood_of(&[record(1.0, 0.5), not_applicable]).expected, 1);
    }

    #[test]
    fn all_undefined_is_exactly_one() {
        let records = [
            ResidualRecord::undefined(UndefinedReason::OutOfDomain),
            ResidualRecord::undefined(UndefinedReason::OutOfDomain),
        ];
        let l = likelihood_of(&records);
        assert_eq!(l.value, 1.0);
        assert_eq!(l.chi_square, 0.0);
        assert!(l.is_degenerate());
        assert_eq!(l.expected, 2);
    }

    #[test]
    fn invariant_under_column_reordering() {
        let mut rng = StdRng::seed_from_u64(7);
        let z_dist = Normal::new(0.0, 1.5).unwrap();
        let vars = vec![
            Comparison::Property(Property::Teff),
            Comparison::Property(Property::Radius),
            Comparison::Property(Property::Luminosity),
            Comparison::Property(Property::Logg),
            Comparison::ZOverX,
            Comparison::TeffDifference,
        ];
        for _ in 0..50 {
            let rows: Vec<Vec<ResidualRecord>> = (0..3)
                .map(|_| {
                    (0..vars.len())
                        .map(|_| {
                            if rng.gen_bool(0.2) {
                                ResidualRecord::undefined(UndefinedReason::MissingObservation)
                            } else {
                                record(z_dist.sample(&mut rng), rng.gen_range(0.01..5.0))
                            }
                        })
                        .collect()
                })
                .collect();
            let base = likelihood(&table(vars.clone(), rows.clone()));

            let mut order: Vec<usize> = (0..vars.len()).collect();
            order.shuffle(&mut rng);
            let shuffled_vars = order.iter().map(|&j| vars[j]).collect();
            let shuffled_rows = rows
                .iter()
                .map(|row| order.iter().map(|&j| row[j]).collect())
                .collect();
            let shuffled = likelihood(&table(shuffled_vars, shuffled_rows));

            assert_eq!((base.used, base.expected), (shuffled.used, shuffled.expected));
            assert!((base.ln_value - shuffled.ln_value).abs() < 1e-9 * base.ln_value.abs().max(1.0));
        }
    }

    #[test]
    fn non_increasing_in_standardized_error_magnitude() {
        let others = [record(0.3, 1.0), record(-0.7, 0.2)];
        let mut previous = f64::INFINITY;
        for k in 0..40 {
            let z = -0.25 * k as f64;
            let mut records = others.to_vec();
            records.push(record(z, 0.5));
            let l = likelihood_of(&records);
            assert!(l.value <= previous);
            previous = l.value;
        }
    }
}
