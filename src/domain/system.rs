//! Multi-star systems and the uniform "list of constituent stars" capability.
//!
//! A single `Star` and a `StellarSystem` both implement `Comparable`, so the fit
//! engine never branches on "is this one star or many".

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::domain::{Measurement, Property, Star};

/// Anything that can be compared against a model table.
pub trait Comparable {
    /// Constituent stars, primary first.
    fn stars(&self) -> &[Star];

    /// Observed `T_primary - T_component` for a non-primary component.
    fn teff_difference(&self, component: usize) -> Option<Measurement> {
        let _ = component;
        None
    }

    fn n_components(&self) -> usize {
        self.stars().len()
    }
}

impl Comparable for Star {
    fn stars(&self) -> &[Star] {
        std::slice::from_ref(self)
    }
}

/// Aggregate properties derived from the first two components (and, for sums,
/// from every component). Each carries a propagated uncertainty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregates {
    pub total_mass: Option<Measurement>,
    pub mass_ratio: Option<Measurement>,
    pub total_radius: Option<Measurement>,
    pub radius_ratio: Option<Measurement>,
    pub teff_ratio: Option<Measurement>,
    pub total_luminosity: Option<Measurement>,
    pub luminosity_ratio: Option<Measurement>,
}

/// An ordered collection of component stars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StellarSystem {
    pub name: String,
    stars: Vec<Star>,
    /// Measured temperature differences keyed by component index. These take
    /// precedence over differences derived from component temperatures.
    teff_differences: BTreeMap<usize, Measurement>,
    aggregates: Aggregates,
}

impl StellarSystem {
    pub fn single(star: Star) -> Self {
        Self::from_stars(star.name.clone(), vec![star])
    }

    pub fn binary(name: impl Into<String>, primary: Star, secondary: Star) -> Self {
        Self::from_stars(name.into(), vec![primary, secondary])
    }

    /// Combine systems (or stars) into one; component counts add up and the
    /// star lists are concatenated in order.
    pub fn combine(name: impl Into<String>, parts: Vec<StellarSystem>) -> Self {
        let mut stars = Vec::new();
        let mut teff_differences = BTreeMap::new();
        for part in parts {
            let offset = stars.len();
            // A sub-system's differences are relative to its own primary, which
            // is only the overall primary for the first part.
            if offset == 0 {
                teff_differences.extend(part.teff_differences);
            } else if !part.teff_differences.is_empty() {
                warn!(
                    part = %part.name,
                    dropped = part.teff_differences.len(),
                    "dropping temperature differences not relative to the overall primary"
                );
            }
            stars.extend(part.stars);
        }
        let mut system = Self::from_stars(name.into(), stars);
        system.teff_differences = teff_differences;
        system
    }

    /// Add another component (e.g. a tertiary to a binary).
    pub fn add_component(self, other: impl Into<StellarSystem>) -> Self {
        let name = self.name.clone();
        Self::combine(name, vec![self, other.into()])
    }

    /// Attach a measured temperature difference for `component` (>= 1).
    pub fn with_teff_difference(mut self, component: usize, measurement: Measurement) -> Self {
        if component > 0 && component < self.stars.len() {
            self.teff_differences.insert(component, measurement);
        }
        self
    }

    pub fn has_teff_differences(&self) -> bool {
        !self.teff_differences.is_empty()
    }

    pub fn aggregates(&self) -> &Aggregates {
        &self.aggregates
    }

    fn from_stars(name: String, stars: Vec<Star>) -> Self {
        let aggregates = compute_aggregates(&stars);
        Self {
            name,
            stars,
            teff_differences: BTreeMap::new(),
            aggregates,
        }
    }
}

impl From<Star> for StellarSystem {
    fn from(star: Star) -> Self {
        StellarSystem::single(star)
    }
}

impl Comparable for StellarSystem {
    fn stars(&self) -> &[Star] {
        &self.stars
    }

    fn teff_difference(&self, component: usize) -> Option<Measurement> {
        if component == 0 || component >= self.stars.len() {
            return None;
        }
        if let Some(measured) = self.teff_differences.get(&component) {
            return Some(*measured);
        }
        let primary = self.stars[0].teff?;
        let other = self.stars[component].teff?;
        Some(difference(primary, other))
    }
}

fn compute_aggregates(stars: &[Star]) -> Aggregates {
    let total = |p: Property| -> Option<Measurement> {
        if stars.len() < 2 {
            return None;
        }
        stars
            .iter()
            .map(|s| s.get(p))
            .try_fold(Measurement::exact(0.0), |acc, m| m.map(|m| sum(acc, m)))
    };
    let ratio_of = |p: Property| -> Option<Measurement> {
        let primary = stars.first()?.get(p)?;
        let secondary = stars.get(1)?.get(p)?;
        ratio(secondary, primary)
    };

    Aggregates {
        total_mass: total(Property::Mass),
        mass_ratio: ratio_of(Property::Mass),
        total_radius: total(Property::Radius),
        radius_ratio: ratio_of(Property::Radius),
        teff_ratio: ratio_of(Property::Teff),
        total_luminosity: total(Property::Luminosity),
        luminosity_ratio: ratio_of(Property::Luminosity),
    }
}

fn sum(a: Measurement, b: Measurement) -> Measurement {
    Measurement::new(a.value + b.value, a.sigma.hypot(b.sigma))
}

fn difference(a: Measurement, b: Measurement) -> Measurement {
    Measurement::new(a.value - b.value, a.sigma.hypot(b.sigma))
}

fn ratio(num: Measurement, den: Measurement) -> Option<Measurement> {
    if den.value == 0.0 || num.value == 0.0 {
        return None;
    }
    let q = num.value / den.value;
    let rel = (num.sigma / num.value).hypot(den.sigma / den.value);
    Some(Measurement::new(q, (q * rel).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(name: &str, mass: f64, teff: f64) -> Star {
        Star::new(name)
            .with(Property::Mass, mass, 0.01)
            .with(Property::Teff, teff, 30.0)
    }

    #[test]
    fn single_star_is_a_one_component_system() {
        let s = star("A", 1.0, 5800.0);
        assert_eq!(s.n_components(), 1);
        assert_eq!(StellarSystem::from(s.clone()).stars(), std::slice::from_ref(&s));
    }

    #[test]
    fn binary_aggregates_propagate_uncertainty() {
        let sys = StellarSystem::binary("AB", star("A", 1.0, 5800.0), star("B", 0.8, 5000.0));
        let agg = sys.aggregates();
        let total = agg.total_mass.unwrap();
        assert!((total.value - 1.8).abs() < 1e-12);
        assert!((total.sigma - (2.0f64).sqrt() * 0.01).abs() < 1e-12);
        let q = agg.mass_ratio.unwrap();
        assert!((q.value - 0.8).abs() < 1e-12);
        assert!(q.sigma > 0.0);
    }

    #[test]
    fn teff_difference_is_derived_or_measured() {
        let sys = StellarSystem::binary("AB", star("A", 1.0, 5800.0), star("B", 0.8, 5000.0));
        let derived = sys.teff_difference(1).unwrap();
        assert_eq!(derived.value, 800.0);
        assert!(sys.teff_difference(0).is_none());

        let sys = sys.with_teff_difference(1, Measurement::new(790.0, 5.0));
        assert_eq!(sys.teff_difference(1), Some(Measurement::new(790.0, 5.0)));
    }

    #[test]
    fn nesting_adds_component_counts() {
        let binary = StellarSystem::binary("AB", star("A", 1.0, 5800.0), star("B", 0.8, 5000.0));
        let triple = binary.add_component(star("C", 0.3, 3400.0));
        assert_eq!(triple.n_components(), 3);
        assert_eq!(triple.stars()[2].name, "C");
        assert_eq!(triple.teff_difference(2).unwrap().value, 2400.0);
    }

    #[test]
    fn only_the_first_part_keeps_measured_differences() {
        let ab = StellarSystem::binary("AB", star("A", 1.0, 5800.0), star("B", 0.8, 5000.0))
            .with_teff_difference(1, Measurement::new(790.0, 5.0));
        let cd = StellarSystem::binary("CD", star("C", 0.6, 4200.0), star("D", 0.4, 3600.0))
            .with_teff_difference(1, Measurement::new(610.0, 5.0));
        assert!(cd.has_teff_differences());

        let quad = StellarSystem::combine("ABCD", vec![ab, cd]);
        assert!(quad.has_teff_differences());
        assert_eq!(quad.teff_difference(1), Some(Measurement::new(790.0, 5.0)));
        // Derived relative to A, not CD's measured 610 K.
        assert_eq!(quad.teff_difference(3).unwrap().value, 2200.0);
    }
}
