//! One-dimensional piecewise-linear interpolation.
//!
//! The axis is sorted on construction, so columns that are not monotonic in
//! table order (e.g. teff along an isochrone) are still usable. Evaluation never
//! extrapolates: anything outside `[x_min, x_max]` is `OutOfDomain`.

use crate::domain::UndefinedReason;

#[derive(Debug, Clone)]
pub struct LinearInterpolant {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LinearInterpolant {
    /// Build from paired samples. Pairs with a non-finite coordinate are dropped.
    ///
    /// Returns `None` if the inputs differ in length or no finite pair remains.
    pub fn new(x: &[f64], y: &[f64]) -> Option<Self> {
        if x.len() != y.len() {
            return None;
        }
        let mut pairs: Vec<(f64, f64)> = x
            .iter()
            .zip(y.iter())
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(&a, &b)| (a, b))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (x, y) = pairs.into_iter().unzip();
        Some(Self { x, y })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.domain();
        x.is_finite() && x >= lo && x <= hi
    }

    pub fn eval(&self, x: f64) -> Result<f64, UndefinedReason> {
        if !self.contains(x) {
            return Err(UndefinedReason::OutOfDomain);
        }
        let i = self.x.partition_point(|&v| v < x);
        if self.x[i] == x {
            return Ok(self.y[i]);
        }
        // contains() guarantees 0 < i < len here.
        let (x0, x1) = (self.x[i - 1], self.x[i]);
        let (y0, y1) = (self.y[i - 1], self.y[i]);
        let t = (x - x0) / (x1 - x0);
        Ok(y0 + (y1 - y0) * t)
    }
}
