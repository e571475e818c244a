//! Shared value types: properties, measurements, and tagged estimates.
//!
//! These types are used by every layer of the engine:
//!
//! - `Property` names an entry in a star's fixed property vector
//! - `Measurement` is an observed `(value, 1-sigma)` pair
//! - `Estimate` carries either a computed number or the reason it is undefined
//! - `Comparison` labels one column of a residual table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// A named stellar property.
///
/// The discriminant order is the star's property-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    Mass,
    Radius,
    Teff,
    Luminosity,
    Logg,
    #[serde(rename = "feh")]
    FeH,
}

impl Property {
    /// Every property in property-vector order.
    pub const ALL: [Property; 6] = [
        Property::Mass,
        Property::Radius,
        Property::Teff,
        Property::Luminosity,
        Property::Logg,
        Property::FeH,
    ];

    /// Properties that can serve as an interpolation axis, in comparison order.
    pub const INTERPOLABLE: [Property; 5] = [
        Property::Mass,
        Property::Teff,
        Property::Radius,
        Property::Luminosity,
        Property::Logg,
    ];

    /// Column name used in model tables and family column maps.
    pub fn name(self) -> &'static str {
        match self {
            Property::Mass => "mass",
            Property::Radius => "radius",
            Property::Teff => "teff",
            Property::Luminosity => "luminosity",
            Property::Logg => "logg",
            Property::FeH => "feh",
        }
    }

    /// Position in the star's property vector.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_interpolable(self) -> bool {
        self != Property::FeH
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mass" | "m" => Ok(Property::Mass),
            "teff" | "t_eff" | "temp" | "t" => Ok(Property::Teff),
            "radius" | "rad" | "r" => Ok(Property::Radius),
            "luminosity" | "lum" | "l" => Ok(Property::Luminosity),
            "logg" | "gravity" => Ok(Property::Logg),
            "feh" | "fe_h" | "[fe/h]" => Ok(Property::FeH),
            _ => Err(AppError::unsupported("property", s)),
        }
    }
}

/// An observed value with its 1-sigma uncertainty.
///
/// JSON accepts `[value, sigma]`, a bare number (sigma = 0), or
/// `{"value": v, "sigma": s}`. A missing uncertainty is treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "MeasurementRepr", into = "(f64, f64)")]
pub struct Measurement {
    pub value: f64,
    pub sigma: f64,
}

impl Measurement {
    pub fn new(value: f64, sigma: f64) -> Self {
        Self { value, sigma }
    }

    pub fn exact(value: f64) -> Self {
        Self { value, sigma: 0.0 }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeasurementRepr {
    Pair((f64, f64)),
    Bare(f64),
    Object {
        value: f64,
        #[serde(default)]
        sigma: f64,
    },
}

impl From<MeasurementRepr> for Measurement {
    fn from(repr: MeasurementRepr) -> Self {
        match repr {
            MeasurementRepr::Pair((value, sigma)) => Measurement::new(value, sigma),
            MeasurementRepr::Bare(value) => Measurement::exact(value),
            MeasurementRepr::Object { value, sigma } => Measurement::new(value, sigma),
        }
    }
}

impl From<Measurement> for (f64, f64) {
    fn from(m: Measurement) -> Self {
        (m.value, m.sigma)
    }
}

/// Why a computed quantity has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    #[error("independent value outside the model table domain")]
    OutOfDomain,
    #[error("observation not available")]
    MissingObservation,
    #[error("model table has no column for this quantity")]
    MissingColumn,
    #[error("division by a zero observed value or uncertainty")]
    SingularRatio,
    #[error("comparison does not apply to this component")]
    NotApplicable,
}

/// A computed quantity: a finite number or the reason there is none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    Value(f64),
    Undefined(UndefinedReason),
}

impl Estimate {
    /// Wrap a number, demoting non-finite results to `SingularRatio`.
    pub fn finite(x: f64) -> Self {
        if x.is_finite() {
            Estimate::Value(x)
        } else {
            Estimate::Undefined(UndefinedReason::SingularRatio)
        }
    }

    /// `num / den`, undefined when `den` is zero.
    pub fn ratio(num: f64, den: f64) -> Self {
        if den == 0.0 {
            return Estimate::Undefined(UndefinedReason::SingularRatio);
        }
        Estimate::finite(num / den)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Estimate::Value(x) => Some(x),
            Estimate::Undefined(_) => None,
        }
    }

    pub fn reason(self) -> Option<UndefinedReason> {
        match self {
            Estimate::Value(_) => None,
            Estimate::Undefined(reason) => Some(reason),
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Estimate::Value(_))
    }

    pub fn and_then(self, f: impl FnOnce(f64) -> Estimate) -> Estimate {
        match self {
            Estimate::Value(x) => f(x),
            undefined => undefined,
        }
    }
}

impl From<Result<f64, UndefinedReason>> for Estimate {
    fn from(r: Result<f64, UndefinedReason>) -> Self {
        match r {
            Ok(x) => Estimate::finite(x),
            Err(reason) => Estimate::Undefined(reason),
        }
    }
}

/// One column of a residual table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// A tabulated property interpolated along the independent axis.
    Property(Property),
    /// Linear metal-to-hydrogen mass-fraction ratio derived from [Fe/H].
    ZOverX,
    /// `T_primary - T_component` for non-primary components.
    TeffDifference,
}

impl Comparison {
    pub fn name(self) -> &'static str {
        match self {
            Comparison::Property(p) => p.name(),
            Comparison::ZOverX => "Z/X",
            Comparison::TeffDifference => "delta_teff",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
