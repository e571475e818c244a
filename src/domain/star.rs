//! Observed stars.

use serde::{Deserialize, Serialize};

use crate::domain::{Measurement, Property};

/// A single observed star.
///
/// Unset properties are `None`, which is distinct from a measured zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Star {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<Measurement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<Measurement>,
    #[serde(default, alias = "Teff", skip_serializing_if = "Option::is_none")]
    pub teff: Option<Measurement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luminosity: Option<Measurement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logg: Option<Measurement>,
    #[serde(default, alias = "Fe_H", skip_serializing_if = "Option::is_none")]
    pub feh: Option<Measurement>,
}

impl Star {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, property: Property, value: f64, sigma: f64) -> Self {
        self.set(property, Some(Measurement::new(value, sigma)));
        self
    }

    pub fn get(&self, property: Property) -> Option<Measurement> {
        match property {
            Property::Mass => self.mass,
            Property::Radius => self.radius,
            Property::Teff => self.teff,
            Property::Luminosity => self.luminosity,
            Property::Logg => self.logg,
            Property::FeH => self.feh,
        }
    }

    pub fn set(&mut self, property: Property, measurement: Option<Measurement>) {
        let slot = match property {
            Property::Mass => &mut self.mass,
            Property::Radius => &mut self.radius,
            Property::Teff => &mut self.teff,
            Property::Luminosity => &mut self.luminosity,
            Property::Logg => &mut self.logg,
            Property::FeH => &mut self.feh,
        };
        *slot = measurement;
    }

    /// The fixed property vector, indexed by `Property::index`.
    pub fn properties(&self) -> [Option<Measurement>; 6] {
        Property::ALL.map(|p| self.get(p))
    }
}
