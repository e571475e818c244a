//! Synthetic stars and model tables shared by the fit tests.

use std::collections::BTreeMap;

use crate::domain::{Property, Star};
use crate::models::{FamilyDescriptor, GridPoint, ModelInstance, ModelTable};

const COLUMNS: [(&str, usize); 5] = [("mass", 0), ("teff", 1), ("radius", 2), ("luminosity", 3), ("logg", 4)];

fn columns() -> BTreeMap<String, usize> {
    COLUMNS.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn table_with_teff(teff: [f64; 3]) -> ModelTable {
    let rows = vec![
        vec![0.9, teff[0], 0.95, 0.9, 4.4],
        vec![1.0, teff[1], 1.0, 1.0, 4.5],
        vec![1.1, teff[2], 1.05, 1.1, 4.6],
    ];
    ModelTable::from_rows(&rows, columns()).expect("fixture table")
}

/// Three rows around one solar mass.
pub fn solar_table() -> ModelTable {
    table_with_teff([5700.0, 5800.0, 5900.0])
}

/// `solar_table` with the temperatures shifted 100 K cooler.
pub fn shifted_table() -> ModelTable {
    table_with_teff([5600.0, 5700.0, 5800.0])
}

pub fn solar_instance(feh: f64) -> ModelInstance {
    ModelInstance::new(GridPoint::new(1.0e9, feh, 0.0), solar_table())
}

pub fn solar_star() -> Star {
    Star::new("Sun-like")
        .with(Property::Mass, 1.0, 0.05)
        .with(Property::Teff, 5770.0, 50.0)
        .with(Property::Radius, 1.0, 0.02)
        .with(Property::Luminosity, 1.0, 0.05)
        .with(Property::FeH, 0.0, 0.05)
}

pub fn family(ages: Vec<f64>, fehs: Vec<f64>, afes: Vec<f64>) -> FamilyDescriptor {
    FamilyDescriptor::new("Synthetic")
        .with_ages(ages)
        .with_metallicities(fehs)
        .with_alpha_enhancements(afes)
        .with_columns(&COLUMNS)
}
