//! Loaded model tables.
//!
//! A `ModelTable` is a dense `rows x columns` matrix plus a name -> column map.
//! Values are stored in linear units: logged columns are delogged once, at
//! construction, and a derived radius column is appended for families that do
//! not tabulate one.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};

use crate::domain::Property;
use crate::math::{radius_from_gravity, radius_from_luminosity};
use crate::models::family::{FamilyDescriptor, GridPoint, RadiusSource};
use crate::models::loader::LoadError;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelTable {
    data: DMatrix<f64>,
    columns: BTreeMap<String, usize>,
}

impl ModelTable {
    pub fn new(data: DMatrix<f64>, columns: BTreeMap<String, usize>) -> Result<Self, LoadError> {
        let width = data.ncols();
        if let Some((name, &index)) = columns.iter().find(|(_, i)| **i >= width) {
            return Err(LoadError::BadColumn {
                name: name.clone(),
                index,
                width,
            });
        }
        Ok(Self { data, columns })
    }

    /// Build from parsed rows. All rows must have the same width.
    pub fn from_rows(rows: &[Vec<f64>], columns: BTreeMap<String, usize>) -> Result<Self, LoadError> {
        let Some(width) = rows.first().map(Vec::len) else {
            return Err(LoadError::Malformed {
                line: 0,
                message: "table has no data rows".to_string(),
            });
        };
        if let Some(i) = rows.iter().position(|r| r.len() != width) {
            return Err(LoadError::Malformed {
                line: i + 1,
                message: format!("expected {width} columns, found {}", rows[i].len()),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(DMatrix::from_row_slice(rows.len(), width, &flat), columns)
    }

    /// Build a table the way `family` stores it: delog logged columns and
    /// derive the radius column when the family lacks one.
    pub fn for_family(rows: &[Vec<f64>], family: &FamilyDescriptor) -> Result<Self, LoadError> {
        let mut table = Self::from_rows(rows, family.columns.clone())?;
        for name in &family.logged {
            table.delog(name);
        }
        match family.radius_source {
            RadiusSource::Tabulated => Ok(table),
            RadiusSource::Gravity => {
                let (Some(mass), Some(logg)) = (table.column("mass"), table.column("logg")) else {
                    return Ok(table);
                };
                let radius = mass.iter().zip(logg.iter()).map(|(&m, &g)| radius_from_gravity(m, g));
                Ok(table.with_column("radius", radius.collect()))
            }
            RadiusSource::StefanBoltzmann => {
                let (Some(lum), Some(teff)) = (table.column("luminosity"), table.column("teff")) else {
                    return Ok(table);
                };
                let radius = lum.iter().zip(teff.iter()).map(|(&l, &t)| radius_from_luminosity(l, t));
                Ok(table.with_column("radius", radius.collect()))
            }
        }
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Copy of a named column, if the table has it.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let i = self.column_index(name)?;
        Some(self.data.column(i).iter().copied().collect())
    }

    pub fn property(&self, property: Property) -> Option<Vec<f64>> {
        self.column(property.name())
    }

    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        (i < self.n_rows()).then(|| self.data.row(i).iter().copied().collect())
    }

    fn delog(&mut self, name: &str) {
        if let Some(i) = self.column_index(name) {
            self.data.column_mut(i).apply(|v| *v = 10f64.powf(*v));
        }
    }

    /// Append (or replace) a named column.
    pub fn with_column(self, name: &str, values: Vec<f64>) -> Self {
        let Self { data, mut columns } = self;
        let width = data.ncols();
        let mut data = data.insert_column(width, 0.0);
        data.set_column(width, &DVector::from_vec(values));
        columns.insert(name.to_string(), width);
        Self { data, columns }
    }
}

/// A table together with the grid point it was loaded for.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub point: GridPoint,
    pub table: ModelTable,
}

impl ModelInstance {
    pub fn new(point: GridPoint, table: ModelTable) -> Self {
        Self { point, table }
    }
}
