//! Model family descriptors and the registry that holds them.
//!
//! A family is one published grid of isochrones. Its descriptor lists the grid
//! axes (ages, [Fe/H], [alpha/Fe]), the column layout of its tables, which
//! columns are stored as log10, and how its files are named on disk.
//!
//! The registry is built once (from the built-in families or a JSON file) and
//! passed explicitly to whatever needs it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, EXIT_INPUT};
use crate::models::layout::FileLayout;

/// One (age, [Fe/H], [alpha/Fe]) node of a family's grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Age in years.
    pub age: f64,
    pub feh: f64,
    pub afe: f64,
}

impl GridPoint {
    pub fn new(age: f64, feh: f64, afe: f64) -> Self {
        Self { age, feh, afe }
    }

    pub fn age_gyr(&self) -> f64 {
        self.age / 1.0e9
    }

    pub fn age_myr(&self) -> f64 {
        self.age / 1.0e6
    }

    /// Equality up to floating-point noise in the axis values.
    pub fn matches(&self, other: &GridPoint) -> bool {
        (self.age - other.age).abs() <= 1e-9 * self.age.abs().max(1.0)
            && (self.feh - other.feh).abs() < 1e-9
            && (self.afe - other.afe).abs() < 1e-9
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "age={:.4} Gyr [Fe/H]={:+.2} [a/Fe]={:+.2}",
            self.age_gyr(),
            self.feh,
            self.afe
        )
    }
}

/// How a family provides the radius column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusSource {
    /// The table has a radius column (possibly logged).
    #[default]
    Tabulated,
    /// Derived from the mass and logg columns.
    Gravity,
    /// Derived from the luminosity and teff columns.
    StefanBoltzmann,
}

/// Everything the engine needs to know about one model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Valid ages in years.
    pub ages: Vec<f64>,
    pub metallicities: Vec<f64>,
    pub alpha_enhancements: Vec<f64>,
    /// Quantity name to column index in a loaded table.
    pub columns: BTreeMap<String, usize>,
    /// Quantities stored as log10 in the files.
    #[serde(default)]
    pub logged: BTreeSet<String>,
    #[serde(default)]
    pub radius_source: RadiusSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<FileLayout>,
    /// Leading non-`#` header lines to skip in each file.
    #[serde(default)]
    pub comment_rows: usize,
    /// Environment variable holding the family's model directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

impl FamilyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            ages: Vec::new(),
            metallicities: Vec::new(),
            alpha_enhancements: Vec::new(),
            columns: BTreeMap::new(),
            logged: BTreeSet::new(),
            radius_source: RadiusSource::Tabulated,
            layout: None,
            comment_rows: 0,
            env_var: None,
        }
    }

    pub fn with_ages(mut self, ages: Vec<f64>) -> Self {
        self.ages = ages;
        self
    }

    pub fn with_metallicities(mut self, fehs: Vec<f64>) -> Self {
        self.metallicities = fehs;
        self
    }

    pub fn with_alpha_enhancements(mut self, afes: Vec<f64>) -> Self {
        self.alpha_enhancements = afes;
        self
    }

    pub fn with_columns(mut self, columns: &[(&str, usize)]) -> Self {
        self.columns = columns.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self
    }

    pub fn with_logged(mut self, logged: &[&str]) -> Self {
        self.logged = logged.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_radius_source(mut self, source: RadiusSource) -> Self {
        self.radius_source = source;
        self
    }

    pub fn with_layout(mut self, layout: FileLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_comment_rows(mut self, rows: usize) -> Self {
        self.comment_rows = rows;
        self
    }

    pub fn with_env_var(mut self, var: &str) -> Self {
        self.env_var = Some(var.to_string());
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn is_logged(&self, name: &str) -> bool {
        self.logged.contains(name)
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    pub fn grid_size(&self) -> usize {
        self.alpha_enhancements.len() * self.metallicities.len() * self.ages.len()
    }

    /// Every grid point: [alpha/Fe] outer, [Fe/H] middle, age inner.
    pub fn grid_points(&self) -> Vec<GridPoint> {
        let mut out = Vec::with_capacity(self.grid_size());
        for &afe in &self.alpha_enhancements {
            for &feh in &self.metallicities {
                for &age in &self.ages {
                    out.push(GridPoint::new(age, feh, afe));
                }
            }
        }
        out
    }

    fn validate(&self) -> Result<(), AppError> {
        let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
        if self.ages.is_empty() || self.metallicities.is_empty() || self.alpha_enhancements.is_empty() {
            return Err(AppError::new(
                EXIT_INPUT,
                format!("Family '{}' has an empty grid axis.", self.name),
            ));
        }
        if !(finite(&self.ages) && finite(&self.metallicities) && finite(&self.alpha_enhancements)) {
            return Err(AppError::new(
                EXIT_INPUT,
                format!("Family '{}' has non-finite grid values.", self.name),
            ));
        }
        Ok(())
    }
}

/// Immutable set of known families.
#[derive(Debug, Clone)]
pub struct FamilyRegistry {
    families: Vec<FamilyDescriptor>,
}

impl FamilyRegistry {
    pub fn new(families: Vec<FamilyDescriptor>) -> Result<Self, AppError> {
        for family in &families {
            family.validate()?;
        }
        Ok(Self { families })
    }

    /// Read a registry from a JSON array of family descriptors.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(
                EXIT_INPUT,
                format!("Failed to open family registry '{}': {e}", path.display()),
            )
        })?;
        let families: Vec<FamilyDescriptor> = serde_json::from_reader(file)
            .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid family registry JSON: {e}")))?;
        Self::new(families)
    }

    pub fn builtin() -> Self {
        Self {
            families: builtin_families(),
        }
    }

    /// Look up a family by name or alias (case-insensitive).
    pub fn get(&self, name: &str) -> Result<&FamilyDescriptor, AppError> {
        self.families
            .iter()
            .find(|f| f.answers_to(name))
            .ok_or_else(|| AppError::unsupported("model family", name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FamilyDescriptor> {
        self.families.iter()
    }
}

/// `start, start + step, ...` strictly below `stop`.
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Fine steps below 20 Myr, then 5 Myr steps strictly below `tail_stop`.
fn young_ages(fine_step: f64, tail_stop: f64) -> Vec<f64> {
    let mut ages = arange(1.0e6, 20.0e6, fine_step);
    ages.extend(arange(2.0e7, tail_stop, 5.0e6));
    ages
}

fn lyon_ages() -> Vec<f64> {
    arange(6.0, 10.05, 0.1)
        .into_iter()
        .map(|x| 10f64.powf((x * 10.0).round() / 10.0))
        .collect()
}

fn builtin_families() -> Vec<FamilyDescriptor> {
    let dartmouth_fehs = vec![
        -1.0, -0.9, -0.8, -0.7, -0.6, -0.5, -0.4, -0.3, -0.2, -0.1, 0.0, 0.1, 0.2, 0.3, 0.4, 0.5,
    ];
    let pisa_fehs = vec![
        -1.80, -1.10, -0.80, -0.60, -0.50, -0.40, -0.30, -0.25, -0.20, -0.10, -0.05, 0.00, 0.10,
        0.20, 0.25, 0.30, 0.35, 0.40, 0.45,
    ];
    let lyon_columns = |radius: bool| -> Vec<(&'static str, usize)> {
        let mut cols = vec![("mass", 0), ("teff", 1), ("luminosity", 3)];
        cols.push(if radius { ("radius", 2) } else { ("logg", 2) });
        cols.extend([
            ("Mv", 4),
            ("Mr", 5),
            ("Mi", 6),
            ("Mj", 7),
            ("Mh", 8),
            ("Mk", 9),
            ("ML", 10),
            ("Mm", 11),
        ]);
        cols
    };

    vec![
        FamilyDescriptor::new("Dartmouth")
            .with_ages(arange(1.0e9, 13.01e9, 2.5e8))
            .with_metallicities(dartmouth_fehs)
            .with_alpha_enhancements(vec![0.0, 0.2, 0.4])
            .with_columns(&[
                ("eep", 0),
                ("mass", 1),
                ("logg", 2),
                ("teff", 3),
                ("luminosity", 4),
                ("radius", 5),
                ("Mv", 10),
                ("Mi", 11),
                ("Mj", 12),
                ("Mh", 13),
                ("Mk", 14),
            ])
            .with_logged(&["teff", "radius", "luminosity"])
            .with_layout(FileLayout::FehAfe { prefix: "dmestar".into() })
            .with_env_var("DART_MODEL_PATH"),
        FamilyDescriptor::new("DMESTAR")
            .with_ages(young_ages(1.0e5, 1.001e8))
            .with_metallicities(vec![0.0])
            .with_alpha_enhancements(vec![0.0])
            .with_columns(&[("mass", 0), ("teff", 1), ("logg", 2), ("luminosity", 3), ("radius", 4)])
            .with_logged(&["teff", "radius", "luminosity"])
            .with_layout(FileLayout::FehAfe { prefix: "dmestar".into() })
            .with_env_var("DMES_MODEL_PATH"),
        FamilyDescriptor::new("DSEP08")
            .with_aliases(&["DSEP", "Dartmouth08"])
            .with_ages(young_ages(1.0e5, 1.001e8))
            .with_metallicities(vec![-0.5, 0.0, 0.2, 0.3, 0.5])
            .with_alpha_enhancements(vec![-0.2, 0.0, 0.2, 0.4, 0.8])
            .with_columns(&[("mass", 0), ("teff", 1), ("logg", 2), ("luminosity", 3)])
            .with_logged(&["teff", "luminosity"])
            .with_radius_source(RadiusSource::Gravity)
            .with_layout(FileLayout::FehAfe { prefix: "dsep08".into() })
            .with_env_var("DSEP_MODEL_PATH"),
        FamilyDescriptor::new("Lyon10")
            .with_ages(lyon_ages())
            .with_metallicities(vec![0.0])
            .with_alpha_enhancements(vec![0.0])
            .with_columns(&lyon_columns(false))
            .with_logged(&["luminosity"])
            .with_radius_source(RadiusSource::Gravity)
            .with_layout(FileLayout::Lyon { amlt: "10".into() })
            .with_comment_rows(4)
            .with_env_var("BCAH_MODEL_PATH"),
        FamilyDescriptor::new("Lyon19")
            .with_aliases(&["Lyon", "BCAH98"])
            .with_ages(lyon_ages())
            .with_metallicities(vec![0.0])
            .with_alpha_enhancements(vec![0.0])
            .with_columns(&lyon_columns(true))
            .with_logged(&["luminosity"])
            .with_layout(FileLayout::Lyon { amlt: "19".into() })
            .with_comment_rows(4)
            .with_env_var("BCAH_MODEL_PATH"),
        FamilyDescriptor::new("Pisa")
            .with_ages(young_ages(1.0e6, 1.001e8))
            .with_metallicities(pisa_fehs)
            .with_alpha_enhancements(vec![0.0])
            .with_columns(&[("luminosity", 0), ("teff", 1), ("mass", 2)])
            .with_logged(&["luminosity", "teff"])
            .with_radius_source(RadiusSource::StefanBoltzmann)
            .with_layout(FileLayout::Pisa)
            .with_env_var("PISA_MODEL_PATH"),
        FamilyDescriptor::new("Yale")
            .with_aliases(&["Yale13"])
            .with_ages(young_ages(2.0e5, 1.0e8))
            .with_metallicities(vec![-1.5, -1.0, -0.5, 0.0, 0.3])
            .with_alpha_enhancements(vec![0.0])
            .with_columns(&[("mass", 0), ("luminosity", 1), ("radius", 2), ("logg", 3), ("teff", 4)])
            .with_logged(&["luminosity", "radius", "teff"])
            .with_layout(FileLayout::Yale)
            .with_env_var("YALE_MODEL_PATH"),
        FamilyDescriptor::new("BAton")
            .with_ages(young_ages(2.0e5, 1.0e8))
            .with_metallicities(vec![0.0])
            .with_alpha_enhancements(vec![0.0])
            .with_columns(&[("mass", 0), ("luminosity", 1), ("teff", 2), ("logg", 3)])
            .with_logged(&["teff", "luminosity"])
            .with_radius_source(RadiusSource::Gravity)
            .with_layout(FileLayout::Baton)
            .with_env_var("ATON_MODEL_PATH"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_case_insensitive_and_alias_aware() {
        let registry = FamilyRegistry::builtin();
        assert_eq!(registry.get("dartmouth").unwrap().name, "Dartmouth");
        assert_eq!(registry.get("DSEP").unwrap().name, "DSEP08");
        assert_eq!(registry.get("BCAH98").unwrap().name, "Lyon19");
        assert!(registry.get("Geneva").is_err());
    }

    #[test]
    fn builtin_age_lists_match_published_grids() {
        let registry = FamilyRegistry::builtin();
        let dartmouth = registry.get("Dartmouth").unwrap();
        assert_eq!(dartmouth.ages.len(), 49);
        assert!((dartmouth.ages[48] - 13.0e9).abs() < 1.0);

        let lyon = registry.get("Lyon19").unwrap();
        assert_eq!(lyon.ages.len(), 41);
        assert!((lyon.ages[0] - 1.0e6).abs() < 1e-3);
        assert!((lyon.ages[40] - 1.0e10).abs() < 1.0);

        let dmestar = registry.get("DMESTAR").unwrap();
        assert_eq!(dmestar.ages.len(), 190 + 17);
        assert!((dmestar.ages[206] - 1.0e8).abs() < 1.0);

        let pisa = registry.get("Pisa").unwrap();
        assert_eq!(pisa.ages.len(), 19 + 17);

        // The Yale and BAton tails stop at 95 Myr.
        for name in ["Yale", "BAton"] {
            let ages = &registry.get(name).unwrap().ages;
            assert_eq!(ages.len(), 95 + 16, "{name}");
            assert!((ages[ages.len() - 1] - 9.5e7).abs() < 1.0, "{name}");
        }
    }

    #[test]
    fn grid_points_iterate_alpha_then_feh_then_age() {
        let family = FamilyDescriptor::new("tiny")
            .with_ages(vec![1.0e9, 2.0e9])
            .with_metallicities(vec![-0.1, 0.1])
            .with_alpha_enhancements(vec![0.0, 0.4]);
        let points = family.grid_points();
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], GridPoint::new(1.0e9, -0.1, 0.0));
        assert_eq!(points[1], GridPoint::new(2.0e9, -0.1, 0.0));
        assert_eq!(points[2], GridPoint::new(1.0e9, 0.1, 0.0));
        assert_eq!(points[4], GridPoint::new(1.0e9, -0.1, 0.4));
    }

    #[test]
    fn registry_round_trips_through_json() {
        let registry = FamilyRegistry::builtin();
        let families: Vec<FamilyDescriptor> = registry.iter().cloned().collect();
        let json = serde_json::to_string(&families).unwrap();
        let back: Vec<FamilyDescriptor> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), families.len());
        for (a, b) in back.iter().zip(families.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.columns, b.columns);
            assert_eq!(a.logged, b.logged);
            assert_eq!(a.layout, b.layout);
            assert_eq!(a.grid_size(), b.grid_size());
        }
    }

    #[test]
    fn empty_axis_is_rejected() {
        let family = FamilyDescriptor::new("broken").with_ages(vec![1.0e9]);
        assert!(FamilyRegistry::new(vec![family]).is_err());
    }
}
