//! Observed star / system JSON input.
//!
//! A star is an object of optional `[value, sigma]` pairs (or bare numbers):
//!
//! ```json
//! { "name": "A", "mass": [1.0, 0.05], "teff": [5770, 50], "feh": 0.0 }
//! ```
//!
//! A system nests components and may carry measured temperature differences
//! keyed by component index:
//!
//! ```json
//! { "name": "AB", "components": [{...}, {...}], "teff_differences": { "1": [80, 20] } }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Comparable, Measurement, Star, StellarSystem};
use crate::error::{AppError, EXIT_INPUT};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SystemSpec {
    System(SystemObject),
    Star(Star),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SystemObject {
    #[serde(default)]
    name: String,
    components: Vec<SystemSpec>,
    /// Keyed by component index as a string (JSON object keys).
    #[serde(default)]
    teff_differences: BTreeMap<String, Measurement>,
}

impl SystemSpec {
    fn into_system(self) -> Result<StellarSystem, AppError> {
        match self {
            SystemSpec::Star(star) => Ok(StellarSystem::single(star)),
            SystemSpec::System(SystemObject {
                name,
                components,
                teff_differences,
            }) => {
                if components.is_empty() {
                    return Err(AppError::new(
                        EXIT_INPUT,
                        format!("System '{name}' has no components."),
                    ));
                }
                let parts = components
                    .into_iter()
                    .map(SystemSpec::into_system)
                    .collect::<Result<Vec<_>, _>>()?;
                // Differences are relative to the overall primary, which only
                // the first part shares.
                if let Some(part) = parts.iter().skip(1).find(|p| p.has_teff_differences()) {
                    return Err(AppError::new(
                        EXIT_INPUT,
                        format!(
                            "System '{name}': component '{}' carries temperature differences, \
                             but only the first component's are relative to the overall primary. \
                             Move them to '{name}' with renumbered components.",
                            part.name
                        ),
                    ));
                }
                let mut system = StellarSystem::combine(name, parts);
                for (key, measurement) in teff_differences {
                    let component = key.trim().parse::<usize>().unwrap_or(0);
                    if component == 0 || component >= system.n_components() {
                        return Err(AppError::new(
                            EXIT_INPUT,
                            format!(
                                "System '{}' has a temperature difference for component '{key}', \
                                 but only components 1..{} can have one.",
                                system.name,
                                system.n_components()
                            ),
                        ));
                    }
                    system = system.with_teff_difference(component, measurement);
                }
                Ok(system)
            }
        }
    }
}

/// Parse a star or system from JSON text.
pub fn parse_system_json(text: &str) -> Result<StellarSystem, AppError> {
    let spec: SystemSpec = serde_json::from_str(text)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid star/system JSON: {e}")))?;
    spec.into_system()
}

/// Read a star or system from a JSON file.
pub fn read_system_json(path: &Path) -> Result<StellarSystem, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            EXIT_INPUT,
            format!("Failed to open system file '{}': {e}", path.display()),
        )
    })?;
    let spec: SystemSpec = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::new(
            EXIT_INPUT,
            format!("Invalid star/system JSON in '{}': {e}", path.display()),
        )
    })?;
    spec.into_system()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Property;

    #[test]
    fn single_star_with_mixed_measurement_forms() {
        let system = parse_system_json(
            r#"{ "name": "Sun", "mass": [1.0, 0.05], "Teff": {"value": 5770, "sigma": 50}, "Fe_H": 0.0 }"#,
        )
        .unwrap();
        assert_eq!(system.n_components(), 1);
        let star = &system.stars()[0];
        assert_eq!(star.name, "Sun");
        assert_eq!(star.get(Property::Mass), Some(Measurement::new(1.0, 0.05)));
        assert_eq!(star.get(Property::Teff), Some(Measurement::new(5770.0, 50.0)));
        assert_eq!(star.get(Property::FeH), Some(Measurement::new(0.0, 0.0)));
        assert_eq!(star.get(Property::Logg), None);
    }

    #[test]
    fn nested_triple_flattens_in_order() {
        let text = r#"{
            "name": "ABC",
            "components": [
                { "name": "AB",
                  "components": [ {"name": "A", "teff": [6000, 50]}, {"name": "B", "teff": [5000, 50]} ],
                  "teff_differences": { "1": [990, 10] } },
                { "name": "C", "teff": [4000, 50] }
            ]
        }"#;
        let system = parse_system_json(text).unwrap();
        let names: Vec<&str> = system.stars().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(system.teff_difference(1), Some(Measurement::new(990.0, 10.0)));
        let derived = system.teff_difference(2).unwrap();
        assert_eq!(derived.value, 2000.0);
    }

    #[test]
    fn bad_input_is_an_input_error() {
        let unknown = parse_system_json(r#"{ "name": "X", "age": [1.0, 0.1] }"#).unwrap_err();
        assert_eq!(unknown.exit_code(), EXIT_INPUT);

        let empty = parse_system_json(r#"{ "name": "X", "components": [] }"#).unwrap_err();
        assert_eq!(empty.exit_code(), EXIT_INPUT);

        let bad_index = parse_system_json(
            r#"{ "components": [ {"teff": 6000}, {"teff": 5000} ], "teff_differences": { "0": [1, 1] } }"#,
        )
        .unwrap_err();
        assert_eq!(bad_index.exit_code(), EXIT_INPUT);
    }

    #[test]
    fn system_objects_reject_stray_keys() {
        let err = parse_system_json(
            r#"{ "name": "AB", "mass": [2.0, 0.1], "components": [ {"teff": 6000}, {"teff": 5000} ] }"#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
    }

    #[test]
    fn differences_on_a_later_subsystem_are_rejected() {
        let text = r#"{
            "name": "ABCD",
            "components": [
                { "name": "AB", "components": [ {"teff": 6000}, {"teff": 5000} ] },
                { "name": "CD",
                  "components": [ {"teff": 4500}, {"teff": 4000} ],
                  "teff_differences": { "1": [500, 20] } }
            ]
        }"#;
        let err = parse_system_json(text).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("CD"));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("star.json");
        std::fs::write(&path, r#"{ "name": "A", "mass": [0.8, 0.02] }"#).unwrap();
        let system = read_system_json(&path).unwrap();
        assert_eq!(system.stars()[0].get(Property::Mass), Some(Measurement::new(0.8, 0.02)));

        let missing = read_system_json(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(missing.exit_code(), EXIT_INPUT);
    }
}
