//! On-disk file naming for each model family.
//!
//! Paths are relative to the family's model directory. Metallicity and alpha
//! values are encoded with a `p`/`m` sign prefix, e.g. [Fe/H] = -0.5 becomes
//! `m050` and [alpha/Fe] = +0.2 becomes `p2`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::family::GridPoint;
use crate::models::loader::LoadError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileLayout {
    /// `pXXX/aY/<prefix>_<age>myr_fehpXXX_afepY.iso`
    FehAfe { prefix: String },
    /// `a<amlt>/bcah98_<age>myr_mh00_amlt<amlt>.iso`, ages rounded to 0.1 dex.
    Lyon { amlt: String },
    /// `pXXX/<age>myr_X0p<X>_Z0p<Z>_A1p875.iso`
    Yale,
    /// `Z<Z>_Y<Y>0_.../ISO_A<age>_Z<Z>_Y<Y>0_....DAT`
    Pisa,
    /// `baton_<age>myr_Z02.iso`
    Baton,
}

/// [Fe/H] -> (X, Z) for the Yale grid.
const YALE_XZ: [(f64, (f64, f64)); 5] = [
    (-1.5, (0.74865, 0.00054)),
    (-1.0, (0.74574, 0.00171)),
    (-0.5, (0.73671, 0.00535)),
    (0.0, (0.70952, 0.01631)),
    (0.3, (0.67336, 0.03090)),
];

/// [Fe/H] -> Z for the Pisa grid.
const PISA_Z: [(f64, f64); 19] = [
    (-1.80, 0.0002),
    (-1.10, 0.0010),
    (-0.80, 0.0020),
    (-0.60, 0.0030),
    (-0.50, 0.0040),
    (-0.40, 0.0050),
    (-0.30, 0.0060),
    (-0.25, 0.0070),
    (-0.20, 0.0080),
    (-0.10, 0.0090),
    (-0.05, 0.0100),
    (0.00, 0.0125),
    (0.10, 0.0150),
    (0.20, 0.0175),
    (0.25, 0.0200),
    (0.30, 0.0225),
    (0.35, 0.0250),
    (0.40, 0.0275),
    (0.45, 0.0300),
];

impl FileLayout {
    /// Path of the table for `point`, relative to the model directory.
    pub fn relative_path(&self, family: &str, point: &GridPoint) -> Result<PathBuf, LoadError> {
        let age_myr = point.age_myr();
        match self {
            FileLayout::FehAfe { prefix } => {
                let feh_dir = feh_code(point.feh);
                let afe_dir = format!("a{:01.0}", (point.afe * 10.0).abs());
                let afe_file = format!("{}{:01.0}", sign_letter(point.afe), (point.afe * 10.0).abs());
                let file = format!("{prefix}_{age_myr:07.1}myr_feh{feh_dir}_afe{afe_file}.iso");
                Ok([feh_dir, afe_dir, file].iter().collect())
            }
            FileLayout::Lyon { amlt } => {
                let rounded = 10f64.powf((point.age.log10() * 10.0).round() / 10.0) / 1.0e6;
                let file = format!("bcah98_{rounded:07.1}myr_mh00_amlt{amlt}.iso");
                Ok([format!("a{amlt}"), file].iter().collect())
            }
            FileLayout::Yale => {
                let (x, z) = lookup(&YALE_XZ, point.feh).ok_or_else(|| unmapped(family, point))?;
                let file = format!(
                    "{age_myr:07.1}myr_X0p{:05.0}_Z0p{:05.0}_A1p875.iso",
                    x * 1.0e5,
                    z * 1.0e5
                );
                Ok([feh_code(point.feh), file].iter().collect())
            }
            FileLayout::Pisa => {
                let z = lookup(&PISA_Z, point.feh).ok_or_else(|| unmapped(family, point))?;
                let y = 0.2485 + 2.0 * z;
                let tag = format!("Z{z:7.5}_Y{y:5.3}0_XD2E5_ML1.68_AS05");
                let file = format!("ISO_A{age_myr:05.0}_{tag}.DAT");
                Ok([tag, file].iter().collect())
            }
            FileLayout::Baton => Ok(PathBuf::from(format!("baton_{age_myr:07.1}myr_Z02.iso"))),
        }
    }
}

fn sign_letter(x: f64) -> char {
    if x < 0.0 { 'm' } else { 'p' }
}

/// `[Fe/H] = -0.5` -> `m050`.
fn feh_code(feh: f64) -> String {
    format!("{}{:03.0}", sign_letter(feh), (feh * 100.0).abs())
}

fn lookup<T: Copy>(table: &[(f64, T)], feh: f64) -> Option<T> {
    table
        .iter()
        .find(|(k, _)| (k - feh).abs() < 1e-6)
        .map(|(_, v)| *v)
}

fn unmapped(family: &str, point: &GridPoint) -> LoadError {
    LoadError::UnmappedMetallicity {
        family: family.to_string(),
        feh: point.feh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dartmouth_style_names() {
        let layout = FileLayout::FehAfe { prefix: "dmestar".into() };
        let path = layout
            .relative_path("Dartmouth", &GridPoint::new(1.25e9, -0.5, 0.2))
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("m050/a2/dmestar_01250.0myr_fehm050_afep2.iso")
        );
    }

    #[test]
    fn lyon_rounds_age_to_tenth_dex() {
        let layout = FileLayout::Lyon { amlt: "19".into() };
        let path = layout
            .relative_path("Lyon19", &GridPoint::new(1.0e7, 0.0, 0.0))
            .unwrap();
        assert_eq!(path, PathBuf::from("a19/bcah98_00010.0myr_mh00_amlt19.iso"));
    }

    #[test]
    fn yale_and_pisa_need_mapped_metallicity() {
        let point = GridPoint::new(5.0e6, 0.0, 0.0);
        let yale = FileLayout::Yale.relative_path("Yale", &point).unwrap();
        assert_eq!(yale, PathBuf::from("p000/00005.0myr_X0p70952_Z0p01631_A1p875.iso"));

        let pisa = FileLayout::Pisa.relative_path("Pisa", &point).unwrap();
        assert!(pisa.to_string_lossy().starts_with("Z0.01250_Y0.27"));
        assert!(pisa.to_string_lossy().contains("ISO_A00005_Z0.01250"));

        let off_grid = GridPoint::new(5.0e6, 0.15, 0.0);
        assert!(matches!(
            FileLayout::Yale.relative_path("Yale", &off_grid),
            Err(LoadError::UnmappedMetallicity { .. })
        ));
    }
}
