//! Abundance and structure transforms shared by the residual engine and the
//! table loader.
//!
//! - `[Fe/H]` (dex) to the linear surface mass-fraction ratio `Z/X`
//! - radius from mass and surface gravity
//! - radius from luminosity and effective temperature (Stefan-Boltzmann)

/// `log10(Z/X)` of the solar mixture.
pub const LOG_ZX_SUN: f64 = -1.636;

/// G * M_sun in cgs (cm^3 s^-2).
pub const GM_SUN: f64 = 1.32712440041e26;
/// Solar radius in cm.
pub const R_SUN: f64 = 6.956e10;
/// Solar luminosity in erg s^-1.
pub const L_SUN: f64 = 3.839e33;
/// Stefan-Boltzmann constant in cgs.
pub const SIGMA_SB: f64 = 5.6704e-5;

/// `Z/X = 10^([Fe/H] - 1.636)`.
pub fn z_over_x(feh: f64) -> f64 {
    10f64.powf(feh + LOG_ZX_SUN)
}

/// Uncertainty assigned to `Z/X`.
///
/// The [Fe/H] value and its uncertainty are added before exponentiating; this is
/// not linear error propagation.
pub fn z_over_x_sigma(feh: f64, feh_sigma: f64) -> f64 {
    10f64.powf(feh + feh_sigma + LOG_ZX_SUN)
}

/// Radius (R_sun) from mass (M_sun) and `log10 g` (cgs).
pub fn radius_from_gravity(mass: f64, logg: f64) -> f64 {
    (GM_SUN * mass / 10f64.powf(logg)).sqrt() / R_SUN
}

/// Radius (R_sun) from luminosity (L_sun) and effective temperature (K).
pub fn radius_from_luminosity(luminosity: f64, teff: f64) -> f64 {
    (luminosity * L_SUN / (4.0 * std::f64::consts::PI * SIGMA_SB * teff.powi(4))).sqrt() / R_SUN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_z_over_x() {
        assert!((z_over_x(0.0) - 10f64.powf(-1.636)).abs() < 1e-15);
        assert!(z_over_x(0.3) > z_over_x(0.0));
    }

    #[test]
    fn zx_sigma_adds_before_exponentiating() {
        let s = z_over_x_sigma(0.0, 0.05);
        assert!((s - 10f64.powf(0.05 - 1.636)).abs() < 1e-15);
    }

    #[test]
    fn solar_radius_round_trips_through_gravity() {
        // log g of the Sun is ~4.438 with these constants.
        let logg = (GM_SUN / (R_SUN * R_SUN)).log10();
        assert!((radius_from_gravity(1.0, logg) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn solar_radius_from_stefan_boltzmann() {
        let teff = (L_SUN / (4.0 * std::f64::consts::PI * SIGMA_SB * R_SUN * R_SUN)).powf(0.25);
        assert!((radius_from_luminosity(1.0, teff) - 1.0).abs() < 1e-9);
    }
}
