//! Isochrone fitting.
//!
//! - interpolate each star onto a model table and compute residuals
//! - combine residuals into a Gaussian likelihood
//! - search a family's grid for the maximum-likelihood point (optionally parallel)

pub mod likelihood;
pub mod residuals;
pub mod search;

#[cfg(test)]
pub(crate) mod fixtures;

pub use likelihood::*;
pub use residuals::*;
pub use search::*;
