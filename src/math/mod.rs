//! Numerical utilities: piecewise-linear interpolation and abundance transforms.

pub mod abundance;
pub mod interp;

pub use abundance::*;
pub use interp::*;
