//! Reporting utilities: run summary, rankings and residual breakdowns.

pub mod format;

pub use format::*;
