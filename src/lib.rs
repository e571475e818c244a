//! `isofit` library crate.
//!
//! The binary (`isofit`) is a thin wrapper around this library so that:
//!
//! - the fitting engine is testable without spawning processes
//! - model loaders and registries can be swapped by embedding callers

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
