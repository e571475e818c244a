//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - property names, measurements and tagged estimates (`types`)
//! - observed stars (`star`)
//! - multi-star systems and the `Comparable` capability (`system`)
//! - run configuration (`config`)

pub mod config;
pub mod star;
pub mod system;
pub mod types;

pub use config::*;
pub use star::*;
pub use system::*;
pub use types::*;
