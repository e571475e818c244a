//! Input/output helpers.
//!
//! - star / system JSON input
//! - likelihood table export

pub mod export;
pub mod system;

pub use export::*;
pub use system::*;
