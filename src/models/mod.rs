//! Isochrone model families: descriptors, on-disk layouts, loaded tables and
//! the loaders that produce them.

pub mod family;
pub mod layout;
pub mod loader;
pub mod table;

pub use family::*;
pub use layout::FileLayout;
pub use loader::*;
pub use table::*;
