//! Performance data sources.
//!
//! - source discovery (`registry`)
//! - deterministic synthetic datasets (`sample`)

pub mod registry;
pub mod sample;

pub use registry::*;
pub use sample::*;
