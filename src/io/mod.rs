//! Input/output helpers.
//!
//! - source ingest + normalization (`ingest`)
//! - snapshot / history / insight exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
