//! Mathematical utilities: descriptive statistics for performance series.

pub mod stats;

pub use stats::*;
