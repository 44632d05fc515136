//! Per-asset performance analysis.
//!
//! Everything here is a pure function of one asset's history; nothing is cached.

pub mod analyzer;

pub use analyzer::*;
