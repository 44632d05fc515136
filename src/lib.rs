//! `solar-pr` library crate.
//!
//! The binary (`solar`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the aggregation cache and insight engine can sit behind other front-ends
//!   (an HTTP layer, a scheduler) without touching the CLI

pub mod aggregate;
pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod insights;
pub mod io;
pub mod math;
pub mod report;
