//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - source descriptors and normalized datasets (`SourceDescriptor`, `NormalizedDataset`)
//! - the merged dataset and its metadata (`MergedDataset`, `MergeMetadata`)
//! - analysis and insight outputs (`PerformanceAnalysis`, `Insight`, `AssetStats`)
//! - run configuration (`AggregatorConfig`)

pub mod types;

pub use types::*;
