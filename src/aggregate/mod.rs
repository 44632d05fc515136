//! Aggregation layer: merge + time-to-live cache.
//!
//! Responsibilities:
//!
//! - load every discovered source (parallel, fault-isolated)
//! - merge under the rank-based override policy
//! - memoize the merged snapshot behind a TTL with an injectable clock

pub mod cache;
pub mod merge;

pub use cache::*;
pub use merge::*;
