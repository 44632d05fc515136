//! Time-to-live cache over the merged dataset.
//!
//! The cache holds a single `Arc<CacheEntry>`. A fresh entry is handed out as
//! is; a stale or missing entry triggers a full discover → load → merge pass
//! whose result replaces the slot. Recomputation runs outside the lock, so two
//! callers racing on an expired entry may both recompute; the pass is a pure
//! function of the sources and the last write wins.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::aggregate::merge::load_and_merge;
use crate::data::SourceRegistry;
use crate::domain::{AssetValues, MergedDataset};
use crate::error::AppError;

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One memoized merge result.
#[derive(Debug)]
pub struct CacheEntry {
    pub snapshot: Arc<MergedDataset>,
    pub computed_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now - self.computed_at < self.ttl
    }
}

pub struct AggregationCache {
    registry: Arc<dyn SourceRegistry>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: RwLock<Option<Arc<CacheEntry>>>,
}

impl AggregationCache {
    pub fn new(registry: Arc<dyn SourceRegistry>, ttl: Duration) -> Self {
        Self::with_clock(registry, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(registry: Arc<dyn SourceRegistry>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            clock,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Current entry, recomputed if stale or missing.
    pub fn entry(&self) -> Result<Arc<CacheEntry>, AppError> {
        let now = self.clock.now();

        let cached = self.slot.read().clone();
        if let Some(entry) = cached.filter(|e| e.is_fresh_at(now)) {
            return Ok(entry);
        }

        let merged = load_and_merge(self.registry.as_ref())?;
        tracing::info!(
            sources = merged.metadata.source_files.len(),
            dates = merged.metadata.total_dates,
            "recomputed merged performance snapshot"
        );

        let entry = Arc::new(CacheEntry {
            snapshot: Arc::new(merged),
            computed_at: now,
            ttl: self.ttl,
        });
        *self.slot.write() = Some(Arc::clone(&entry));

        Ok(entry)
    }

    pub fn get_merged(&self) -> Result<Arc<MergedDataset>, AppError> {
        Ok(Arc::clone(&self.entry()?.snapshot))
    }

    /// Drop the current entry so the next read recomputes.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }

    /// All merged dates, ascending.
    pub fn get_dates(&self) -> Result<Vec<String>, AppError> {
        Ok(self.get_merged()?.dates())
    }

    /// Per-asset values for one date; `None` when the date is absent.
    pub fn get_by_date(&self, date: &str) -> Result<Option<AssetValues>, AppError> {
        Ok(self.get_merged()?.values_for(date).cloned())
    }
}

/// Test clock that only moves when told to.
#[cfg(test)]
pub(crate) struct ManualClock {
    now: parking_lot::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: parking_lot::Mutex::new(start),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
