//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - held in memory behind the aggregation cache
//! - exported to JSON/CSV
//! - handed to an HTTP boundary unchanged (`{pr_data, metadata}`)

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default freshness window for the merged dataset.
pub const DEFAULT_CACHE_TTL_SECS: i64 = 60;

/// `assetId → performance ratio` for a single date.
pub type AssetValues = BTreeMap<String, f64>;

/// `date → (assetId → performance ratio)`.
///
/// Dates are ISO-8601 strings, so the `BTreeMap` key order is also the
/// chronological order.
pub type PrData = BTreeMap<String, AssetValues>;

/// `date → performance ratio` for a single asset.
pub type AssetHistory = BTreeMap<String, f64>;

/// Payload encoding of a raw performance source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// `{"pr_data": {date: {asset: value}}}` or a bare `{date: {asset: value}}` object.
    Json,
    /// Long-form rows: `date,asset_id,value`.
    Csv,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(SourceFormat::Json),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Csv => "csv",
        }
    }
}

/// Where the raw bytes of a source come from.
#[derive(Debug, Clone)]
pub enum SourceOrigin {
    /// A file on disk; the format is taken from its extension.
    File(PathBuf),
    /// An in-memory payload declared up front (tests, embedded datasets).
    Inline { format: SourceFormat, body: Arc<str> },
}

/// One discovered performance source.
///
/// `rank` is the override rank: the primary source has rank 0 and every
/// later source overrides values of the sources ranked before it.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: String,
    pub rank: usize,
    pub origin: SourceOrigin,
}

impl SourceDescriptor {
    pub fn file(name: impl Into<String>, rank: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            rank,
            origin: SourceOrigin::File(path.into()),
        }
    }

    pub fn inline(name: impl Into<String>, rank: usize, format: SourceFormat, body: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            rank,
            origin: SourceOrigin::Inline {
                format,
                body: body.into(),
            },
        }
    }

    pub fn is_primary(&self) -> bool {
        self.rank == 0
    }
}

/// A single source after parsing.
///
/// Only finite numeric values are retained. Entries that could not be parsed
/// are counted in `entries_dropped` and otherwise forgotten.
#[derive(Debug, Clone, Default)]
pub struct NormalizedDataset {
    pub source: String,
    pub pr_data: PrData,
    pub entries_read: usize,
    pub entries_dropped: usize,
}

impl NormalizedDataset {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Record one `(date, asset)` entry, keeping it only if `value` is finite.
    ///
    /// The date key is created even when the value is dropped, so a date that
    /// appears in a source is always visible after merge.
    pub fn record(&mut self, date: &str, asset_id: &str, value: Option<f64>) {
        self.entries_read += 1;
        let assets = self.pr_data.entry(date.to_string()).or_default();
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                assets.insert(asset_id.to_string(), v);
            }
            None => self.entries_dropped += 1,
        }
    }

    pub fn entries_kept(&self) -> usize {
        self.entries_read - self.entries_dropped
    }
}

/// Earliest and latest date present in a merged dataset.
///
/// Both are `None` when the merged dataset has no dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeMetadata {
    /// Successfully loaded sources, in override-rank order.
    pub source_files: Vec<String>,
    pub date_range: DateRange,
    pub total_dates: usize,
}

impl MergeMetadata {
    pub fn earliest(&self) -> Option<&str> {
        self.date_range.earliest.as_deref()
    }

    pub fn latest(&self) -> Option<&str> {
        self.date_range.latest.as_deref()
    }
}

/// All sources merged under the override policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedDataset {
    pub pr_data: PrData,
    pub metadata: MergeMetadata,
}

impl MergedDataset {
    /// All dates, ascending.
    pub fn dates(&self) -> Vec<String> {
        self.pr_data.keys().cloned().collect()
    }

    pub fn values_for(&self, date: &str) -> Option<&AssetValues> {
        self.pr_data.get(date)
    }

    /// Project one asset across every date where it has a value.
    pub fn asset_history(&self, asset_id: &str) -> AssetHistory {
        self.pr_data
            .iter()
            .filter_map(|(date, assets)| {
                assets
                    .get(asset_id)
                    .filter(|v| v.is_finite())
                    .map(|v| (date.clone(), *v))
            })
            .collect()
    }

    pub fn asset_ids(&self) -> BTreeSet<String> {
        self.pr_data
            .values()
            .flat_map(|assets| assets.keys().cloned())
            .collect()
    }
}

/// Direction of an asset's performance over the observed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

/// Trend and anomaly characterization of one asset's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub change_percentage: f64,
    pub trend: Trend,
    pub anomaly_detected: bool,
}

impl PerformanceAnalysis {
    /// Result for histories with fewer than two valid points.
    pub const NEUTRAL: PerformanceAnalysis = PerformanceAnalysis {
        change_percentage: 0.0,
        trend: Trend::Stable,
        anomaly_detected: false,
    };
}

/// Priority tier of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// One actionable finding about an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub affected_asset: String,
    pub generated_at: DateTime<Utc>,
}

/// Summary statistics over an asset's valid history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStats {
    pub points: usize,
    pub lowest: f64,
    pub lowest_date: String,
    pub highest: f64,
    pub highest_date: String,
    pub average: f64,
}

/// Resolved configuration for the aggregation pipeline.
///
/// This is derived from CLI flags, environment variables, and defaults.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Directory holding the primary and supplementary sources.
    pub data_dir: PathBuf,
    /// Plant code; source files are named `pr_<plant>.json` and `pr_<plant>_*.{json,csv}`.
    pub plant: String,
    pub cache_ttl: Duration,
}

impl AggregatorConfig {
    pub fn new(data_dir: impl Into<PathBuf>, plant: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            plant: plant.into(),
            cache_ttl: Duration::seconds(DEFAULT_CACHE_TTL_SECS),
        }
    }

    pub fn primary_file_name(&self) -> String {
        format!("pr_{}.json", self.plant)
    }

    pub fn supplementary_prefix(&self) -> String {
        format!("pr_{}_", self.plant)
    }
}
