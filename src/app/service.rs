//! Read-side facade over the aggregation cache.
//!
//! Every front-end (CLI commands today) goes through this type, so the
//! cache → merge → analyze → insights path is expressed once.

use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::{AggregationCache, CacheEntry};
use crate::analysis::{analyze_performance, asset_stats};
use crate::data::{DirectoryRegistry, SourceRegistry};
use crate::domain::{
    AggregatorConfig, AssetHistory, AssetStats, AssetValues, Insight, MergedDataset, PerformanceAnalysis,
};
use crate::error::AppError;
use crate::insights::{InsightRequest, generate_insights};

/// Asset selection for insight generation.
#[derive(Debug, Clone, Default)]
pub struct InsightQuery {
    pub asset_id: Option<String>,
    /// Context date; also picks the default current value.
    pub reference_date: Option<String>,
    /// Explicit current value; overrides the lookup from history.
    pub current_pr: Option<f64>,
}

impl InsightQuery {
    pub fn for_asset(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: Some(asset_id.into()),
            ..Self::default()
        }
    }
}

/// Insights plus the inputs they were derived from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub asset_id: Option<String>,
    pub reference_date: Option<String>,
    pub current_pr: Option<f64>,
    pub analysis: PerformanceAnalysis,
    pub insights: Vec<Insight>,
}

pub struct PerformanceService {
    cache: AggregationCache,
}

impl PerformanceService {
    pub fn new(cache: AggregationCache) -> Self {
        Self { cache }
    }

    pub fn from_config(config: &AggregatorConfig) -> Self {
        let registry: Arc<dyn SourceRegistry> = Arc::new(DirectoryRegistry::from_config(config));
        Self::new(AggregationCache::new(registry, config.cache_ttl))
    }

    pub fn list_dates(&self) -> Result<Vec<String>, AppError> {
        self.cache.get_dates()
    }

    /// Per-asset values for `date`; `Ok(None)` when the date is not in the merged data.
    pub fn performance_for_date(&self, date: &str) -> Result<Option<AssetValues>, AppError> {
        self.cache.get_by_date(date)
    }

    pub fn merged_snapshot(&self) -> Result<Arc<MergedDataset>, AppError> {
        self.cache.get_merged()
    }

    /// Empty when the asset never appears.
    pub fn asset_history(&self, asset_id: &str) -> Result<AssetHistory, AppError> {
        Ok(self.cache.get_merged()?.asset_history(asset_id))
    }

    pub fn asset_stats(&self, asset_id: &str) -> Result<Option<AssetStats>, AppError> {
        Ok(asset_stats(&self.asset_history(asset_id)?))
    }

    pub fn insights(&self, query: &InsightQuery) -> Result<Vec<Insight>, AppError> {
        Ok(self.insight_report(query)?.insights)
    }

    /// Resolve the current value, analyze the history and run the rule table.
    ///
    /// Without an explicit `current_pr`, the asset's value on `reference_date`
    /// is used, or its most recent value when no date is given.
    pub fn insight_report(&self, query: &InsightQuery) -> Result<InsightReport, AppError> {
        let history = match &query.asset_id {
            Some(asset_id) => self.asset_history(asset_id)?,
            None => AssetHistory::new(),
        };

        let current_pr = query.current_pr.or_else(|| match &query.reference_date {
            Some(date) => history.get(date).copied(),
            None => history.values().next_back().copied(),
        });

        let request = InsightRequest {
            asset_id: query.asset_id.as_deref(),
            current_pr,
            history: &history,
            reference_date: query.reference_date.as_deref(),
        };

        Ok(InsightReport {
            asset_id: query.asset_id.clone(),
            reference_date: query.reference_date.clone(),
            current_pr,
            analysis: analyze_performance(&history),
            insights: generate_insights(&request),
        })
    }

    /// Current cache entry (snapshot and computation time).
    pub fn cache_entry(&self) -> Result<Arc<CacheEntry>, AppError> {
        self.cache.entry()
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    const PRIMARY: &str = r#"{
        "pr_data": {
            "2024-08-01": {"INV1": 0.0095, "INV2": 0.0095},
            "2024-08-02": {"INV1": 0.0093, "INV2": 0.0095},
            "2024-08-03": {"INV1": 0.0090, "INV2": 0.0095},
            "2024-08-04": {"INV1": 0.0085, "INV2": 0.0095},
            "2024-08-05": {"INV1": 0.0080, "INV2": 0.0095}
        }
    }"#;

    fn service() -> (tempfile::TempDir, PerformanceService) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pr_T.json"), PRIMARY).unwrap();
        std::fs::write(
            dir.path().join("pr_T_fix.csv"),
            "date,asset_id,value\n2024-08-05,INV2,0.0066\n2024-08-06,INV2,0.0094\n",
        )
        .unwrap();
        let config = AggregatorConfig::new(dir.path(), "T");
        let svc = PerformanceService::from_config(&config);
        (dir, svc)
    }

    #[test]
    fn dates_and_by_date_lookup() {
        let (_dir, svc) = service();
        let dates = svc.list_dates().unwrap();
        assert_eq!(dates.first().map(String::as_str), Some("2024-08-01"));
        assert_eq!(dates.last().map(String::as_str), Some("2024-08-06"));

        let values = svc.performance_for_date("2024-08-05").unwrap().unwrap();
        assert_eq!(values["INV2"], 0.0066);
        assert!(svc.performance_for_date("2023-01-01").unwrap().is_none());
    }

    #[test]
    fn snapshot_metadata_lists_sources_in_rank_order() {
        let (_dir, svc) = service();
        let snapshot = svc.merged_snapshot().unwrap();
        assert_eq!(snapshot.metadata.source_files, ["pr_T.json", "pr_T_fix.csv"]);
        assert_eq!(snapshot.metadata.total_dates, 6);
        assert_eq!(snapshot.metadata.earliest(), Some("2024-08-01"));
        assert_eq!(snapshot.metadata.latest(), Some("2024-08-06"));
    }

    #[test]
    fn history_and_stats_for_unknown_asset_are_empty() {
        let (_dir, svc) = service();
        assert!(svc.asset_history("NOPE").unwrap().is_empty());
        assert!(svc.asset_stats("NOPE").unwrap().is_none());
        assert_eq!(svc.asset_stats("INV1").unwrap().unwrap().points, 5);
    }

    #[test]
    fn insights_default_to_latest_value() {
        let (_dir, svc) = service();
        let report = svc.insight_report(&InsightQuery::for_asset("INV1")).unwrap();
        assert_eq!(report.current_pr, Some(0.0080));
        assert_eq!(report.insights[0].severity, Severity::Critical);
        assert_eq!(report.insights[0].id, "insight-drop-INV1");
    }

    #[test]
    fn reference_date_selects_current_value_but_not_history() {
        let (_dir, svc) = service();
        let query = InsightQuery {
            asset_id: Some("INV2".into()),
            reference_date: Some("2024-08-05".into()),
            current_pr: None,
        };
        let report = svc.insight_report(&query).unwrap();

        assert_eq!(report.current_pr, Some(0.0066));
        assert!(report.insights.iter().any(|i| i.id == "insight-low-pr-INV2"));
        // Full history, including the date after the reference date.
        assert_eq!(svc.asset_history("INV2").unwrap().len(), 6);
    }

    #[test]
    fn missing_asset_yields_no_insights() {
        let (_dir, svc) = service();
        assert!(svc.insights(&InsightQuery::default()).unwrap().is_empty());
        assert!(svc.insights(&InsightQuery::for_asset("NOPE")).unwrap().is_empty());
    }

    #[test]
    fn cache_entry_is_reused_until_invalidated() {
        let (_dir, svc) = service();
        let a = svc.cache_entry().unwrap();
        let b = svc.cache_entry().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        svc.invalidate();
        let c = svc.cache_entry().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
