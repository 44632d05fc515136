//! Plain-text terminal formatting.
//!
//! Every function returns a `String`; printing is left to the caller.

use chrono::{DateTime, Utc};

use crate::app::service::InsightReport;
use crate::domain::{AssetHistory, AssetStats, AssetValues, Insight, MergedDataset, PerformanceAnalysis};
use crate::insights::LOW_PR_THRESHOLD;

pub fn format_dates(dates: &[String]) -> String {
    let mut out = String::new();
    for date in dates {
        out.push_str(date);
        out.push('\n');
    }
    out.push_str(&format!("({} dates)\n", dates.len()));
    out
}

/// Per-asset table for one date; assets below the low-ratio threshold are flagged.
pub fn format_date_values(date: &str, values: &AssetValues) -> String {
    let mut out = String::new();
    out.push_str(&format!("Performance ratio on {date}:\n"));
    out.push_str(format!("{:<24} {:>10} {:>8}\n", "asset", "pr", "pr %").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<10} {:-<8}\n", "", "", "").trim_end());
    out.push('\n');

    for (asset_id, value) in values {
        let flag = if *value < LOW_PR_THRESHOLD { "  low" } else { "" };
        out.push_str(&format!(
            "{:<24} {:>10.6} {:>8.3}{flag}\n",
            truncate(asset_id, 24),
            value,
            value * 100.0
        ));
    }
    out.push_str(&format!("({} assets)\n", values.len()));
    out
}

pub fn format_snapshot_summary(merged: &MergedDataset, computed_at: Option<DateTime<Utc>>) -> String {
    let meta = &merged.metadata;
    let mut out = String::new();

    out.push_str("=== solar - merged performance snapshot ===\n");
    out.push_str(&format!(
        "Dates: {} | range=[{}, {}]\n",
        meta.total_dates,
        meta.earliest().unwrap_or("-"),
        meta.latest().unwrap_or("-"),
    ));
    out.push_str(&format!("Assets: {}\n", merged.asset_ids().len()));
    if let Some(at) = computed_at {
        out.push_str(&format!("Computed at: {}\n", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    out.push_str("\nSources (override order):\n");
    for (rank, name) in meta.source_files.iter().enumerate() {
        let role = if rank == 0 { "primary" } else { "supplementary" };
        out.push_str(&format!("{rank:>3}. {name} ({role})\n"));
    }

    out
}

pub fn format_history(asset_id: &str, history: &AssetHistory, stats: Option<&AssetStats>) -> String {
    let mut out = String::new();
    out.push_str(&format!("History for {asset_id}:\n"));
    for (date, value) in history {
        out.push_str(&format!("{date}  {value:.6}\n"));
    }

    if let Some(s) = stats {
        out.push_str(&format!(
            "\nPoints: {} | lowest={:.6} ({}) | highest={:.6} ({}) | average={:.6}\n",
            s.points, s.lowest, s.lowest_date, s.highest, s.highest_date, s.average
        ));
    }

    out
}

pub fn format_analysis(analysis: &PerformanceAnalysis) -> String {
    format!(
        "Trend: {} ({:+.2}%) | anomaly: {}\n",
        analysis.trend.label(),
        analysis.change_percentage,
        if analysis.anomaly_detected { "yes" } else { "no" }
    )
}

pub fn format_insights(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return "No insights (asset or current value missing).\n".to_string();
    }

    let mut out = String::new();
    for insight in insights {
        out.push_str(&format!("[{}] {}\n", insight.severity.label(), insight.title));
        out.push_str(&format!("  {}\n", insight.description));
        out.push_str(&format!("  -> {}\n", insight.recommendation));
    }
    out
}

pub fn format_insight_report(report: &InsightReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== insights for {} ===\n",
        report.asset_id.as_deref().unwrap_or("-")
    ));
    if let Some(date) = &report.reference_date {
        out.push_str(&format!("Reference date: {date}\n"));
    }
    match report.current_pr {
        Some(v) => out.push_str(&format!("Current PR: {v:.6}\n")),
        None => out.push_str("Current PR: -\n"),
    }
    out.push_str(&format_analysis(&report.analysis));
    out.push('\n');
    out.push_str(&format_insights(&report.insights));

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateRange, MergeMetadata, Severity, Trend};

    #[test]
    fn date_values_flag_low_assets() {
        let values = AssetValues::from([("INV1".to_string(), 0.0095), ("INV2".to_string(), 0.0065)]);
        let text = format_date_values("2024-08-01", &values);
        let inv2 = text.lines().find(|l| l.starts_with("INV2")).unwrap();
        assert!(inv2.ends_with("low"));
        let inv1 = text.lines().find(|l| l.starts_with("INV1")).unwrap();
        assert!(!inv1.ends_with("low"));
    }

    #[test]
    fn snapshot_summary_marks_primary_source() {
        let merged = MergedDataset {
            pr_data: Default::default(),
            metadata: MergeMetadata {
                source_files: vec!["pr_T.json".into(), "pr_T_late.csv".into()],
                date_range: DateRange::default(),
                total_dates: 0,
            },
        };
        let text = format_snapshot_summary(&merged, None);
        assert!(text.contains("range=[-, -]"));
        assert!(text.contains("0. pr_T.json (primary)"));
        assert!(text.contains("1. pr_T_late.csv (supplementary)"));
    }

    #[test]
    fn analysis_line_shows_signed_change() {
        let a = PerformanceAnalysis {
            change_percentage: -15.789,
            trend: Trend::Declining,
            anomaly_detected: false,
        };
        assert_eq!(format_analysis(&a), "Trend: declining (-15.79%) | anomaly: no\n");
    }

    #[test]
    fn insights_render_severity_label() {
        let insight = Insight {
            id: "insight-low-pr-A".into(),
            severity: Severity::Warning,
            title: "Low Performance Ratio Value".into(),
            description: "d".into(),
            recommendation: "r".into(),
            affected_asset: "A".into(),
            generated_at: Utc::now(),
        };
        let text = format_insights(&[insight]);
        assert!(text.starts_with("[WARNING] Low Performance Ratio Value"));
        assert!(format_insights(&[]).starts_with("No insights"));
    }

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
