//! Insight generation: one analyzer pass, then the rule table in order.

use chrono::{DateTime, Utc};

use crate::analysis::analyze_performance;
use crate::domain::{AssetHistory, Insight, Severity};
use crate::insights::rules::{NORMAL_OPERATION, RULES, RuleContext};

/// Everything the engine needs to evaluate one asset.
#[derive(Debug, Clone, Copy)]
pub struct InsightRequest<'a> {
    pub asset_id: Option<&'a str>,
    pub current_pr: Option<f64>,
    pub history: &'a AssetHistory,
    /// Context only; recorded on the tracing span, never used to filter `history`.
    pub reference_date: Option<&'a str>,
}

impl<'a> InsightRequest<'a> {
    pub fn new(asset_id: &'a str, current_pr: f64, history: &'a AssetHistory) -> Self {
        Self {
            asset_id: Some(asset_id),
            current_pr: Some(current_pr),
            history,
            reference_date: None,
        }
    }

    pub fn with_reference_date(mut self, date: Option<&'a str>) -> Self {
        self.reference_date = date;
        self
    }
}

/// Evaluate the rule table for one asset, stamped with the current time.
pub fn generate_insights(request: &InsightRequest<'_>) -> Vec<Insight> {
    generate_insights_at(request, Utc::now())
}

/// Evaluate the rule table for one asset.
///
/// Returns an empty list when the asset or current value is missing (a
/// non-finite current value counts as missing). Otherwise the list is
/// non-empty: if no rule fires, a single "operating normally" insight is
/// returned.
pub fn generate_insights_at(request: &InsightRequest<'_>, generated_at: DateTime<Utc>) -> Vec<Insight> {
    let asset_id = request.asset_id.filter(|a| !a.is_empty());
    let current_pr = request.current_pr.filter(|v| v.is_finite());
    let (Some(asset_id), Some(current_pr)) = (asset_id, current_pr) else {
        return Vec::new();
    };

    let span = tracing::debug_span!(
        "insights",
        asset = asset_id,
        reference_date = request.reference_date.unwrap_or("-")
    );
    let _enter = span.enter();

    let analysis = analyze_performance(request.history);
    let mut ctx = RuleContext {
        asset_id,
        current_pr,
        analysis,
        critical_emitted: false,
    };

    let mut insights = Vec::new();
    for rule in RULES.iter() {
        if !(rule.applies)(&ctx) {
            continue;
        }
        let insight = rule.build(&ctx, generated_at);
        if insight.severity == Severity::Critical {
            ctx.critical_emitted = true;
        }
        insights.push(insight);
    }

    if insights.is_empty() {
        insights.push(NORMAL_OPERATION.build(&ctx, generated_at));
    }

    tracing::debug!(
        count = insights.len(),
        trend = analysis.trend.label(),
        change_pct = analysis.change_percentage,
        anomaly = analysis.anomaly_detected,
        "evaluated insight rules"
    );

    insights
}
