//! The insight rule table.
//!
//! Each rule is a `(predicate, factory)` pair over a [`RuleContext`]. Rules are
//! evaluated in table order and each contributes at most one insight. Facts
//! that later rules depend on (whether a critical insight was already emitted)
//! are carried in the context rather than implied by ordering.

use chrono::{DateTime, Utc};

use crate::domain::{Insight, PerformanceAnalysis, Severity, Trend};

/// Decline beyond this (percent) is critical.
pub const CRITICAL_DROP_PCT: f64 = 10.0;
/// Decline beyond this (percent), up to the critical threshold, is a warning.
pub const MODERATE_DECLINE_PCT: f64 = 5.0;
/// Improvement beyond this (percent) is reported.
pub const IMPROVEMENT_PCT: f64 = 5.0;
/// Current performance ratio below this is reported regardless of trend.
pub const LOW_PR_THRESHOLD: f64 = 0.007;

/// Inputs visible to a rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub asset_id: &'a str,
    pub current_pr: f64,
    pub analysis: PerformanceAnalysis,
    /// A critical insight has already been emitted in this evaluation.
    pub critical_emitted: bool,
}

impl RuleContext<'_> {
    fn decline_magnitude(&self) -> Option<f64> {
        (self.analysis.trend == Trend::Declining).then(|| self.analysis.change_percentage.abs())
    }
}

pub struct Rule {
    /// Stable rule key; part of every insight id.
    pub name: &'static str,
    pub severity: Severity,
    pub title: &'static str,
    pub recommendation: &'static str,
    pub applies: fn(&RuleContext<'_>) -> bool,
    pub describe: fn(&RuleContext<'_>) -> String,
}

impl Rule {
    /// Deterministic id: identical `(rule, asset)` pairs always share an id.
    pub fn insight_id(&self, asset_id: &str) -> String {
        format!("insight-{}-{}", self.name, asset_id)
    }

    pub fn build(&self, ctx: &RuleContext<'_>, generated_at: DateTime<Utc>) -> Insight {
        Insight {
            id: self.insight_id(ctx.asset_id),
            severity: self.severity,
            title: self.title.to_string(),
            description: (self.describe)(ctx),
            recommendation: self.recommendation.to_string(),
            affected_asset: ctx.asset_id.to_string(),
            generated_at,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish()
    }
}

/// Rules in evaluation order.
pub static RULES: [Rule; 5] = [
    Rule {
        name: "drop",
        severity: Severity::Critical,
        title: "Critical Performance Drop Detected",
        recommendation: "Investigate immediately. Check for inverter faults or offline status, \
            DC string disconnections, accumulated soiling on panels, and new shading or \
            obstructions. Schedule maintenance within 24-48 hours.",
        applies: |ctx| ctx.decline_magnitude().is_some_and(|m| m > CRITICAL_DROP_PCT),
        describe: |ctx| {
            format!(
                "Asset {} lost {:.1}% of its performance ratio over the observed period, \
                 a severe deviation from its baseline.",
                ctx.asset_id,
                ctx.analysis.change_percentage.abs()
            )
        },
    },
    Rule {
        name: "decline",
        severity: Severity::Warning,
        title: "Performance Decline Detected",
        recommendation: "Monitor this asset closely over the next 7 days and start maintenance \
            checks if the decline continues. Consider panel cleaning and a check for partial shading.",
        applies: |ctx| {
            ctx.decline_magnitude()
                .is_some_and(|m| m > MODERATE_DECLINE_PCT && m <= CRITICAL_DROP_PCT)
        },
        describe: |ctx| {
            format!(
                "Asset {} shows a {:.1}% decline in performance ratio. Not critical yet, \
                 but the trend warrants monitoring.",
                ctx.asset_id,
                ctx.analysis.change_percentage.abs()
            )
        },
    },
    Rule {
        name: "anomaly",
        severity: Severity::Warning,
        title: "Unusual Performance Pattern",
        recommendation: "Review environmental conditions (weather, cloud cover, temperature) for \
            the affected dates, look for intermittent connection faults or equipment cycling, \
            and correlate with meteorological data.",
        applies: |ctx| ctx.analysis.anomaly_detected && !ctx.critical_emitted,
        describe: |ctx| {
            format!(
                "Asset {} has at least one reading more than two standard deviations from its mean, \
                 suggesting intermittent faults or environmental effects.",
                ctx.asset_id
            )
        },
    },
    Rule {
        name: "improvement",
        severity: Severity::Info,
        title: "Performance Improvement Trend",
        recommendation: "Keep the current maintenance schedule. This asset can serve as a baseline \
            reference for similar units.",
        applies: |ctx| ctx.analysis.trend == Trend::Improving && ctx.analysis.change_percentage > IMPROVEMENT_PCT,
        describe: |ctx| {
            format!(
                "Asset {} improved its performance ratio by {:.1}% over the observed period.",
                ctx.asset_id, ctx.analysis.change_percentage
            )
        },
    },
    Rule {
        name: "low-pr",
        severity: Severity::Warning,
        title: "Low Performance Ratio Value",
        recommendation: "Verify the asset is generating during peak sun hours. Check AC/DC wiring, \
            inverter efficiency losses and sensor calibration for measurement errors.",
        applies: |ctx| ctx.current_pr < LOW_PR_THRESHOLD,
        describe: |ctx| {
            format!(
                "Asset {} currently operates at a {:.2}% performance ratio, below the {:.2}% threshold.",
                ctx.asset_id,
                ctx.current_pr * 100.0,
                LOW_PR_THRESHOLD * 100.0
            )
        },
    },
];

/// Emitted alone when no rule in [`RULES`] fires.
pub static NORMAL_OPERATION: Rule = Rule {
    name: "normal",
    severity: Severity::Info,
    title: "Operating Normally",
    recommendation: "Continue routine monitoring and keep the quarterly maintenance schedule.",
    applies: |_| true,
    describe: |ctx| {
        format!(
            "Asset {} is operating within normal parameters with stable performance.",
            ctx.asset_id
        )
    },
};

pub fn rule(name: &str) -> Option<&'static Rule> {
    RULES.iter().chain(std::iter::once(&NORMAL_OPERATION)).find(|r| r.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(change: f64, trend: Trend, anomaly: bool) -> RuleContext<'static> {
        RuleContext {
            asset_id: "INV1",
            current_pr: 0.0095,
            analysis: PerformanceAnalysis {
                change_percentage: change,
                trend,
                anomaly_detected: anomaly,
            },
            critical_emitted: false,
        }
    }

    fn fires(name: &str, ctx: &RuleContext<'_>) -> bool {
        (rule(name).unwrap().applies)(ctx)
    }

    #[test]
    fn critical_and_moderate_split_at_ten_percent() {
        assert!(fires("drop", &ctx(-10.5, Trend::Declining, false)));
        assert!(!fires("decline", &ctx(-10.5, Trend::Declining, false)));

        assert!(!fires("drop", &ctx(-10.0, Trend::Declining, false)));
        assert!(fires("decline", &ctx(-10.0, Trend::Declining, false)));

        assert!(!fires("decline", &ctx(-5.0, Trend::Declining, false)));
    }

    #[test]
    fn decline_rules_require_declining_trend() {
        assert!(!fires("drop", &ctx(-12.0, Trend::Stable, false)));
        assert!(!fires("decline", &ctx(-7.0, Trend::Stable, false)));
    }

    #[test]
    fn anomaly_is_suppressed_only_by_an_emitted_critical() {
        let mut c = ctx(0.0, Trend::Stable, true);
        assert!(fires("anomaly", &c));
        c.critical_emitted = true;
        assert!(!fires("anomaly", &c));
    }

    #[test]
    fn improvement_needs_more_than_five_percent() {
        assert!(fires("improvement", &ctx(5.5, Trend::Improving, false)));
        assert!(!fires("improvement", &ctx(4.0, Trend::Improving, false)));
    }

    #[test]
    fn low_ratio_ignores_trend() {
        let mut c = ctx(0.0, Trend::Stable, false);
        c.current_pr = 0.0065;
        assert!(fires("low-pr", &c));
        c.current_pr = 0.007;
        assert!(!fires("low-pr", &c));
    }

    #[test]
    fn descriptions_interpolate_rounded_magnitude() {
        let c = ctx(-15.789, Trend::Declining, false);
        let insight = rule("drop").unwrap().build(&c, Utc::now());
        assert!(insight.description.contains("15.8%"));
        assert_eq!(insight.id, "insight-drop-INV1");
        assert_eq!(insight.affected_asset, "INV1");
    }
}
