//! Trend and anomaly characterization of one asset's history.
//!
//! Rules:
//! 1. Drop non-finite values; order the rest by date (ISO dates sort lexically)
//! 2. With fewer than two points, return the neutral analysis
//! 3. `change% = (newest - oldest) / oldest * 100`; `< -3` declining, `> 3` improving
//! 4. Anomaly: any value more than two population standard deviations from the mean

use crate::domain::{AssetHistory, AssetStats, PerformanceAnalysis, Trend};
use crate::math::{has_outlier, percent_change};

/// Absolute percentage change beyond which a trend is reported.
pub const TREND_THRESHOLD_PCT: f64 = 3.0;

/// Deviation from the mean, in population standard deviations, that counts as an anomaly.
pub const ANOMALY_SIGMA: f64 = 2.0;

/// Analyze one asset's history.
pub fn analyze_performance(history: &AssetHistory) -> PerformanceAnalysis {
    let values = valid_values(history);
    if values.len() < 2 {
        return PerformanceAnalysis::NEUTRAL;
    }

    let oldest = values[0];
    let newest = values[values.len() - 1];
    // A zero baseline has no defined relative change; treat it as flat.
    let change_percentage = percent_change(oldest, newest).unwrap_or(0.0);

    PerformanceAnalysis {
        change_percentage,
        trend: classify_trend(change_percentage),
        anomaly_detected: has_outlier(&values, ANOMALY_SIGMA),
    }
}

pub fn classify_trend(change_percentage: f64) -> Trend {
    if change_percentage < -TREND_THRESHOLD_PCT {
        Trend::Declining
    } else if change_percentage > TREND_THRESHOLD_PCT {
        Trend::Improving
    } else {
        Trend::Stable
    }
}

/// Lowest / highest / average over the valid points. `None` if there are none.
///
/// Ties keep the earliest date.
pub fn asset_stats(history: &AssetHistory) -> Option<AssetStats> {
    let mut points = history.iter().filter(|(_, v)| v.is_finite());
    let (first_date, first) = points.next()?;

    let mut stats = AssetStats {
        points: 1,
        lowest: *first,
        lowest_date: first_date.clone(),
        highest: *first,
        highest_date: first_date.clone(),
        average: 0.0,
    };
    let mut sum = *first;

    for (date, value) in points {
        stats.points += 1;
        sum += value;
        if *value < stats.lowest {
            stats.lowest = *value;
            stats.lowest_date = date.clone();
        }
        if *value > stats.highest {
            stats.highest = *value;
            stats.highest_date = date.clone();
        }
    }
    stats.average = sum / stats.points as f64;

    Some(stats)
}

fn valid_values(history: &AssetHistory) -> Vec<f64> {
    history.values().copied().filter(|v| v.is_finite()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(values: &[f64]) -> AssetHistory {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("2024-08-{:02}", i + 1), *v))
            .collect()
    }

    #[test]
    fn zero_or_one_point_is_neutral() {
        assert_eq!(analyze_performance(&history(&[])), PerformanceAnalysis::NEUTRAL);
        assert_eq!(analyze_performance(&history(&[0.0095])), PerformanceAnalysis::NEUTRAL);
        // NaN entries do not count towards the minimum.
        assert_eq!(
            analyze_performance(&history(&[0.0095, f64::NAN])),
            PerformanceAnalysis::NEUTRAL
        );
    }

    #[test]
    fn steady_decline_is_declining_without_anomaly() {
        let h = history(&[
            0.0095, 0.00945, 0.0094, 0.0093, 0.0092, 0.0090, 0.0088, 0.0085, 0.0082, 0.0080,
        ]);
        let a = analyze_performance(&h);
        assert_eq!(a.trend, Trend::Declining);
        assert!((a.change_percentage + 15.789).abs() < 0.01);
        assert!(!a.anomaly_detected);
    }

    #[test]
    fn oldest_and_newest_follow_date_order_not_insertion_order() {
        let mut h = AssetHistory::new();
        h.insert("2024-08-10".into(), 0.0110);
        h.insert("2024-08-01".into(), 0.0100);
        let a = analyze_performance(&h);
        assert!((a.change_percentage - 10.0).abs() < 1e-9);
        assert_eq!(a.trend, Trend::Improving);
    }

    #[test]
    fn single_dip_is_an_anomaly_on_a_flat_trend() {
        let h = history(&[
            0.0095, 0.00948, 0.00949, 0.00951, 0.00952, 0.0048, 0.00945, 0.00947, 0.00948, 0.0095,
        ]);
        let a = analyze_performance(&h);
        assert_eq!(a.trend, Trend::Stable);
        assert!(a.anomaly_detected);
    }

    #[test]
    fn trend_thresholds_are_exclusive() {
        assert_eq!(classify_trend(-3.0), Trend::Stable);
        assert_eq!(classify_trend(3.0), Trend::Stable);
        assert_eq!(classify_trend(-3.01), Trend::Declining);
        assert_eq!(classify_trend(3.01), Trend::Improving);
    }

    #[test]
    fn zero_baseline_reports_no_change() {
        let a = analyze_performance(&history(&[0.0, 0.009]));
        assert_eq!(a.change_percentage, 0.0);
        assert_eq!(a.trend, Trend::Stable);
    }

    #[test]
    fn stats_track_extremes_with_dates() {
        let h = history(&[0.0090, 0.0080, 0.0100, 0.0080]);
        let s = asset_stats(&h).unwrap();
        assert_eq!(s.points, 4);
        assert_eq!(s.lowest, 0.0080);
        assert_eq!(s.lowest_date, "2024-08-02");
        assert_eq!(s.highest_date, "2024-08-03");
        assert!((s.average - 0.00875).abs() < 1e-12);
        assert!(asset_stats(&AssetHistory::new()).is_none());
    }
}
