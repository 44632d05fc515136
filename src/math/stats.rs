//! Descriptive statistics over small series.
//!
//! Histories are at most a few hundred points, so everything here is a
//! straightforward single or double pass over a slice.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divisor `N`, not `N - 1`).
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Relative change from `from` to `to`, in percent.
///
/// `None` when `from` is zero (the relative change is undefined).
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    Some((to - from) / from * 100.0)
}

/// True if any value lies strictly more than `k` standard deviations from the mean.
///
/// A constant series has zero deviation and never qualifies.
pub fn has_outlier(values: &[f64], k: f64) -> bool {
    let (Some(mean), Some(sigma)) = (mean(values), population_std_dev(values)) else {
        return false;
    };
    let threshold = k * sigma;
    values.iter().any(|v| (v - mean).abs() > threshold)
}
