//! Built-in datasets that each exercise one path through the rule table.
//!
//! Used by `solar scenarios` to demonstrate the engine without any data on disk.

use crate::domain::AssetHistory;

const DATES: [&str; 10] = [
    "2024-08-01",
    "2024-08-02",
    "2024-08-03",
    "2024-08-04",
    "2024-08-05",
    "2024-08-06",
    "2024-08-07",
    "2024-08-08",
    "2024-08-09",
    "2024-08-10",
];

#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub asset_id: &'static str,
    pub summary: &'static str,
    /// Rule keys the scenario is expected to trigger, in evaluation order.
    pub expected_rules: &'static [&'static str],
    values: [f64; 10],
}

impl Scenario {
    pub fn history(&self) -> AssetHistory {
        DATES
            .iter()
            .zip(self.values)
            .map(|(d, v)| (d.to_string(), v))
            .collect()
    }

    /// The most recent reading, used as the asset's current value.
    pub fn current_pr(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn reference_date(&self) -> &'static str {
        DATES[DATES.len() - 1]
    }
}

pub static SCENARIOS: [Scenario; 6] = [
    Scenario {
        name: "critical",
        asset_id: "L17_LT1_INV1",
        summary: "steady slide of roughly 16% over ten days",
        expected_rules: &["drop"],
        values: [0.0095, 0.00945, 0.0094, 0.0093, 0.0092, 0.0090, 0.0088, 0.0085, 0.0082, 0.0080],
    },
    Scenario {
        name: "warning",
        asset_id: "L17_LT1_INV2",
        summary: "moderate decline of about 5%",
        expected_rules: &["decline"],
        values: [0.0095, 0.00948, 0.00945, 0.0094, 0.00935, 0.0093, 0.00925, 0.0092, 0.0091, 0.0090],
    },
    Scenario {
        name: "improvement",
        asset_id: "L17_LT1_INV3",
        summary: "recovery of about 10% after maintenance",
        expected_rules: &["improvement"],
        values: [0.0085, 0.0086, 0.0087, 0.0088, 0.0089, 0.0090, 0.0091, 0.0092, 0.0093, 0.0094],
    },
    Scenario {
        name: "anomaly",
        asset_id: "L17_LT1_INV4",
        summary: "flat series with a single-day collapse",
        expected_rules: &["anomaly"],
        values: [0.0095, 0.00948, 0.00949, 0.00951, 0.00952, 0.0048, 0.00945, 0.00947, 0.00948, 0.0095],
    },
    Scenario {
        name: "low-pr",
        asset_id: "L17_LT1_INV5",
        summary: "stable but chronically low ratio",
        expected_rules: &["anomaly", "low-pr"],
        values: [0.0065, 0.0066, 0.00655, 0.0067, 0.00645, 0.0066, 0.0065, 0.00655, 0.00648, 0.00652],
    },
    Scenario {
        name: "normal",
        asset_id: "L17_LT1_INV6",
        summary: "healthy asset with small day-to-day noise",
        expected_rules: &["normal"],
        values: [0.0095, 0.00951, 0.00949, 0.00952, 0.0095, 0.009515, 0.009495, 0.00951, 0.009505, 0.0095],
    },
];

pub fn scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}
