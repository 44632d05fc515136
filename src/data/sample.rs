//! Deterministic synthetic performance-ratio datasets.
//!
//! Produces a primary source plus one supplementary "late readings" source for
//! a plant, shaped so that every insight rule has something to find:
//!
//! - healthy assets hover around the nominal ratio
//! - degrading assets lose a fixed share of their ratio across the window
//! - intermittent assets collapse for a single day
//! - underperforming assets sit below the low-ratio threshold
//!
//! The supplementary source re-reports the last few days of the primary window
//! (corrections) and extends it by a few days, so merging exercises override.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{AggregatorConfig, NormalizedDataset, SourceFormat};
use crate::error::AppError;
use crate::io::export::{write_source_csv, write_source_json};

const NOMINAL_PR: f64 = 0.0095;
const UNDERPERFORMING_PR: f64 = 0.0066;
const NOISE_SIGMA: f64 = 0.00003;
/// Fraction of the ratio a degrading asset loses over the window.
const DEGRADATION: f64 = 0.15;
/// Ratio multiplier on an intermittent asset's bad day.
const DIP_FACTOR: f64 = 0.5;
/// Correction applied to re-reported days in the supplementary source.
const CORRECTION_FACTOR: f64 = 1.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetProfile {
    Healthy,
    Degrading,
    Intermittent,
    Underperforming,
}

impl AssetProfile {
    /// Round-robin assignment so small plants still cover every profile.
    fn for_index(i: usize) -> Self {
        match i % 4 {
            0 => AssetProfile::Healthy,
            1 => AssetProfile::Degrading,
            2 => AssetProfile::Intermittent,
            _ => AssetProfile::Underperforming,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub plant: String,
    pub assets: usize,
    pub start: NaiveDate,
    /// Days covered by the primary source.
    pub days: usize,
    /// Trailing primary days re-reported by the supplementary source.
    pub overlap_days: usize,
    /// Days after the primary window covered only by the supplementary source.
    pub extra_days: usize,
    pub seed: u64,
}

impl SampleConfig {
    pub fn new(plant: impl Into<String>) -> Self {
        Self {
            plant: plant.into(),
            assets: 8,
            start: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap_or(NaiveDate::MIN),
            days: 30,
            overlap_days: 3,
            extra_days: 5,
            seed: 17,
        }
    }

    pub fn asset_id(&self, i: usize) -> String {
        format!("L17_LT1_INV{}", i + 1)
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub primary: NormalizedDataset,
    pub supplementary: NormalizedDataset,
    pub profiles: Vec<(String, AssetProfile)>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.assets == 0 {
        return Err(AppError::new(2, "Sample asset count must be > 0."));
    }
    if config.days < 3 {
        return Err(AppError::new(2, "Sample window must cover at least 3 days."));
    }
    if config.overlap_days > config.days {
        return Err(AppError::new(2, "Overlap cannot exceed the primary window."));
    }

    let aggregator = AggregatorConfig::new(PathBuf::new(), config.plant.as_str());
    let mut primary = NormalizedDataset::new(aggregator.primary_file_name());
    let mut supplementary = NormalizedDataset::new(format!(
        "{}late.{}",
        aggregator.supplementary_prefix(),
        SourceFormat::Csv.extension()
    ));

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let noise = Normal::new(0.0, NOISE_SIGMA)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let total_days = config.days + config.extra_days;
    let overlap_start = config.days - config.overlap_days;
    let mut profiles = Vec::with_capacity(config.assets);

    for i in 0..config.assets {
        let asset_id = config.asset_id(i);
        let profile = AssetProfile::for_index(i);
        // Keep the bad day away from the window edges so it never becomes the
        // oldest or newest reading.
        let dip_day = rng.gen_range(1..config.days - 1);

        for day in 0..total_days {
            let date = (config.start + Duration::days(day as i64)).format("%Y-%m-%d").to_string();
            let progress = day as f64 / (total_days - 1) as f64;

            let level = match profile {
                AssetProfile::Healthy => NOMINAL_PR,
                AssetProfile::Degrading => NOMINAL_PR * (1.0 - DEGRADATION * progress),
                AssetProfile::Intermittent if day == dip_day => NOMINAL_PR * DIP_FACTOR,
                AssetProfile::Intermittent => NOMINAL_PR,
                AssetProfile::Underperforming => UNDERPERFORMING_PR,
            };
            let value = (level + noise.sample(&mut rng)).max(0.0);

            if day < config.days {
                primary.record(&date, &asset_id, Some(value));
            }
            if day >= overlap_start {
                let reported = if day < config.days { value * CORRECTION_FACTOR } else { value };
                supplementary.record(&date, &asset_id, Some(reported));
            }
        }

        profiles.push((asset_id, profile));
    }

    tracing::debug!(
        plant = %config.plant,
        assets = config.assets,
        primary_entries = primary.entries_kept(),
        supplementary_entries = supplementary.entries_kept(),
        "generated sample dataset"
    );

    Ok(SampleData {
        primary,
        supplementary,
        profiles,
    })
}

/// Write both sources into `dir`, returning the written paths (primary first).
pub fn write_sample(dir: &Path, sample: &SampleData) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create data directory '{}': {e}", dir.display())))?;

    let primary_path = dir.join(&sample.primary.source);
    write_source_json(&primary_path, &sample.primary)?;

    let supplementary_path = dir.join(&sample.supplementary.source);
    write_source_csv(&supplementary_path, &sample.supplementary)?;

    Ok(vec![primary_path, supplementary_path])
}

fn sample_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.plant.hash(&mut hasher);
    config.assets.hash(&mut hasher);
    config.start.hash(&mut hasher);
    config.days.hash(&mut hasher);
    config.overlap_days.hash(&mut hasher);
    config.extra_days.hash(&mut hasher);
    config.seed.hash(&mut hasher);
    hasher.finish()
}
