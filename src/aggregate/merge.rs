//! Merge normalized datasets under the override policy.
//!
//! Datasets are folded in rank order; for every `(date, asset)` key the value
//! from the highest-ranked dataset that defines it wins.

use rayon::prelude::*;

use crate::data::SourceRegistry;
use crate::domain::{DateRange, MergedDataset, NormalizedDataset};
use crate::error::AppError;
use crate::io::ingest::{LoadFailure, load_source};

/// Merge datasets given in ascending override rank.
pub fn merge_datasets(datasets: &[NormalizedDataset]) -> MergedDataset {
    let mut merged = MergedDataset::default();

    for dataset in datasets {
        for (date, assets) in &dataset.pr_data {
            let slot = merged.pr_data.entry(date.clone()).or_default();
            for (asset_id, value) in assets {
                slot.insert(asset_id.clone(), *value);
            }
        }
        merged.metadata.source_files.push(dataset.source.clone());
    }

    merged.metadata.total_dates = merged.pr_data.len();
    merged.metadata.date_range = DateRange {
        earliest: merged.pr_data.keys().next().cloned(),
        latest: merged.pr_data.keys().next_back().cloned(),
    };

    merged
}

/// Run one full discover → load → merge pass.
///
/// Sources are loaded in parallel and re-assembled in rank order. A source
/// that fails to load is logged and left out; only the failure of *every*
/// source is an error.
pub fn load_and_merge(registry: &dyn SourceRegistry) -> Result<MergedDataset, AppError> {
    let descriptors = registry.discover();

    let results: Vec<Result<NormalizedDataset, LoadFailure>> =
        descriptors.par_iter().map(load_source).collect();

    let mut loaded = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(dataset) => loaded.push(dataset),
            Err(e) => {
                tracing::warn!(source = e.source_name(), error = %e, "skipping performance source");
            }
        }
    }

    if loaded.is_empty() {
        return Err(AppError::data_unavailable());
    }

    Ok(merge_datasets(&loaded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticRegistry;
    use crate::domain::{SourceDescriptor, SourceFormat};

    fn dataset(name: &str, entries: &[(&str, &str, f64)]) -> NormalizedDataset {
        let mut ds = NormalizedDataset::new(name);
        for (date, asset, value) in entries {
            ds.record(date, asset, Some(*value));
        }
        ds
    }

    #[test]
    fn highest_rank_wins_per_key() {
        let d1 = dataset(
            "primary",
            &[("2024-08-01", "A", 1.0), ("2024-08-01", "B", 1.0), ("2024-08-02", "A", 1.0)],
        );
        let d2 = dataset("second", &[("2024-08-01", "A", 2.0), ("2024-08-03", "C", 2.0)]);
        let d3 = dataset("third", &[("2024-08-01", "A", 3.0), ("2024-08-02", "B", 3.0)]);

        let merged = merge_datasets(&[d1, d2, d3]);

        assert_eq!(merged.pr_data["2024-08-01"]["A"], 3.0);
        // Untouched keys from lower ranks survive.
        assert_eq!(merged.pr_data["2024-08-01"]["B"], 1.0);
        assert_eq!(merged.pr_data["2024-08-02"]["A"], 1.0);
        assert_eq!(merged.pr_data["2024-08-02"]["B"], 3.0);
        assert_eq!(merged.pr_data["2024-08-03"]["C"], 2.0);
        assert_eq!(merged.metadata.source_files, ["primary", "second", "third"]);
    }

    #[test]
    fn metadata_tracks_lexicographic_range_and_count() {
        let d1 = dataset("a", &[("2024-09-10", "A", 1.0), ("2024-08-31", "A", 1.0)]);
        let d2 = dataset("b", &[("2024-10-01", "A", 1.0), ("2024-08-31", "B", 1.0)]);

        let merged = merge_datasets(&[d1, d2]);

        assert_eq!(merged.metadata.total_dates, 3);
        assert_eq!(merged.metadata.earliest(), Some("2024-08-31"));
        assert_eq!(merged.metadata.latest(), Some("2024-10-01"));
    }

    #[test]
    fn empty_input_has_no_range() {
        let merged = merge_datasets(&[]);
        assert_eq!(merged.metadata.total_dates, 0);
        assert_eq!(merged.metadata.date_range, DateRange::default());
    }

    #[test]
    fn failed_sources_are_skipped_and_not_listed() {
        let registry = StaticRegistry::new([
            SourceDescriptor::inline("primary", 0, SourceFormat::Json, r#"{"2024-08-01": {"A": 0.009}}"#),
            SourceDescriptor::inline("broken", 0, SourceFormat::Json, "{ nope"),
            SourceDescriptor::inline(
                "patch",
                0,
                SourceFormat::Csv,
                "date,asset_id,value\n2024-08-01,A,0.0095\n",
            ),
        ]);

        let merged = load_and_merge(&registry).unwrap();

        assert_eq!(merged.metadata.source_files, ["primary", "patch"]);
        assert_eq!(merged.pr_data["2024-08-01"]["A"], 0.0095);
    }

    #[test]
    fn no_loadable_source_is_unavailable() {
        let registry = StaticRegistry::new([SourceDescriptor::inline("primary", 0, SourceFormat::Json, "[]")]);
        let err = load_and_merge(&registry).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
