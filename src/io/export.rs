//! Export snapshots, asset histories and insights.
//!
//! Exports are meant to be easy to consume in spreadsheets or downstream scripts:
//! JSON mirrors the in-memory shapes, CSV is one `date,asset_id,value` row per reading.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{AssetHistory, MergedDataset, NormalizedDataset};
use crate::error::AppError;

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON export '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(4, format!("Failed to write JSON export: {e}")))?;

    Ok(())
}

/// Write one asset's history to CSV (`date,asset_id,value`).
///
/// The layout matches the long-form CSV the loader accepts, so an exported
/// history can be dropped back into the data directory as a source.
pub fn write_history_csv(path: &Path, asset_id: &str, history: &AssetHistory) -> Result<(), AppError> {
    let rows = history.iter().map(|(date, value)| (date.as_str(), asset_id, *value));
    write_long_csv(path, rows)
}

/// Write a normalized dataset as a `{"pr_data": ...}` JSON source file.
pub fn write_source_json(path: &Path, dataset: &NormalizedDataset) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct SourceFile<'a> {
        pr_data: &'a crate::domain::PrData,
    }

    write_json(path, &SourceFile { pr_data: &dataset.pr_data })
}

/// Write a normalized dataset as a long-form CSV source file.
pub fn write_source_csv(path: &Path, dataset: &NormalizedDataset) -> Result<(), AppError> {
    let rows = dataset.pr_data.iter().flat_map(|(date, assets)| {
        assets
            .iter()
            .map(move |(asset_id, value)| (date.as_str(), asset_id.as_str(), *value))
    });
    write_long_csv(path, rows)
}

/// Values use the shortest representation that parses back to the same `f64`;
/// fields are quoted by the writer when needed.
fn write_long_csv<'a>(path: &Path, rows: impl Iterator<Item = (&'a str, &'a str, f64)>) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["date", "asset_id", "value"])
        .map_err(|e| AppError::new(4, format!("Failed to write CSV header: {e}")))?;

    for (date, asset_id, value) in rows {
        writer
            .write_record([date, asset_id, value.to_string().as_str()])
            .map_err(|e| AppError::new(4, format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush CSV '{}': {e}", path.display())))?;

    Ok(())
}

/// Write the merged snapshot as `{pr_data, metadata}`.
pub fn write_snapshot_json(path: &Path, merged: &MergedDataset) -> Result<(), AppError> {
    write_json(path, merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SourceDescriptor, SourceFormat};
    use crate::io::ingest::load_source;

    #[test]
    fn history_csv_round_trips_through_the_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let history = AssetHistory::from([
            ("2024-08-01".to_string(), 0.0095),
            ("2024-08-02".to_string(), 0.0093),
        ]);

        write_history_csv(&path, "INV1", &history).unwrap();

        let ds = load_source(&SourceDescriptor::file("history.csv", 0, &path)).unwrap();
        assert_eq!(ds.pr_data.len(), 2);
        assert!((ds.pr_data["2024-08-02"]["INV1"] - 0.0093).abs() < 1e-9);
    }

    #[test]
    fn history_csv_keeps_full_precision_and_quotes_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let history = AssetHistory::from([
            ("2024-08-01".to_string(), 0.009512345),
            ("2024-08-02".to_string(), 0.0000004),
        ]);

        write_history_csv(&path, "Block A, INV1", &history).unwrap();

        let ds = load_source(&SourceDescriptor::file("history.csv", 0, &path)).unwrap();
        assert_eq!(ds.entries_dropped, 0);
        assert_eq!(ds.pr_data["2024-08-01"]["Block A, INV1"], 0.009512345);
        assert_eq!(ds.pr_data["2024-08-02"]["Block A, INV1"], 0.0000004);
    }

    #[test]
    fn source_csv_reloads_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pr_T_late.csv");
        let mut dataset = NormalizedDataset::new("pr_T_late.csv");
        dataset.record("2024-08-01", "INV \"north\"", Some(0.0095123456789));
        dataset.record("2024-08-01", "INV2", Some(0.0066));
        dataset.record("2024-08-02", "INV2", Some(1e-9));

        write_source_csv(&path, &dataset).unwrap();

        let reloaded = load_source(&SourceDescriptor::file("pr_T_late.csv", 1, &path)).unwrap();
        assert_eq!(reloaded.pr_data, dataset.pr_data);
    }

    #[test]
    fn source_json_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pr_T.json");
        let mut dataset = NormalizedDataset::new("pr_T.json");
        dataset.record("2024-08-01", "INV1", Some(0.009));

        write_source_json(&path, &dataset).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let reloaded = load_source(&SourceDescriptor::inline("pr_T.json", 0, SourceFormat::Json, body.as_str())).unwrap();
        assert_eq!(reloaded.pr_data, dataset.pr_data);
    }
}
