//! Source loading and normalization.
//!
//! This module is responsible for turning one raw performance source (JSON or
//! long-form CSV) into a clean `date → (asset → value)` map that is safe to merge.
//!
//! Design goals:
//! - **Per-source isolation**: a malformed source is a `LoadFailure`, never a panic
//!   and never an abort of the wider aggregation
//! - **Entry-level leniency**: unparseable values are dropped and counted, not reported
//! - **Deterministic behavior**: output depends only on the payload

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;

use csv::StringRecord;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{NormalizedDataset, SourceDescriptor, SourceFormat, SourceOrigin};

/// Why a single source could not be loaded.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("failed to read source '{name}': {cause}")]
    Io {
        name: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("source '{name}' is not valid JSON: {cause}")]
    Json {
        name: String,
        #[source]
        cause: serde_json::Error,
    },

    #[error("source '{name}' is not valid CSV: {cause}")]
    Csv {
        name: String,
        #[source]
        cause: csv::Error,
    },

    #[error("source '{name}' has an unexpected shape: {detail}")]
    Shape { name: String, detail: String },

    #[error("source '{name}' has no recognised format (expected .json or .csv)")]
    UnsupportedFormat { name: String },
}

impl LoadFailure {
    pub fn source_name(&self) -> &str {
        match self {
            LoadFailure::Io { name, .. }
            | LoadFailure::Json { name, .. }
            | LoadFailure::Csv { name, .. }
            | LoadFailure::Shape { name, .. }
            | LoadFailure::UnsupportedFormat { name } => name,
        }
    }

    fn shape(name: &str, detail: impl Into<String>) -> Self {
        LoadFailure::Shape {
            name: name.to_string(),
            detail: detail.into(),
        }
    }
}

/// Load and normalize one source.
pub fn load_source(descriptor: &SourceDescriptor) -> Result<NormalizedDataset, LoadFailure> {
    let name = descriptor.name.as_str();

    let (format, body): (SourceFormat, Cow<'_, str>) = match &descriptor.origin {
        SourceOrigin::File(path) => {
            let format = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(SourceFormat::from_extension)
                .ok_or_else(|| LoadFailure::UnsupportedFormat {
                    name: name.to_string(),
                })?;
            let body = fs::read_to_string(path).map_err(|cause| LoadFailure::Io {
                name: name.to_string(),
                cause,
            })?;
            (format, Cow::Owned(body))
        }
        SourceOrigin::Inline { format, body } => (*format, Cow::Borrowed(body.as_ref())),
    };

    let dataset = match format {
        SourceFormat::Json => parse_json(name, &body)?,
        SourceFormat::Csv => parse_csv(name, &body)?,
    };

    tracing::debug!(
        source = name,
        rank = descriptor.rank,
        dates = dataset.pr_data.len(),
        kept = dataset.entries_kept(),
        dropped = dataset.entries_dropped,
        "loaded performance source"
    );

    Ok(dataset)
}

/// Parse `{"pr_data": {date: {asset: value}}}` (or the bare inner object).
fn parse_json(name: &str, body: &str) -> Result<NormalizedDataset, LoadFailure> {
    let root: Value = serde_json::from_str(body).map_err(|cause| LoadFailure::Json {
        name: name.to_string(),
        cause,
    })?;

    let Value::Object(mut root) = root else {
        return Err(LoadFailure::shape(name, "top-level value must be an object"));
    };

    let dates = match root.remove("pr_data") {
        Some(Value::Object(dates)) => dates,
        Some(_) => return Err(LoadFailure::shape(name, "`pr_data` must be an object")),
        None => root,
    };

    let mut dataset = NormalizedDataset::new(name);
    for (date, assets) in dates {
        match assets {
            Value::Object(assets) => {
                for (asset_id, value) in &assets {
                    dataset.record(&date, asset_id, json_number(value));
                }
            }
            // A date whose payload is not an asset map carries nothing usable.
            _ => {
                dataset.entries_read += 1;
                dataset.entries_dropped += 1;
            }
        }
    }

    Ok(dataset)
}

/// Parse long-form CSV rows: `date,asset_id,value`.
fn parse_csv(name: &str, body: &str) -> Result<NormalizedDataset, LoadFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|cause| LoadFailure::Csv {
            name: name.to_string(),
            cause,
        })?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = column(&header_map, &["date"])
        .ok_or_else(|| LoadFailure::shape(name, "missing required column `date`"))?;
    let asset_idx = column(&header_map, &["asset_id", "asset"])
        .ok_or_else(|| LoadFailure::shape(name, "missing required column `asset_id`"))?;
    let value_idx = column(&header_map, &["value", "pr"])
        .ok_or_else(|| LoadFailure::shape(name, "missing required column `value`"))?;

    let mut dataset = NormalizedDataset::new(name);
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                dataset.entries_read += 1;
                dataset.entries_dropped += 1;
                continue;
            }
        };

        let date = field(&record, date_idx);
        let asset_id = field(&record, asset_idx);
        match (date, asset_id) {
            (Some(date), Some(asset_id)) => {
                dataset.record(date, asset_id, parse_value(field(&record, value_idx)));
            }
            _ => {
                dataset.entries_read += 1;
                dataset.entries_dropped += 1;
            }
        }
    }

    Ok(dataset)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| header_map.get(*alias).copied())
}

fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_value(Some(s)),
        _ => None,
    }
}

fn parse_value(raw: Option<&str>) -> Option<f64> {
    let v = raw?.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
