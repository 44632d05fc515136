//! Command-line parsing for the `solar` performance-ratio tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! aggregation and insight code. Every global option has an environment
//! fallback so a `.env` file can pin the data directory and plant.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{AggregatorConfig, DEFAULT_CACHE_TTL_SECS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "solar", version, about = "Solar plant performance-ratio aggregation and insights")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Directory holding `pr_<plant>.json` and `pr_<plant>_*.{json,csv}`.
    #[arg(long, env = "SOLAR_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Plant code used to name source files.
    #[arg(long, env = "SOLAR_PLANT", default_value = "ICR17", global = true)]
    pub plant: String,

    /// Seconds a merged snapshot stays fresh.
    #[arg(long, env = "SOLAR_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS, global = true)]
    pub cache_ttl_secs: i64,
}

impl GlobalArgs {
    pub fn aggregator_config(&self) -> AggregatorConfig {
        let mut config = AggregatorConfig::new(self.data_dir.clone(), self.plant.clone());
        config.cache_ttl = chrono::Duration::seconds(self.cache_ttl_secs.max(0));
        config
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every date present in the merged data.
    Dates,
    /// Show per-asset values for one date.
    Date(DateArgs),
    /// Summarize the merged snapshot (sources, date range), optionally exporting it.
    Snapshot(SnapshotArgs),
    /// Show one asset's history with summary statistics.
    History(HistoryArgs),
    /// Analyze one asset and print the generated insights.
    Insights(InsightArgs),
    /// Run the built-in scenarios through the insight engine.
    Scenarios(ScenarioArgs),
    /// Write a deterministic synthetic dataset.
    Generate(GenerateArgs),
    /// Poll the cached snapshot and report recomputations.
    Watch(WatchArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct DateArgs {
    /// Date key (YYYY-MM-DD).
    pub date: String,
}

#[derive(Debug, Parser, Clone)]
pub struct SnapshotArgs {
    /// Export `{pr_data, metadata}` to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct HistoryArgs {
    pub asset: String,

    /// Export the history to CSV (`date,asset_id,value`).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct InsightArgs {
    pub asset: String,

    /// Reference date; the asset's value on this date is the default current value.
    #[arg(long)]
    pub date: Option<String>,

    /// Explicit current performance ratio.
    #[arg(long = "current-pr")]
    pub current_pr: Option<f64>,

    /// Write the analysis and insights to JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ScenarioArgs {
    /// Run only this scenario (critical, warning, improvement, anomaly, low-pr, normal).
    pub name: Option<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Output directory (created if missing).
    #[arg(long)]
    pub out: PathBuf,

    /// Number of assets.
    #[arg(long, default_value_t = 8)]
    pub assets: usize,

    /// Days covered by the primary source.
    #[arg(long, default_value_t = 30)]
    pub days: usize,

    /// First date of the window.
    #[arg(long, default_value = "2024-08-01")]
    pub start: NaiveDate,

    /// Random seed (combined with the other options for reproducibility).
    #[arg(long, default_value_t = 17)]
    pub seed: u64,
}

#[derive(Debug, Parser, Clone)]
pub struct WatchArgs {
    /// Seconds between polls.
    #[arg(long, default_value_t = 5)]
    pub interval: u64,

    /// Stop after this many polls (runs until interrupted if omitted).
    #[arg(long)]
    pub iterations: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_resolve_into_config() {
        let cli = Cli::parse_from(["solar", "--data-dir", "/tmp/pr", "--plant", "X1", "--cache-ttl-secs", "5", "dates"]);
        let config = cli.global.aggregator_config();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pr"));
        assert_eq!(config.primary_file_name(), "pr_X1.json");
        assert_eq!(config.cache_ttl, chrono::Duration::seconds(5));
        assert!(matches!(cli.command, Command::Dates));
    }

    #[test]
    fn insights_args_parse() {
        let cli = Cli::parse_from([
            "solar",
            "insights",
            "L17_LT1_INV1",
            "--date",
            "2024-08-10",
            "--current-pr",
            "0.0065",
        ]);
        let Command::Insights(args) = cli.command else {
            panic!("expected insights command");
        };
        assert_eq!(args.asset, "L17_LT1_INV1");
        assert_eq!(args.date.as_deref(), Some("2024-08-10"));
        assert_eq!(args.current_pr, Some(0.0065));
    }

    #[test]
    fn generate_parses_start_date() {
        let cli = Cli::parse_from(["solar", "generate", "--out", "d", "--start", "2024-09-01"]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate command");
        };
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(args.assets, 8);
    }
}
