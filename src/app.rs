//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - builds the performance service over the configured data directory
//! - prints reports and writes optional exports

use std::time::Duration as StdDuration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Cli, Command, DateArgs, GenerateArgs, GlobalArgs, HistoryArgs, InsightArgs, ScenarioArgs, SnapshotArgs,
    WatchArgs,
};
use crate::data::{SampleConfig, generate_sample, write_sample};
use crate::error::AppError;
use crate::insights::{InsightRequest, SCENARIOS, Scenario, generate_insights, scenario};

pub mod service;

use service::{InsightQuery, PerformanceService};

/// Entry point for the `solar` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Dates => handle_dates(&cli.global),
        Command::Date(args) => handle_date(&cli.global, args),
        Command::Snapshot(args) => handle_snapshot(&cli.global, args),
        Command::History(args) => handle_history(&cli.global, args),
        Command::Insights(args) => handle_insights(&cli.global, args),
        Command::Scenarios(args) => handle_scenarios(args),
        Command::Generate(args) => handle_generate(&cli.global, args),
        Command::Watch(args) => handle_watch(&cli.global, args),
    }
}

/// Logs go to stderr; `RUST_LOG` filters (default `warn`), `RUST_LOG_FORMAT=json` switches format.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (e.g. when embedded); keep it.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn service(global: &GlobalArgs) -> PerformanceService {
    let config = global.aggregator_config();
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        plant = %config.plant,
        ttl_secs = config.cache_ttl.num_seconds(),
        "resolved configuration"
    );
    PerformanceService::from_config(&config)
}

fn handle_dates(global: &GlobalArgs) -> Result<(), AppError> {
    let dates = service(global).list_dates()?;
    print!("{}", crate::report::format_dates(&dates));
    Ok(())
}

fn handle_date(global: &GlobalArgs, args: DateArgs) -> Result<(), AppError> {
    let values = service(global)
        .performance_for_date(&args.date)?
        .ok_or_else(|| AppError::not_found(format!("date {}", args.date)))?;
    print!("{}", crate::report::format_date_values(&args.date, &values));
    Ok(())
}

fn handle_snapshot(global: &GlobalArgs, args: SnapshotArgs) -> Result<(), AppError> {
    let entry = service(global).cache_entry()?;
    print!(
        "{}",
        crate::report::format_snapshot_summary(&entry.snapshot, Some(entry.computed_at))
    );

    if let Some(path) = &args.export {
        crate::io::export::write_snapshot_json(path, &entry.snapshot)?;
        println!("Wrote snapshot to {}", path.display());
    }
    Ok(())
}

fn handle_history(global: &GlobalArgs, args: HistoryArgs) -> Result<(), AppError> {
    let svc = service(global);
    let history = svc.asset_history(&args.asset)?;
    if history.is_empty() {
        return Err(AppError::not_found(format!("asset {}", args.asset)));
    }
    let stats = crate::analysis::asset_stats(&history);
    print!(
        "{}",
        crate::report::format_history(&args.asset, &history, stats.as_ref())
    );

    if let Some(path) = &args.export {
        crate::io::export::write_history_csv(path, &args.asset, &history)?;
        println!("Wrote history to {}", path.display());
    }
    Ok(())
}

fn handle_insights(global: &GlobalArgs, args: InsightArgs) -> Result<(), AppError> {
    let query = InsightQuery {
        asset_id: Some(args.asset),
        reference_date: args.date,
        current_pr: args.current_pr,
    };
    let report = service(global).insight_report(&query)?;
    print!("{}", crate::report::format_insight_report(&report));

    if let Some(path) = &args.json {
        crate::io::export::write_json(path, &report)?;
        println!("Wrote insights to {}", path.display());
    }
    Ok(())
}

fn handle_scenarios(args: ScenarioArgs) -> Result<(), AppError> {
    let selected: Vec<&Scenario> = match &args.name {
        Some(name) => vec![scenario(name).ok_or_else(|| AppError::new(2, format!("Unknown scenario '{name}'.")))?],
        None => SCENARIOS.iter().collect(),
    };

    for case in selected {
        let history = case.history();
        let request = InsightRequest::new(case.asset_id, case.current_pr(), &history)
            .with_reference_date(Some(case.reference_date()));
        let insights = generate_insights(&request);

        println!(
            "=== {} ({}): {} ===",
            case.name.to_uppercase(),
            case.asset_id,
            case.summary
        );
        print!(
            "{}",
            crate::report::format_analysis(&crate::analysis::analyze_performance(&history))
        );
        print!("{}", crate::report::format_insights(&insights));
        println!();
    }
    Ok(())
}

fn handle_generate(global: &GlobalArgs, args: GenerateArgs) -> Result<(), AppError> {
    let mut config = SampleConfig::new(global.plant.clone());
    config.assets = args.assets;
    config.days = args.days;
    config.start = args.start;
    config.seed = args.seed;

    let sample = generate_sample(&config)?;
    let paths = write_sample(&args.out, &sample)?;

    for path in &paths {
        println!("Wrote {}", path.display());
    }
    for (asset_id, profile) in &sample.profiles {
        println!("  {asset_id:<16} {profile:?}");
    }
    Ok(())
}

fn handle_watch(global: &GlobalArgs, args: WatchArgs) -> Result<(), AppError> {
    let svc = service(global);
    let interval = StdDuration::from_secs(args.interval.max(1));
    let mut last_computed = None;
    let mut polls = 0u64;

    loop {
        match svc.cache_entry() {
            Ok(entry) => {
                if last_computed != Some(entry.computed_at) {
                    let meta = &entry.snapshot.metadata;
                    println!(
                        "[{}] snapshot: {} dates [{} .. {}] from {} source(s)",
                        entry.computed_at.format("%H:%M:%S"),
                        meta.total_dates,
                        meta.earliest().unwrap_or("-"),
                        meta.latest().unwrap_or("-"),
                        meta.source_files.len()
                    );
                    last_computed = Some(entry.computed_at);
                }
            }
            // Sources may appear later; keep polling.
            Err(e) => tracing::warn!(error = %e, "snapshot unavailable"),
        }

        polls += 1;
        if args.iterations.is_some_and(|n| polls >= n) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}
