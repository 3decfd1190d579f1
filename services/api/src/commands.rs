use crate::infra::{load_snapshot, parse_date};
use chrono::NaiveDate;
use clap::Args;
use energy_community::config::AppConfig;
use energy_community::error::AppError;
use energy_community::telemetry;
use energy_community::{DirectoryFeed, EligibilityService, SnapshotStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Longitude in decimal degrees (NAD83)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lng: f64,
    /// Latitude in decimal degrees (NAD83)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lat: f64,
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CheckArgs {
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Date stamped on records without an "added" column (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let config = prepare(args.data_dir)?;
    let snapshots = Arc::new(SnapshotStore::new());
    load_snapshot(&snapshots, DirectoryFeed::new(&config.data.data_dir))?;

    let verdict = EligibilityService::new(snapshots).evaluate_point(args.lng, args.lat)?;
    print_json(&verdict)
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let config = prepare(args.data_dir)?;
    let mut feed = DirectoryFeed::new(&config.data.data_dir);
    if let Some(date) = args.as_of {
        feed = feed.with_ingested_on(date);
    }

    let report = load_snapshot(&SnapshotStore::new(), feed)?;
    print_json(&report)
}

fn prepare(data_dir: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = data_dir {
        config.data.data_dir = data_dir;
    }
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
    println!("{rendered}");
    Ok(())
}
