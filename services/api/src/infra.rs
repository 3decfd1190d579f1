use chrono::NaiveDate;
use energy_community::error::AppError;
use energy_community::snapshot::IngestionReport;
use energy_community::{DirectoryFeed, SnapshotStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) snapshots: Arc<SnapshotStore>,
    pub(crate) data_dir: PathBuf,
}

impl AppState {
    pub(crate) fn feed(&self) -> DirectoryFeed {
        DirectoryFeed::new(&self.data_dir)
    }

    /// Full reload from the data directory. Marks the service ready on success.
    pub(crate) fn reload(&self) -> Result<IngestionReport, AppError> {
        let report = load_snapshot(&self.snapshots, self.feed())?;
        self.readiness.store(true, Ordering::Release);
        Ok(report)
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.readiness.load(Ordering::Acquire)
    }
}

/// Loads `feed` into `store` and logs the outcome.
pub(crate) fn load_snapshot(
    store: &SnapshotStore,
    feed: DirectoryFeed,
) -> Result<IngestionReport, AppError> {
    match store.reload(&feed) {
        Ok(report) => {
            if !report.orphans.is_empty() {
                warn!(
                    orphans = report.orphans.len(),
                    "snapshot published with orphan references"
                );
            }
            info!(
                generation = report.generation,
                data_dir = %feed.root().display(),
                skipped = ?report.skipped,
                "data directory loaded"
            );
            Ok(report)
        }
        Err(err) => {
            error!(error = %err, data_dir = %feed.root().display(), "data directory load failed");
            Err(err.into())
        }
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{value}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert_eq!(
            parse_date("2024-05-01"),
            Ok(NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"))
        );
        assert!(parse_date("05/01/2024").is_err());
    }
}
