//! Immutable published state and the single-writer ingestion session that replaces it.

use crate::attributes::{
    AttributeError, AttributeTable, DatasetKind, DatasetRecord, DatasetSummary, DatasetVersion,
};
use crate::boundaries::{hierarchy, Boundary, BoundaryId, BoundaryLevel, OrphanReference};
use crate::geometry::{GeometryError, GeometryStore, LayerSummary};
use crate::ingest::{ImportError, IngestionFeed};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use tracing::{info, warn};

/// Everything a query reads, frozen at publication.
#[derive(Debug, Clone)]
pub struct Snapshot {
    geometry: GeometryStore,
    attributes: AttributeTable,
    generation: u64,
    published_at: DateTime<Utc>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            geometry: GeometryStore::default(),
            attributes: AttributeTable::default(),
            generation: 0,
            published_at: Utc::now(),
        }
    }

    pub fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// 0 until the first commit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            generation: self.generation,
            published_at: self.published_at,
            boundaries: self.geometry.summaries(),
            datasets: self.attributes.summaries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub generation: u64,
    pub published_at: DateTime<Utc>,
    pub boundaries: Vec<LayerSummary>,
    pub datasets: Vec<DatasetSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("another ingestion is already in progress")]
    InProgress,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Attributes(#[from] AttributeError),
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Step of a reload that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "target", rename_all = "snake_case")]
pub enum IngestStage {
    Session,
    Boundaries(BoundaryLevel),
    Dataset(DatasetKind),
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestStage::Session => f.write_str("opening the ingestion session"),
            IngestStage::Boundaries(level) => write!(f, "loading {level} boundaries"),
            IngestStage::Dataset(kind) => write!(f, "ingesting the {kind} dataset"),
        }
    }
}

/// A reload that stopped partway. Nothing it staged was published.
#[derive(Debug, thiserror::Error)]
#[error("ingestion failed while {stage}; the previous snapshot is still being served")]
pub struct PartialIngestion {
    pub stage: IngestStage,
    #[source]
    pub source: IngestError,
}

impl PartialIngestion {
    pub fn is_busy(&self) -> bool {
        matches!(self.source, IngestError::InProgress)
    }
}

/// Outcome of a committed ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub generation: u64,
    pub published_at: DateTime<Utc>,
    pub boundaries: Vec<LayerSummary>,
    pub datasets: Vec<DatasetSummary>,
    /// Levels and datasets the feed had nothing for; their previous content was kept.
    pub skipped: Vec<String>,
    pub orphans: Vec<OrphanReference>,
}

/// Holder of the serving snapshot.
///
/// Readers clone the `Arc` once and never block on ingestion. At most one
/// [`IngestionSession`] exists at a time.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    gate: Mutex<()>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            gate: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Opens a session staged from the current snapshot.
    ///
    /// Fails immediately with [`IngestError::InProgress`] instead of waiting for another
    /// session to finish.
    pub fn begin(&self) -> Result<IngestionSession<'_>, IngestError> {
        let guard = match self.gate.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(IngestError::InProgress),
        };

        let base = self.current();
        Ok(IngestionSession {
            store: self,
            _gate: guard,
            geometry: base.geometry.clone(),
            attributes: base.attributes.clone(),
            boundaries: Vec::new(),
            datasets: Vec::new(),
        })
    }

    /// Reads every level and dataset from `feed` and publishes them together.
    ///
    /// Any failure drops the session, so the serving snapshot is untouched.
    pub fn reload<F>(&self, feed: &F) -> Result<IngestionReport, PartialIngestion>
    where
        F: IngestionFeed + ?Sized,
    {
        let fail = |stage: IngestStage| {
            move |source: IngestError| PartialIngestion { stage, source }
        };

        let mut session = self.begin().map_err(fail(IngestStage::Session))?;
        let mut skipped = Vec::new();

        for level in BoundaryLevel::ordered() {
            let stage = IngestStage::Boundaries(level);
            match feed.boundaries(level).map_err(|err| fail(stage)(err.into()))? {
                Some(batch) => {
                    session
                        .load_boundaries(level, batch.boundaries)
                        .map_err(fail(stage))?;
                }
                None => skipped.push(format!("{level} boundaries")),
            }
        }

        for kind in DatasetKind::ordered() {
            let stage = IngestStage::Dataset(kind);
            match feed.dataset(kind).map_err(|err| fail(stage)(err.into()))? {
                Some(batch) => {
                    session
                        .ingest_dataset(kind, batch.version, batch.records)
                        .map_err(fail(stage))?;
                }
                None => skipped.push(format!("{kind} dataset")),
            }
        }

        let mut report = session.commit();
        report.skipped = skipped;
        Ok(report)
    }
}

/// Staged copy of the snapshot. Dropping it without [`commit`](Self::commit) discards
/// every change.
pub struct IngestionSession<'a> {
    store: &'a SnapshotStore,
    _gate: MutexGuard<'a, ()>,
    geometry: GeometryStore,
    attributes: AttributeTable,
    boundaries: Vec<LayerSummary>,
    datasets: Vec<DatasetSummary>,
}

impl<'a> IngestionSession<'a> {
    pub fn load_boundaries(
        &mut self,
        level: BoundaryLevel,
        boundaries: Vec<Boundary>,
    ) -> Result<LayerSummary, IngestError> {
        let summary = self.geometry.load(level, boundaries)?;
        info!(%level, boundaries = summary.boundaries, "staged boundary layer");
        self.boundaries.push(summary.clone());
        Ok(summary)
    }

    pub fn ingest_dataset(
        &mut self,
        kind: DatasetKind,
        version: DatasetVersion,
        records: Vec<DatasetRecord>,
    ) -> Result<DatasetSummary, IngestError> {
        let summary = self.attributes.ingest(kind, version, records)?;
        info!(
            dataset = %kind,
            %version,
            records = summary.records,
            "staged dataset"
        );
        self.datasets.push(summary.clone());
        Ok(summary)
    }

    /// Publishes geometry and attributes in one swap.
    pub fn commit(self) -> IngestionReport {
        let orphans = audit(&self.geometry, &self.attributes);

        let mut current = self
            .store
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let snapshot = Snapshot {
            geometry: self.geometry,
            attributes: self.attributes,
            generation: current.generation + 1,
            published_at: Utc::now(),
        };
        let report = IngestionReport {
            generation: snapshot.generation,
            published_at: snapshot.published_at,
            boundaries: self.boundaries,
            datasets: self.datasets,
            skipped: Vec::new(),
            orphans,
        };
        *current = Arc::new(snapshot);
        drop(current);

        info!(
            generation = report.generation,
            layers = report.boundaries.len(),
            datasets = report.datasets.len(),
            orphans = report.orphans.len(),
            "published snapshot"
        );
        report
    }
}

/// Data-quality pass over a staged snapshot. Checks only run against loaded layers.
fn audit(geometry: &GeometryStore, attributes: &AttributeTable) -> Vec<OrphanReference> {
    let ids = |level: BoundaryLevel| -> Option<HashSet<BoundaryId>> {
        geometry
            .layer(level)
            .map(|layer| layer.ids().cloned().collect())
    };
    let mut orphans = Vec::new();

    for level in [BoundaryLevel::County, BoundaryLevel::Tract] {
        let (Some(children), Some(parent_level)) = (geometry.layer(level), level.parent()) else {
            continue;
        };
        if let Some(parents) = ids(parent_level) {
            let context = format!("{level} boundary");
            report(
                &context,
                hierarchy::find_orphans(children.ids(), &parents, &context),
                &mut orphans,
            );
        }
    }

    for kind in DatasetKind::ordered() {
        let (Some(table), Some(known)) = (attributes.dataset(kind), ids(kind.level())) else {
            continue;
        };
        let mut missing: Vec<OrphanReference> = table
            .boundaries()
            .filter(|id| !known.contains(*id))
            .map(|id| OrphanReference {
                child: id.clone(),
                missing: id.clone(),
                context: format!("{kind} record"),
            })
            .collect();
        missing.sort_by(|a, b| a.child.cmp(&b.child));
        report(&format!("{kind} record"), missing, &mut orphans);
    }

    orphans
}

fn report(context: &str, found: Vec<OrphanReference>, orphans: &mut Vec<OrphanReference>) {
    if found.is_empty() {
        return;
    }
    let sample: Vec<&str> = found.iter().take(5).map(|orphan| orphan.child.as_str()).collect();
    warn!(
        context,
        count = found.len(),
        sample = ?sample,
        "orphan references: boundaries missing from loaded layers"
    );
    orphans.extend(found);
}
