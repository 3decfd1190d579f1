//! Eligibility facts keyed by boundary, one independently versioned table per dataset.

mod record;
mod schema;

pub use record::{DatasetRecord, DatasetVersion, InvalidVersion, Provenance};
pub use schema::{DatasetKind, Determination, Fact, UnknownDataset, UnknownFact};

use crate::boundaries::{BoundaryId, BoundaryLevel};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributeError {
    #[error("{requested} facts requested for {id}, which is a {actual} identifier")]
    LevelMismatch {
        id: BoundaryId,
        requested: BoundaryLevel,
        actual: BoundaryLevel,
    },
    #[error("{dataset} record for {id} targets the {found} level; the dataset is {expected}-level")]
    WrongLevel {
        dataset: DatasetKind,
        id: BoundaryId,
        expected: BoundaryLevel,
        found: BoundaryLevel,
    },
    #[error("{dataset} contains more than one record for {id}")]
    DuplicateRecord { dataset: DatasetKind, id: BoundaryId },
    #[error("{dataset} record for {id} carries fact '{fact}', which the dataset does not publish")]
    FactOutsideSchema {
        dataset: DatasetKind,
        id: BoundaryId,
        fact: Fact,
    },
    #[error("{dataset} record for {id} is version {found}, but version {declared} is being ingested")]
    VersionMismatch {
        dataset: DatasetKind,
        id: BoundaryId,
        declared: DatasetVersion,
        found: DatasetVersion,
    },
}

/// The full record set of one dataset at one version.
#[derive(Debug, Clone)]
pub struct DatasetTable {
    kind: DatasetKind,
    version: DatasetVersion,
    records: HashMap<BoundaryId, DatasetRecord>,
}

impl DatasetTable {
    /// Validates every record before anything is kept.
    pub fn build(
        kind: DatasetKind,
        version: DatasetVersion,
        records: Vec<DatasetRecord>,
    ) -> Result<Self, AttributeError> {
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            let expected = kind.level();
            if record.level != expected || record.boundary.level() != expected {
                return Err(AttributeError::WrongLevel {
                    dataset: kind,
                    id: record.boundary.clone(),
                    expected,
                    found: if record.level != expected {
                        record.level
                    } else {
                        record.boundary.level()
                    },
                });
            }
            if let Some(fact) = record.facts.keys().find(|fact| !kind.allows(**fact)) {
                return Err(AttributeError::FactOutsideSchema {
                    dataset: kind,
                    id: record.boundary.clone(),
                    fact: *fact,
                });
            }
            if record.provenance.dataset_version != version {
                return Err(AttributeError::VersionMismatch {
                    dataset: kind,
                    id: record.boundary.clone(),
                    declared: version,
                    found: record.provenance.dataset_version,
                });
            }
            if by_id.contains_key(&record.boundary) {
                return Err(AttributeError::DuplicateRecord {
                    dataset: kind,
                    id: record.boundary,
                });
            }
            by_id.insert(record.boundary.clone(), record);
        }

        Ok(Self {
            kind,
            version,
            records: by_id,
        })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn version(&self) -> DatasetVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &BoundaryId) -> Option<&DatasetRecord> {
        self.records.get(id)
    }

    pub fn boundaries(&self) -> impl Iterator<Item = &BoundaryId> {
        self.records.keys()
    }

    pub fn summary(&self) -> DatasetSummary {
        let qualifying = self
            .records
            .values()
            .filter(|record| record.facts.values().any(|value| *value))
            .count();
        DatasetSummary {
            dataset: self.kind,
            version: self.version,
            records: self.records.len(),
            records_with_true_fact: qualifying,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub dataset: DatasetKind,
    pub version: DatasetVersion,
    pub records: usize,
    pub records_with_true_fact: usize,
}

/// Whether a dataset had anything to say about a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// The dataset has never been ingested.
    NotIngested,
    /// The dataset is loaded but has no row for this boundary.
    NoRecord,
    Recorded,
}

/// One dataset's view of a boundary: every schema fact, tri-state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetFacts {
    pub coverage: Coverage,
    pub facts: BTreeMap<Fact, Determination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DatasetFacts {
    fn undetermined(kind: DatasetKind, coverage: Coverage) -> Self {
        Self {
            coverage,
            facts: kind
                .schema()
                .iter()
                .map(|fact| (*fact, Determination::Unknown))
                .collect(),
            provenance: None,
            label: None,
        }
    }

    fn from_record(kind: DatasetKind, record: &DatasetRecord) -> Self {
        Self {
            coverage: Coverage::Recorded,
            facts: kind
                .schema()
                .iter()
                .map(|fact| (*fact, Determination::from(record.fact(*fact))))
                .collect(),
            provenance: Some(record.provenance.clone()),
            label: record.label.clone(),
        }
    }

    pub fn get(&self, fact: Fact) -> Determination {
        self.facts
            .get(&fact)
            .copied()
            .unwrap_or(Determination::Unknown)
    }
}

/// Facts for one boundary from every dataset published at its level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactSheet {
    pub boundary: BoundaryId,
    pub level: BoundaryLevel,
    pub datasets: BTreeMap<DatasetKind, DatasetFacts>,
}

impl FactSheet {
    pub fn dataset(&self, kind: DatasetKind) -> Option<&DatasetFacts> {
        self.datasets.get(&kind)
    }

    /// `Unknown` when the dataset is not part of this sheet's level.
    pub fn fact(&self, kind: DatasetKind, fact: Fact) -> Determination {
        self.dataset(kind)
            .map(|facts| facts.get(fact))
            .unwrap_or(Determination::Unknown)
    }
}

/// Every ingested dataset.
///
/// Tables sit behind `Arc` so staging a new snapshot clones pointers, and `ingest`
/// swaps a whole table at once.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    datasets: BTreeMap<DatasetKind, Arc<DatasetTable>>,
}

impl AttributeTable {
    /// Replaces the dataset's entire record set. On error nothing changes.
    pub fn ingest(
        &mut self,
        kind: DatasetKind,
        version: DatasetVersion,
        records: Vec<DatasetRecord>,
    ) -> Result<DatasetSummary, AttributeError> {
        let table = DatasetTable::build(kind, version, records)?;
        let summary = table.summary();
        self.datasets.insert(kind, Arc::new(table));
        Ok(summary)
    }

    pub fn dataset(&self, kind: DatasetKind) -> Option<&DatasetTable> {
        self.datasets.get(&kind).map(Arc::as_ref)
    }

    pub fn facts_for(
        &self,
        level: BoundaryLevel,
        id: &BoundaryId,
    ) -> Result<FactSheet, AttributeError> {
        if id.level() != level {
            return Err(AttributeError::LevelMismatch {
                id: id.clone(),
                requested: level,
                actual: id.level(),
            });
        }

        let datasets = DatasetKind::at_level(level)
            .map(|kind| {
                let facts = match self.dataset(kind) {
                    None => DatasetFacts::undetermined(kind, Coverage::NotIngested),
                    Some(table) => match table.get(id) {
                        Some(record) => DatasetFacts::from_record(kind, record),
                        None => DatasetFacts::undetermined(kind, Coverage::NoRecord),
                    },
                };
                (kind, facts)
            })
            .collect();

        Ok(FactSheet {
            boundary: id.clone(),
            level,
            datasets,
        })
    }

    pub fn summaries(&self) -> Vec<DatasetSummary> {
        self.datasets.values().map(|table| table.summary()).collect()
    }
}
