mod paths;
mod policy;

use crate::attributes::{Coverage, DatasetKind, DatasetVersion, Determination, Fact, FactSheet};
use crate::boundaries::{hierarchy, BoundaryId, BoundaryLevel};
use serde::Serialize;

/// The three independent ways a location can be an energy community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualifyingPath {
    CoalClosure,
    FfeUnemployment,
    PersistentPoverty,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EligibilityError {
    #[error("{path:?} path needs {expected}-level facts but was given {found}-level facts")]
    WrongSheetLevel {
        path: QualifyingPath,
        expected: BoundaryLevel,
        found: BoundaryLevel,
    },
    #[error("county {county} is not the parent of tract {tract}")]
    CountyMismatch { tract: BoundaryId, county: BoundaryId },
}

/// A fact value as it was read during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactEvidence {
    pub fact: Fact,
    pub value: Determination,
}

/// Result of one path, kept whether or not it qualified so audits see the full trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathOutcome {
    pub path: QualifyingPath,
    pub dataset: DatasetKind,
    pub boundary: BoundaryId,
    pub outcome: Determination,
    pub facts: Vec<FactEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_version: Option<DatasetVersion>,
}

/// Why a location qualifies: one entry per path that evaluated true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reason {
    pub path: QualifyingPath,
    pub source_dataset: DatasetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_version: Option<DatasetVersion>,
    pub boundary: BoundaryId,
    pub facts: Vec<FactEvidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub qualifies: Determination,
    pub reasons: Vec<Reason>,
    pub paths: Vec<PathOutcome>,
    pub notes: Vec<String>,
}

/// Stateless evaluator combining tract and county fact sheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl RuleEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates all paths. Each path reads only the sheet of its own level, and the
    /// county sheet must belong to the tract's own county.
    pub fn evaluate(
        &self,
        tract: &FactSheet,
        county: &FactSheet,
    ) -> Result<Evaluation, EligibilityError> {
        if let Some(parent) = hierarchy::parent(&tract.boundary) {
            if tract.level == BoundaryLevel::Tract && parent != county.boundary {
                return Err(EligibilityError::CountyMismatch {
                    tract: tract.boundary.clone(),
                    county: county.boundary.clone(),
                });
            }
        }

        let paths = QualifyingPath::ordered()
            .into_iter()
            .map(|path| {
                let sheet = match path.level() {
                    BoundaryLevel::Tract => tract,
                    _ => county,
                };
                paths::evaluate_path(path, sheet)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Evaluation {
            qualifies: policy::combine(&paths),
            reasons: policy::reasons(&paths),
            notes: policy::notes(tract, county, &paths),
            paths,
        })
    }
}
