use super::{EligibilityError, FactEvidence, PathOutcome, QualifyingPath};
use crate::attributes::{DatasetKind, Determination, Fact, FactSheet};
use crate::boundaries::BoundaryLevel;

pub(crate) fn evaluate_path(
    path: QualifyingPath,
    sheet: &FactSheet,
) -> Result<PathOutcome, EligibilityError> {
    let expected = path.level();
    if sheet.level != expected || sheet.boundary.level() != expected {
        return Err(EligibilityError::WrongSheetLevel {
            path,
            expected,
            found: sheet.level,
        });
    }

    let dataset = path.dataset();
    let value = |fact: Fact| sheet.fact(dataset, fact);

    let outcome = match path {
        // Adjacency never qualifies a tract by itself.
        QualifyingPath::CoalClosure => value(Fact::MineClosed).or(value(Fact::GeneratorRetired)),
        // Both statutory thresholds must hold together.
        QualifyingPath::FfeUnemployment => {
            value(Fact::FfeQualified).and(value(Fact::UnemploymentQualified))
        }
        QualifyingPath::PersistentPoverty => value(Fact::PersistentPoverty),
    };

    let facts = path
        .deciding_facts()
        .iter()
        .map(|fact| FactEvidence {
            fact: *fact,
            value: value(*fact),
        })
        .collect();

    let dataset_facts = sheet.dataset(dataset);
    Ok(PathOutcome {
        path,
        dataset,
        boundary: sheet.boundary.clone(),
        outcome,
        facts,
        coverage: dataset_facts.map(|facts| facts.coverage),
        dataset_version: dataset_facts
            .and_then(|facts| facts.provenance.as_ref())
            .map(|provenance| provenance.dataset_version),
    })
}

impl QualifyingPath {
    pub const fn ordered() -> [Self; 3] {
        [Self::CoalClosure, Self::FfeUnemployment, Self::PersistentPoverty]
    }

    pub const fn dataset(self) -> DatasetKind {
        match self {
            Self::CoalClosure => DatasetKind::CoalClosure,
            Self::FfeUnemployment => DatasetKind::FfeUnemployment,
            Self::PersistentPoverty => DatasetKind::PersistentPoverty,
        }
    }

    pub const fn level(self) -> BoundaryLevel {
        self.dataset().level()
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CoalClosure => "Coal closure",
            Self::FfeUnemployment => "Fossil fuel employment & unemployment",
            Self::PersistentPoverty => "Persistent poverty",
        }
    }

    /// Facts that feed the path's boolean expression.
    pub const fn deciding_facts(self) -> &'static [Fact] {
        match self {
            Self::CoalClosure => &[Fact::MineClosed, Fact::GeneratorRetired],
            Self::FfeUnemployment => &[Fact::FfeQualified, Fact::UnemploymentQualified],
            Self::PersistentPoverty => &[Fact::PersistentPoverty],
        }
    }
}

/// Evidence worth citing for a path that evaluated true.
///
/// For the OR path only the facts that are actually true contributed; for the AND path
/// and the single-fact path every deciding fact did.
pub(crate) fn contributing_facts(outcome: &PathOutcome) -> Vec<FactEvidence> {
    match outcome.path {
        QualifyingPath::CoalClosure => outcome
            .facts
            .iter()
            .filter(|evidence| evidence.value == Determination::True)
            .cloned()
            .collect(),
        QualifyingPath::FfeUnemployment | QualifyingPath::PersistentPoverty => {
            outcome.facts.clone()
        }
    }
}
