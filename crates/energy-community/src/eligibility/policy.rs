use super::paths::contributing_facts;
use super::{PathOutcome, Reason};
use crate::attributes::{Coverage, DatasetKind, Determination, Fact, FactSheet};

/// OR across paths under three-valued logic.
///
/// A single true path qualifies; only when every path is determined false is the answer
/// false. Anything else (including "all unknown") stays unknown.
pub(crate) fn combine(paths: &[PathOutcome]) -> Determination {
    Determination::any(paths.iter().map(|path| path.outcome))
}

pub(crate) fn reasons(paths: &[PathOutcome]) -> Vec<Reason> {
    paths
        .iter()
        .filter(|path| path.outcome == Determination::True)
        .map(|path| Reason {
            path: path.path,
            source_dataset: path.dataset,
            dataset_version: path.dataset_version,
            boundary: path.boundary.clone(),
            facts: contributing_facts(path),
        })
        .collect()
}

/// Informational observations that never change the verdict.
pub(crate) fn notes(tract: &FactSheet, county: &FactSheet, paths: &[PathOutcome]) -> Vec<String> {
    let mut notes = Vec::new();

    if tract.fact(DatasetKind::CoalClosure, Fact::AdjacentToClosure) == Determination::True {
        notes.push(format!(
            "tract {} adjoins a coal closure tract; adjacency alone does not qualify under the coal closure path",
            tract.boundary
        ));
    }

    let msa = county
        .fact(DatasetKind::FfeUnemployment, Fact::IsMsa)
        .as_bool()
        .or_else(|| {
            county
                .fact(DatasetKind::PersistentPoverty, Fact::IsMsa)
                .as_bool()
        });
    match msa {
        Some(true) => notes.push(format!(
            "county {} is part of a metropolitan statistical area",
            county.boundary
        )),
        Some(false) => notes.push(format!(
            "county {} is outside any metropolitan statistical area",
            county.boundary
        )),
        None => {}
    }

    for (dataset, facts) in tract.datasets.iter().chain(county.datasets.iter()) {
        if facts.coverage == Coverage::NotIngested {
            notes.push(format!(
                "{} dataset has not been ingested; its path is undetermined",
                dataset.label()
            ));
        }
    }

    notes.extend(paths.iter().filter_map(undetermined));
    notes
}

/// Why an ingested path still came out unknown. Missing datasets are noted above.
fn undetermined(outcome: &PathOutcome) -> Option<String> {
    if outcome.outcome != Determination::Unknown {
        return None;
    }
    match outcome.coverage? {
        Coverage::NotIngested => None,
        Coverage::NoRecord => Some(format!(
            "{} path is undetermined: {} has no {} record",
            outcome.path.label(),
            outcome.boundary,
            outcome.dataset.label()
        )),
        Coverage::Recorded => Some(format!(
            "{} path is undetermined: a deciding fact is blank for {}",
            outcome.path.label(),
            outcome.boundary
        )),
    }
}
