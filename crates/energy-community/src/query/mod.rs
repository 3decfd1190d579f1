//! Point-in, verdict-out facade over the serving snapshot.

mod router;

pub use router::eligibility_router;

use crate::attributes::{AttributeError, Determination, FactSheet};
use crate::boundaries::{hierarchy, BoundaryId, BoundaryLevel, MalformedIdentifier};
use crate::eligibility::{EligibilityError, PathOutcome, Reason, RuleEvaluator};
use crate::geometry::{CoordinateError, Point};
use crate::resolver::{PointResolver, Resolution, ResolvedLocation};
use crate::snapshot::{SnapshotInfo, SnapshotStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateError),
    #[error(transparent)]
    MalformedIdentifier(#[from] MalformedIdentifier),
    #[error(transparent)]
    Attributes(#[from] AttributeError),
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
}

/// Answer for one coordinate, with everything needed to audit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityVerdict {
    pub queried_point: Point,
    /// Absent when the point is outside every loaded tract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ResolvedLocation>,
    pub qualifies: Determination,
    pub reasons: Vec<Reason>,
    pub paths: Vec<PathOutcome>,
    pub notes: Vec<String>,
    pub generation: u64,
}

/// Facts recorded for one boundary at its own level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<BoundaryId>,
    #[serde(flatten)]
    pub sheet: FactSheet,
    pub generation: u64,
}

/// Resolution of a point against the snapshot it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedPoint {
    pub queried_point: Point,
    #[serde(flatten)]
    pub resolution: Resolution,
    pub generation: u64,
}

pub struct EligibilityService {
    snapshots: Arc<SnapshotStore>,
    evaluator: RuleEvaluator,
}

impl EligibilityService {
    pub fn new(snapshots: Arc<SnapshotStore>) -> Self {
        Self {
            snapshots,
            evaluator: RuleEvaluator::new(),
        }
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    /// Resolves the point and evaluates every path against a single snapshot.
    ///
    /// A point outside all tracts is a definite non-match, not an error.
    pub fn evaluate_point(&self, lng: f64, lat: f64) -> Result<EligibilityVerdict, QueryError> {
        let point = Point::new(lng, lat)?;
        let snapshot = self.snapshots.current();
        let generation = snapshot.generation();

        let location = match PointResolver::new(snapshot.geometry()).resolve(point) {
            Resolution::Resolved(location) => location,
            Resolution::Unresolved => {
                let note = if snapshot.geometry().is_loaded(BoundaryLevel::Tract) {
                    "point is outside every loaded census tract"
                } else {
                    "no census tract boundaries are loaded"
                };
                debug!(lng, lat, generation, "unresolved eligibility query");
                return Ok(EligibilityVerdict {
                    queried_point: point,
                    location: None,
                    qualifies: Determination::False,
                    reasons: Vec::new(),
                    paths: Vec::new(),
                    notes: vec![note.to_string()],
                    generation,
                });
            }
        };

        let attributes = snapshot.attributes();
        let tract = attributes.facts_for(BoundaryLevel::Tract, &location.tract)?;
        let county = attributes.facts_for(BoundaryLevel::County, &location.county)?;
        let evaluation = self.evaluator.evaluate(&tract, &county)?;

        debug!(
            lng,
            lat,
            generation,
            tract = %location.tract,
            qualifies = ?evaluation.qualifies,
            "evaluated eligibility"
        );

        Ok(EligibilityVerdict {
            queried_point: point,
            location: Some(location),
            qualifies: evaluation.qualifies,
            reasons: evaluation.reasons,
            paths: evaluation.paths,
            notes: evaluation.notes,
            generation,
        })
    }

    pub fn resolve(&self, lng: f64, lat: f64) -> Result<LocatedPoint, QueryError> {
        let point = Point::new(lng, lat)?;
        let snapshot = self.snapshots.current();
        Ok(LocatedPoint {
            queried_point: point,
            resolution: PointResolver::new(snapshot.geometry()).resolve(point),
            generation: snapshot.generation(),
        })
    }

    /// Facts for any state, county or tract id, at the id's own level.
    pub fn facts_for(&self, geoid: &str) -> Result<BoundaryFacts, QueryError> {
        let id = BoundaryId::parse(geoid.trim())?;
        let snapshot = self.snapshots.current();
        let sheet = snapshot.attributes().facts_for(id.level(), &id)?;
        let name = snapshot
            .geometry()
            .boundary(&id)
            .map(|boundary| boundary.name.clone());

        Ok(BoundaryFacts {
            name,
            parent: hierarchy::parent(&id),
            sheet,
            generation: snapshot.generation(),
        })
    }

    pub fn snapshot_info(&self) -> SnapshotInfo {
        self.snapshots.current().info()
    }
}
