//! Coordinate to tract/county/state resolution.
//!
//! Only the tract layer is searched spatially. County and state are derived from the
//! tract id by truncation, so a resolved county always matches its tract's prefix even
//! when county polygons disagree with tract polygons.

use crate::boundaries::{hierarchy, BoundaryId, BoundaryLevel};
use crate::geometry::{CoordinateError, GeometryStore, Point, Selection, TieBreak};
use serde::Serialize;
use tracing::{debug, warn};

/// Overlapping tract polygons all claimed the point; one was picked deterministically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousGeometry {
    pub point: Point,
    pub selected: BoundaryId,
    pub contenders: Vec<BoundaryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub tract: BoundaryId,
    pub county: BoundaryId,
    pub state: BoundaryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tract_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    pub tie_break: TieBreak,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambiguity: Option<AmbiguousGeometry>,
}

/// Outcome of a lookup. `Unresolved` is a definite "not in covered territory".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(ResolvedLocation),
    Unresolved,
}

impl Resolution {
    pub fn location(&self) -> Option<&ResolvedLocation> {
        match self {
            Resolution::Resolved(location) => Some(location),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

pub struct PointResolver<'a> {
    geometry: &'a GeometryStore,
}

impl<'a> PointResolver<'a> {
    pub fn new(geometry: &'a GeometryStore) -> Self {
        Self { geometry }
    }

    pub fn resolve_coordinates(&self, lng: f64, lat: f64) -> Result<Resolution, CoordinateError> {
        Point::new(lng, lat).map(|point| self.resolve(point))
    }

    pub fn resolve(&self, point: Point) -> Resolution {
        let hits = self.geometry.hits(BoundaryLevel::Tract, point);
        let Some(selection) = Selection::from_hits(hits) else {
            debug!(lng = point.lng, lat = point.lat, "point outside every loaded tract");
            return Resolution::Unresolved;
        };

        let ambiguity = self.report_tie_break(point, &selection);
        Resolution::Resolved(self.locate(selection, ambiguity))
    }

    fn report_tie_break(&self, point: Point, selection: &Selection) -> Option<AmbiguousGeometry> {
        match selection.tie_break {
            TieBreak::Unique => None,
            TieBreak::SharedEdge => {
                debug!(
                    lng = point.lng,
                    lat = point.lat,
                    selected = %selection.id,
                    contenders = ?selection.contenders,
                    "point on shared tract edge; lowest id selected"
                );
                None
            }
            TieBreak::Overlap => {
                warn!(
                    lng = point.lng,
                    lat = point.lat,
                    selected = %selection.id,
                    contenders = ?selection.contenders,
                    "ambiguous geometry: overlapping tracts contain point; smallest area selected"
                );
                Some(AmbiguousGeometry {
                    point,
                    selected: selection.id.clone(),
                    contenders: selection.contenders.clone(),
                })
            }
        }
    }

    fn locate(&self, selection: Selection, ambiguity: Option<AmbiguousGeometry>) -> ResolvedLocation {
        let tract = selection.id;
        let county = hierarchy::county_of(&tract).unwrap_or_else(|| tract.clone());
        let state = hierarchy::state_of(&tract);
        let name_of = |id: &BoundaryId| {
            self.geometry
                .boundary(id)
                .map(|boundary| boundary.name.clone())
                .filter(|name| !name.is_empty())
        };

        ResolvedLocation {
            tract_name: name_of(&tract),
            county_name: name_of(&county),
            state_name: name_of(&state),
            tract,
            county,
            state,
            tie_break: selection.tie_break,
            ambiguity,
        }
    }
}
