use super::index::GridIndex;
use super::polygon::Containment;
use super::Point;
use crate::boundaries::{Boundary, BoundaryId, BoundaryLevel};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("boundary {id} is a {actual} identifier but was loaded into the {expected} layer")]
    LevelMismatch {
        id: BoundaryId,
        expected: BoundaryLevel,
        actual: BoundaryLevel,
    },
    #[error("boundary {id} appears more than once in the {level} layer")]
    DuplicateBoundary { id: BoundaryId, level: BoundaryLevel },
    #[error("no {level} boundary contains ({lng}, {lat})")]
    NotFound {
        level: BoundaryLevel,
        lng: f64,
        lat: f64,
    },
}

/// A boundary whose geometry contains (or touches) the queried point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub id: BoundaryId,
    pub containment: Containment,
    pub area: f64,
}

/// How a single boundary was chosen from the hits for a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Exactly one candidate.
    Unique,
    /// Point sits on an edge shared by several boundaries; lowest id wins.
    SharedEdge,
    /// Point is strictly inside several boundaries; smallest area, then lowest id wins.
    Overlap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub id: BoundaryId,
    pub tie_break: TieBreak,
    /// Every boundary that competed, winner included, sorted by id.
    pub contenders: Vec<BoundaryId>,
}

impl Selection {
    /// Picks one boundary deterministically.
    ///
    /// Interior hits always beat edge-only hits. Several interior hits mean the source
    /// data has overlapping polygons: the smallest area wins, then the lowest id. Several
    /// edge-only hits mean the point is on a shared border: the lowest id wins.
    pub fn from_hits(hits: Vec<Hit>) -> Option<Self> {
        let has_interior = hits
            .iter()
            .any(|hit| hit.containment == Containment::Inside);
        let mut pool: Vec<Hit> = hits
            .into_iter()
            .filter(|hit| {
                hit.containment == Containment::Inside
                    || (!has_interior && hit.containment == Containment::Boundary)
            })
            .collect();

        let tie_break = match pool.len() {
            0 => return None,
            1 => TieBreak::Unique,
            _ if has_interior => TieBreak::Overlap,
            _ => TieBreak::SharedEdge,
        };

        match tie_break {
            TieBreak::Overlap => {
                pool.sort_by(|a, b| a.area.total_cmp(&b.area).then_with(|| a.id.cmp(&b.id)))
            }
            TieBreak::Unique | TieBreak::SharedEdge => pool.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        let id = pool[0].id.clone();
        let mut contenders: Vec<BoundaryId> = pool.into_iter().map(|hit| hit.id).collect();
        contenders.sort();

        Some(Self {
            id,
            tie_break,
            contenders,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub level: BoundaryLevel,
    pub boundaries: usize,
    pub grid_columns: usize,
    pub grid_rows: usize,
    pub grid_split_cells: usize,
}

/// All boundaries of one level plus the spatial index over them.
#[derive(Debug, Clone)]
pub struct GeometryLayer {
    level: BoundaryLevel,
    boundaries: Vec<Boundary>,
    areas: Vec<f64>,
    lookup: HashMap<BoundaryId, usize>,
    index: GridIndex,
}

impl GeometryLayer {
    pub fn build(level: BoundaryLevel, boundaries: Vec<Boundary>) -> Result<Self, GeometryError> {
        let mut lookup = HashMap::with_capacity(boundaries.len());
        for (slot, boundary) in boundaries.iter().enumerate() {
            if boundary.level() != level {
                return Err(GeometryError::LevelMismatch {
                    id: boundary.id.clone(),
                    expected: level,
                    actual: boundary.level(),
                });
            }
            if lookup.insert(boundary.id.clone(), slot).is_some() {
                return Err(GeometryError::DuplicateBoundary {
                    id: boundary.id.clone(),
                    level,
                });
            }
        }

        let boxes: Vec<_> = boundaries
            .iter()
            .map(|boundary| boundary.geometry.bounding_box())
            .collect();
        let areas = boundaries
            .iter()
            .map(|boundary| boundary.geometry.area())
            .collect();

        Ok(Self {
            level,
            index: GridIndex::build(&boxes),
            boundaries,
            areas,
            lookup,
        })
    }

    pub fn level(&self) -> BoundaryLevel {
        self.level
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn get(&self, id: &BoundaryId) -> Option<&Boundary> {
        self.lookup.get(id).map(|slot| &self.boundaries[*slot])
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn ids(&self) -> impl Iterator<Item = &BoundaryId> {
        self.boundaries.iter().map(|boundary| &boundary.id)
    }

    /// Exact containment test against every index candidate for `point`.
    pub fn hits(&self, point: Point) -> Vec<Hit> {
        self.index
            .candidates(point)
            .iter()
            .filter_map(|slot| {
                let slot = *slot as usize;
                let boundary = &self.boundaries[slot];
                let containment = boundary.geometry.locate(point);
                containment.is_contained().then(|| Hit {
                    id: boundary.id.clone(),
                    containment,
                    area: self.areas[slot],
                })
            })
            .collect()
    }

    pub fn summary(&self) -> LayerSummary {
        let (grid_columns, grid_rows) = self.index.dimensions();
        LayerSummary {
            level: self.level,
            boundaries: self.boundaries.len(),
            grid_columns,
            grid_rows,
            grid_split_cells: self.index.split_cells(),
        }
    }
}

/// Geometry for every loaded level.
///
/// Layers are shared behind `Arc`, so cloning a store to stage a new snapshot only copies
/// pointers; `load` swaps in a freshly built layer and never edits one in place.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    layers: BTreeMap<BoundaryLevel, Arc<GeometryLayer>>,
}

impl GeometryStore {
    /// Replaces every boundary of `level`. On error the store is unchanged.
    pub fn load(
        &mut self,
        level: BoundaryLevel,
        boundaries: Vec<Boundary>,
    ) -> Result<LayerSummary, GeometryError> {
        let layer = GeometryLayer::build(level, boundaries)?;
        let summary = layer.summary();
        self.layers.insert(level, Arc::new(layer));
        Ok(summary)
    }

    pub fn layer(&self, level: BoundaryLevel) -> Option<&GeometryLayer> {
        self.layers.get(&level).map(Arc::as_ref)
    }

    pub fn is_loaded(&self, level: BoundaryLevel) -> bool {
        self.layers.contains_key(&level)
    }

    pub fn boundary(&self, id: &BoundaryId) -> Option<&Boundary> {
        self.layer(id.level()).and_then(|layer| layer.get(id))
    }

    pub fn hits(&self, level: BoundaryLevel, point: Point) -> Vec<Hit> {
        self.layer(level)
            .map(|layer| layer.hits(point))
            .unwrap_or_default()
    }

    pub fn containing(&self, level: BoundaryLevel, point: Point) -> Result<Selection, GeometryError> {
        Selection::from_hits(self.hits(level, point)).ok_or(GeometryError::NotFound {
            level,
            lng: point.lng,
            lat: point.lat,
        })
    }

    pub fn summaries(&self) -> Vec<LayerSummary> {
        self.layers.values().map(|layer| layer.summary()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::rect;
    use crate::geometry::{MultiPolygon, Polygon};

    fn tract(id: &str, min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Boundary {
        let polygon = Polygon::from_rings(vec![rect(min_lng, min_lat, max_lng, max_lat)])
            .expect("valid polygon");
        Boundary::new(
            BoundaryId::parse(id).expect("valid id"),
            format!("Tract {id}"),
            MultiPolygon::from(polygon),
        )
    }

    fn pt(lng: f64, lat: f64) -> Point {
        Point { lng, lat }
    }

    #[test]
    fn load_rejects_mismatched_levels_and_duplicates() {
        let mut store = GeometryStore::default();
        let county = Boundary::new(
            BoundaryId::parse("54039").unwrap(),
            "Kanawha".to_string(),
            tract("54039000100", 0.0, 0.0, 1.0, 1.0).geometry,
        );

        let error = store
            .load(BoundaryLevel::Tract, vec![county])
            .expect_err("county in tract layer");
        assert!(matches!(error, GeometryError::LevelMismatch { .. }));

        let error = store
            .load(
                BoundaryLevel::Tract,
                vec![
                    tract("54039000100", 0.0, 0.0, 1.0, 1.0),
                    tract("54039000100", 1.0, 0.0, 2.0, 1.0),
                ],
            )
            .expect_err("duplicate tract");
        assert!(matches!(error, GeometryError::DuplicateBoundary { .. }));
        assert!(!store.is_loaded(BoundaryLevel::Tract));
    }

    #[test]
    fn failed_load_keeps_previous_layer() {
        let mut store = GeometryStore::default();
        store
            .load(
                BoundaryLevel::Tract,
                vec![tract("54039000100", 0.0, 0.0, 1.0, 1.0)],
            )
            .expect("initial load");

        let result = store.load(
            BoundaryLevel::Tract,
            vec![
                tract("54039000200", 0.0, 0.0, 1.0, 1.0),
                tract("54039000200", 0.0, 0.0, 1.0, 1.0),
            ],
        );

        assert!(result.is_err());
        let selection = store
            .containing(BoundaryLevel::Tract, pt(0.5, 0.5))
            .expect("old tract still served");
        assert_eq!(selection.id.as_str(), "54039000100");
    }

    #[test]
    fn load_replaces_the_whole_level() {
        let mut store = GeometryStore::default();
        store
            .load(
                BoundaryLevel::Tract,
                vec![
                    tract("54039000100", 0.0, 0.0, 1.0, 1.0),
                    tract("54039000200", 1.0, 0.0, 2.0, 1.0),
                ],
            )
            .unwrap();
        let summary = store
            .load(
                BoundaryLevel::Tract,
                vec![tract("54039000300", 5.0, 5.0, 6.0, 6.0)],
            )
            .unwrap();

        assert_eq!(summary.boundaries, 1);
        assert!(store
            .boundary(&BoundaryId::parse("54039000100").unwrap())
            .is_none());
        assert!(matches!(
            store.containing(BoundaryLevel::Tract, pt(0.5, 0.5)),
            Err(GeometryError::NotFound { .. })
        ));
    }

    #[test]
    fn shared_edge_goes_to_lowest_id() {
        let mut store = GeometryStore::default();
        store
            .load(
                BoundaryLevel::Tract,
                vec![
                    tract("54039000200", 1.0, 0.0, 2.0, 1.0),
                    tract("54039000100", 0.0, 0.0, 1.0, 1.0),
                ],
            )
            .unwrap();

        let selection = store
            .containing(BoundaryLevel::Tract, pt(1.0, 0.5))
            .unwrap();
        assert_eq!(selection.id.as_str(), "54039000100");
        assert_eq!(selection.tie_break, TieBreak::SharedEdge);
        assert_eq!(selection.contenders.len(), 2);
    }

    #[test]
    fn overlap_prefers_smallest_area_then_lowest_id() {
        let mut store = GeometryStore::default();
        store
            .load(
                BoundaryLevel::Tract,
                vec![
                    tract("54039000100", 0.0, 0.0, 4.0, 4.0),
                    tract("54039000900", 1.0, 1.0, 2.0, 2.0),
                    tract("54039000500", 1.0, 1.0, 2.0, 2.0),
                ],
            )
            .unwrap();

        let selection = store
            .containing(BoundaryLevel::Tract, pt(1.5, 1.5))
            .unwrap();
        assert_eq!(selection.id.as_str(), "54039000500");
        assert_eq!(selection.tie_break, TieBreak::Overlap);
        assert_eq!(selection.contenders.len(), 3);
    }

    #[test]
    fn interior_hit_beats_edge_hit() {
        let hits = vec![
            Hit {
                id: BoundaryId::parse("54039000100").unwrap(),
                containment: Containment::Boundary,
                area: 1.0,
            },
            Hit {
                id: BoundaryId::parse("54039000200").unwrap(),
                containment: Containment::Inside,
                area: 4.0,
            },
        ];
        let selection = Selection::from_hits(hits).unwrap();
        assert_eq!(selection.id.as_str(), "54039000200");
        assert_eq!(selection.tie_break, TieBreak::Unique);
        assert!(Selection::from_hits(Vec::new()).is_none());
    }
}
