use crate::attributes::{DatasetRecord, DatasetVersion, Fact, Provenance};
use crate::boundaries::{Boundary, BoundaryId};
use crate::geometry::{MultiPolygon, Point, Polygon};
use chrono::NaiveDate;

pub(crate) fn id(value: &str) -> BoundaryId {
    BoundaryId::parse(value).expect("valid id")
}

pub(crate) fn pt(lng: f64, lat: f64) -> Point {
    Point { lng, lat }
}

pub(crate) fn rect_boundary(
    geoid: &str,
    min_lng: f64,
    min_lat: f64,
    max_lng: f64,
    max_lat: f64,
) -> Boundary {
    let ring = vec![
        pt(min_lng, min_lat),
        pt(max_lng, min_lat),
        pt(max_lng, max_lat),
        pt(min_lng, max_lat),
    ];
    let polygon = Polygon::from_rings(vec![ring]).expect("valid rectangle");
    Boundary::new(id(geoid), format!("Boundary {geoid}"), MultiPolygon::from(polygon))
}

pub(crate) fn provenance() -> Provenance {
    Provenance {
        dataset_version: DatasetVersion::new(2, 0),
        last_updated: NaiveDate::from_ymd_opt(2023, 4, 3),
        ingested: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
    }
}

pub(crate) fn record(geoid: &str, facts: &[(Fact, bool)]) -> DatasetRecord {
    facts.iter().fold(
        DatasetRecord::new(id(geoid), provenance()),
        |record, (fact, value)| record.with_fact(*fact, *value),
    )
}
