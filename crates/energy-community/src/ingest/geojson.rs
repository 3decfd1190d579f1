use super::normalizer;
use super::{ImportError, RowProblem};
use crate::boundaries::{Boundary, BoundaryDetail, BoundaryLevel};
use crate::geometry::{MultiPolygon, Point, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Read;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<GeometryObject>,
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryObject {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    #[serde(other)]
    Unsupported,
}

/// Reads a GeoJSON FeatureCollection of Census boundaries for one level.
///
/// Property names are matched case-insensitively (`GEOID`, `NAME`, `STUSPS`, `NAMELSAD`,
/// `ALAND`). Each feature's position in the collection stands in for a line number in
/// error reports.
pub fn read_boundaries<R: Read>(
    reader: R,
    level: BoundaryLevel,
    source: &str,
) -> Result<Vec<Boundary>, ImportError> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            convert_feature(feature, level).map_err(|problem| ImportError::Row {
                source: source.to_string(),
                line: index as u64 + 1,
                problem,
            })
        })
        .collect()
}

fn convert_feature(feature: Feature, level: BoundaryLevel) -> Result<Boundary, RowProblem> {
    let properties = feature.properties.unwrap_or_default();
    let raw_id = property(&properties, "GEOID").ok_or(RowProblem::MissingIdentifier)?;
    let id = normalizer::boundary_id(&raw_id, level)?;
    let name = property(&properties, "NAME").unwrap_or_default();

    let geometry = match feature.geometry {
        Some(GeometryObject::Polygon { coordinates }) => {
            MultiPolygon::from(polygon(coordinates)?)
        }
        Some(GeometryObject::MultiPolygon { coordinates }) => MultiPolygon::new(
            coordinates
                .into_iter()
                .map(polygon)
                .collect::<Result<Vec<_>, _>>()?,
        )?,
        Some(GeometryObject::Unsupported) | None => return Err(RowProblem::UnsupportedGeometry),
    };

    let detail = match id.level() {
        BoundaryLevel::State => BoundaryDetail::State {
            abbreviation: property(&properties, "STUSPS"),
        },
        BoundaryLevel::County => BoundaryDetail::County {
            legal_name: property(&properties, "NAMELSAD"),
        },
        BoundaryLevel::Tract => BoundaryDetail::Tract {
            land_area_sq_m: property(&properties, "ALAND").and_then(|value| value.parse().ok()),
        },
    };

    // Detail is built from the id's own level, so it always matches.
    Ok(Boundary::new(id, name, geometry)
        .with_detail(detail)
        .unwrap_or_else(|boundary| boundary))
}

fn polygon(rings: Vec<Vec<Position>>) -> Result<Polygon, RowProblem> {
    let rings = rings
        .into_iter()
        .map(|ring| ring.into_iter().map(point).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::from_rings(rings)?)
}

fn point(position: Position) -> Result<Point, RowProblem> {
    match position.as_slice() {
        [lng, lat, ..] => Ok(Point {
            lng: *lng,
            lat: *lat,
        }),
        _ => Err(RowProblem::ShortPosition),
    }
}

/// String or numeric property, looked up ignoring case. Blank values count as absent.
fn property(properties: &Map<String, Value>, key: &str) -> Option<String> {
    let value = properties.get(key).or_else(|| {
        properties
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })?;

    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
