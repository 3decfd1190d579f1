//! Planar geometry in the service's single coordinate reference system.
//!
//! All coordinates are NAD83 (EPSG:4269) longitude/latitude degrees, the CRS the Census
//! boundary files ship in. No reprojection happens anywhere in the crate.

mod index;
mod polygon;
mod store;

pub use polygon::{Containment, InvalidShape, MultiPolygon, Polygon, Ring};
pub use store::{
    GeometryError, GeometryLayer, GeometryStore, Hit, LayerSummary, Selection, TieBreak,
};

use serde::{Deserialize, Serialize};

/// Identifier for the fixed CRS, reported alongside resolved locations.
pub const CRS: &str = "EPSG:4269";

/// Reasons a coordinate pair is rejected before any lookup happens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number (lng {lng}, lat {lat})")]
    NotFinite { lng: f64, lat: f64 },
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("coordinate '{0}' is not a decimal number")]
    Unparseable(String),
}

/// Longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lng: f64,
    pub lat: f64,
}

impl Point {
    /// Validated constructor used at every query boundary.
    pub fn new(lng: f64, lat: f64) -> Result<Self, CoordinateError> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(CoordinateError::NotFinite { lng, lat });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Parses decimal degrees as they arrive in a request path.
    pub fn parse(lng: &str, lat: &str) -> Result<Self, CoordinateError> {
        let degrees = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| CoordinateError::Unparseable(value.to_string()))
        };
        Self::new(degrees(lng)?, degrees(lat)?)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn of_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            min_lng: first.lng,
            min_lat: first.lat,
            max_lng: first.lng,
            max_lat: first.lat,
        };
        for point in iter {
            bbox.min_lng = bbox.min_lng.min(point.lng);
            bbox.min_lat = bbox.min_lat.min(point.lat);
            bbox.max_lng = bbox.max_lng.max(point.lng);
            bbox.max_lat = bbox.max_lat.max(point.lat);
        }
        Some(bbox)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_lng: self.min_lng.min(other.min_lng),
            min_lat: self.min_lat.min(other.min_lat),
            max_lng: self.max_lng.max(other.max_lng),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Inclusive on every side.
    pub fn contains(&self, point: Point) -> bool {
        point.lng >= self.min_lng
            && point.lng <= self.max_lng
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}
