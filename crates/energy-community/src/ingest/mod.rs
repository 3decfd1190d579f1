//! Reading boundary files and eligibility datasets into loadable batches.

mod directory;
mod geojson;
mod mapping;
mod normalizer;
mod parser;

pub use directory::DirectoryFeed;
pub use geojson::read_boundaries;
pub use mapping::{FactColumn, FieldMap, MappingError};
pub use parser::read_dataset;

use crate::attributes::{DatasetKind, DatasetRecord, DatasetVersion, InvalidVersion};
use crate::boundaries::{Boundary, BoundaryLevel, MalformedIdentifier};
use crate::geometry::InvalidShape;
use std::fmt;

/// Boundaries for one level, ready to replace that layer.
#[derive(Debug, Clone)]
pub struct BoundaryBatch {
    pub level: BoundaryLevel,
    pub source: String,
    pub boundaries: Vec<Boundary>,
}

/// A full record set for one dataset, ready to replace that dataset.
#[derive(Debug, Clone)]
pub struct DatasetBatch {
    pub kind: DatasetKind,
    pub version: DatasetVersion,
    pub source: String,
    pub records: Vec<DatasetRecord>,
}

/// Source of everything a reload publishes.
///
/// `Ok(None)` means the feed has nothing for that level or dataset; the current content
/// is kept.
pub trait IngestionFeed {
    fn boundaries(&self, level: BoundaryLevel) -> Result<Option<BoundaryBatch>, ImportError>;

    fn dataset(&self, kind: DatasetKind) -> Result<Option<DatasetBatch>, ImportError>;
}

/// What was wrong with a single row or feature.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowProblem {
    #[error("missing boundary identifier")]
    MissingIdentifier,
    #[error(transparent)]
    Identifier(#[from] MalformedIdentifier),
    #[error("column '{column}' holds '{value}', which is not a yes/no value")]
    Boolean { column: String, value: String },
    #[error("column '{column}' holds '{value}', which is not a date")]
    Date { column: String, value: String },
    #[error(transparent)]
    Version(#[from] InvalidVersion),
    #[error("invalid geometry: {0}")]
    Geometry(#[from] InvalidShape),
    #[error("unsupported geometry type; expected Polygon or MultiPolygon")]
    UnsupportedGeometry,
    #[error("coordinate position needs at least two numbers")]
    ShortPosition,
}

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Mapping(MappingError),
    MissingColumn {
        dataset: DatasetKind,
        column: String,
    },
    Row {
        source: String,
        line: u64,
        problem: RowProblem,
    },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read ingestion input: {}", err),
            ImportError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            ImportError::Json(err) => write!(f, "invalid JSON data: {}", err),
            ImportError::Mapping(err) => write!(f, "invalid field map: {}", err),
            ImportError::MissingColumn { dataset, column } => write!(
                f,
                "{} file has no '{}' column required by its field map",
                dataset, column
            ),
            ImportError::Row {
                source,
                line,
                problem,
            } => write!(f, "{} line {}: {}", source, line, problem),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Json(err) => Some(err),
            ImportError::Mapping(err) => Some(err),
            ImportError::MissingColumn { .. } => None,
            ImportError::Row { problem, .. } => Some(problem),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<MappingError> for ImportError {
    fn from(err: MappingError) -> Self {
        Self::Mapping(err)
    }
}
