pub mod hierarchy;
mod id;

pub use hierarchy::OrphanReference;
pub use id::{BoundaryId, BoundaryLevel, MalformedIdentifier, UnknownLevel};

use crate::geometry::MultiPolygon;
use serde::Serialize;

/// Level-specific attributes carried next to the shared boundary fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum BoundaryDetail {
    State {
        #[serde(skip_serializing_if = "Option::is_none")]
        abbreviation: Option<String>,
    },
    County {
        /// Name with its legal suffix, e.g. "Kanawha County".
        #[serde(skip_serializing_if = "Option::is_none")]
        legal_name: Option<String>,
    },
    Tract {
        #[serde(skip_serializing_if = "Option::is_none")]
        land_area_sq_m: Option<u64>,
    },
}

impl BoundaryDetail {
    pub fn empty(level: BoundaryLevel) -> Self {
        match level {
            BoundaryLevel::State => Self::State { abbreviation: None },
            BoundaryLevel::County => Self::County { legal_name: None },
            BoundaryLevel::Tract => Self::Tract {
                land_area_sq_m: None,
            },
        }
    }

    pub fn level(&self) -> BoundaryLevel {
        match self {
            Self::State { .. } => BoundaryLevel::State,
            Self::County { .. } => BoundaryLevel::County,
            Self::Tract { .. } => BoundaryLevel::Tract,
        }
    }
}

/// A state, county or tract with its geometry.
///
/// The parent is never stored; it is derived from the id on demand, so replacing a
/// parent layer cannot leave a dangling pointer behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub id: BoundaryId,
    pub name: String,
    pub geometry: MultiPolygon,
    detail: BoundaryDetail,
}

impl Boundary {
    pub fn new(id: BoundaryId, name: String, geometry: MultiPolygon) -> Self {
        let detail = BoundaryDetail::empty(id.level());
        Self {
            id,
            name,
            geometry,
            detail,
        }
    }

    /// Attaches level-specific attributes. Hands the boundary back unchanged if `detail`
    /// is for another level.
    pub fn with_detail(mut self, detail: BoundaryDetail) -> Result<Self, Self> {
        if detail.level() != self.id.level() {
            return Err(self);
        }
        self.detail = detail;
        Ok(self)
    }

    pub fn level(&self) -> BoundaryLevel {
        self.id.level()
    }

    pub fn parent(&self) -> Option<BoundaryId> {
        hierarchy::parent(&self.id)
    }

    pub fn detail(&self) -> &BoundaryDetail {
        &self.detail
    }
}
