//! Energy community eligibility: resolve a longitude/latitude to its census tract, county
//! and state, then evaluate the coal closure, fossil fuel employment and persistent
//! poverty qualifying paths against independently published datasets.
//!
//! ```text
//! point -> resolver -> tract id -> hierarchy (county, state)
//!       -> attribute facts (tract, county) -> eligibility rules -> verdict
//! ```

pub mod attributes;
pub mod boundaries;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod geometry;
pub mod ingest;
pub mod query;
pub mod resolver;
pub mod snapshot;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use attributes::{Determination, DatasetKind, Fact};
pub use boundaries::{BoundaryId, BoundaryLevel};
pub use geometry::Point;
pub use ingest::{DirectoryFeed, IngestionFeed};
pub use query::{eligibility_router, EligibilityService, EligibilityVerdict};
pub use snapshot::{IngestionReport, SnapshotStore};
