use super::schema::Fact;
use crate::boundaries::{BoundaryId, BoundaryLevel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Dataset version with one fractional digit, e.g. `2.0` for the 2023v2 releases.
///
/// Stored as tenths so equality and ordering are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetVersion {
    tenths: u32,
}

impl DatasetVersion {
    pub const fn new(whole: u32, tenth: u8) -> Self {
        Self {
            tenths: whole * 10 + (tenth % 10) as u32,
        }
    }
}

impl fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid dataset version '{0}': expected digits with at most one decimal place")]
pub struct InvalidVersion(pub String);

impl FromStr for DatasetVersion {
    type Err = InvalidVersion;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidVersion(value.to_string());
        let trimmed = value.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if whole.is_empty() || !whole.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        // "2.00" is fine, "2.05" is not representable
        let mut digits = fraction.chars();
        let tenth = digits.next().and_then(|ch| ch.to_digit(10)).unwrap_or(0);
        if digits.any(|ch| ch != '0') {
            return Err(invalid());
        }

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let tenths = whole
            .checked_mul(10)
            .and_then(|value| value.checked_add(tenth))
            .ok_or_else(invalid)?;
        Ok(Self { tenths })
    }
}

impl TryFrom<String> for DatasetVersion {
    type Error = InvalidVersion;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatasetVersion> for String {
    fn from(value: DatasetVersion) -> Self {
        value.to_string()
    }
}

/// Where a record's facts came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub dataset_version: DatasetVersion,
    /// Publisher's last-update date for the data, not for this service.
    pub last_updated: Option<NaiveDate>,
    /// Date the row was pulled into this service.
    pub ingested: NaiveDate,
}

/// One row of an eligibility dataset after field mapping.
///
/// Facts absent from `facts` are undetermined for this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub boundary: BoundaryId,
    pub level: BoundaryLevel,
    pub facts: BTreeMap<Fact, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub provenance: Provenance,
}

impl DatasetRecord {
    pub fn new(boundary: BoundaryId, provenance: Provenance) -> Self {
        Self {
            level: boundary.level(),
            boundary,
            facts: BTreeMap::new(),
            label: None,
            provenance,
        }
    }

    pub fn with_fact(mut self, fact: Fact, value: bool) -> Self {
        self.facts.insert(fact, value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn fact(&self, fact: Fact) -> Option<bool> {
        self.facts.get(&fact).copied()
    }
}
