use crate::boundaries::BoundaryLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical boolean facts published by the eligibility datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    /// A coal mine in the tract closed after 1999.
    MineClosed,
    /// A coal-fired generating unit in the tract retired after 2009.
    GeneratorRetired,
    /// The tract adjoins a closure tract. Informational only.
    AdjacentToClosure,
    IsMsa,
    /// Fossil fuel employment >= 0.17% or fossil fuel tax revenue >= 25%.
    FfeQualified,
    /// Unemployment rate at or above the national average.
    UnemploymentQualified,
    PersistentPoverty,
}

impl Fact {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MineClosed => "mine_closed",
            Self::GeneratorRetired => "generator_retired",
            Self::AdjacentToClosure => "adjacent_to_closure",
            Self::IsMsa => "is_msa",
            Self::FfeQualified => "ffe_qualified",
            Self::UnemploymentQualified => "unemployment_qualified",
            Self::PersistentPoverty => "persistent_poverty",
        }
    }

    pub const fn all() -> [Self; 7] {
        [
            Self::MineClosed,
            Self::GeneratorRetired,
            Self::AdjacentToClosure,
            Self::IsMsa,
            Self::FfeQualified,
            Self::UnemploymentQualified,
            Self::PersistentPoverty,
        ]
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fact {
    type Err = UnknownFact;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::all()
            .into_iter()
            .find(|fact| fact.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFact(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fact '{0}'")]
pub struct UnknownFact(pub String);

/// Independently published eligibility datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    CoalClosure,
    FfeUnemployment,
    PersistentPoverty,
}

impl DatasetKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::CoalClosure, Self::FfeUnemployment, Self::PersistentPoverty]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoalClosure => "coal_closure",
            Self::FfeUnemployment => "ffe_unemployment",
            Self::PersistentPoverty => "persistent_poverty",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CoalClosure => "Coal Closure Energy Communities",
            Self::FfeUnemployment => "MSA/Non-MSA Fossil Fuel Employment & Unemployment",
            Self::PersistentPoverty => "Persistent Poverty Counties",
        }
    }

    /// Level every record of the dataset must target.
    pub const fn level(self) -> BoundaryLevel {
        match self {
            Self::CoalClosure => BoundaryLevel::Tract,
            Self::FfeUnemployment | Self::PersistentPoverty => BoundaryLevel::County,
        }
    }

    /// Facts a record of this dataset may carry.
    pub const fn schema(self) -> &'static [Fact] {
        match self {
            Self::CoalClosure => &[
                Fact::MineClosed,
                Fact::GeneratorRetired,
                Fact::AdjacentToClosure,
            ],
            Self::FfeUnemployment => &[
                Fact::IsMsa,
                Fact::FfeQualified,
                Fact::UnemploymentQualified,
            ],
            Self::PersistentPoverty => &[Fact::IsMsa, Fact::PersistentPoverty],
        }
    }

    /// Facts a field map must provide a column for.
    pub const fn required(self) -> &'static [Fact] {
        match self {
            Self::CoalClosure => &[Fact::MineClosed, Fact::GeneratorRetired],
            Self::FfeUnemployment => &[Fact::FfeQualified, Fact::UnemploymentQualified],
            Self::PersistentPoverty => &[Fact::PersistentPoverty],
        }
    }

    pub fn allows(self, fact: Fact) -> bool {
        self.schema().contains(&fact)
    }

    pub fn at_level(level: BoundaryLevel) -> impl Iterator<Item = DatasetKind> {
        Self::ordered()
            .into_iter()
            .filter(move |kind| kind.level() == level)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = UnknownDataset;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownDataset(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dataset '{0}'")]
pub struct UnknownDataset(pub String);

/// Three-valued truth: a missing record is "unknown", never "false".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Determination {
    Unknown,
    True,
    False,
}

impl Determination {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::True => Some(true),
            Self::False => Some(false),
        }
    }

    pub fn is_true(self) -> bool {
        self == Self::True
    }

    /// Kleene conjunction: false dominates, then unknown.
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    /// Kleene disjunction: true dominates, then unknown.
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    pub fn any<I: IntoIterator<Item = Self>>(values: I) -> Self {
        values.into_iter().fold(Self::False, Self::or)
    }
}

impl From<Option<bool>> for Determination {
    fn from(value: Option<bool>) -> Self {
        value.map(Self::from_bool).unwrap_or(Self::Unknown)
    }
}
