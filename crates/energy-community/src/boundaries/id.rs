use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative level of a boundary, ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryLevel {
    State,
    County,
    Tract,
}

impl BoundaryLevel {
    pub const fn ordered() -> [Self; 3] {
        [Self::State, Self::County, Self::Tract]
    }

    /// Number of digits in an identifier at this level.
    pub const fn id_width(self) -> usize {
        match self {
            Self::State => 2,
            Self::County => 5,
            Self::Tract => 11,
        }
    }

    pub const fn from_width(width: usize) -> Option<Self> {
        match width {
            2 => Some(Self::State),
            5 => Some(Self::County),
            11 => Some(Self::Tract),
            _ => None,
        }
    }

    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::State => None,
            Self::County => Some(Self::State),
            Self::Tract => Some(Self::County),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::County => "county",
            Self::Tract => "tract",
        }
    }
}

impl fmt::Display for BoundaryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BoundaryLevel {
    type Err = UnknownLevel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "state" | "states" => Ok(Self::State),
            "county" | "counties" => Ok(Self::County),
            "tract" | "tracts" => Ok(Self::Tract),
            _ => Err(UnknownLevel(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown boundary level '{0}'")]
pub struct UnknownLevel(pub String);

/// Structural problem with a FIPS identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedIdentifier {
    #[error("identifier '{value}' has {length} characters; expected 2, 5 or 11 digits")]
    Length { value: String, length: usize },
    #[error("identifier '{value}' contains non-digit character {found:?}")]
    NonDigit { value: String, found: char },
}

/// FIPS GEOID for a state (2 digits), county (5) or census tract (11).
///
/// Ordering is lexicographic, which for identifiers of one level is also numeric order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundaryId {
    digits: String,
    level: BoundaryLevel,
}

impl BoundaryId {
    pub fn parse(value: &str) -> Result<Self, MalformedIdentifier> {
        if let Some(found) = value.chars().find(|ch| !ch.is_ascii_digit()) {
            return Err(MalformedIdentifier::NonDigit {
                value: value.to_string(),
                found,
            });
        }

        // all ASCII past this point, so byte length is the digit count
        let level =
            BoundaryLevel::from_width(value.len()).ok_or_else(|| MalformedIdentifier::Length {
                value: value.to_string(),
                length: value.len(),
            })?;

        Ok(Self {
            digits: value.to_string(),
            level,
        })
    }

    pub fn level(&self) -> BoundaryLevel {
        self.level
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Identifier truncated to `level`; `None` when `level` is finer than this id.
    pub fn truncate_to(&self, level: BoundaryLevel) -> Option<BoundaryId> {
        if level > self.level() {
            return None;
        }
        Some(Self {
            digits: self.digits[..level.id_width()].to_string(),
            level,
        })
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl FromStr for BoundaryId {
    type Err = MalformedIdentifier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for BoundaryId {
    type Error = MalformedIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BoundaryId> for String {
    fn from(value: BoundaryId) -> Self {
        value.digits
    }
}

impl AsRef<str> for BoundaryId {
    fn as_ref(&self) -> &str {
        &self.digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_assigns_level_from_width() {
        assert_eq!(BoundaryId::parse("01").unwrap().level(), BoundaryLevel::State);
        assert_eq!(
            BoundaryId::parse("01001").unwrap().level(),
            BoundaryLevel::County
        );
        assert_eq!(
            BoundaryId::parse("01001020100").unwrap().level(),
            BoundaryLevel::Tract
        );
    }

    #[test]
    fn parse_rejects_unknown_widths_and_non_digits() {
        assert!(matches!(
            BoundaryId::parse("0100"),
            Err(MalformedIdentifier::Length { length: 4, .. })
        ));
        assert!(matches!(
            BoundaryId::parse(""),
            Err(MalformedIdentifier::Length { length: 0, .. })
        ));
        assert!(matches!(
            BoundaryId::parse("01A01"),
            Err(MalformedIdentifier::NonDigit { found: 'A', .. })
        ));
        assert!(matches!(
            BoundaryId::parse("01 01"),
            Err(MalformedIdentifier::NonDigit { found: ' ', .. })
        ));
    }

    #[test]
    fn truncate_refuses_finer_levels() {
        let county = BoundaryId::parse("54039").unwrap();
        assert_eq!(
            county.truncate_to(BoundaryLevel::State).unwrap().as_str(),
            "54"
        );
        assert_eq!(county.truncate_to(BoundaryLevel::County), Some(county.clone()));
        assert!(county.truncate_to(BoundaryLevel::Tract).is_none());
    }

    #[test]
    fn serde_round_trips_through_string() {
        let id: BoundaryId = serde_json::from_str("\"54039000100\"").unwrap();
        assert_eq!(id.level(), BoundaryLevel::Tract);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"54039000100\"");
        assert!(serde_json::from_str::<BoundaryId>("\"5403\"").is_err());
    }

    #[test]
    fn level_parses_plural_names() {
        assert_eq!("Tracts".parse::<BoundaryLevel>().unwrap(), BoundaryLevel::Tract);
        assert!("block".parse::<BoundaryLevel>().is_err());
    }
}
