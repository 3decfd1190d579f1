use crate::attributes::{DatasetKind, DatasetVersion, Fact};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which CSV column feeds a fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactColumn {
    pub fact: Fact,
    pub column: String,
}

impl FactColumn {
    fn new(fact: Fact, column: &str) -> Self {
        Self {
            fact,
            column: column.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("field map for {dataset} was loaded as the map for {expected}")]
    DatasetMismatch {
        dataset: DatasetKind,
        expected: DatasetKind,
    },
    #[error("{dataset} records cannot carry the '{fact}' fact")]
    FactOutsideSchema { dataset: DatasetKind, fact: Fact },
    #[error("{dataset} field map has no column for required fact '{fact}'")]
    MissingRequiredFact { dataset: DatasetKind, fact: Fact },
    #[error("{dataset} field map lists '{fact}' more than once")]
    DuplicateFact { dataset: DatasetKind, fact: Fact },
    #[error("{dataset} field map leaves the {field} column name empty")]
    EmptyColumn {
        dataset: DatasetKind,
        field: &'static str,
    },
}

/// Declarative column mapping for one dataset file.
///
/// Validated against the dataset schema before any row is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub dataset: DatasetKind,
    pub boundary: String,
    pub facts: Vec<FactColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Used when the file has no version column or the column is blank.
    pub default_version: DatasetVersion,
}

impl FieldMap {
    pub fn standard(dataset: DatasetKind) -> Self {
        match dataset {
            DatasetKind::CoalClosure => Self::coal_closure_2023v2(),
            DatasetKind::FfeUnemployment => Self::ffe_unemployment_2023v2(),
            DatasetKind::PersistentPoverty => Self::persistent_poverty_2013(),
        }
    }

    /// Coal Closure Energy Communities, 2023 v2 tract file.
    pub fn coal_closure_2023v2() -> Self {
        Self {
            dataset: DatasetKind::CoalClosure,
            boundary: "geoid_tract_2020".to_string(),
            facts: vec![
                FactColumn::new(Fact::MineClosed, "Mine_Closure"),
                FactColumn::new(Fact::GeneratorRetired, "Generator_Closure"),
                FactColumn::new(Fact::AdjacentToClosure, "Adjacent_to_Closure"),
            ],
            version: Some("dataset_version".to_string()),
            last_updated: Some("date_last_update".to_string()),
            added: Some("record_added".to_string()),
            label: Some("County_Name".to_string()),
            default_version: DatasetVersion::new(2, 0),
        }
    }

    /// MSA/non-MSA fossil fuel employment and unemployment, 2023 v2 county file.
    pub fn ffe_unemployment_2023v2() -> Self {
        Self {
            dataset: DatasetKind::FfeUnemployment,
            boundary: "geoid_cty_2020".to_string(),
            facts: vec![
                FactColumn::new(Fact::FfeQualified, "ffe_ind_qual"),
                FactColumn::new(Fact::UnemploymentQualified, "ec_ind_qual"),
            ],
            version: Some("dataset_ve".to_string()),
            last_updated: Some("date_last_".to_string()),
            added: Some("date_recor".to_string()),
            label: Some("county_name_2020".to_string()),
            default_version: DatasetVersion::new(2, 0),
        }
    }

    /// ERS county typology, persistent poverty 2013 edition.
    pub fn persistent_poverty_2013() -> Self {
        Self {
            dataset: DatasetKind::PersistentPoverty,
            boundary: "FIPStxt".to_string(),
            facts: vec![
                FactColumn::new(Fact::PersistentPoverty, "Persistent_Poverty_2013"),
                FactColumn::new(
                    Fact::IsMsa,
                    "Metro-nonmetro status, 2013 0=Nonmetro 1=Metro",
                ),
            ],
            version: None,
            last_updated: None,
            added: None,
            label: Some("County_name".to_string()),
            default_version: DatasetVersion::new(1, 0),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        let dataset = self.dataset;
        if self.boundary.trim().is_empty() {
            return Err(MappingError::EmptyColumn {
                dataset,
                field: "boundary",
            });
        }

        let mut seen = HashSet::new();
        for column in &self.facts {
            if !dataset.allows(column.fact) {
                return Err(MappingError::FactOutsideSchema {
                    dataset,
                    fact: column.fact,
                });
            }
            if !seen.insert(column.fact) {
                return Err(MappingError::DuplicateFact {
                    dataset,
                    fact: column.fact,
                });
            }
            if column.column.trim().is_empty() {
                return Err(MappingError::EmptyColumn {
                    dataset,
                    field: column.fact.as_str(),
                });
            }
        }

        if let Some(fact) = dataset
            .required()
            .iter()
            .find(|fact| !seen.contains(*fact))
        {
            return Err(MappingError::MissingRequiredFact {
                dataset,
                fact: *fact,
            });
        }

        let optional = [
            ("version", &self.version),
            ("last_updated", &self.last_updated),
            ("added", &self.added),
            ("label", &self.label),
        ];
        for (field, column) in optional {
            if column.as_deref().is_some_and(|name| name.trim().is_empty()) {
                return Err(MappingError::EmptyColumn { dataset, field });
            }
        }

        Ok(())
    }

    /// Checks the map is valid and belongs to `expected`.
    pub fn validate_for(&self, expected: DatasetKind) -> Result<(), MappingError> {
        if self.dataset != expected {
            return Err(MappingError::DatasetMismatch {
                dataset: self.dataset,
                expected,
            });
        }
        self.validate()
    }
}
