use super::mapping::FieldMap;
use super::normalizer::{self, clean_cell, normalize_header};
use super::{DatasetBatch, ImportError, RowProblem};
use crate::attributes::{DatasetRecord, DatasetVersion, Fact, Provenance};
use chrono::NaiveDate;
use std::io::Read;
use tracing::debug;

/// Header positions for every column the field map names.
struct Columns {
    boundary: usize,
    facts: Vec<(Fact, usize, String)>,
    version: Option<usize>,
    last_updated: Option<(usize, String)>,
    added: Option<(usize, String)>,
    label: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord, map: &FieldMap) -> Result<Self, ImportError> {
        let headers: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |column: &str| -> Result<usize, ImportError> {
            let wanted = normalize_header(column);
            headers
                .iter()
                .position(|header| *header == wanted)
                .or_else(|| {
                    headers
                        .iter()
                        .position(|header| header.eq_ignore_ascii_case(&wanted))
                })
                .ok_or_else(|| ImportError::MissingColumn {
                    dataset: map.dataset,
                    column: column.to_string(),
                })
        };
        let named = |column: &Option<String>| -> Result<Option<(usize, String)>, ImportError> {
            column
                .as_deref()
                .map(|name| find(name).map(|index| (index, name.to_string())))
                .transpose()
        };

        let facts = map
            .facts
            .iter()
            .map(|column| Ok((column.fact, find(&column.column)?, column.column.clone())))
            .collect::<Result<Vec<_>, ImportError>>()?;

        Ok(Self {
            boundary: find(&map.boundary)?,
            facts,
            version: named(&map.version)?.map(|(index, _)| index),
            last_updated: named(&map.last_updated)?,
            added: named(&map.added)?,
            label: named(&map.label)?.map(|(index, _)| index),
        })
    }
}

/// Reads one dataset CSV through its field map.
///
/// The map is validated and every mapped column located before the first row is read.
/// Blank fact cells stay unknown. The batch version is the first row's version, or the
/// map's default when the file carries none; rows disagreeing with it are rejected later
/// when the batch is ingested.
pub fn read_dataset<R: Read>(
    reader: R,
    map: &FieldMap,
    source: &str,
    ingested_on: NaiveDate,
) -> Result<DatasetBatch, ImportError> {
    map.validate()?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::resolve(csv_reader.headers()?, map)?;
    let level = map.dataset.level();
    let mut declared: Option<DatasetVersion> = None;
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        let line = row.position().map(|position| position.line()).unwrap_or(0);
        let row_error = |problem: RowProblem| ImportError::Row {
            source: source.to_string(),
            line,
            problem,
        };
        let cell = |index: usize| row.get(index).map(clean_cell).unwrap_or("");

        if row.iter().all(|value| clean_cell(value).is_empty()) {
            continue;
        }

        let raw_id = cell(columns.boundary);
        if raw_id.is_empty() {
            return Err(row_error(RowProblem::MissingIdentifier));
        }
        let boundary =
            normalizer::boundary_id(raw_id, level).map_err(|err| row_error(err.into()))?;

        let version = match columns.version.map(cell).filter(|value| !value.is_empty()) {
            Some(raw) => raw
                .parse::<DatasetVersion>()
                .map_err(|err| row_error(err.into()))?,
            None => map.default_version,
        };
        declared.get_or_insert(version);

        let date_at = |column: &Option<(usize, String)>| -> Result<Option<NaiveDate>, ImportError> {
            let Some((index, name)) = column else {
                return Ok(None);
            };
            let raw = cell(*index);
            normalizer::date(raw).map_err(|()| {
                row_error(RowProblem::Date {
                    column: name.clone(),
                    value: raw.to_string(),
                })
            })
        };
        let provenance = Provenance {
            dataset_version: version,
            last_updated: date_at(&columns.last_updated)?,
            ingested: date_at(&columns.added)?.unwrap_or(ingested_on),
        };

        let mut record = DatasetRecord::new(boundary, provenance);
        for (fact, index, name) in &columns.facts {
            let raw = cell(*index);
            match normalizer::boolean(raw) {
                Ok(Some(value)) => record = record.with_fact(*fact, value),
                Ok(None) => {}
                Err(()) => {
                    return Err(row_error(RowProblem::Boolean {
                        column: name.clone(),
                        value: raw.to_string(),
                    }))
                }
            }
        }
        if let Some(label) = columns.label.map(cell).filter(|value| !value.is_empty()) {
            record = record.with_label(label);
        }

        records.push(record);
    }

    debug!(
        dataset = %map.dataset,
        source,
        records = records.len(),
        "parsed dataset rows"
    );

    Ok(DatasetBatch {
        kind: map.dataset,
        version: declared.unwrap_or(map.default_version),
        source: source.to_string(),
        records,
    })
}
