use crate::boundaries::{BoundaryId, BoundaryLevel, MalformedIdentifier};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub(crate) fn clean_cell(value: &str) -> &str {
    value
        .trim_matches(|ch: char| ch == '\u{feff}' || ch == '\u{200b}' || ch.is_whitespace())
}

pub(crate) fn normalize_header(value: &str) -> String {
    clean_cell(value)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a FIPS code as exported by spreadsheets.
///
/// Spreadsheet round trips turn `"01001"` into `1001` or `1001.0`; one dropped leading
/// zero is restored when the result is otherwise one digit short of `expected`.
pub(crate) fn boundary_id(
    value: &str,
    expected: BoundaryLevel,
) -> Result<BoundaryId, MalformedIdentifier> {
    let mut digits = clean_cell(value).trim_matches('"');
    if let Some(stripped) = digits.strip_suffix(".0") {
        digits = stripped;
    }

    let width = expected.id_width();
    if digits.len() + 1 == width && digits.chars().all(|ch| ch.is_ascii_digit()) {
        return BoundaryId::parse(&format!("0{digits}"));
    }
    BoundaryId::parse(digits)
}

/// Tri-state cell: blank is `Ok(None)`, anything unrecognised is an error.
pub(crate) fn boolean(value: &str) -> Result<Option<bool>, ()> {
    let cleaned = clean_cell(value).to_ascii_lowercase();
    match cleaned.as_str() {
        "" => Ok(None),
        "1" | "1.0" | "true" | "t" | "yes" | "y" => Ok(Some(true)),
        "0" | "0.0" | "false" | "f" | "no" | "n" => Ok(Some(false)),
        _ => Err(()),
    }
}

pub(crate) fn date(value: &str) -> Result<Option<NaiveDate>, ()> {
    let trimmed = clean_cell(value);
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(dt.date_naive()));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(Some(dt.date()));
    }

    for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(Some(date));
        }
    }

    Err(())
}
