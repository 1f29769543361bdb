//! Shared CSV utilities for loading reference tables.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{Result, StandardsError};

/// A CSV file read column by column, in header order.
#[derive(Debug, Clone, Default)]
pub struct CsvColumns {
    pub columns: Vec<(String, Vec<String>)>,
}

fn clean_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').trim().to_string()
}

/// Read a CSV file into a vector of row maps.
///
/// Handles BOM characters and trims whitespace from values.
pub fn read_csv_rows(path: &Path) -> Result<Vec<BTreeMap<String, String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|error| StandardsError::csv(path, &error))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|error| StandardsError::csv(path, &error))?
        .iter()
        .map(clean_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| StandardsError::csv(path, &error))?;
        let mut row = BTreeMap::new();
        for (idx, value) in record.iter().enumerate() {
            let key = headers.get(idx).cloned().unwrap_or_default();
            row.insert(key, value.trim().to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read a CSV file column by column.
///
/// Blank cells are skipped, so each column holds only its non-empty values in
/// row order. Columns keep header order.
pub fn read_csv_columns(path: &Path) -> Result<CsvColumns> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|error| StandardsError::csv(path, &error))?;

    let mut columns: Vec<(String, Vec<String>)> = reader
        .headers()
        .map_err(|error| StandardsError::csv(path, &error))?
        .iter()
        .map(|header| (clean_header(header), Vec::new()))
        .collect();

    for record in reader.records() {
        let record = record.map_err(|error| StandardsError::csv(path, &error))?;
        for (idx, value) in record.iter().enumerate() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if let Some((_, values)) = columns.get_mut(idx) {
                values.push(value.to_string());
            }
        }
    }
    Ok(CsvColumns { columns })
}

/// Required field of a row map.
pub fn require_field<'a>(
    row: &'a BTreeMap<String, String>,
    key: &str,
    path: &Path,
) -> Result<&'a str> {
    row.get(key)
        .map(String::as_str)
        .ok_or_else(|| StandardsError::MissingColumn {
            path: path.to_path_buf(),
            column: key.to_string(),
        })
}

/// Optional field of a row map (None if empty or missing).
pub fn optional_field(row: &BTreeMap<String, String>, key: &str) -> Option<String> {
    row.get(key).filter(|value| !value.is_empty()).cloned()
}

/// First header among `aliases` present in the row.
pub fn first_field<'a>(row: &'a BTreeMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|alias| row.get(*alias))
        .map(String::as_str)
}

pub fn parse_number(value: &str, column: &str, path: &Path) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| StandardsError::InvalidNumber {
            path: path.to_path_buf(),
            column: column.to_string(),
            value: value.to_string(),
        })
}
