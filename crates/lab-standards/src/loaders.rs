//! Loaders for the externally supplied reference tables.
//!
//! Every table is comma-separated with a header row:
//!
//! - equivalent labels: one column per group, the first value is canonical
//!   (the header itself is only a name for the group)
//! - allowed units: one column per variable label, listing its units
//! - plausible ranges: rows of `variable_label`, `Min`, `Max`
//! - cross-system equivalence: one row per canonical variable

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use lab_model::{
    AllowedUnits, CrossSystemEquivalence, CrossSystemTable, EquivalenceGroup, EquivalenceTable,
    PlausibleRange, PlausibleRanges, ReferenceTables,
};
use tracing::debug;

use crate::csv_utils::{
    first_field, optional_field, parse_number, read_csv_columns, read_csv_rows, require_field,
};
use crate::error::{Result, StandardsError};

const RANGE_LABEL: &str = "variable_label";
const RANGE_MIN: &str = "Min";
const RANGE_MAX: &str = "Max";

const CANONICAL_NAME: &[&str] = &["canonical_name", "DPI_name"];
const EQUIVALENT_NAME: &[&str] = &["equivalent_name", "MIMIC_equivalent_name"];
const OTHER_EQUIVALENTS: &[&str] = &["other_equivalents", "other_MIMIC_equivalents"];
const TARGET_UNIT: &[&str] = &["target_unit", "DPI_units"];
const CONVERSION_NEEDED: &[&str] = &["unit_conversion_needed"];
const CONVERSION_FACTOR: &[&str] = &["multiplicative_factor"];

/// Separator between several alternate spellings in one cell.
const EQUIVALENT_SEPARATOR: char = '|';

pub fn load_equivalent_labels(path: &Path) -> Result<EquivalenceTable> {
    let table = read_csv_columns(path)?;
    let groups: Vec<EquivalenceGroup> = table
        .columns
        .into_iter()
        .filter_map(|(_, values)| EquivalenceGroup::new(values))
        .collect();
    debug!(path = %path.display(), groups = groups.len(), "loaded label equivalences");
    Ok(EquivalenceTable::new(groups))
}

/// A column with no values restricts its label to no unit at all.
pub fn load_dosage_units(path: &Path) -> Result<AllowedUnits> {
    let table = read_csv_columns(path)?;
    let mut units: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (label, values) in table.columns {
        if label.is_empty() {
            continue;
        }
        units.entry(label).or_default().extend(values);
    }
    debug!(path = %path.display(), labels = units.len(), "loaded allowed units");
    Ok(AllowedUnits::new(units))
}

pub fn load_plausible_ranges(path: &Path) -> Result<PlausibleRanges> {
    let rows = read_csv_rows(path)?;
    let mut ranges = PlausibleRanges::default();
    for row in &rows {
        let label = require_field(row, RANGE_LABEL, path)?;
        if label.is_empty() {
            continue;
        }
        let min = parse_number(require_field(row, RANGE_MIN, path)?, RANGE_MIN, path)?;
        let max = parse_number(require_field(row, RANGE_MAX, path)?, RANGE_MAX, path)?;
        let range = PlausibleRange::new(label, min, max).map_err(|source| StandardsError::Model {
            path: path.to_path_buf(),
            source,
        })?;
        ranges.insert(label, range);
    }
    debug!(path = %path.display(), ranges = ranges.len(), "loaded plausible ranges");
    Ok(ranges)
}

pub fn load_cross_system(path: &Path) -> Result<CrossSystemTable> {
    let rows = read_csv_rows(path)?;
    let mut table = Vec::new();
    for row in &rows {
        let canonical_name = first_field(row, CANONICAL_NAME).ok_or_else(|| {
            StandardsError::MissingColumn {
                path: path.to_path_buf(),
                column: CANONICAL_NAME[0].to_string(),
            }
        })?;
        if canonical_name.is_empty() {
            continue;
        }
        let multiplicative_factor = match first_field(row, CONVERSION_FACTOR) {
            Some(raw) if !raw.is_empty() => Some(parse_number(raw, CONVERSION_FACTOR[0], path)?),
            _ => None,
        };
        table.push(CrossSystemEquivalence {
            canonical_name: canonical_name.to_string(),
            equivalent_name: alias_field(row, EQUIVALENT_NAME),
            other_equivalents: first_field(row, OTHER_EQUIVALENTS)
                .map(|raw| {
                    raw.split(EQUIVALENT_SEPARATOR)
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            target_unit: alias_field(row, TARGET_UNIT),
            unit_conversion_needed: first_field(row, CONVERSION_NEEDED).is_some_and(parse_flag),
            multiplicative_factor,
        });
    }
    debug!(path = %path.display(), rows = table.len(), "loaded cross-system equivalences");
    Ok(CrossSystemTable::new(table))
}

fn alias_field(row: &BTreeMap<String, String>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| optional_field(row, alias))
}

fn parse_flag(raw: &str) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" | "x" => true,
        _ => false,
    }
}

/// Locations of the reference tables of one invocation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTablePaths {
    pub equivalent_labels: Option<PathBuf>,
    pub dosage_units: Option<PathBuf>,
    pub plausible_ranges: Option<PathBuf>,
    pub cross_system: Option<PathBuf>,
}

/// Loads every supplied table; absent tables stay empty.
pub fn load_reference_tables(paths: &ReferenceTablePaths) -> Result<ReferenceTables> {
    let mut tables = ReferenceTables::default();
    if let Some(path) = &paths.equivalent_labels {
        tables.equivalent_labels = load_equivalent_labels(path)?;
    }
    if let Some(path) = &paths.dosage_units {
        tables.allowed_units = load_dosage_units(path)?;
    }
    if let Some(path) = &paths.plausible_ranges {
        tables.plausible_ranges = load_plausible_ranges(path)?;
    }
    if let Some(path) = &paths.cross_system {
        tables.cross_system = Some(load_cross_system(path)?);
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_spellings() {
        assert!(parse_flag("1"));
        assert!(parse_flag("True"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
