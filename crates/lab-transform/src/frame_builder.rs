//! Conversion between polars frames and lab records.
//!
//! The primary source arrives as a long (or reshaped) text table. The
//! alternate source is a long table keyed by admission with separate textual
//! and numeric value columns. Both adapters produce the same [`LabTable`].

use lab_ingest::{format_numeric, has_column, optional_string_values, string_values};
use lab_model::columns::{
    ANALYSE_LABEL, CASE_ADMISSION_ID, DOSAGE_LABEL, LAB_NAME, LOWER_LIMIT, MATERIAL_LABEL,
    SAMPLE_DATE, UNIT_OF_MEASURE, UPPER_LIMIT, VALUE,
};
use lab_model::{LabRecord, LabTable, LabValue};
use polars::prelude::*;

use crate::censored::looks_censored;
use crate::error::{HarmonizeError, Result};

/// Field aliases accepted from reshaped wide tables.
const UNIT_ALIAS: &str = "unit";
const MATERIAL_ALIAS: &str = "material";

/// Alternate-source column names.
pub mod alternate_columns {
    pub const ADMISSION_ID: &str = "hadm_id";
    pub const LABEL: &str = "label";
    pub const CHART_TIME: &str = "charttime";
    pub const VALUE: &str = "value";
    pub const VALUE_NUMERIC: &str = "valuenum";
    pub const VALUE_UNIT: &str = "valueuom";
    pub const FLUID: &str = "fluid";
}

fn required(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    if !has_column(df, column) {
        return Err(HarmonizeError::MissingColumn {
            column: column.to_string(),
        });
    }
    Ok(string_values(df, column)?)
}

/// First present column among `names`, or all `None`.
fn first_present(df: &DataFrame, names: &[&str]) -> Result<Vec<Option<String>>> {
    match names.iter().find(|name| has_column(df, name)) {
        Some(name) => Ok(string_values(df, name)?),
        None => Ok(vec![None; df.height()]),
    }
}

/// Records from a primary-source long table.
///
/// `dosage_label` falls back to `lab_name` for reshaped wide tables; `unit`
/// and `material` are accepted for the unit and material fields.
pub fn primary_records_from_frame(df: &DataFrame) -> Result<LabTable> {
    let case_ids = required(df, CASE_ADMISSION_ID)?;
    let sample_dates = optional_string_values(df, SAMPLE_DATE)?;
    let analyse_labels = optional_string_values(df, ANALYSE_LABEL)?;
    let dosage_labels = first_present(df, &[DOSAGE_LABEL])?;
    let lab_names = optional_string_values(df, LAB_NAME)?;
    let materials = first_present(df, &[MATERIAL_LABEL, MATERIAL_ALIAS])?;
    let units = first_present(df, &[UNIT_OF_MEASURE, UNIT_ALIAS])?;
    let values = required(df, VALUE)?;
    let lower_limits = optional_string_values(df, LOWER_LIMIT)?;
    let upper_limits = optional_string_values(df, UPPER_LIMIT)?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let label = dosage_labels[idx]
            .clone()
            .or_else(|| lab_names[idx].clone())
            .unwrap_or_default();
        records.push(LabRecord {
            case_admission_id: case_ids[idx].clone().unwrap_or_default(),
            sample_date: sample_dates[idx].clone().unwrap_or_default(),
            analyse_label: analyse_labels[idx].clone(),
            dosage_label: label,
            material_label: materials[idx].clone().unwrap_or_default(),
            specimen_label: None,
            unit_of_measure: units[idx].clone().unwrap_or_default(),
            value: LabValue::from_raw(values[idx].as_deref()),
            lower_limit: lower_limits[idx].clone(),
            upper_limit: upper_limits[idx].clone(),
        });
    }
    Ok(LabTable::new(records))
}

/// Records from an alternate-source table.
///
/// The numeric column is used unless the text carries a censoring pattern,
/// in which case the text is kept for the censored-value step.
pub fn alternate_records_from_frame(df: &DataFrame) -> Result<LabTable> {
    use alternate_columns::{
        ADMISSION_ID, CHART_TIME, FLUID, LABEL, VALUE as TEXT_VALUE, VALUE_NUMERIC, VALUE_UNIT,
    };

    let case_ids = if has_column(df, ADMISSION_ID) {
        string_values(df, ADMISSION_ID)?
    } else {
        required(df, CASE_ADMISSION_ID)?
    };
    let labels = required(df, LABEL)?;
    let chart_times = optional_string_values(df, CHART_TIME)?;
    let texts = optional_string_values(df, TEXT_VALUE)?;
    let numerics = optional_string_values(df, VALUE_NUMERIC)?;
    let units = optional_string_values(df, VALUE_UNIT)?;
    let fluids = optional_string_values(df, FLUID)?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let numeric = numerics[idx]
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite());
        let text = texts[idx].as_deref().filter(|text| !text.trim().is_empty());
        let value = match (text, numeric) {
            (Some(text), _) if looks_censored(text) => LabValue::Text(text.to_string()),
            (_, Some(numeric)) => LabValue::Numeric(numeric),
            (Some(text), None) => LabValue::Text(text.to_string()),
            (None, None) => LabValue::Missing,
        };
        let label = labels[idx].clone().unwrap_or_default();
        records.push(LabRecord {
            case_admission_id: case_ids[idx].clone().unwrap_or_default(),
            sample_date: chart_times[idx].clone().unwrap_or_default(),
            analyse_label: Some(label.clone()),
            dosage_label: label,
            material_label: fluids[idx].clone().unwrap_or_default(),
            specimen_label: None,
            unit_of_measure: units[idx].clone().unwrap_or_default(),
            value,
            lower_limit: None,
            upper_limit: None,
        });
    }
    Ok(LabTable::new(records))
}

/// Display form of a value for tabular output.
pub fn value_to_string(value: &LabValue) -> String {
    match value {
        LabValue::Missing => String::new(),
        LabValue::Text(text) => text.clone(),
        LabValue::Numeric(number) => format_numeric(*number),
    }
}
