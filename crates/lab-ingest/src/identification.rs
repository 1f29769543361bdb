//! Case identification and registry-column removal.

use lab_model::case_admission_id;
use lab_model::columns::CASE_ADMISSION_ID;
use polars::prelude::*;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::polars_utils::{column_names, has_column, string_column, string_values};

/// Patient identifier column of primary-source exports.
pub const PATIENT_ID: &str = "patient_id";
/// Episode suffix column of primary-source exports.
pub const EPISODE_SUFFIX: &str = "eds_end_4digit";

/// Adds `case_admission_id` built from patient id and episode suffix.
///
/// A frame that already carries the identifier and lacks the source columns
/// is left unchanged. Rows missing either part get a null identifier.
pub fn add_case_admission_id(df: &mut DataFrame) -> Result<()> {
    let has_sources = has_column(df, PATIENT_ID) && has_column(df, EPISODE_SUFFIX);
    if !has_sources {
        if has_column(df, CASE_ADMISSION_ID) {
            return Ok(());
        }
        let missing = if has_column(df, PATIENT_ID) {
            EPISODE_SUFFIX
        } else {
            PATIENT_ID
        };
        return Err(IngestError::ColumnNotFound {
            column: missing.to_string(),
        });
    }

    let patients = string_values(df, PATIENT_ID)?;
    let suffixes = string_values(df, EPISODE_SUFFIX)?;
    let ids: Vec<Option<String>> = patients
        .iter()
        .zip(&suffixes)
        .map(|(patient, suffix)| match (patient, suffix) {
            (Some(patient), Some(suffix)) => Some(case_admission_id(patient, suffix)),
            _ => None,
        })
        .collect();
    df.with_column(string_column(CASE_ADMISSION_ID, ids))?;
    Ok(())
}

/// Drops the listed columns that are present; returns the names removed.
pub fn drop_columns(df: DataFrame, columns: &[String]) -> (DataFrame, Vec<String>) {
    let present = column_names(&df);
    let dropped: Vec<String> = columns
        .iter()
        .filter(|name| present.contains(name))
        .cloned()
        .collect();
    let df = df.drop_many(dropped.iter().map(String::as_str));
    (df, dropped)
}

/// Builds the case identifier, then removes registry columns.
pub fn prepare_lab_frame(mut df: DataFrame, columns_to_drop: &[String]) -> Result<DataFrame> {
    add_case_admission_id(&mut df)?;
    let (df, dropped) = drop_columns(df, columns_to_drop);
    debug!(dropped = dropped.len(), "dropped identification columns");
    Ok(df)
}
