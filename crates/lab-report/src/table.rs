//! Clean long-format table output.

use std::path::{Path, PathBuf};

use anyhow::Result;
use lab_model::LabTable;
use lab_model::columns::{
    CASE_ADMISSION_ID, DOSAGE_LABEL, LOWER_LIMIT, MATERIAL_LABEL, SAMPLE_DATE, UNIT_OF_MEASURE,
    UPPER_LIMIT, VALUE,
};
use lab_transform::value_to_string;
use tracing::info;

use crate::common::write_csv;

pub const CLEAN_TABLE_FILE: &str = "preprocessed_labs.csv";

const CLEAN_TABLE_HEADER: [&str; 8] = [
    CASE_ADMISSION_ID,
    SAMPLE_DATE,
    DOSAGE_LABEL,
    MATERIAL_LABEL,
    UNIT_OF_MEASURE,
    VALUE,
    LOWER_LIMIT,
    UPPER_LIMIT,
];

/// Writes the clean table as `preprocessed_labs.csv` under `output_dir`.
pub fn write_clean_table(output_dir: &Path, table: &LabTable) -> Result<PathBuf> {
    let rows: Vec<Vec<String>> = table
        .iter()
        .map(|record| {
            vec![
                record.case_admission_id.clone(),
                record.sample_date.clone(),
                record.dosage_label.clone(),
                record.material_label.clone(),
                record.unit_of_measure.clone(),
                value_to_string(&record.value),
                record.lower_limit.clone().unwrap_or_default(),
                record.upper_limit.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let path = output_dir.join(CLEAN_TABLE_FILE);
    write_csv(&path, &CLEAN_TABLE_HEADER, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote clean table");
    Ok(path)
}
