//! Schema normalization: wide per-analyte tables to the long row shape.
//!
//! A wide table carries one group of columns per analyte, named
//! `{analyte}_{field}` (`glucose_value`, `glucose_unit_of_measure`). Each
//! analyte block is sliced out with the identification columns, its fields
//! renamed without the prefix, rows without a value dropped, and the block
//! tagged with `lab_name`. Blocks are stacked in first-appearance order.

use lab_ingest::{column_names, concat_frames, has_column, string_column};
use lab_model::columns::{IDENTIFICATION, LAB_NAME, LONG_FORMAT, VALUE};
use polars::prelude::*;
use tracing::debug;

use crate::error::Result;

const PREFIX_SEPARATOR: char = '_';

/// True when every canonical long-format column is present.
pub fn is_long_format(df: &DataFrame) -> bool {
    LONG_FORMAT.iter().all(|column| has_column(df, column))
}

/// Analyte prefixes of the non-identification columns, first-seen order.
pub fn analyte_prefixes(df: &DataFrame) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    for name in column_names(df) {
        if IDENTIFICATION.contains(&name.as_str()) {
            continue;
        }
        let prefix = analyte_prefix(&name).to_string();
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }
    prefixes
}

fn analyte_prefix(column: &str) -> &str {
    column.split(PREFIX_SEPARATOR).next().unwrap_or(column)
}

/// Field name of a prefixed column (`glucose_unit_of_measure` -> `unit_of_measure`).
fn field_name(column: &str) -> &str {
    column
        .split_once(PREFIX_SEPARATOR)
        .map_or("", |(_, field)| field)
}

/// Reshapes a wide table into long rows; long tables are returned unchanged.
pub fn normalize_schema(df: DataFrame) -> Result<DataFrame> {
    if is_long_format(&df) {
        debug!(rows = df.height(), "input already in long format");
        return Ok(df);
    }
    wide_to_long(&df)
}

pub fn wide_to_long(df: &DataFrame) -> Result<DataFrame> {
    let columns = column_names(df);
    let identification: Vec<&str> = IDENTIFICATION
        .iter()
        .copied()
        .filter(|column| has_column(df, column))
        .collect();

    let mut blocks = Vec::new();
    for prefix in analyte_prefixes(df) {
        let value_column = format!("{prefix}{PREFIX_SEPARATOR}{VALUE}");
        if !has_column(df, &value_column) {
            debug!(analyte = %prefix, "skipping analyte block without value column");
            continue;
        }
        let analyte_columns: Vec<&String> = columns
            .iter()
            .filter(|name| {
                !identification.contains(&name.as_str()) && analyte_prefix(name) == prefix
            })
            .collect();

        let mut block_columns: Vec<Column> = Vec::new();
        for name in &identification {
            block_columns.push(df.column(name)?.clone());
        }
        for name in &analyte_columns {
            let field = field_name(name);
            if field.is_empty() {
                continue;
            }
            let mut column = df.column(name)?.clone();
            column.rename(field.into());
            block_columns.push(column);
        }
        let block = DataFrame::new(block_columns)?;

        let keep = block.column(VALUE)?.is_not_null();
        let mut block = block.filter(&keep)?;
        let height = block.height();
        block.with_column(string_column(LAB_NAME, vec![Some(prefix.clone()); height]))?;
        debug!(analyte = %prefix, rows = height, "reshaped analyte block");
        blocks.push(block);
    }

    let long = concat_frames(blocks)?;
    debug!(rows = long.height(), "reshaped wide table");
    Ok(long)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_ingest::string_values;

    fn test_df(columns: Vec<(&str, Vec<Option<&str>>)>) -> DataFrame {
        let cols: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| {
                Series::new(
                    name.into(),
                    values
                        .into_iter()
                        .map(|value| value.map(String::from))
                        .collect::<Vec<_>>(),
                )
                .into_column()
            })
            .collect();
        DataFrame::new(cols).unwrap()
    }

    #[test]
    fn wide_table_yields_one_row_per_present_value() {
        let df = test_df(vec![
            ("case_admission_id", vec![Some("1_0001"), Some("2_0001")]),
            ("sample_date", vec![Some("t1"), Some("t2")]),
            ("glucose_value", vec![Some("5.1"), None]),
            ("glucose_unit", vec![Some("mmol/l"), Some("mmol/l")]),
        ]);
        let long = normalize_schema(df).unwrap();
        assert_eq!(long.height(), 1);
        assert_eq!(
            string_values(&long, LAB_NAME).unwrap(),
            vec![Some("glucose".to_string())]
        );
        assert_eq!(
            string_values(&long, "unit").unwrap(),
            vec![Some("mmol/l".to_string())]
        );
    }

    #[test]
    fn blocks_follow_first_appearance_order() {
        let df = test_df(vec![
            ("case_admission_id", vec![Some("1_0001"), Some("2_0001")]),
            ("sodium_value", vec![Some("140"), Some("139")]),
            ("glucose_value", vec![Some("5.1"), Some("6.0")]),
        ]);
        let long = normalize_schema(df).unwrap();
        assert_eq!(
            string_values(&long, LAB_NAME).unwrap(),
            vec![
                Some("sodium".to_string()),
                Some("sodium".to_string()),
                Some("glucose".to_string()),
                Some("glucose".to_string()),
            ]
        );
        assert_eq!(
            string_values(&long, "case_admission_id").unwrap(),
            vec![
                Some("1_0001".to_string()),
                Some("2_0001".to_string()),
                Some("1_0001".to_string()),
                Some("2_0001".to_string()),
            ]
        );
    }

    #[test]
    fn long_table_is_unchanged() {
        let columns: Vec<(&str, Vec<Option<&str>>)> = LONG_FORMAT
            .iter()
            .map(|name| (*name, vec![Some("x")]))
            .collect();
        let df = test_df(columns);
        let normalized = normalize_schema(df.clone()).unwrap();
        assert!(normalized.equals(&df));
    }
}
