//! Text-column helpers over polars frames.

use polars::prelude::*;

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<f64>().ok()
}

/// Values of a column as optional strings, whatever its dtype.
///
/// Empty strings are returned as `None`.
pub fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column
        .str()?
        .into_iter()
        .map(|value| value.filter(|text| !text.is_empty()).map(str::to_string))
        .collect();
    Ok(values)
}

/// Values of an optional column; all `None` when the column is absent.
pub fn optional_string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    if has_column(df, name) {
        string_values(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names()
        .iter()
        .any(|column| column.as_str() == name)
}

/// Owned column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Builds a string column, mapping `None` to null.
pub fn string_column(name: &str, values: Vec<Option<String>>) -> Column {
    Series::new(name.into(), values).into_column()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_numeric_strips_trailing_zeros() {
        assert_eq!(format_numeric(87.36), "87.36");
        assert_eq!(format_numeric(4.0), "4");
        assert_eq!(format_numeric(100.0), "100");
    }

    #[test]
    fn parse_f64_rejects_blank() {
        assert_eq!(parse_f64(" "), None);
        assert_eq!(parse_f64(" 1.5 "), Some(1.5));
        assert_eq!(parse_f64("<5"), None);
    }

    #[test]
    fn string_values_map_empty_to_none() {
        let df = DataFrame::new(vec![string_column(
            "value",
            vec![Some("1".to_string()), Some(String::new()), None],
        )])
        .unwrap();
        let values = string_values(&df, "value").unwrap();
        assert_eq!(values, vec![Some("1".to_string()), None, None]);
        assert!(has_column(&df, "value"));
        assert_eq!(optional_string_values(&df, "unit").unwrap(), vec![None, None, None]);
    }

    #[test]
    fn string_values_cast_numeric_columns() {
        let df = DataFrame::new(vec![Column::new("valuenum".into(), [1.5_f64, 2.0])]).unwrap();
        let values = string_values(&df, "valuenum").unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(Option::is_some));
    }
}
