//! Delimited file loading.
//!
//! Every field is read as text: numeric coercion happens later, after the
//! censored-value rules have had a chance to rewrite qualified values.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::discovery::list_lab_files;
use crate::error::{IngestError, Result};
use crate::polars_utils::column_names;

/// Default file-name prefix of primary-source lab exports.
pub const DEFAULT_FILE_PREFIX: &str = "labo";
/// Default field delimiter of primary-source lab exports.
pub const DEFAULT_DELIMITER: u8 = b';';

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub file_prefix: String,
    pub delimiter: u8,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Reads one delimited UTF-8 file with every column as `String`.
pub fn read_lab_file(path: &Path, delimiter: u8) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(delimiter))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if df.width() == 0 {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read lab file"
    );
    Ok(df)
}

/// Stacks frames vertically over the union of their columns.
///
/// Columns keep first-seen order; cells of columns a frame lacks are null.
pub fn concat_frames(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut union: Vec<String> = Vec::new();
    for frame in &frames {
        for name in column_names(frame) {
            if !union.contains(&name) {
                union.push(name);
            }
        }
    }

    let mut combined: Option<DataFrame> = None;
    for frame in frames {
        let aligned = align_columns(frame, &union)?;
        match combined.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&aligned)?;
            }
            None => combined = Some(aligned),
        }
    }
    Ok(combined.unwrap_or_else(DataFrame::empty))
}

fn align_columns(mut frame: DataFrame, union: &[String]) -> Result<DataFrame> {
    let present = column_names(&frame);
    let height = frame.height();
    for name in union {
        if !present.contains(name) {
            let nulls = Series::full_null(name.as_str().into(), height, &DataType::String);
            frame.with_column(nulls)?;
        }
    }
    Ok(frame.select(union.iter().map(String::as_str))?)
}

/// Reads and concatenates every file of `dir` matching the prefix.
pub fn read_lab_directory(dir: &Path, options: &IngestOptions) -> Result<DataFrame> {
    let files: Vec<PathBuf> = list_lab_files(dir, &options.file_prefix)?;
    let frames = files
        .iter()
        .map(|path| read_lab_file(path, options.delimiter))
        .collect::<Result<Vec<_>>>()?;
    let combined = concat_frames(frames)?;
    info!(
        dir = %dir.display(),
        files = files.len(),
        rows = combined.height(),
        columns = combined.width(),
        "loaded lab files"
    );
    Ok(combined)
}
