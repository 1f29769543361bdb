//! Error types for lab data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating or loading lab exports.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No file in the directory starts with the requested prefix.
    #[error("no file starting with '{prefix}' in {path}")]
    NoMatchingFiles { path: PathBuf, prefix: String },

    /// The delimited reader rejected a lab export.
    #[error("failed to parse {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Export without a header row.
    #[error("file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    #[error("lab frame has no column '{column}'")]
    ColumnNotFound { column: String },

    #[error("lab frame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_names_prefix_and_directory() {
        let err = IngestError::NoMatchingFiles {
            path: PathBuf::from("/data"),
            prefix: "labo".to_string(),
        };
        assert_eq!(err.to_string(), "no file starting with 'labo' in /data");
    }

    #[test]
    fn polars_errors_become_frame_errors() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
