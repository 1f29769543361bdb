//! Lab data ingestion: file discovery, text-only loading, case identification.

pub mod discovery;
pub mod error;
pub mod identification;
pub mod polars_utils;
pub mod reader;

pub use discovery::list_lab_files;
pub use error::{IngestError, Result};
pub use identification::{
    EPISODE_SUFFIX, PATIENT_ID, add_case_admission_id, drop_columns, prepare_lab_frame,
};
pub use polars_utils::{
    column_names, format_numeric, has_column, optional_string_values, parse_f64,
    string_column, string_values,
};
pub use reader::{
    DEFAULT_DELIMITER, DEFAULT_FILE_PREFIX, IngestOptions, concat_frames, read_lab_directory,
    read_lab_file,
};
