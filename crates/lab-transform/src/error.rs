//! Fatal harmonization errors.
//!
//! Each variant is a data contradiction or a structural problem that stops
//! the run. Recoverable anomalies are counted in the audit summary instead.

use lab_ingest::IngestError;
use lab_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarmonizeError {
    #[error("{label} has different units: {units:?}")]
    MixedUnits { label: String, units: Vec<String> },

    #[error("{label} has arterial and other materials: {materials:?}")]
    MixedBloodGasMaterials {
        label: String,
        materials: Vec<String>,
    },

    #[error("remaining non-numerical values: {values:?}")]
    UnhandledNonNumeric { values: Vec<String> },

    #[error("units for {label} do not correspond: expected {expected}, found {observed:?}")]
    UnitMismatch {
        label: String,
        expected: String,
        observed: Vec<String>,
    },

    #[error("no cross-system equivalent for {label}")]
    MissingEquivalence { label: String },

    #[error("cross-system equivalence table is required for the alternate source")]
    MissingCrossSystemTable,

    #[error("required column '{column}' not found in input table")]
    MissingColumn { column: String },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("DataFrame operation failed: {message}")]
    Frame { message: String },
}

impl From<polars::prelude::PolarsError> for HarmonizeError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Frame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarmonizeError>;
