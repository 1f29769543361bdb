use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown comparator '{0}' (expected '<' or '>')")]
    InvalidComparator(String),
    #[error("invalid plausible range for {label}: min {min} is greater than max {max}")]
    InvertedRange { label: String, min: f64, max: f64 },
    #[error("censored-value rule for literal '{literal}' has no usable threshold")]
    InvalidRule { literal: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
