//! Censored-value rules.
//!
//! A censored value is reported only as bounded by an inequality (`">83.2"`).
//! Each rule maps one exact literal, for a set of variable labels, to a point
//! estimate pushed 5% beyond the censoring boundary.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Fraction by which an estimate is pushed past the censoring threshold.
pub const CENSORED_ADJUSTMENT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
}

impl Comparator {
    pub fn symbol(self) -> char {
        match self {
            Self::LessThan => '<',
            Self::GreaterThan => '>',
        }
    }

    /// Pushes `threshold` 5% in the direction the inequality implies.
    pub fn estimate(self, threshold: f64) -> f64 {
        match self {
            Self::LessThan => threshold - CENSORED_ADJUSTMENT * threshold,
            Self::GreaterThan => threshold + CENSORED_ADJUSTMENT * threshold,
        }
    }
}

impl FromStr for Comparator {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "<" => Ok(Self::LessThan),
            ">" => Ok(Self::GreaterThan),
            other => Err(ModelError::InvalidComparator(other.to_string())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// `(labels, comparator, literal, threshold)`: rewrites `literal` to the
/// adjusted threshold for records whose label is in `labels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensoredValueRule {
    pub labels: BTreeSet<String>,
    pub comparator: Comparator,
    pub literal: String,
    /// Parsed from the literal when omitted.
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl CensoredValueRule {
    pub fn new<I, S>(labels: I, comparator: Comparator, literal: &str, threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            comparator,
            literal: literal.to_string(),
            threshold: Some(threshold),
        }
    }

    /// Numeric threshold, falling back to the digits after the comparator.
    pub fn threshold(&self) -> Result<f64> {
        if let Some(threshold) = self.threshold {
            return Ok(threshold);
        }
        self.literal
            .trim()
            .strip_prefix(self.comparator.symbol())
            .and_then(|rest| rest.trim().parse::<f64>().ok())
            .ok_or_else(|| ModelError::InvalidRule {
                literal: self.literal.clone(),
            })
    }

    pub fn estimate(&self) -> Result<f64> {
        Ok(self.comparator.estimate(self.threshold()?))
    }

    pub fn applies_to(&self, label: &str, literal: &str) -> bool {
        self.literal == literal && self.labels.contains(label)
    }
}
