//! Audit summary returned alongside the cleaned table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::reference::PlausibleRange;

/// count, mean, std, min, quartiles, max of one variable.
///
/// `std` is the sample standard deviation and is `None` for a single
/// observation. Quartiles use linear interpolation between order statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Rows removed by each recoverable-anomaly class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionCounts {
    pub unselected_label: usize,
    pub excluded_material: usize,
    pub non_arterial_blood_gas: usize,
    pub disallowed_unit: usize,
    pub missing_value: usize,
    pub non_numeric_token: usize,
    pub unparsed_text: usize,
    pub negative_value: usize,
    pub out_of_range: usize,
}

impl ExclusionCounts {
    pub fn total(&self) -> usize {
        self.unselected_label
            + self.excluded_material
            + self.non_arterial_blood_gas
            + self.disallowed_unit
            + self.missing_value
            + self.non_numeric_token
            + self.unparsed_text
            + self.negative_value
            + self.out_of_range
    }
}

/// Everything a caller needs to audit one harmonization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub pipeline: String,
    pub input_rows: usize,
    pub output_rows: usize,
    pub included_labels: Vec<String>,
    pub dropped_labels: Vec<String>,
    pub included_materials: BTreeSet<String>,
    pub excluded_materials: BTreeSet<String>,
    /// Rows invalidated by the plausible-range check.
    pub out_of_range: usize,
    pub exclusions: ExclusionCounts,
    /// Residual negative values outside the exempt family.
    pub negative_value_warnings: usize,
    /// Rows created by derived-variable synthesis.
    pub derived_rows: usize,
    /// Unit retained per label.
    pub units: BTreeMap<String, String>,
    /// Median number of observations per case admission, per label.
    pub median_observations: BTreeMap<String, f64>,
    pub descriptive_stats: BTreeMap<String, DescriptiveStats>,
    /// Plausible ranges in force, in table order.
    pub plausible_ranges: Vec<(String, PlausibleRange)>,
}
