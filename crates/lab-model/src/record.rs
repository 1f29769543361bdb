//! Long-format laboratory records.
//!
//! A [`LabRecord`] is one measurement tied to a case admission and a sample
//! timestamp. Records flow through every harmonization step; a [`LabTable`]
//! is the ordered collection a step consumes and produces.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Canonical long-format column names.
pub mod columns {
    pub const CASE_ADMISSION_ID: &str = "case_admission_id";
    pub const SAMPLE_DATE: &str = "sample_date";
    pub const ANALYSE_LABEL: &str = "analyse_label";
    pub const DOSAGE_LABEL: &str = "dosage_label";
    pub const MATERIAL_LABEL: &str = "material_label";
    pub const UNIT_OF_MEASURE: &str = "unit_of_measure";
    pub const VALUE: &str = "value";
    pub const LOWER_LIMIT: &str = "lower_limit";
    pub const UPPER_LIMIT: &str = "upper_limit";
    /// Added by the wide-to-long reshape to tag the analyte block.
    pub const LAB_NAME: &str = "lab_name";

    /// Columns that identify a long-format table.
    pub const LONG_FORMAT: [&str; 9] = [
        CASE_ADMISSION_ID,
        SAMPLE_DATE,
        ANALYSE_LABEL,
        DOSAGE_LABEL,
        MATERIAL_LABEL,
        UNIT_OF_MEASURE,
        VALUE,
        LOWER_LIMIT,
        UPPER_LIMIT,
    ];

    /// Identification columns shared by every analyte block of a wide table.
    pub const IDENTIFICATION: [&str; 2] = [CASE_ADMISSION_ID, SAMPLE_DATE];
}

/// Measurement value as it moves from raw text to a numeric estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum LabValue {
    /// No value reported, or a value invalidated by a correction step.
    #[default]
    Missing,
    /// Raw text as ingested, before censored-value correction.
    Text(String),
    /// Parsed or estimated numeric value.
    Numeric(f64),
}

impl LabValue {
    /// Builds a value from an optional raw cell, treating blank text as missing.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(text) if !text.trim().is_empty() => Self::Text(text.to_string()),
            _ => Self::Missing,
        }
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// One laboratory measurement in canonical long format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LabRecord {
    /// `"{patient_id}_{4-digit-suffix}"`.
    pub case_admission_id: String,
    pub sample_date: String,
    /// Source-system analysis label, kept for provenance.
    pub analyse_label: Option<String>,
    /// Variable label, canonical once label resolution has run.
    pub dosage_label: String,
    /// Material category once materials are merged; the raw descriptor before.
    pub material_label: String,
    /// Raw specimen descriptor, preserved when materials are merged.
    pub specimen_label: Option<String>,
    pub unit_of_measure: String,
    pub value: LabValue,
    pub lower_limit: Option<String>,
    pub upper_limit: Option<String>,
}

impl LabRecord {
    pub fn new(
        case_admission_id: impl Into<String>,
        sample_date: impl Into<String>,
        dosage_label: impl Into<String>,
    ) -> Self {
        Self {
            case_admission_id: case_admission_id.into(),
            sample_date: sample_date.into(),
            dosage_label: dosage_label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material_label = material.into();
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measure = unit.into();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: LabValue) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_text_value(self, value: impl Into<String>) -> Self {
        self.with_value(LabValue::Text(value.into()))
    }

    /// Specimen descriptor, falling back to the material label when no
    /// separate descriptor was recorded.
    pub fn specimen(&self) -> &str {
        self.specimen_label
            .as_deref()
            .unwrap_or(&self.material_label)
    }
}

/// Ordered collection of records flowing through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabTable {
    pub records: Vec<LabRecord>,
}

impl LabTable {
    pub fn new(records: Vec<LabRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, LabRecord> {
        self.records.iter_mut()
    }

    /// Retains records matching the predicate and returns how many were removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&LabRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(keep);
        before - self.records.len()
    }

    /// Distinct variable labels in first-seen order.
    pub fn labels(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter(|record| seen.insert(record.dosage_label.as_str()))
            .map(|record| record.dosage_label.clone())
            .collect()
    }

    /// Distinct units observed per variable label.
    pub fn units_by_label(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut units: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for record in &self.records {
            units
                .entry(record.dosage_label.clone())
                .or_default()
                .insert(record.unit_of_measure.clone());
        }
        units
    }

    /// Distinct material labels currently present.
    pub fn materials(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .map(|record| record.material_label.clone())
            .collect()
    }
}

impl From<Vec<LabRecord>> for LabTable {
    fn from(records: Vec<LabRecord>) -> Self {
        Self::new(records)
    }
}

impl IntoIterator for LabTable {
    type Item = LabRecord;
    type IntoIter = std::vec::IntoIter<LabRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a LabTable {
    type Item = &'a LabRecord;
    type IntoIter = std::slice::Iter<'a, LabRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_raw_value_is_missing() {
        assert_eq!(LabValue::from_raw(Some("  ")), LabValue::Missing);
        assert_eq!(LabValue::from_raw(None), LabValue::Missing);
        assert_eq!(
            LabValue::from_raw(Some("12")),
            LabValue::Text("12".to_string())
        );
    }

    #[test]
    fn labels_keep_first_seen_order() {
        let table = LabTable::new(vec![
            LabRecord::new("1_0001", "t", "sodium"),
            LabRecord::new("1_0001", "t", "glucose"),
            LabRecord::new("2_0001", "t", "sodium"),
        ]);
        assert_eq!(table.labels(), vec!["sodium", "glucose"]);
    }

    #[test]
    fn retain_reports_removed_count() {
        let mut table = LabTable::new(vec![
            LabRecord::new("1_0001", "t", "sodium"),
            LabRecord::new("1_0001", "t", "glucose"),
        ]);
        let removed = table.retain(|record| record.dosage_label == "sodium");
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 1);
    }
}
