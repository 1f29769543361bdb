//! Derived-variable synthesis for the alternate source.

use std::collections::{BTreeMap, BTreeSet};

use lab_model::{CorrectedCalcium, LabRecord, LabTable, LabValue};

/// Appends a corrected-calcium row for every calcium observation that has an
/// albumin observation at the same case and sample time.
///
/// Returns the number of rows appended.
pub fn synthesize_corrected_calcium(table: &mut LabTable, derived: &CorrectedCalcium) -> usize {
    let source_label = |record: &LabRecord| {
        record
            .analyse_label
            .clone()
            .unwrap_or_else(|| record.dosage_label.clone())
    };

    let mut albumin: BTreeMap<(String, String), f64> = BTreeMap::new();
    for record in table.iter() {
        if derived.albumin_labels.contains(&source_label(record))
            && let Some(value) = record.value.as_numeric()
        {
            albumin
                .entry((record.case_admission_id.clone(), record.sample_date.clone()))
                .or_insert(value);
        }
    }

    let mut seen = BTreeSet::new();
    let mut synthesized = Vec::new();
    for record in table.iter() {
        if !derived.calcium_labels.contains(&source_label(record)) {
            continue;
        }
        let Some(calcium) = record.value.as_numeric() else {
            continue;
        };
        let key = (record.case_admission_id.clone(), record.sample_date.clone());
        let Some(albumin) = albumin.get(&key) else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }
        let mut row = record.clone();
        row.dosage_label = derived.label.clone();
        row.unit_of_measure = derived.unit.clone();
        row.value = LabValue::Numeric(derived.compute(calcium, *albumin));
        synthesized.push(row);
    }

    let count = synthesized.len();
    table.records.extend(synthesized);
    count
}
