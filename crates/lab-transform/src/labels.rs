//! Label equivalence resolution and variable selection.

use std::collections::{BTreeMap, BTreeSet};

use lab_model::{CorrectedCalcium, CrossSystemTable, EquivalenceTable, LabTable};

use crate::error::{HarmonizeError, Result};

/// Rewrites every synonym to its canonical label. Returns rows rewritten.
pub fn resolve_labels(table: &mut LabTable, equivalences: &EquivalenceTable) -> usize {
    let synonyms = equivalences.synonym_map();
    let mut rewritten = 0;
    for record in table.iter_mut() {
        if let Some(canonical) = synonyms.get(record.dosage_label.as_str()) {
            record.dosage_label = (*canonical).to_string();
            rewritten += 1;
        }
    }
    rewritten
}

/// Outcome of restricting a table to the selected variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelection {
    /// Distinct labels retained, first-seen order.
    pub included: Vec<String>,
    /// Distinct labels removed, first-seen order.
    pub dropped: Vec<String>,
    pub removed_rows: usize,
}

pub fn select_variables(table: &mut LabTable, selected: &BTreeSet<String>) -> LabelSelection {
    let dropped: Vec<String> = table
        .labels()
        .into_iter()
        .filter(|label| !selected.contains(label))
        .collect();
    let removed_rows = table.retain(|record| selected.contains(&record.dosage_label));
    LabelSelection {
        included: table.labels(),
        dropped,
        removed_rows,
    }
}

/// Rewrites alternate-source labels to canonical names for the selected
/// rows of the cross-system table.
///
/// A selected row without an equivalent is an error, except for the derived
/// variable synthesized later.
pub fn align_cross_system_labels(
    table: &mut LabTable,
    cross_system: &CrossSystemTable,
    selected: &BTreeSet<String>,
    derived: &CorrectedCalcium,
) -> Result<usize> {
    let mut mapping: BTreeMap<&str, &str> = BTreeMap::new();
    for row in cross_system.selected(selected) {
        if row.equivalent_name.is_none() {
            if row.canonical_name == derived.label {
                continue;
            }
            return Err(HarmonizeError::MissingEquivalence {
                label: row.canonical_name.clone(),
            });
        }
        for source in row.source_labels() {
            mapping.entry(source).or_insert(row.canonical_name.as_str());
        }
    }

    let mut aligned = 0;
    for record in table.iter_mut() {
        if let Some(canonical) = mapping.get(record.dosage_label.as_str()) {
            record.dosage_label = (*canonical).to_string();
            aligned += 1;
        }
    }
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_model::{CrossSystemEquivalence, EquivalenceGroup, LabRecord};

    fn table(labels: &[&str]) -> LabTable {
        LabTable::new(
            labels
                .iter()
                .map(|label| LabRecord::new("1_0001", "t", *label))
                .collect(),
        )
    }

    fn cross_row(canonical: &str, equivalent: Option<&str>) -> CrossSystemEquivalence {
        CrossSystemEquivalence {
            canonical_name: canonical.to_string(),
            equivalent_name: equivalent.map(str::to_string),
            other_equivalents: Vec::new(),
            target_unit: None,
            unit_conversion_needed: false,
            multiplicative_factor: None,
        }
    }

    #[test]
    fn synonyms_collapse_to_canonical() {
        let mut table = table(&["créatinine", "creatinine", "CREA", "sodium"]);
        let equivalences = EquivalenceTable::new(vec![
            EquivalenceGroup::new(["créatinine", "creatinine", "CREA"]).unwrap(),
        ]);
        assert_eq!(resolve_labels(&mut table, &equivalences), 2);
        assert_eq!(table.labels(), vec!["créatinine", "sodium"]);
    }

    #[test]
    fn selection_records_included_and_dropped() {
        let mut table = table(&["sodium", "urea", "glucose", "urea"]);
        let selected = BTreeSet::from(["sodium".to_string(), "glucose".to_string()]);
        let selection = select_variables(&mut table, &selected);
        assert_eq!(selection.included, vec!["sodium", "glucose"]);
        assert_eq!(selection.dropped, vec!["urea"]);
        assert_eq!(selection.removed_rows, 2);
    }

    #[test]
    fn cross_system_alignment_maps_source_labels() {
        let mut table = table(&["Sodium", "Glucose", "Other"]);
        let cross = CrossSystemTable::new(vec![
            cross_row("sodium", Some("Sodium")),
            cross_row("glucose", Some("Glucose")),
        ]);
        let selected = BTreeSet::from(["sodium".to_string(), "glucose".to_string()]);
        let aligned =
            align_cross_system_labels(&mut table, &cross, &selected, &CorrectedCalcium::default())
                .unwrap();
        assert_eq!(aligned, 2);
        assert_eq!(table.labels(), vec!["sodium", "glucose", "Other"]);
    }

    #[test]
    fn missing_equivalent_is_fatal_except_for_derived_label() {
        let derived = CorrectedCalcium::default();
        let selected = BTreeSet::from(["calcium corrige".to_string(), "ALAT".to_string()]);

        let cross = CrossSystemTable::new(vec![cross_row("calcium corrige", None)]);
        let mut records = table(&["Albumin"]);
        assert!(align_cross_system_labels(&mut records, &cross, &selected, &derived).is_ok());

        let cross = CrossSystemTable::new(vec![cross_row("ALAT", None)]);
        let error =
            align_cross_system_labels(&mut records, &cross, &selected, &derived).unwrap_err();
        assert!(matches!(error, HarmonizeError::MissingEquivalence { ref label } if label == "ALAT"));
    }
}
