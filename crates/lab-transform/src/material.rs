//! Specimen-material merging, selection and blood-gas consistency.

use std::collections::{BTreeMap, BTreeSet};

use lab_model::{BloodGasPolicy, BloodGasRule, LabTable, MaterialVocabulary};

use crate::error::{HarmonizeError, Result};

/// Merges specimen synonyms into their coarse category.
///
/// The raw descriptor is kept in `specimen_label`. Returns rows merged.
pub fn merge_materials(table: &mut LabTable, vocabulary: &MaterialVocabulary) -> usize {
    let categories: BTreeMap<&str, &str> = vocabulary
        .categories
        .iter()
        .flat_map(|category| {
            category
                .members
                .iter()
                .map(move |member| (member.as_str(), category.name.as_str()))
        })
        .collect();

    let mut merged = 0;
    for record in table.iter_mut() {
        if record.specimen_label.is_none() {
            record.specimen_label = Some(record.material_label.clone());
        }
        if let Some(category) = categories.get(record.material_label.as_str()) {
            record.material_label = (*category).to_string();
            merged += 1;
        }
    }
    merged
}

/// Outcome of restricting a table to the included material categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialSelection {
    pub included: BTreeSet<String>,
    pub excluded: BTreeSet<String>,
    pub removed_rows: usize,
}

pub fn select_materials(table: &mut LabTable, include: &BTreeSet<String>) -> MaterialSelection {
    let present = table.materials();
    let excluded: BTreeSet<String> = present.difference(include).cloned().collect();
    let removed_rows = table.retain(|record| include.contains(&record.material_label));
    MaterialSelection {
        included: table.materials(),
        excluded,
        removed_rows,
    }
}

/// Enforces arterial specimens for blood-gas variables. Returns rows dropped.
///
/// A record belongs to a blood-gas family when its label contains one of the
/// rule's fragments (`pO2 corrige` is in the `pO2` family). Under
/// [`BloodGasPolicy::ArterialOnly`] non-arterial rows of every family are
/// dropped first, so the consistency check that follows cannot fail and
/// `MixedBloodGasMaterials` is only raised under [`BloodGasPolicy::CheckOnly`],
/// which keeps every row and fails when a family mixes arterial and other
/// specimens.
pub fn enforce_blood_gas(
    table: &mut LabTable,
    rule: &BloodGasRule,
    policy: BloodGasPolicy,
) -> Result<usize> {
    let removed = match policy {
        BloodGasPolicy::ArterialOnly => table.retain(|record| {
            rule.family_of(&record.dosage_label).is_none() || rule.is_arterial(record.specimen())
        }),
        BloodGasPolicy::CheckOnly => 0,
    };

    let mut specimens: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for record in table.iter() {
        if let Some(family) = rule.family_of(&record.dosage_label) {
            specimens.entry(family).or_default().insert(record.specimen());
        }
    }
    for (family, specimens) in specimens {
        let has_arterial = specimens.iter().any(|specimen| rule.is_arterial(specimen));
        let has_other = specimens.iter().any(|specimen| !rule.is_arterial(specimen));
        if has_arterial && has_other {
            return Err(HarmonizeError::MixedBloodGasMaterials {
                label: family.to_string(),
                materials: specimens.into_iter().map(str::to_string).collect(),
            });
        }
    }
    Ok(removed)
}
