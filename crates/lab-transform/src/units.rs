//! Unit reconciliation.
//!
//! Synonym merging, per-label allow-lists and the single-unit assertion
//! apply to both sources. Conversion factors, scalings and spelling folds
//! only apply to the alternate source.

use std::collections::{BTreeMap, BTreeSet};

use lab_model::{
    AllowedUnits, CrossSystemTable, EquivalenceGroup, LabTable, LabValue, UnitFold, UnitScaling,
};

use crate::error::{HarmonizeError, Result};

/// Rewrites unit synonyms to the first member of their group.
pub fn merge_unit_synonyms(table: &mut LabTable, groups: &[EquivalenceGroup]) -> usize {
    let synonyms: BTreeMap<&str, &str> = groups
        .iter()
        .flat_map(|group| {
            group
                .synonyms()
                .iter()
                .map(move |synonym| (synonym.as_str(), group.canonical()))
        })
        .collect();

    let mut merged = 0;
    for record in table.iter_mut() {
        if let Some(canonical) = synonyms.get(record.unit_of_measure.as_str()) {
            record.unit_of_measure = (*canonical).to_string();
            merged += 1;
        }
    }
    merged
}

/// Drops rows whose unit is not allowed for their label.
///
/// Labels absent from the allow-list keep every unit.
pub fn restrict_allowed_units(table: &mut LabTable, allowed: &AllowedUnits) -> usize {
    table.retain(|record| {
        allowed
            .for_label(&record.dosage_label)
            .is_none_or(|units| units.contains(&record.unit_of_measure))
    })
}

/// Checks that each label carries exactly one unit and returns it.
pub fn assert_single_unit(table: &LabTable) -> Result<BTreeMap<String, String>> {
    let mut retained = BTreeMap::new();
    for (label, units) in table.units_by_label() {
        let mut iter = units.iter();
        match (iter.next(), iter.next()) {
            (Some(unit), None) => {
                retained.insert(label, unit.clone());
            }
            (Some(_), Some(_)) => {
                return Err(HarmonizeError::MixedUnits {
                    label,
                    units: units.into_iter().collect(),
                });
            }
            (None, _) => {}
        }
    }
    Ok(retained)
}

/// Multiplies values by the cross-system factor and sets the target unit,
/// for every selected row flagged as needing conversion.
pub fn apply_cross_system_conversion(
    table: &mut LabTable,
    cross_system: &CrossSystemTable,
    selected: &BTreeSet<String>,
) -> usize {
    let conversions: BTreeMap<&str, (f64, Option<&str>)> = cross_system
        .selected(selected)
        .filter_map(|row| {
            row.conversion_factor().map(|factor| {
                (
                    row.canonical_name.as_str(),
                    (factor, row.target_unit.as_deref()),
                )
            })
        })
        .collect();

    let mut converted = 0;
    for record in table.iter_mut() {
        let Some((factor, target)) = conversions.get(record.dosage_label.as_str()) else {
            continue;
        };
        if let LabValue::Numeric(value) = &mut record.value {
            *value *= factor;
        }
        if let Some(target) = target {
            record.unit_of_measure = (*target).to_string();
        }
        converted += 1;
    }
    converted
}

/// Scales values recorded in a source unit and relabels them.
pub fn scale_units(table: &mut LabTable, scalings: &[UnitScaling]) -> usize {
    let mut scaled = 0;
    for record in table.iter_mut() {
        let Some(scaling) = scalings
            .iter()
            .find(|scaling| scaling.from == record.unit_of_measure)
        else {
            continue;
        };
        if let LabValue::Numeric(value) = &mut record.value {
            *value *= scaling.factor;
        }
        record.unit_of_measure = scaling.to.clone();
        scaled += 1;
    }
    scaled
}

/// Renames unit spellings; the first applicable fold wins.
pub fn fold_units(table: &mut LabTable, folds: &[UnitFold]) -> usize {
    let mut folded = 0;
    for record in table.iter_mut() {
        if let Some(fold) = folds
            .iter()
            .find(|fold| fold.applies_to(&record.dosage_label, &record.unit_of_measure))
        {
            record.unit_of_measure = fold.to.clone();
            folded += 1;
        }
    }
    folded
}

/// Checks that each selected label's observed unit equals its configured
/// target unit. Labels without a target or without rows are skipped.
pub fn verify_target_units(
    table: &LabTable,
    cross_system: &CrossSystemTable,
    selected: &BTreeSet<String>,
) -> Result<()> {
    let observed = table.units_by_label();
    for row in cross_system.selected(selected) {
        let Some(expected) = row.target_unit.as_deref() else {
            continue;
        };
        let Some(units) = observed.get(&row.canonical_name) else {
            continue;
        };
        if units.iter().any(|unit| unit != expected) {
            return Err(HarmonizeError::UnitMismatch {
                label: row.canonical_name.clone(),
                expected: expected.to_string(),
                observed: units.iter().cloned().collect(),
            });
        }
    }
    Ok(())
}
