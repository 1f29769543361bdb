//! Negative-value corrections and plausible-range validation.

use lab_model::{LabTable, LabValue, NegativeValueRule, PlausibleRanges};
use tracing::warn;

/// Invalidates negative values of the nulled labels and drops those rows.
pub fn correct_negative_values(table: &mut LabTable, rule: &NegativeValueRule) -> usize {
    table.retain(|record| {
        !(rule.nulled_labels.contains(&record.dosage_label)
            && record.value.as_numeric().is_some_and(|value| value < 0.0))
    })
}

/// Counts negative values outside the exempt label family.
///
/// These are advisory: a warning is emitted per label, nothing is dropped.
pub fn residual_negative_count(table: &LabTable, rule: &NegativeValueRule) -> usize {
    let exempt = |label: &str| {
        !rule.exempt_fragment.is_empty() && label.contains(rule.exempt_fragment.as_str())
    };
    let mut count = 0;
    for label in table.labels() {
        if exempt(&label) {
            continue;
        }
        let negatives = table
            .iter()
            .filter(|record| record.dosage_label == label)
            .filter(|record| record.value.as_numeric().is_some_and(|value| value < 0.0))
            .count();
        if negatives > 0 {
            warn!(label = %label, negatives, "negative values remain");
            count += negatives;
        }
    }
    count
}

/// Nulls values outside each label's inclusive range, then drops every row
/// without a value. Returns how many values the range check invalidated.
pub fn apply_plausible_ranges(table: &mut LabTable, ranges: &PlausibleRanges) -> usize {
    let mut invalidated = 0;
    for record in table.iter_mut() {
        let Some(range) = ranges.get(&record.dosage_label) else {
            continue;
        };
        if let Some(value) = record.value.as_numeric()
            && !range.contains(value)
        {
            record.value = LabValue::Missing;
            invalidated += 1;
        }
    }
    table.retain(|record| !record.value.is_missing());
    invalidated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use lab_model::{LabRecord, PlausibleRange};
    use proptest::prelude::*;

    fn record(label: &str, value: f64) -> LabRecord {
        LabRecord::new("1_0001", "t", label).with_value(LabValue::Numeric(value))
    }

    fn rule() -> NegativeValueRule {
        NegativeValueRule {
            nulled_labels: BTreeSet::from(["hemoglobine".to_string(), "glucose".to_string()]),
            exempt_fragment: "cBase".to_string(),
        }
    }

    fn glucose_range() -> PlausibleRanges {
        let mut ranges = PlausibleRanges::default();
        ranges.insert("glucose", PlausibleRange::new("glucose", 0.5, 50.0).unwrap());
        ranges
    }

    #[test]
    fn negative_hemoglobin_and_glucose_are_dropped() {
        let mut table = LabTable::new(vec![
            record("hemoglobine", -1.0),
            record("glucose", -0.1),
            record("glucose", 5.0),
            record("cBase(Ecf)c", -3.0),
        ]);
        assert_eq!(correct_negative_values(&mut table, &rule()), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn residual_negatives_exclude_base_family() {
        let table = LabTable::new(vec![
            record("cBase(Ecf)c", -3.0),
            record("potassium", -1.0),
            record("potassium", 4.0),
        ]);
        assert_eq!(residual_negative_count(&table, &rule()), 1);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut table = LabTable::new(vec![
            record("glucose", 0.5),
            record("glucose", 50.0),
            record("glucose", 50.1),
            record("sodium", 9999.0),
        ]);
        assert_eq!(apply_plausible_ranges(&mut table, &glucose_range()), 1);
        assert_eq!(table.len(), 3);
    }

    proptest! {
        #[test]
        fn surviving_values_lie_within_range(values in prop::collection::vec(-100.0f64..200.0, 0..40)) {
            let ranges = glucose_range();
            let mut table = LabTable::new(values.iter().map(|v| record("glucose", *v)).collect());
            let invalidated = apply_plausible_ranges(&mut table, &ranges);
            prop_assert_eq!(invalidated + table.len(), values.len());
            for record in table.iter() {
                let value = record.value.as_numeric().unwrap();
                prop_assert!((0.5..=50.0).contains(&value));
            }
        }
    }
}
