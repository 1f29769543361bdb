//! Per-variable observation counts and descriptive statistics.

use std::collections::BTreeMap;

use lab_model::{DescriptiveStats, LabTable};

/// Median of `values`, or `None` when empty.
fn median(values: &mut [f64]) -> Option<f64> {
    values.sort_by(f64::total_cmp);
    quantile(values, 0.5)
}

/// Linear-interpolation quantile of `sorted`, `q` in `[0, 1]`.
///
/// `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Median number of rows per case admission, per label.
pub fn median_observations(table: &LabTable) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    for record in table.iter() {
        *counts
            .entry(record.dosage_label.as_str())
            .or_default()
            .entry(record.case_admission_id.as_str())
            .or_default() += 1;
    }
    counts
        .into_iter()
        .filter_map(|(label, per_case)| {
            let mut values: Vec<f64> = per_case.values().map(|count| *count as f64).collect();
            median(&mut values).map(|median| (label.to_string(), median))
        })
        .collect()
}

pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let variance =
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    });
    Some(DescriptiveStats {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25)?,
        median: quantile(&sorted, 0.5)?,
        q75: quantile(&sorted, 0.75)?,
        max: sorted[count - 1],
    })
}

/// Descriptive statistics of the numeric values of each label.
pub fn descriptive_stats(table: &LabTable) -> BTreeMap<String, DescriptiveStats> {
    let mut values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in table.iter() {
        if let Some(value) = record.value.as_numeric() {
            values
                .entry(record.dosage_label.as_str())
                .or_default()
                .push(value);
        }
    }
    values
        .into_iter()
        .filter_map(|(label, values)| describe(&values).map(|stats| (label.to_string(), stats)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_model::{LabRecord, LabValue};

    fn record(case: &str, label: &str, value: f64) -> LabRecord {
        LabRecord::new(case, "t", label).with_value(LabValue::Numeric(value))
    }

    #[test]
    fn median_of_two_and_one_is_one_and_a_half() {
        let table = LabTable::new(vec![
            record("1_1234", "albumine", 30.0),
            record("1_1234", "albumine", 32.0),
            record("2_9999", "albumine", 35.0),
        ]);
        let medians = median_observations(&table);
        assert_eq!(medians.get("albumine"), Some(&1.5));
    }

    #[test]
    fn quartiles_interpolate() {
        let stats = describe(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.q25, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q75, 3.25);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        let std = stats.std.unwrap();
        assert!((std - 1.290_994_448_735_805_6).abs() < 1e-12);
    }

    #[test]
    fn quantile_of_empty_slice_is_none() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[3.0], 0.75), Some(3.0));
        assert_eq!(quantile(&[1.0, 3.0], 0.5), Some(2.0));
    }

    #[test]
    fn empty_table_has_no_statistics() {
        let table = LabTable::default();
        assert!(median_observations(&table).is_empty());
        assert!(descriptive_stats(&table).is_empty());
    }

    #[test]
    fn single_observation_has_no_std() {
        let stats = describe(&[7.0]).unwrap();
        assert_eq!(stats.std, None);
        assert_eq!(stats.q25, 7.0);
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn stats_grouped_by_label() {
        let table = LabTable::new(vec![
            record("1_0001", "sodium", 140.0),
            record("1_0001", "potassium", 4.0),
            record("1_0002", "sodium", 136.0),
        ]);
        let stats = descriptive_stats(&table);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["sodium"].mean, 138.0);
    }
}
