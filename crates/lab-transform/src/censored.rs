//! Censored-value correction and numeric conversion.
//!
//! The primary source is corrected through an exact lookup of
//! `(label, literal)` pairs built from the vocabulary rule list. The alternate
//! source carries free-text qualifiers that are parsed by pattern instead.

use std::collections::{BTreeMap, BTreeSet};

use lab_model::{CENSORED_ADJUSTMENT, CensoredValueRule, LabTable, LabValue};
use tracing::debug;

use crate::error::{HarmonizeError, Result};
use crate::text::strip_diacritics;

const GREATER_THAN_PREFIX: &str = "greater than ";
const HIGHEST_MEASURED_SUFFIX: &str = " is highest measured ";

/// Whether alternate-source text carries one of the censoring patterns.
pub fn looks_censored(text: &str) -> bool {
    if text.contains('>') {
        return true;
    }
    let lower = text.to_lowercase();
    lower.contains(GREATER_THAN_PREFIX) || lower.contains(HIGHEST_MEASURED_SUFFIX.trim_start())
}

/// Lookup table from `(label, literal)` to the adjusted estimate.
///
/// When two rules cover the same pair the first one listed wins.
#[derive(Debug, Clone, Default)]
pub struct CensoredRuleTable {
    estimates: BTreeMap<(String, String), f64>,
}

impl CensoredRuleTable {
    pub fn from_rules(rules: &[CensoredValueRule]) -> Result<Self> {
        let mut estimates = BTreeMap::new();
        for rule in rules {
            let estimate = rule.estimate()?;
            for label in &rule.labels {
                estimates
                    .entry((label.clone(), rule.literal.clone()))
                    .or_insert(estimate);
            }
        }
        Ok(Self { estimates })
    }

    pub fn lookup(&self, label: &str, literal: &str) -> Option<f64> {
        self.estimates
            .get(&(label.to_string(), literal.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}

/// Removes literal apostrophes from text values. Returns values changed.
pub fn strip_apostrophes(table: &mut LabTable) -> usize {
    let mut changed = 0;
    for record in table.iter_mut() {
        if let LabValue::Text(text) = &mut record.value
            && text.contains('\'')
        {
            text.retain(|c| c != '\'');
            changed += 1;
        }
    }
    changed
}

/// Replaces every text value matching a rule with its estimate.
pub fn apply_censored_rules(table: &mut LabTable, rules: &CensoredRuleTable) -> usize {
    let mut corrected = 0;
    for record in table.iter_mut() {
        let estimate = record
            .value
            .as_text()
            .and_then(|text| rules.lookup(&record.dosage_label, text));
        if let Some(estimate) = estimate {
            record.value = LabValue::Numeric(estimate);
            corrected += 1;
        }
    }
    corrected
}

/// Drops rows whose text value is a known non-numeric token. Accented and
/// unaccented spellings both match.
pub fn drop_non_numeric_tokens(table: &mut LabTable, tokens: &[String]) -> usize {
    let tokens: BTreeSet<String> = tokens
        .iter()
        .flat_map(|token| [token.clone(), strip_diacritics(token)])
        .collect();
    table.retain(|record| match record.value.as_text() {
        Some(text) => !tokens.contains(text) && !tokens.contains(&strip_diacritics(text)),
        None => true,
    })
}

pub fn drop_missing_values(table: &mut LabTable) -> usize {
    table.retain(|record| !record.value.is_missing())
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses every remaining text value into a finite number.
///
/// Any value that does not parse is fatal; the error lists each distinct
/// offending value once, sorted.
pub fn convert_to_numeric(table: &mut LabTable) -> Result<usize> {
    let mut unhandled = BTreeSet::new();
    let mut converted = 0;
    for record in table.iter_mut() {
        if let LabValue::Text(text) = &record.value {
            match parse_finite(text) {
                Some(number) => {
                    record.value = LabValue::Numeric(number);
                    converted += 1;
                }
                None => {
                    unhandled.insert(text.clone());
                }
            }
        }
    }
    if !unhandled.is_empty() {
        return Err(HarmonizeError::UnhandledNonNumeric {
            values: unhandled.into_iter().collect(),
        });
    }
    Ok(converted)
}

/// Magnitude encoded by an alternate-source censoring pattern, if any.
fn censored_magnitude(text: &str) -> Option<f64> {
    if let Some((_, rest)) = text.split_once('>') {
        return parse_finite(rest);
    }
    let lower = text.to_lowercase();
    if let Some(idx) = lower.find(GREATER_THAN_PREFIX) {
        return parse_finite(&lower[idx + GREATER_THAN_PREFIX.len()..]);
    }
    if let Some(idx) = lower.find(HIGHEST_MEASURED_SUFFIX.trim_start()) {
        return parse_finite(&lower[..idx]);
    }
    None
}

/// Row counts from parsing alternate-source text values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlternateParseCounts {
    pub censored: usize,
    pub plain_numbers: usize,
    pub non_interpretable: usize,
    pub unparsed: usize,
    pub missing: usize,
}

/// Resolves alternate-source text values.
///
/// Censoring patterns become `magnitude * 1.05` for every variable; plain
/// numbers are kept as-is. Non-interpretable tokens, unparseable text and
/// missing values are dropped and counted.
pub fn parse_alternate_values(
    table: &mut LabTable,
    non_interpretable: &[String],
) -> AlternateParseCounts {
    let tokens: BTreeSet<&str> = non_interpretable.iter().map(String::as_str).collect();
    let mut counts = AlternateParseCounts::default();

    counts.missing = drop_missing_values(table);
    counts.non_interpretable = table.retain(|record| {
        record
            .value
            .as_text()
            .is_none_or(|text| !tokens.contains(text.trim()))
    });

    for record in table.iter_mut() {
        let LabValue::Text(text) = &record.value else {
            continue;
        };
        if let Some(magnitude) = censored_magnitude(text) {
            record.value = LabValue::Numeric(magnitude + CENSORED_ADJUSTMENT * magnitude);
            counts.censored += 1;
        } else if let Some(number) = parse_finite(text) {
            record.value = LabValue::Numeric(number);
            counts.plain_numbers += 1;
        } else {
            record.value = LabValue::Missing;
        }
    }
    counts.unparsed = drop_missing_values(table);

    debug!(
        censored = counts.censored,
        plain = counts.plain_numbers,
        non_interpretable = counts.non_interpretable,
        unparsed = counts.unparsed,
        "parsed alternate text values"
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_model::{Comparator, LabRecord};

    fn text_record(label: &str, value: &str) -> LabRecord {
        LabRecord::new("1_0001", "t", label).with_text_value(value)
    }

    fn numeric(table: &LabTable) -> Vec<f64> {
        table
            .iter()
            .filter_map(|record| record.value.as_numeric())
            .collect()
    }

    #[test]
    fn looks_censored_detects_patterns() {
        assert!(looks_censored(">100"));
        assert!(looks_censored("GREATER THAN 50"));
        assert!(looks_censored("150 IS HIGHEST MEASURED PTT"));
        assert!(!looks_censored("12.5"));
        assert!(!looks_censored("<5"));
    }

    #[test]
    fn first_rule_wins_for_duplicate_pairs() {
        let rules = CensoredRuleTable::from_rules(&[
            CensoredValueRule::new(["glucose"], Comparator::GreaterThan, ">83.2", 83.2),
            CensoredValueRule::new(["glucose"], Comparator::GreaterThan, ">83.2", 100.0),
        ])
        .unwrap();
        assert_eq!(rules.len(), 1);
        assert!((rules.lookup("glucose", ">83.2").unwrap() - 87.36).abs() < 1e-9);
    }

    #[test]
    fn rules_only_match_listed_labels() {
        let rules = CensoredRuleTable::from_rules(&[CensoredValueRule::new(
            ["ALAT"],
            Comparator::LessThan,
            "<5",
            5.0,
        )])
        .unwrap();
        let mut table = LabTable::new(vec![text_record("ALAT", "<5"), text_record("ASAT", "<5")]);
        assert_eq!(apply_censored_rules(&mut table, &rules), 1);
        assert_eq!(numeric(&table), vec![4.75]);
        assert_eq!(table.records[1].value.as_text(), Some("<5"));
    }

    #[test]
    fn apostrophes_are_removed() {
        let mut table = LabTable::new(vec![text_record("glucose", "'>83.2'")]);
        assert_eq!(strip_apostrophes(&mut table), 1);
        assert_eq!(table.records[0].value.as_text(), Some(">83.2"));
    }

    #[test]
    fn tokens_match_with_and_without_accents() {
        let mut table = LabTable::new(vec![
            text_record("sodium", "hémolysé"),
            text_record("sodium", "hemolyse"),
            text_record("sodium", "140"),
        ]);
        let removed = drop_non_numeric_tokens(&mut table, &["hémolysé".to_string()]);
        assert_eq!(removed, 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unhandled_text_is_fatal_and_listed_once() {
        let mut table = LabTable::new(vec![
            text_record("sodium", "140"),
            text_record("sodium", "pending"),
            text_record("urea", "pending"),
            text_record("urea", "NaN"),
        ]);
        match convert_to_numeric(&mut table).unwrap_err() {
            HarmonizeError::UnhandledNonNumeric { values } => {
                assert_eq!(values, vec!["NaN", "pending"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn numeric_conversion_parses_trimmed_text() {
        let mut table = LabTable::new(vec![text_record("sodium", " 140.5 ")]);
        assert_eq!(convert_to_numeric(&mut table).unwrap(), 1);
        assert_eq!(numeric(&table), vec![140.5]);
    }

    #[test]
    fn alternate_patterns_add_five_percent() {
        let mut table = LabTable::new(vec![
            text_record("PTT", ">150"),
            text_record("PTT", "greater than 100"),
            text_record("PTT", "200 IS HIGHEST MEASURED PTT"),
            text_record("PTT", "42"),
            text_record("PTT", "ERROR"),
            text_record("PTT", "see comment"),
            LabRecord::new("1_0001", "t", "PTT"),
        ]);
        let counts = parse_alternate_values(&mut table, &["ERROR".to_string()]);
        assert_eq!(
            counts,
            AlternateParseCounts {
                censored: 3,
                plain_numbers: 1,
                non_interpretable: 1,
                unparsed: 1,
                missing: 1,
            }
        );
        let values = numeric(&table);
        assert_eq!(values.len(), 4);
        assert!((values[0] - 157.5).abs() < 1e-9);
        assert!((values[1] - 105.0).abs() < 1e-9);
        assert!((values[2] - 210.0).abs() < 1e-9);
        assert_eq!(values[3], 42.0);
    }
}
