//! Diacritic stripping.
//!
//! Text is decomposed (NFKD) and every non-ASCII remnant dropped, so
//! `hémoglobine` and `hemoglobine` collapse to one spelling.

use lab_model::{LabTable, LabValue};
use unicode_normalization::UnicodeNormalization;

/// ASCII-only form of `text`.
pub fn strip_diacritics(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    text.nfkd().filter(char::is_ascii).collect()
}

fn strip_in_place(text: &mut String) {
    if !text.is_ascii() {
        *text = strip_diacritics(text);
    }
}

fn strip_optional(text: &mut Option<String>) {
    if let Some(text) = text.as_mut() {
        strip_in_place(text);
    }
}

/// Strips diacritics from every text field of every record.
///
/// Returns the number of records that changed.
pub fn normalize_text(table: &mut LabTable) -> usize {
    let mut changed = 0;
    for record in table.iter_mut() {
        let before = record.clone();
        strip_in_place(&mut record.case_admission_id);
        strip_in_place(&mut record.sample_date);
        strip_optional(&mut record.analyse_label);
        strip_in_place(&mut record.dosage_label);
        strip_in_place(&mut record.material_label);
        strip_optional(&mut record.specimen_label);
        strip_in_place(&mut record.unit_of_measure);
        if let LabValue::Text(text) = &mut record.value {
            strip_in_place(text);
        }
        strip_optional(&mut record.lower_limit);
        strip_optional(&mut record.upper_limit);
        if *record != before {
            changed += 1;
        }
    }
    changed
}
