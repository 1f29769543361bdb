//! The rule vocabulary: embedded default plus file override.

use std::path::Path;

use lab_model::Vocabulary;
use tracing::debug;

use crate::error::{Result, StandardsError};

const DEFAULT_VOCABULARY: &str = include_str!("../data/vocabulary.toml");
const DEFAULT_VOCABULARY_NAME: &str = "<embedded vocabulary.toml>";

/// TOML text of the shipped vocabulary, a starting point for overrides.
pub fn default_vocabulary_source() -> &'static str {
    DEFAULT_VOCABULARY
}

/// The vocabulary shipped with the crate.
pub fn default_vocabulary() -> Result<Vocabulary> {
    parse_vocabulary(DEFAULT_VOCABULARY, Path::new(DEFAULT_VOCABULARY_NAME))
}

/// Loads a vocabulary from a TOML file with the same shape as the default.
pub fn load_vocabulary(path: &Path) -> Result<Vocabulary> {
    let content = std::fs::read_to_string(path).map_err(|source| StandardsError::io(path, source))?;
    parse_vocabulary(&content, path)
}

fn parse_vocabulary(content: &str, path: &Path) -> Result<Vocabulary> {
    let vocabulary: Vocabulary = toml::from_str(content).map_err(|source| StandardsError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    for rule in &vocabulary.censored_rules {
        rule.threshold().map_err(|source| StandardsError::Model {
            path: path.to_path_buf(),
            source,
        })?;
    }
    debug!(
        path = %path.display(),
        censored_rules = vocabulary.censored_rules.len(),
        material_categories = vocabulary.materials.categories.len(),
        "loaded vocabulary"
    );
    Ok(vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_vocabulary_parses() {
        let vocabulary = default_vocabulary().expect("default vocabulary");
        assert_eq!(vocabulary.identification_columns_to_drop.len(), 23);
        assert_eq!(vocabulary.censored_rules.len(), 23);
        assert_eq!(vocabulary.non_numeric_tokens.len(), 15);
        assert_eq!(vocabulary.materials.default_included, vec!["any_blood"]);
        assert_eq!(vocabulary.blood_gas.labels, vec!["pO2", "pCO2", "pH"]);
        assert_eq!(vocabulary.alternate.unit_folds.len(), 7);
    }

    #[test]
    fn rule_without_threshold_is_rejected_when_literal_is_bad() {
        let content = r#"
[[censored_rules]]
labels = ["glucose"]
comparator = ">"
literal = "high"
"#;
        let error = parse_vocabulary(content, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(error, StandardsError::Model { .. }));
    }
}
