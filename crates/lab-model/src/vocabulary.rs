//! Fixed rule vocabularies.
//!
//! Material synonyms, unit synonyms, censored-value rules, exclusion tokens
//! and the alternate-source folds. The values ship as a TOML document in
//! `lab-standards`; this module only defines their shape.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::censored::CensoredValueRule;
use crate::reference::EquivalenceGroup;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Registry columns removed once the case identifier is built.
    #[serde(default)]
    pub identification_columns_to_drop: Vec<String>,
    #[serde(default)]
    pub materials: MaterialVocabulary,
    #[serde(default)]
    pub blood_gas: BloodGasRule,
    /// Each inner list is an equivalence group; the first entry is kept.
    #[serde(default)]
    pub unit_synonyms: Vec<Vec<String>>,
    #[serde(default)]
    pub censored_rules: Vec<CensoredValueRule>,
    /// Known non-numeric tokens dropped after censored-value correction.
    #[serde(default)]
    pub non_numeric_tokens: Vec<String>,
    #[serde(default)]
    pub negative_values: NegativeValueRule,
    #[serde(default)]
    pub alternate: AlternateVocabulary,
}

impl Vocabulary {
    /// Unit synonym lists as equivalence groups.
    pub fn unit_groups(&self) -> Vec<EquivalenceGroup> {
        self.unit_synonyms
            .iter()
            .filter_map(|group| EquivalenceGroup::new(group.iter().cloned()))
            .collect()
    }
}

/// A coarse specimen-material category and its synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCategory {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialVocabulary {
    #[serde(default)]
    pub categories: Vec<MaterialCategory>,
    /// Categories retained when the caller does not choose.
    #[serde(default = "default_included_materials")]
    pub default_included: Vec<String>,
}

impl Default for MaterialVocabulary {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            default_included: default_included_materials(),
        }
    }
}

fn default_included_materials() -> Vec<String> {
    vec![ANY_BLOOD.to_string()]
}

/// Category every blood-draw descriptor merges into.
pub const ANY_BLOOD: &str = "any_blood";

/// Blood-gas variables must come from arterial specimens only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodGasRule {
    /// Label fragments identifying blood-gas variables (`pO2` matches
    /// `pO2 corrige`).
    #[serde(default)]
    pub labels: Vec<String>,
    /// Specimen descriptors counted as arterial.
    #[serde(default)]
    pub arterial_specimens: BTreeSet<String>,
}

impl BloodGasRule {
    /// The blood-gas fragment a label belongs to, if any.
    pub fn family_of(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|fragment| label.contains(fragment.as_str()))
            .map(String::as_str)
    }

    pub fn is_arterial(&self, specimen: &str) -> bool {
        self.arterial_specimens.contains(specimen)
    }
}

/// Data-entry corrections for negative values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeValueRule {
    /// Labels whose negative values are invalidated.
    #[serde(default)]
    pub nulled_labels: BTreeSet<String>,
    /// Label fragment of the variable family allowed to stay negative.
    #[serde(default)]
    pub exempt_fragment: String,
}

/// Rewrites a unit and scales the value (`mg/dL` to `mg/l`, x10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitScaling {
    pub from: String,
    pub to: String,
    pub factor: f64,
}

/// Renames a unit spelling, optionally only for some labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFold {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

impl UnitFold {
    pub fn applies_to(&self, label: &str, unit: &str) -> bool {
        unit == self.from && (self.labels.is_empty() || self.labels.contains(label))
    }
}

/// Corrected calcium synthesized from simultaneous calcium and albumin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedCalcium {
    pub label: String,
    pub unit: String,
    pub calcium_labels: BTreeSet<String>,
    pub albumin_labels: BTreeSet<String>,
    /// Calcium mg/dl to mmol/l.
    pub calcium_factor: f64,
    /// Albumin g/dl to g/l.
    pub albumin_factor: f64,
    /// Reference albumin concentration in g/l.
    pub reference_albumin: f64,
    /// mmol/l of calcium per g/l of albumin deficit.
    pub albumin_coefficient: f64,
}

impl Default for CorrectedCalcium {
    fn default() -> Self {
        Self {
            label: "calcium corrige".to_string(),
            unit: "mmol/l".to_string(),
            calcium_labels: BTreeSet::from(["Calcium, Total".to_string()]),
            albumin_labels: BTreeSet::from(["Albumin".to_string()]),
            calcium_factor: 0.2495,
            albumin_factor: 10.0,
            reference_albumin: 40.0,
            albumin_coefficient: 0.02,
        }
    }
}

impl CorrectedCalcium {
    /// `ca * f_ca + coef * (ref - alb * f_alb)`.
    pub fn compute(&self, calcium: f64, albumin: f64) -> f64 {
        calcium * self.calcium_factor
            + self.albumin_coefficient * (self.reference_albumin - albumin * self.albumin_factor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternateVocabulary {
    #[serde(default)]
    pub non_interpretable_tokens: Vec<String>,
    #[serde(default)]
    pub unit_scalings: Vec<UnitScaling>,
    #[serde(default)]
    pub unit_folds: Vec<UnitFold>,
    #[serde(default)]
    pub corrected_calcium: CorrectedCalcium,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_gas_matches_fragments() {
        let rule = BloodGasRule {
            labels: vec!["pO2".to_string(), "pH".to_string()],
            arterial_specimens: BTreeSet::from(["sga".to_string()]),
        };
        assert_eq!(rule.family_of("pO2 corrige"), Some("pO2"));
        assert_eq!(rule.family_of("phosphate"), None);
        assert!(rule.is_arterial("sga"));
        assert!(!rule.is_arterial("sgv"));
    }

    #[test]
    fn unit_fold_respects_labels() {
        let fold = UnitFold {
            from: "mEq/L".to_string(),
            to: "mmol/l".to_string(),
            labels: BTreeSet::from(["sodium".to_string()]),
        };
        assert!(fold.applies_to("sodium", "mEq/L"));
        assert!(!fold.applies_to("bicarbonate", "mEq/L"));
    }

    #[test]
    fn corrected_calcium_formula() {
        let derived = CorrectedCalcium::default();
        // 9 mg/dl calcium, 3 g/dl albumin
        let value = derived.compute(9.0, 3.0);
        assert!((value - (9.0 * 0.2495 + 0.02 * (40.0 - 30.0))).abs() < 1e-12);
    }
}
