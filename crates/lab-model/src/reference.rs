//! Externally supplied reference tables.
//!
//! These are pure data: equivalence groups, per-label allowed units,
//! plausible ranges and the cross-system equivalence table. They are loaded
//! once per invocation and shared read-only by every pipeline step.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Interchangeable labels; the first member is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceGroup {
    members: Vec<String>,
}

impl EquivalenceGroup {
    /// Creates a group from its members, skipping blanks. Returns `None` when
    /// no member remains.
    pub fn new<I, S>(members: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members
            .into_iter()
            .map(Into::into)
            .filter(|member| !member.trim().is_empty())
            .collect();
        if members.is_empty() {
            None
        } else {
            Some(Self { members })
        }
    }

    pub fn canonical(&self) -> &str {
        &self.members[0]
    }

    /// Non-canonical members.
    pub fn synonyms(&self) -> &[String] {
        &self.members[1..]
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, label: &str) -> bool {
        self.members.iter().any(|member| member == label)
    }
}

/// Collection of equivalence groups with a synonym lookup.
///
/// Groups are assumed disjoint. When a label appears in two groups the first
/// group wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceTable {
    groups: Vec<EquivalenceGroup>,
}

impl EquivalenceTable {
    pub fn new(groups: Vec<EquivalenceGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[EquivalenceGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Maps every non-canonical member to its canonical label.
    pub fn synonym_map(&self) -> BTreeMap<&str, &str> {
        let mut map = BTreeMap::new();
        for group in &self.groups {
            for synonym in group.synonyms() {
                map.entry(synonym.as_str()).or_insert(group.canonical());
            }
        }
        map
    }
}

/// Units accepted per canonical variable label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedUnits {
    units: BTreeMap<String, BTreeSet<String>>,
}

impl AllowedUnits {
    pub fn new(units: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { units }
    }

    pub fn insert(&mut self, label: impl Into<String>, unit: impl Into<String>) {
        self.units.entry(label.into()).or_default().insert(unit.into());
    }

    /// Allowed units for a label, or `None` when the label is unrestricted.
    pub fn for_label(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.units.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Inclusive plausible interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub fn new(label: &str, min: f64, max: f64) -> Result<Self> {
        if min > max {
            return Err(ModelError::InvertedRange {
                label: label.to_string(),
                min,
                max,
            });
        }
        Ok(Self { min, max })
    }

    /// Bounds are valid values.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Plausible ranges keyed by canonical variable label, in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlausibleRanges {
    entries: Vec<(String, PlausibleRange)>,
}

impl PlausibleRanges {
    /// Adds a range. A repeated label keeps its first range.
    pub fn insert(&mut self, label: impl Into<String>, range: PlausibleRange) {
        let label = label.into();
        if self.get(&label).is_none() {
            self.entries.push((label, range));
        }
    }

    pub fn get(&self, label: &str) -> Option<&PlausibleRange> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, range)| range)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlausibleRange)> {
        self.entries
            .iter()
            .map(|(label, range)| (label.as_str(), range))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One row of the cross-system label/unit equivalence table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSystemEquivalence {
    /// Canonical label used by the primary source.
    pub canonical_name: String,
    /// Main label of the same variable in the alternate source.
    pub equivalent_name: Option<String>,
    /// Further alternate-source spellings.
    pub other_equivalents: Vec<String>,
    /// Unit expected for the canonical variable after reconciliation.
    pub target_unit: Option<String>,
    pub unit_conversion_needed: bool,
    pub multiplicative_factor: Option<f64>,
}

impl CrossSystemEquivalence {
    /// Alternate-source labels that map onto the canonical name.
    pub fn source_labels(&self) -> Vec<&str> {
        self.equivalent_name
            .iter()
            .chain(self.other_equivalents.iter())
            .map(String::as_str)
            .filter(|label| !label.trim().is_empty())
            .collect()
    }

    /// Conversion factor to apply, when the row requests one.
    pub fn conversion_factor(&self) -> Option<f64> {
        if self.unit_conversion_needed {
            self.multiplicative_factor
        } else {
            None
        }
    }
}

/// The cross-system equivalence table of the alternate source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSystemTable {
    pub rows: Vec<CrossSystemEquivalence>,
}

impl CrossSystemTable {
    pub fn new(rows: Vec<CrossSystemEquivalence>) -> Self {
        Self { rows }
    }

    /// Rows whose canonical name is selected.
    pub fn selected<'a>(
        &'a self,
        selected_variables: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a CrossSystemEquivalence> + 'a {
        self.rows
            .iter()
            .filter(move |row| selected_variables.contains(&row.canonical_name))
    }
}

/// Every externally supplied table the pipelines consume.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub equivalent_labels: EquivalenceTable,
    pub allowed_units: AllowedUnits,
    pub plausible_ranges: PlausibleRanges,
    /// Only needed by the alternate-source pipeline.
    pub cross_system: Option<CrossSystemTable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_first_member_is_canonical() {
        let group = EquivalenceGroup::new(["créatinine", "creatinine", "CREA"]).unwrap();
        assert_eq!(group.canonical(), "créatinine");
        assert_eq!(group.synonyms(), ["creatinine", "CREA"]);
    }

    #[test]
    fn group_skips_blank_members() {
        assert!(EquivalenceGroup::new(["", " "]).is_none());
        let group = EquivalenceGroup::new(["a", "", "b"]).unwrap();
        assert_eq!(group.members(), ["a", "b"]);
    }

    #[test]
    fn synonym_map_first_group_wins() {
        let table = EquivalenceTable::new(vec![
            EquivalenceGroup::new(["A", "x"]).unwrap(),
            EquivalenceGroup::new(["B", "x"]).unwrap(),
        ]);
        assert_eq!(table.synonym_map().get("x"), Some(&"A"));
    }

    #[test]
    fn range_is_inclusive() {
        let range = PlausibleRange::new("sodium", 100.0, 180.0).unwrap();
        assert!(range.contains(100.0));
        assert!(range.contains(180.0));
        assert!(!range.contains(180.01));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(PlausibleRange::new("sodium", 5.0, 1.0).is_err());
    }

    #[test]
    fn cross_system_factor_requires_flag() {
        let row = CrossSystemEquivalence {
            canonical_name: "glucose".to_string(),
            equivalent_name: Some("Glucose".to_string()),
            other_equivalents: vec![],
            target_unit: Some("mmol/l".to_string()),
            unit_conversion_needed: false,
            multiplicative_factor: Some(0.0555),
        };
        assert_eq!(row.conversion_factor(), None);
        assert_eq!(row.source_labels(), vec!["Glucose"]);
    }
}
