//! Configuration options for lab harmonization.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::vocabulary::ANY_BLOOD;

/// How blood-gas variables sourced from non-arterial specimens are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BloodGasPolicy {
    /// Drop non-arterial rows, then check consistency.
    #[default]
    ArterialOnly,
    /// Keep every row and fail if arterial and non-arterial rows coexist.
    CheckOnly,
}

/// Options controlling a harmonization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonizeOptions {
    /// Canonical labels to retain.
    pub selected_variables: BTreeSet<String>,
    /// Material categories to retain.
    pub material_to_include: BTreeSet<String>,
    /// Audit artifacts are persisted here when set.
    pub log_dir: Option<PathBuf>,
    /// Include descriptive statistics in the printed run summary.
    pub verbose: bool,
    pub blood_gas_policy: BloodGasPolicy,
}

impl Default for HarmonizeOptions {
    fn default() -> Self {
        Self {
            selected_variables: BTreeSet::new(),
            material_to_include: BTreeSet::from([ANY_BLOOD.to_string()]),
            log_dir: None,
            verbose: false,
            blood_gas_policy: BloodGasPolicy::default(),
        }
    }
}

impl HarmonizeOptions {
    pub fn new<I, S>(selected_variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_variables: selected_variables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.material_to_include = materials.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_blood_gas_policy(mut self, policy: BloodGasPolicy) -> Self {
        self.blood_gas_policy = policy;
        self
    }
}
