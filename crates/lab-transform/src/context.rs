//! Immutable inputs shared by every harmonization step.

use lab_model::{HarmonizeOptions, ReferenceTables, Vocabulary};

/// Reference tables, rule vocabulary and options of one run.
#[derive(Debug, Clone, Default)]
pub struct HarmonizeContext {
    pub reference: ReferenceTables,
    pub vocabulary: Vocabulary,
    pub options: HarmonizeOptions,
}

impl HarmonizeContext {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reference_tables(mut self, reference: ReferenceTables) -> Self {
        self.reference = reference;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: HarmonizeOptions) -> Self {
        self.options = options;
        self
    }
}
