//! Data model for laboratory harmonization.
//!
//! - **record**: long-format [`LabRecord`] and [`LabTable`]
//! - **reference**: externally supplied equivalence, unit and range tables
//! - **censored**: censored-value rule table entries
//! - **vocabulary**: fixed material/unit/token vocabularies
//! - **options**: run configuration
//! - **audit**: audit summary and descriptive statistics

pub mod audit;
pub mod censored;
pub mod error;
pub mod ids;
pub mod options;
pub mod record;
pub mod reference;
pub mod vocabulary;

pub use audit::{AuditSummary, DescriptiveStats, ExclusionCounts};
pub use censored::{CENSORED_ADJUSTMENT, CensoredValueRule, Comparator};
pub use error::{ModelError, Result};
pub use ids::case_admission_id;
pub use options::{BloodGasPolicy, HarmonizeOptions};
pub use record::{LabRecord, LabTable, LabValue, columns};
pub use reference::{
    AllowedUnits, CrossSystemEquivalence, CrossSystemTable, EquivalenceGroup, EquivalenceTable,
    PlausibleRange, PlausibleRanges, ReferenceTables,
};
pub use vocabulary::{
    ANY_BLOOD, AlternateVocabulary, BloodGasRule, CorrectedCalcium, MaterialCategory,
    MaterialVocabulary, NegativeValueRule, UnitFold, UnitScaling, Vocabulary,
};
