//! Laboratory harmonization: the transformation core.
//!
//! - **schema**: wide-to-long reshape
//! - **text**: diacritic stripping
//! - **labels**: synonym resolution, selection, cross-system alignment
//! - **material**: material merge, selection, blood-gas consistency
//! - **units**: unit synonyms, allow-lists, conversions, single-unit check
//! - **censored**: censored-value correction and numeric conversion
//! - **range**: negative-value correction and plausible ranges
//! - **derived**: corrected-calcium synthesis
//! - **statistics**: observation counts and descriptive statistics
//! - **pipeline** / **harmonizer**: ordered steps and the two source pipelines

pub mod censored;
pub mod context;
pub mod derived;
pub mod error;
pub mod frame_builder;
pub mod harmonizer;
pub mod labels;
pub mod material;
pub mod pipeline;
pub mod range;
pub mod schema;
pub mod statistics;
pub mod text;
pub mod units;

pub use censored::{
    AlternateParseCounts, CensoredRuleTable, apply_censored_rules, convert_to_numeric,
    drop_missing_values, drop_non_numeric_tokens, looks_censored, parse_alternate_values,
    strip_apostrophes,
};
pub use context::HarmonizeContext;
pub use derived::synthesize_corrected_calcium;
pub use error::{HarmonizeError, Result};
pub use frame_builder::{
    alternate_columns, alternate_records_from_frame, primary_records_from_frame,
    value_to_string,
};
pub use harmonizer::{AlternateHarmonizer, HarmonizeOutput, LabHarmonizer, PrimaryHarmonizer};
pub use labels::{LabelSelection, align_cross_system_labels, resolve_labels, select_variables};
pub use material::{MaterialSelection, enforce_blood_gas, merge_materials, select_materials};
pub use pipeline::{
    HarmonizeStep, PipelineState, StepPipeline, build_alternate_pipeline, build_primary_pipeline,
};
pub use range::{apply_plausible_ranges, correct_negative_values, residual_negative_count};
pub use schema::{analyte_prefixes, is_long_format, normalize_schema, wide_to_long};
pub use statistics::{describe, descriptive_stats, median_observations, quantile};
pub use text::{normalize_text, strip_diacritics};
pub use units::{
    apply_cross_system_conversion, assert_single_unit, fold_units, merge_unit_synonyms,
    restrict_allowed_units, scale_units, verify_target_units,
};
