//! Harmonization pipelines with ordered step execution.
//!
//! Each step implements [`HarmonizeStep`] and runs in order over the shared
//! [`PipelineState`]. Fatal contradictions abort the run; every other
//! anomaly is dropped and counted in the audit summary.
//!
//! # Primary pipeline order
//!
//! 1. **label_resolution** - synonym labels to canonical labels
//! 2. **text_normalization** - diacritic stripping
//! 3. **variable_selection** - keep selected labels
//! 4. **material_merge** / **material_selection** / **blood_gas_consistency**
//! 5. **unit_synonyms** / **allowed_units** / **single_unit_check**
//! 6. **censored_values** / **non_numeric_tokens** / **missing_values** / **numeric_conversion**
//! 7. **negative_values** / **plausible_range**
//! 8. **statistics**
//!
//! # Alternate pipeline order
//!
//! Cross-system alignment and corrected-calcium synthesis run before
//! selection; text values are parsed before units are converted, folded and
//! checked against the target units.

use std::collections::BTreeSet;

use lab_model::{AuditSummary, CrossSystemTable, LabTable};
use tracing::{debug, info, info_span};

use crate::censored::{
    CensoredRuleTable, apply_censored_rules, convert_to_numeric, drop_missing_values,
    drop_non_numeric_tokens, parse_alternate_values, strip_apostrophes,
};
use crate::context::HarmonizeContext;
use crate::derived::synthesize_corrected_calcium;
use crate::error::{HarmonizeError, Result};
use crate::labels::{align_cross_system_labels, resolve_labels, select_variables};
use crate::material::{enforce_blood_gas, merge_materials, select_materials};
use crate::range::{apply_plausible_ranges, correct_negative_values, residual_negative_count};
use crate::statistics::{descriptive_stats, median_observations};
use crate::text::normalize_text;
use crate::units::{
    apply_cross_system_conversion, assert_single_unit, fold_units, merge_unit_synonyms,
    restrict_allowed_units, scale_units, verify_target_units,
};

/// A single step of a harmonization pipeline.
pub trait HarmonizeStep: Send + Sync {
    /// Transforms `state.table` in place and records audit counts.
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()>;

    fn step_name(&self) -> &str;

    /// Default implementation always runs the step.
    fn should_skip(&self, _ctx: &HarmonizeContext) -> bool {
        false
    }
}

/// Table and audit summary threaded through the steps.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub table: LabTable,
    pub audit: AuditSummary,
    /// Step execution log for debugging.
    pub executed_steps: Vec<String>,
}

impl PipelineState {
    pub fn new(table: LabTable) -> Self {
        let audit = AuditSummary {
            input_rows: table.len(),
            ..AuditSummary::default()
        };
        Self {
            table,
            audit,
            executed_steps: Vec::new(),
        }
    }
}

/// An ordered pipeline of harmonization steps.
pub struct StepPipeline {
    steps: Vec<Box<dyn HarmonizeStep>>,
}

impl Default for StepPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl StepPipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    #[must_use]
    pub fn add_step(mut self, step: Box<dyn HarmonizeStep>) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn insert_step(mut self, index: usize, step: Box<dyn HarmonizeStep>) -> Self {
        self.steps.insert(index, step);
        self
    }

    #[must_use]
    pub fn remove_step(mut self, step_name: &str) -> Self {
        self.steps.retain(|s| s.step_name() != step_name);
        self
    }

    /// Runs every step over `table` and returns the final state.
    pub fn execute(&self, ctx: &HarmonizeContext, table: LabTable) -> Result<PipelineState> {
        let mut state = PipelineState::new(table);
        self.execute_with_state(ctx, &mut state)?;
        Ok(state)
    }

    pub fn execute_with_state(
        &self,
        ctx: &HarmonizeContext,
        state: &mut PipelineState,
    ) -> Result<()> {
        for step in &self.steps {
            if step.should_skip(ctx) {
                debug!(step = step.step_name(), "skipping step");
                continue;
            }
            let before = state.table.len();
            info_span!("step", name = step.step_name())
                .in_scope(|| step.execute(ctx, state))?;
            debug!(
                step = step.step_name(),
                rows_before = before,
                rows_after = state.table.len(),
                "step complete"
            );
            state.executed_steps.push(step.step_name().to_string());
        }
        Ok(())
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }
}

// ============================================================================
// Label steps
// ============================================================================

pub struct LabelResolutionStep;

impl HarmonizeStep for LabelResolutionStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let rewritten = resolve_labels(&mut state.table, &ctx.reference.equivalent_labels);
        debug!(rewritten, "resolved label synonyms");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "label_resolution"
    }
}

pub struct TextNormalizationStep;

impl HarmonizeStep for TextNormalizationStep {
    fn execute(&self, _ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let changed = normalize_text(&mut state.table);
        debug!(changed, "stripped diacritics");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "text_normalization"
    }
}

pub struct VariableSelectionStep;

impl HarmonizeStep for VariableSelectionStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let selection = select_variables(&mut state.table, &ctx.options.selected_variables);
        info!(
            included = selection.included.len(),
            dropped = selection.dropped.len(),
            removed_rows = selection.removed_rows,
            "restricted to selected variables"
        );
        state.audit.included_labels = selection.included;
        state.audit.dropped_labels = selection.dropped;
        state.audit.exclusions.unselected_label += selection.removed_rows;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "variable_selection"
    }
}

pub struct CrossSystemAlignmentStep;

impl HarmonizeStep for CrossSystemAlignmentStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let (cross_system, selected) = selected_cross_system(ctx)?;
        let aligned = align_cross_system_labels(
            &mut state.table,
            cross_system,
            selected,
            &ctx.vocabulary.alternate.corrected_calcium,
        )?;
        debug!(aligned, "aligned cross-system labels");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "cross_system_alignment"
    }
}

pub struct CorrectedCalciumStep;

impl HarmonizeStep for CorrectedCalciumStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let derived = synthesize_corrected_calcium(
            &mut state.table,
            &ctx.vocabulary.alternate.corrected_calcium,
        );
        info!(derived, "synthesized corrected calcium");
        state.audit.derived_rows += derived;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "corrected_calcium"
    }

    fn should_skip(&self, ctx: &HarmonizeContext) -> bool {
        let label = &ctx.vocabulary.alternate.corrected_calcium.label;
        !ctx.options.selected_variables.contains(label)
    }
}

// ============================================================================
// Material steps
// ============================================================================

pub struct MaterialMergeStep;

impl HarmonizeStep for MaterialMergeStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let merged = merge_materials(&mut state.table, &ctx.vocabulary.materials);
        debug!(merged, "merged material synonyms");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "material_merge"
    }
}

pub struct MaterialSelectionStep;

impl HarmonizeStep for MaterialSelectionStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let selection = select_materials(&mut state.table, &ctx.options.material_to_include);
        info!(
            excluded = ?selection.excluded,
            removed_rows = selection.removed_rows,
            "restricted to included materials"
        );
        state.audit.included_materials = selection.included;
        state.audit.excluded_materials = selection.excluded;
        state.audit.exclusions.excluded_material += selection.removed_rows;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "material_selection"
    }
}

pub struct BloodGasConsistencyStep;

impl HarmonizeStep for BloodGasConsistencyStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let removed = enforce_blood_gas(
            &mut state.table,
            &ctx.vocabulary.blood_gas,
            ctx.options.blood_gas_policy,
        )?;
        if removed > 0 {
            info!(removed, "dropped non-arterial blood gas rows");
        }
        state.audit.exclusions.non_arterial_blood_gas += removed;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "blood_gas_consistency"
    }
}

// ============================================================================
// Unit steps
// ============================================================================

pub struct UnitSynonymStep;

impl HarmonizeStep for UnitSynonymStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let merged = merge_unit_synonyms(&mut state.table, &ctx.vocabulary.unit_groups());
        debug!(merged, "merged unit synonyms");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "unit_synonyms"
    }
}

pub struct AllowedUnitsStep;

impl HarmonizeStep for AllowedUnitsStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let removed = restrict_allowed_units(&mut state.table, &ctx.reference.allowed_units);
        info!(removed, "dropped rows with disallowed units");
        state.audit.exclusions.disallowed_unit += removed;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "allowed_units"
    }
}

pub struct SingleUnitStep;

impl HarmonizeStep for SingleUnitStep {
    fn execute(&self, _ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        state.audit.units = assert_single_unit(&state.table)?;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "single_unit_check"
    }
}

fn selected_cross_system<'a>(
    ctx: &'a HarmonizeContext,
) -> Result<(&'a CrossSystemTable, &'a BTreeSet<String>)> {
    let cross_system = ctx
        .reference
        .cross_system
        .as_ref()
        .ok_or(HarmonizeError::MissingCrossSystemTable)?;
    Ok((cross_system, &ctx.options.selected_variables))
}

pub struct CrossSystemConversionStep;

impl HarmonizeStep for CrossSystemConversionStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let (cross_system, selected) = selected_cross_system(ctx)?;
        let converted = apply_cross_system_conversion(&mut state.table, cross_system, selected);
        debug!(converted, "applied cross-system unit conversions");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "cross_system_conversion"
    }
}

pub struct UnitScalingStep;

impl HarmonizeStep for UnitScalingStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let scaled = scale_units(&mut state.table, &ctx.vocabulary.alternate.unit_scalings);
        debug!(scaled, "scaled units");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "unit_scaling"
    }
}

pub struct UnitFoldStep;

impl HarmonizeStep for UnitFoldStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let folded = fold_units(&mut state.table, &ctx.vocabulary.alternate.unit_folds);
        debug!(folded, "folded unit spellings");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "unit_folds"
    }
}

pub struct TargetUnitStep;

impl HarmonizeStep for TargetUnitStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let (cross_system, selected) = selected_cross_system(ctx)?;
        verify_target_units(&state.table, cross_system, selected)
    }

    fn step_name(&self) -> &str {
        "target_unit_check"
    }
}

// ============================================================================
// Value steps
// ============================================================================

pub struct CensoredValueStep;

impl HarmonizeStep for CensoredValueStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        strip_apostrophes(&mut state.table);
        let rules = CensoredRuleTable::from_rules(&ctx.vocabulary.censored_rules)?;
        let corrected = apply_censored_rules(&mut state.table, &rules);
        info!(corrected, rules = rules.len(), "corrected censored values");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "censored_values"
    }
}

pub struct NonNumericTokenStep;

impl HarmonizeStep for NonNumericTokenStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let removed = drop_non_numeric_tokens(&mut state.table, &ctx.vocabulary.non_numeric_tokens);
        info!(removed, "dropped non-numeric tokens");
        state.audit.exclusions.non_numeric_token += removed;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "non_numeric_tokens"
    }
}

pub struct MissingValueStep;

impl HarmonizeStep for MissingValueStep {
    fn execute(&self, _ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let removed = drop_missing_values(&mut state.table);
        debug!(removed, "dropped rows without value");
        state.audit.exclusions.missing_value += removed;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "missing_values"
    }
}

pub struct NumericConversionStep;

impl HarmonizeStep for NumericConversionStep {
    fn execute(&self, _ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let converted = convert_to_numeric(&mut state.table)?;
        debug!(converted, "converted values to numeric");
        Ok(())
    }

    fn step_name(&self) -> &str {
        "numeric_conversion"
    }
}

pub struct AlternateValueStep;

impl HarmonizeStep for AlternateValueStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let counts = parse_alternate_values(
            &mut state.table,
            &ctx.vocabulary.alternate.non_interpretable_tokens,
        );
        info!(
            excluded = counts.non_interpretable + counts.unparsed,
            "excluded non-numerical values"
        );
        let exclusions = &mut state.audit.exclusions;
        exclusions.non_numeric_token += counts.non_interpretable;
        exclusions.unparsed_text += counts.unparsed;
        exclusions.missing_value += counts.missing;
        Ok(())
    }

    fn step_name(&self) -> &str {
        "alternate_values"
    }
}

pub struct NegativeValueStep;

impl HarmonizeStep for NegativeValueStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let rule = &ctx.vocabulary.negative_values;
        let removed = correct_negative_values(&mut state.table, rule);
        state.audit.exclusions.negative_value += removed;
        state.audit.negative_value_warnings = residual_negative_count(&state.table, rule);
        Ok(())
    }

    fn step_name(&self) -> &str {
        "negative_values"
    }
}

pub struct PlausibleRangeStep;

impl HarmonizeStep for PlausibleRangeStep {
    fn execute(&self, ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        let ranges = &ctx.reference.plausible_ranges;
        let invalidated = apply_plausible_ranges(&mut state.table, ranges);
        info!(invalidated, "excluded observations out of range");
        state.audit.out_of_range = invalidated;
        state.audit.exclusions.out_of_range += invalidated;
        state.audit.plausible_ranges = ranges
            .iter()
            .map(|(label, range)| (label.to_string(), *range))
            .collect();
        Ok(())
    }

    fn step_name(&self) -> &str {
        "plausible_range"
    }
}

pub struct StatisticsStep;

impl HarmonizeStep for StatisticsStep {
    fn execute(&self, _ctx: &HarmonizeContext, state: &mut PipelineState) -> Result<()> {
        state.audit.median_observations = median_observations(&state.table);
        state.audit.descriptive_stats = descriptive_stats(&state.table);
        state.audit.output_rows = state.table.len();
        Ok(())
    }

    fn step_name(&self) -> &str {
        "statistics"
    }
}

/// Steps of the primary-source pipeline.
pub fn build_primary_pipeline() -> StepPipeline {
    StepPipeline::new()
        .add_step(Box::new(LabelResolutionStep))
        .add_step(Box::new(TextNormalizationStep))
        .add_step(Box::new(VariableSelectionStep))
        .add_step(Box::new(MaterialMergeStep))
        .add_step(Box::new(MaterialSelectionStep))
        .add_step(Box::new(BloodGasConsistencyStep))
        .add_step(Box::new(UnitSynonymStep))
        .add_step(Box::new(AllowedUnitsStep))
        .add_step(Box::new(SingleUnitStep))
        .add_step(Box::new(CensoredValueStep))
        .add_step(Box::new(NonNumericTokenStep))
        .add_step(Box::new(MissingValueStep))
        .add_step(Box::new(NumericConversionStep))
        .add_step(Box::new(NegativeValueStep))
        .add_step(Box::new(PlausibleRangeStep))
        .add_step(Box::new(StatisticsStep))
}

/// Steps of the alternate-source pipeline.
pub fn build_alternate_pipeline() -> StepPipeline {
    StepPipeline::new()
        .add_step(Box::new(CrossSystemAlignmentStep))
        .add_step(Box::new(CorrectedCalciumStep))
        .add_step(Box::new(VariableSelectionStep))
        .add_step(Box::new(AlternateValueStep))
        .add_step(Box::new(CrossSystemConversionStep))
        .add_step(Box::new(UnitScalingStep))
        .add_step(Box::new(UnitFoldStep))
        .add_step(Box::new(TargetUnitStep))
        .add_step(Box::new(SingleUnitStep))
        .add_step(Box::new(NegativeValueStep))
        .add_step(Box::new(PlausibleRangeStep))
        .add_step(Box::new(StatisticsStep))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_pipeline_order() {
        let pipeline = build_primary_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec![
                "label_resolution",
                "text_normalization",
                "variable_selection",
                "material_merge",
                "material_selection",
                "blood_gas_consistency",
                "unit_synonyms",
                "allowed_units",
                "single_unit_check",
                "censored_values",
                "non_numeric_tokens",
                "missing_values",
                "numeric_conversion",
                "negative_values",
                "plausible_range",
                "statistics",
            ]
        );
    }

    #[test]
    fn alternate_pipeline_selects_after_synthesis() {
        let names = build_alternate_pipeline().step_names().join(",");
        let calcium = names.find("corrected_calcium").unwrap();
        let selection = names.find("variable_selection").unwrap();
        let conversion = names.find("cross_system_conversion").unwrap();
        let values = names.find("alternate_values").unwrap();
        assert!(calcium < selection);
        assert!(values < conversion);
    }

    #[test]
    fn steps_can_be_removed_and_inserted() {
        let pipeline = build_primary_pipeline()
            .remove_step("text_normalization")
            .insert_step(0, Box::new(TextNormalizationStep));
        let names = pipeline.step_names();
        assert_eq!(names[0], "text_normalization");
        assert_eq!(names[1], "label_resolution");
        assert_eq!(names.len(), 16);
    }

    #[test]
    fn skipped_steps_are_not_logged() {
        let ctx = HarmonizeContext::default();
        let pipeline = StepPipeline::new()
            .add_step(Box::new(CorrectedCalciumStep))
            .add_step(Box::new(StatisticsStep));
        let state = pipeline.execute(&ctx, LabTable::default()).unwrap();
        assert_eq!(state.executed_steps, vec!["statistics"]);
    }

    #[test]
    fn alternate_alignment_requires_cross_system_table() {
        let ctx = HarmonizeContext::default();
        let error = build_alternate_pipeline()
            .execute(&ctx, LabTable::default())
            .unwrap_err();
        assert!(matches!(error, HarmonizeError::MissingCrossSystemTable));
    }
}
