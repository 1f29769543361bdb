//! The two source pipelines behind one harmonization contract.
//!
//! Each harmonizer adapts its input frame into a [`LabTable`] and runs its
//! own step order; both return the clean table with its audit summary.

use lab_ingest::prepare_lab_frame;
use lab_model::{AuditSummary, LabTable};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use crate::context::HarmonizeContext;
use crate::error::Result;
use crate::frame_builder::{alternate_records_from_frame, primary_records_from_frame};
use crate::pipeline::{StepPipeline, build_alternate_pipeline, build_primary_pipeline};
use crate::schema::normalize_schema;

/// Clean long-format table and its audit summary.
#[derive(Debug, Clone, Default)]
pub struct HarmonizeOutput {
    pub table: LabTable,
    pub audit: AuditSummary,
}

pub trait LabHarmonizer {
    fn name(&self) -> &str;

    /// Converts a raw input frame into records.
    fn adapt(&self, df: DataFrame, ctx: &HarmonizeContext) -> Result<LabTable>;

    fn pipeline(&self) -> &StepPipeline;

    /// Runs the pipeline over already-adapted records.
    fn harmonize_table(&self, table: LabTable, ctx: &HarmonizeContext) -> Result<HarmonizeOutput> {
        let span = info_span!("harmonize", pipeline = self.name(), rows = table.len());
        let _guard = span.enter();

        let state = self.pipeline().execute(ctx, table)?;
        let mut audit = state.audit;
        audit.pipeline = self.name().to_string();
        audit.output_rows = state.table.len();
        info!(
            input_rows = audit.input_rows,
            output_rows = audit.output_rows,
            labels = audit.included_labels.len(),
            excluded = audit.exclusions.total(),
            "harmonization complete"
        );
        Ok(HarmonizeOutput {
            table: state.table,
            audit,
        })
    }

    fn harmonize(&self, df: DataFrame, ctx: &HarmonizeContext) -> Result<HarmonizeOutput> {
        let table = info_span!("adapt", pipeline = self.name()).in_scope(|| self.adapt(df, ctx))?;
        self.harmonize_table(table, ctx)
    }
}

/// Primary-source harmonizer: semicolon exports, wide or long.
pub struct PrimaryHarmonizer {
    pipeline: StepPipeline,
}

impl Default for PrimaryHarmonizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimaryHarmonizer {
    pub fn new() -> Self {
        Self {
            pipeline: build_primary_pipeline(),
        }
    }

    pub fn with_pipeline(pipeline: StepPipeline) -> Self {
        Self { pipeline }
    }
}

impl LabHarmonizer for PrimaryHarmonizer {
    fn name(&self) -> &str {
        "primary"
    }

    fn adapt(&self, df: DataFrame, ctx: &HarmonizeContext) -> Result<LabTable> {
        let df = prepare_lab_frame(df, &ctx.vocabulary.identification_columns_to_drop)?;
        let df = normalize_schema(df)?;
        primary_records_from_frame(&df)
    }

    fn pipeline(&self) -> &StepPipeline {
        &self.pipeline
    }
}

/// Alternate-source harmonizer: long tables keyed by admission.
pub struct AlternateHarmonizer {
    pipeline: StepPipeline,
}

impl Default for AlternateHarmonizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AlternateHarmonizer {
    pub fn new() -> Self {
        Self {
            pipeline: build_alternate_pipeline(),
        }
    }

    pub fn with_pipeline(pipeline: StepPipeline) -> Self {
        Self { pipeline }
    }
}

impl LabHarmonizer for AlternateHarmonizer {
    fn name(&self) -> &str {
        "alternate"
    }

    fn adapt(&self, df: DataFrame, _ctx: &HarmonizeContext) -> Result<LabTable> {
        alternate_records_from_frame(&df)
    }

    fn pipeline(&self) -> &StepPipeline {
        &self.pipeline
    }
}
