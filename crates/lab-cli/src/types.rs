use std::path::PathBuf;

use lab_model::{AuditSummary, HarmonizeOptions};

/// Outcome of one `harmonize` invocation.
#[derive(Debug)]
pub struct RunResult {
    pub data_dir: PathBuf,
    pub audit: AuditSummary,
    /// Clean table, when `--output-dir` was given.
    pub clean_table: Option<PathBuf>,
    /// Audit artifacts, when `--log-dir` was given.
    pub artifacts: Vec<PathBuf>,
    /// Options the run was harmonized with.
    pub options: HarmonizeOptions,
}
