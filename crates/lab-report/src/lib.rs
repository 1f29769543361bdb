//! Output for lab harmonization runs.

pub mod audit_log;
pub mod common;
pub mod table;

pub use audit_log::{
    DESCRIPTIVE_STATS_FILE, MEDIAN_OBSERVATIONS_FILE, SUMMARY_LOG_FILE, summary_log_rows,
    write_audit_artifacts, write_descriptive_stats, write_median_observations, write_summary_log,
};
pub use table::{CLEAN_TABLE_FILE, write_clean_table};
