//! Audit artifacts: summary log, median observations, descriptive statistics.

use std::path::{Path, PathBuf};

use anyhow::Result;
use lab_ingest::format_numeric;
use lab_model::AuditSummary;
use tracing::info;

use crate::common::{optional_number, write_csv};

pub const SUMMARY_LOG_FILE: &str = "lab_preprocessing_log.csv";
pub const MEDIAN_OBSERVATIONS_FILE: &str = "median_observations_per_case_admission_id.csv";
pub const DESCRIPTIVE_STATS_FILE: &str = "descriptive_stats.csv";

pub const SUMMARY_LOG_HEADER: [&str; 8] = [
    "included_dosage_labels",
    "dropped_dosage_labels",
    "included_material",
    "excluded_material",
    "n_observations_out_ouf_range",
    "variable_label",
    "Min",
    "Max",
];

const MEDIAN_HEADER: [&str; 2] = ["dosage_label", "median_observations_per_case_admission_id"];

const STATS_HEADER: [&str; 9] = [
    "dosage_label",
    "count",
    "mean",
    "std",
    "min",
    "25%",
    "50%",
    "75%",
    "max",
];

fn cell<T: ToString>(items: &[T], idx: usize) -> String {
    items.get(idx).map(ToString::to_string).unwrap_or_default()
}

/// Summary-log rows: each list is a column, padded with empty cells, and the
/// plausible-range table sits next to them.
pub fn summary_log_rows(audit: &AuditSummary) -> Vec<Vec<String>> {
    let included_materials: Vec<&String> = audit.included_materials.iter().collect();
    let excluded_materials: Vec<&String> = audit.excluded_materials.iter().collect();
    let height = [
        audit.included_labels.len(),
        audit.dropped_labels.len(),
        included_materials.len(),
        excluded_materials.len(),
        audit.plausible_ranges.len(),
        1,
    ]
    .into_iter()
    .max()
    .unwrap_or(1);

    (0..height)
        .map(|idx| {
            let range = audit.plausible_ranges.get(idx);
            vec![
                cell(&audit.included_labels, idx),
                cell(&audit.dropped_labels, idx),
                cell(&included_materials, idx),
                cell(&excluded_materials, idx),
                if idx == 0 {
                    audit.out_of_range.to_string()
                } else {
                    String::new()
                },
                range.map(|(label, _)| label.clone()).unwrap_or_default(),
                optional_number(range.map(|(_, range)| range.min)),
                optional_number(range.map(|(_, range)| range.max)),
            ]
        })
        .collect()
}

pub fn write_summary_log(path: &Path, audit: &AuditSummary) -> Result<()> {
    write_csv(path, &SUMMARY_LOG_HEADER, &summary_log_rows(audit))
}

pub fn write_median_observations(path: &Path, audit: &AuditSummary) -> Result<()> {
    let rows: Vec<Vec<String>> = audit
        .median_observations
        .iter()
        .map(|(label, median)| vec![label.clone(), format_numeric(*median)])
        .collect();
    write_csv(path, &MEDIAN_HEADER, &rows)
}

pub fn write_descriptive_stats(path: &Path, audit: &AuditSummary) -> Result<()> {
    let rows: Vec<Vec<String>> = audit
        .descriptive_stats
        .iter()
        .map(|(label, stats)| {
            vec![
                label.clone(),
                stats.count.to_string(),
                format_numeric(stats.mean),
                optional_number(stats.std),
                format_numeric(stats.min),
                format_numeric(stats.q25),
                format_numeric(stats.median),
                format_numeric(stats.q75),
                format_numeric(stats.max),
            ]
        })
        .collect();
    write_csv(path, &STATS_HEADER, &rows)
}

/// Writes the three audit artifacts into `log_dir` and returns their paths.
pub fn write_audit_artifacts(log_dir: &Path, audit: &AuditSummary) -> Result<Vec<PathBuf>> {
    let summary = log_dir.join(SUMMARY_LOG_FILE);
    let medians = log_dir.join(MEDIAN_OBSERVATIONS_FILE);
    let stats = log_dir.join(DESCRIPTIVE_STATS_FILE);

    write_summary_log(&summary, audit)?;
    write_median_observations(&medians, audit)?;
    write_descriptive_stats(&stats, audit)?;
    info!(dir = %log_dir.display(), "wrote audit artifacts");
    Ok(vec![summary, medians, stats])
}
