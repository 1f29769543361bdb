//! Shared CSV writing helpers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Writes `header` and `rows` to `path`, creating the parent directory.
pub fn write_csv(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    writer
        .write_record(header)
        .with_context(|| format!("write header to {}", path.display()))?;
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Cell text of an optional number.
pub fn optional_number(value: Option<f64>) -> String {
    value.map(lab_ingest::format_numeric).unwrap_or_default()
}
