use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span, trace};

use lab_ingest::{IngestOptions, read_lab_directory};
use lab_model::{BloodGasPolicy, HarmonizeOptions, LabTable, Vocabulary};
use lab_report::{write_audit_artifacts, write_clean_table};
use lab_standards::{
    ReferenceTablePaths, default_vocabulary, default_vocabulary_source, load_reference_tables,
    load_vocabulary,
};
use lab_transform::{
    AlternateHarmonizer, HarmonizeContext, LabHarmonizer, PrimaryHarmonizer, value_to_string,
};

use crate::cli::{HarmonizeArgs, SourceArg};
use crate::logging::{log_data_enabled, redact_value};
use crate::types::RunResult;

pub fn run_vocabulary() -> Result<()> {
    print!("{}", default_vocabulary_source());
    Ok(())
}

pub fn run_harmonize(args: &HarmonizeArgs) -> Result<RunResult> {
    let span = info_span!("run", data_dir = %args.data_dir.display());
    let _guard = span.enter();

    let vocabulary = load_run_vocabulary(args.vocabulary.as_deref())?;
    let reference = load_reference_tables(&ReferenceTablePaths {
        equivalent_labels: args.equivalent_labels.clone(),
        dosage_units: args.dosage_units.clone(),
        plausible_ranges: args.plausible_ranges.clone(),
        cross_system: args.cross_system.clone(),
    })
    .context("load reference tables")?;

    let variables = collect_variables(args)?;
    if variables.is_empty() {
        bail!("no variables selected; pass --variables or --variables-file");
    }
    debug!(count = variables.len(), "selected variables");

    let policy = if args.check_only_blood_gas {
        BloodGasPolicy::CheckOnly
    } else {
        BloodGasPolicy::ArterialOnly
    };
    let materials = if args.material.is_empty() {
        vocabulary.materials.default_included.clone()
    } else {
        args.material.clone()
    };
    let options = HarmonizeOptions::new(variables)
        .with_materials(materials)
        .with_log_dir(args.log_dir.clone())
        .with_verbose(args.show_stats)
        .with_blood_gas_policy(policy);
    let ctx = HarmonizeContext::new(vocabulary)
        .with_reference_tables(reference)
        .with_options(options);

    let delimiter = u8::try_from(args.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter {:?} is not a single ASCII byte", args.delimiter))?;
    let ingest = IngestOptions {
        file_prefix: args.file_prefix.clone(),
        delimiter,
    };
    let df = read_lab_directory(&args.data_dir, &ingest)
        .with_context(|| format!("read lab exports from {}", args.data_dir.display()))?;
    info!(rows = df.height(), "lab exports loaded");

    let output = match args.source {
        SourceArg::Primary => PrimaryHarmonizer::new().harmonize(df, &ctx),
        SourceArg::Alternate => AlternateHarmonizer::new().harmonize(df, &ctx),
    }
    .context("harmonize lab records")?;
    trace_rows(&output.table);

    let artifacts = match &ctx.options.log_dir {
        Some(dir) => write_audit_artifacts(dir, &output.audit)
            .with_context(|| format!("write audit artifacts to {}", dir.display()))?,
        None => Vec::new(),
    };
    let clean_table = match &args.output_dir {
        Some(dir) => Some(
            write_clean_table(dir, &output.table)
                .with_context(|| format!("write clean table to {}", dir.display()))?,
        ),
        None => None,
    };

    Ok(RunResult {
        data_dir: args.data_dir.clone(),
        audit: output.audit,
        clean_table,
        artifacts,
        options: ctx.options,
    })
}

fn load_run_vocabulary(path: Option<&Path>) -> Result<Vocabulary> {
    match path {
        Some(path) => load_vocabulary(path)
            .with_context(|| format!("load vocabulary {}", path.display())),
        None => default_vocabulary().context("load embedded vocabulary"),
    }
}

/// Union of `--variables` and the lines of `--variables-file`.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn collect_variables(args: &HarmonizeArgs) -> Result<BTreeSet<String>> {
    let mut variables: BTreeSet<String> = args
        .variables
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(path) = &args.variables_file {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read variables file {}", path.display()))?;
        variables.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    Ok(variables)
}

fn trace_rows(table: &LabTable) {
    if !log_data_enabled() {
        return;
    }
    for record in table.iter() {
        let value = value_to_string(&record.value);
        trace!(
            case_admission_id = redact_value(&record.case_admission_id),
            dosage_label = %record.dosage_label,
            value = redact_value(&value),
            "clean row"
        );
    }
}
