//! CLI argument definitions for lab harmonization.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use lab_ingest::DEFAULT_FILE_PREFIX;

#[derive(Parser)]
#[command(
    name = "lab-harmonize",
    version,
    about = "Harmonize laboratory exports into one canonical long table",
    long_about = "Harmonize laboratory measurements from heterogeneous exports.\n\n\
                  Resolves label synonyms, filters specimen materials, reconciles units,\n\
                  corrects censored values and drops implausible observations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow row-level values (case identifiers, raw values) in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Harmonize every matching lab export in a directory.
    Harmonize(HarmonizeArgs),

    /// Print the embedded rule vocabulary as TOML.
    Vocabulary,
}

#[derive(Parser)]
pub struct HarmonizeArgs {
    /// Directory containing the lab exports.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Source schema of the exports.
    #[arg(long = "source", value_enum, default_value = "primary")]
    pub source: SourceArg,

    /// Only files whose name starts with this prefix are read.
    #[arg(long = "file-prefix", default_value = DEFAULT_FILE_PREFIX)]
    pub file_prefix: String,

    /// Field delimiter of the exports.
    #[arg(long = "delimiter", default_value_t = ';')]
    pub delimiter: char,

    /// Label-equivalence table (one column per synonym group).
    #[arg(long = "equivalent-labels", value_name = "CSV")]
    pub equivalent_labels: Option<PathBuf>,

    /// Allowed-unit table (one column per label).
    #[arg(long = "dosage-units", value_name = "CSV")]
    pub dosage_units: Option<PathBuf>,

    /// Plausible-range table (variable_label, Min, Max).
    #[arg(long = "plausible-ranges", value_name = "CSV")]
    pub plausible_ranges: Option<PathBuf>,

    /// Cross-system equivalence table, required for the alternate source.
    #[arg(long = "cross-system", value_name = "CSV")]
    pub cross_system: Option<PathBuf>,

    /// Rule vocabulary replacing the embedded one.
    #[arg(long = "vocabulary", value_name = "TOML")]
    pub vocabulary: Option<PathBuf>,

    /// Canonical labels to retain (comma separated).
    #[arg(long = "variables", value_delimiter = ',')]
    pub variables: Vec<String>,

    /// File listing canonical labels to retain, one per line.
    #[arg(long = "variables-file", value_name = "PATH")]
    pub variables_file: Option<PathBuf>,

    /// Material categories to retain (repeatable). Defaults to the
    /// vocabulary's `materials.default_included`.
    #[arg(long = "material")]
    pub material: Vec<String>,

    /// Write preprocessed_labs.csv into this directory.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write the audit artifacts into this directory.
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Include descriptive statistics in the printed summary.
    #[arg(long = "show-stats")]
    pub show_stats: bool,

    /// Keep non-arterial blood-gas rows and fail if they mix with arterial ones.
    #[arg(long = "check-only-blood-gas")]
    pub check_only_blood_gas: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Primary,
    Alternate,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
