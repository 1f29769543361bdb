//! End-to-end runs of the `harmonize` command over a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use lab_cli::cli::{Cli, Command, HarmonizeArgs, SourceArg};
use lab_cli::commands::{collect_variables, run_harmonize};
use lab_cli::summary::render_summary;
use lab_report::{CLEAN_TABLE_FILE, DESCRIPTIVE_STATS_FILE, SUMMARY_LOG_FILE};
use tempfile::TempDir;

const EXPORT: &str = "\
patient_id;eds_end_4digit;sample_date;analyse_label;dosage_label;material_label;unit_of_measure;value;lower_limit;upper_limit
1;1234;2021-03-01 08:00;glucose;glucose;sgv;mmol/l;5.4;;
1;1234;2021-03-01 09:00;Glucose;Glucose;sgv;mmol/l;>83.2;;
1;1234;2021-03-01 10:00;glucose;glucose;sgv;mg/dl;97;;
2;5678;2021-04-02 07:30;sodium;sodium;plasma;mmol/l;140;135;145
2;5678;2021-04-02 07:30;sodium;sodium;urine;mmol/l;150;;
2;5678;2021-04-02 08:30;sodium;sodium;sgv;mmol/l;999;;
2;5678;2021-04-02 09:30;sodium;sodium;sgv;mmol/l;;;
2;5678;2021-04-02 09:30;potassium;potassium;sgv;mmol/l;4.1;;
";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

struct Fixture {
    _root: TempDir,
    data_dir: PathBuf,
    reference_dir: PathBuf,
    out_dir: PathBuf,
}

fn fixture() -> Fixture {
    let root = TempDir::new().expect("temp dir");
    let data_dir = root.path().join("data");
    let reference_dir = root.path().join("reference");
    fs::create_dir_all(&data_dir).expect("data dir");
    fs::create_dir_all(&reference_dir).expect("reference dir");
    write(&data_dir, "labo_2021.csv", EXPORT);
    write(&data_dir, "notes.csv", "ignored\n");
    write(
        &reference_dir,
        "equivalent_labels.csv",
        "glucose\nglucose\nGlucose\n",
    );
    write(&reference_dir, "dosage_units.csv", "glucose\nmmol/l\n");
    write(
        &reference_dir,
        "ranges.csv",
        "variable_label,Min,Max\nglucose,0.1,100\nsodium,100,180\n",
    );
    let out_dir = root.path().join("out");
    Fixture {
        _root: root,
        data_dir,
        reference_dir,
        out_dir,
    }
}

fn harmonize_args(fixture: &Fixture, extra: &[&str]) -> HarmonizeArgs {
    let reference = |name: &str| fixture.reference_dir.join(name).display().to_string();
    let mut argv = vec![
        "lab-harmonize".to_string(),
        "harmonize".to_string(),
        fixture.data_dir.display().to_string(),
        "--equivalent-labels".to_string(),
        reference("equivalent_labels.csv"),
        "--dosage-units".to_string(),
        reference("dosage_units.csv"),
        "--plausible-ranges".to_string(),
        reference("ranges.csv"),
    ];
    argv.extend(extra.iter().map(|arg| (*arg).to_string()));
    match Cli::try_parse_from(argv).expect("parse arguments").command {
        Command::Harmonize(args) => args,
        Command::Vocabulary => panic!("expected harmonize command"),
    }
}

#[test]
fn harmonize_writes_clean_table_and_audit() {
    let fixture = fixture();
    let out = fixture.out_dir.display().to_string();
    let logs = fixture.out_dir.join("logs").display().to_string();
    let args = harmonize_args(
        &fixture,
        &[
            "--variables",
            "glucose,sodium",
            "--output-dir",
            &out,
            "--log-dir",
            &logs,
            "--show-stats",
        ],
    );
    assert_eq!(args.source, SourceArg::Primary);

    let result = run_harmonize(&args).expect("harmonize");
    let audit = &result.audit;
    assert_eq!(audit.pipeline, "primary");
    assert_eq!(audit.input_rows, 8);
    assert_eq!(audit.output_rows, 3);
    assert_eq!(audit.exclusions.unselected_label, 1);
    assert_eq!(audit.exclusions.excluded_material, 1);
    assert_eq!(audit.exclusions.disallowed_unit, 1);
    assert_eq!(audit.exclusions.missing_value, 1);
    assert_eq!(audit.exclusions.out_of_range, 1);
    assert_eq!(audit.units.get("glucose").map(String::as_str), Some("mmol/l"));
    assert_eq!(audit.descriptive_stats["glucose"].count, 2);
    assert!((audit.descriptive_stats["glucose"].max - 87.36).abs() < 1e-9);
    assert!(result.options.verbose);
    assert!(render_summary(&result).contains("Descriptive statistics:"));

    let clean_path = result.clean_table.as_ref().expect("clean table path");
    assert!(clean_path.ends_with(CLEAN_TABLE_FILE));
    let clean = fs::read_to_string(clean_path).expect("read clean table");
    let lines: Vec<&str> = clean.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("case_admission_id,sample_date,dosage_label"));
    assert!(lines[1..].iter().all(|line| !line.contains("urine")));

    let names: Vec<String> = result
        .artifacts
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|name| name == SUMMARY_LOG_FILE));
    assert!(names.iter().any(|name| name == DESCRIPTIVE_STATS_FILE));
    assert!(result.artifacts.iter().all(|path| path.exists()));
}

#[test]
fn nothing_is_written_without_output_directories() {
    let fixture = fixture();
    let args = harmonize_args(&fixture, &["--variables", "sodium"]);
    let result = run_harmonize(&args).expect("harmonize");
    assert!(result.clean_table.is_none());
    assert!(result.artifacts.is_empty());
    assert_eq!(result.audit.output_rows, 1);
    assert!(!result.options.verbose);
    assert!(!render_summary(&result).contains("Descriptive statistics:"));
    assert!(!fixture.out_dir.exists());
}

#[test]
fn run_without_variables_is_rejected() {
    let fixture = fixture();
    let args = harmonize_args(&fixture, &[]);
    let error = run_harmonize(&args).unwrap_err();
    assert!(error.to_string().contains("no variables selected"));
}

#[test]
fn missing_data_directory_names_the_path() {
    let fixture = fixture();
    let mut args = harmonize_args(&fixture, &["--variables", "sodium"]);
    args.data_dir = fixture.data_dir.join("absent");
    let error = run_harmonize(&args).unwrap_err();
    assert!(format!("{error:#}").contains("absent"));
}

#[test]
fn variables_merge_list_and_file() {
    let fixture = fixture();
    let list = write(
        &fixture.reference_dir,
        "variables.txt",
        "# selected labels\nsodium\n\n  glucose \n",
    );
    let list = list.display().to_string();
    let args = harmonize_args(
        &fixture,
        &["--variables", "sodium,ALAT", "--variables-file", &list],
    );
    let variables = collect_variables(&args).expect("collect variables");
    let variables: Vec<&str> = variables.iter().map(String::as_str).collect();
    assert_eq!(variables, vec!["ALAT", "glucose", "sodium"]);
}

#[test]
fn vocabulary_default_materials_apply_without_material_flag() {
    let fixture = fixture();
    let source = lab_standards::default_vocabulary_source().replace(
        r#"default_included = ["any_blood"]"#,
        r#"default_included = ["any_blood", "urine"]"#,
    );
    let vocabulary = write(&fixture.reference_dir, "vocabulary.toml", &source);
    let vocabulary = vocabulary.display().to_string();
    let args = harmonize_args(&fixture, &["--variables", "sodium", "--vocabulary", &vocabulary]);
    assert!(args.material.is_empty());

    let result = run_harmonize(&args).expect("harmonize");
    assert!(result.options.material_to_include.contains("urine"));
    assert_eq!(result.audit.exclusions.excluded_material, 0);
    assert_eq!(result.audit.output_rows, 2);
}

#[test]
fn material_flag_overrides_vocabulary_default() {
    let fixture = fixture();
    let args = harmonize_args(&fixture, &["--variables", "sodium", "--material", "urine"]);
    let result = run_harmonize(&args).expect("harmonize");
    assert_eq!(
        result.options.material_to_include.iter().collect::<Vec<_>>(),
        vec!["urine"]
    );
    assert_eq!(result.audit.output_rows, 1);
}
