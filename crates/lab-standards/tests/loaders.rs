use std::fs;
use std::path::PathBuf;

use lab_standards::{
    ReferenceTablePaths, StandardsError, load_cross_system, load_dosage_units,
    load_equivalent_labels, load_plausible_ranges, load_reference_tables,
};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn equivalent_labels_are_read_column_wise() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "equivalent_labels.csv",
        "creat,hb\ncréatinine,hémoglobine\ncreatinine,hemoglobine\nCREA,\n",
    );
    let table = load_equivalent_labels(&path).expect("load equivalences");
    assert_eq!(table.groups().len(), 2);
    assert_eq!(table.groups()[0].canonical(), "créatinine");
    assert_eq!(table.groups()[0].synonyms(), ["creatinine", "CREA"]);
    assert_eq!(table.groups()[1].members(), ["hémoglobine", "hemoglobine"]);
}

#[test]
fn dosage_units_are_keyed_by_header() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "dosage_units.csv",
        "glucose,sodium\nmmol/l,mmol/l\nmg/dl,\n",
    );
    let units = load_dosage_units(&path).expect("load units");
    let glucose = units.for_label("glucose").expect("glucose units");
    assert!(glucose.contains("mmol/l"));
    assert!(glucose.contains("mg/dl"));
    assert_eq!(units.for_label("sodium").map(|set| set.len()), Some(1));
    assert!(units.for_label("potassium").is_none());
}

#[test]
fn plausible_ranges_parse_bounds() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "ranges.csv",
        "variable_label,Min,Max\nsodium,100,180\nglucose,0.5,60\n,,\n",
    );
    let ranges = load_plausible_ranges(&path).expect("load ranges");
    assert_eq!(ranges.len(), 2);
    let sodium = ranges.get("sodium").expect("sodium range");
    assert_eq!(sodium.min, 100.0);
    assert_eq!(sodium.max, 180.0);
}

#[test]
fn plausible_ranges_reject_bad_numbers() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "ranges.csv", "variable_label,Min,Max\nsodium,low,180\n");
    let error = load_plausible_ranges(&path).unwrap_err();
    assert!(matches!(error, StandardsError::InvalidNumber { .. }));
}

#[test]
fn plausible_ranges_reject_inverted_bounds() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "ranges.csv", "variable_label,Min,Max\nsodium,180,100\n");
    let error = load_plausible_ranges(&path).unwrap_err();
    assert!(matches!(error, StandardsError::Model { .. }));
}

#[test]
fn cross_system_accepts_source_headers() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "cross.csv",
        "DPI_name,MIMIC_equivalent_name,other_MIMIC_equivalents,DPI_units,unit_conversion_needed,multiplicative_factor\n\
         glucose,Glucose,Glucose (whole blood)|Glucose POC,mmol/l,1,0.0555\n\
         calcium corrige,,,mmol/l,0,\n",
    );
    let table = load_cross_system(&path).expect("load cross-system table");
    assert_eq!(table.rows.len(), 2);
    let glucose = &table.rows[0];
    assert_eq!(
        glucose.source_labels(),
        vec!["Glucose", "Glucose (whole blood)", "Glucose POC"]
    );
    assert_eq!(glucose.conversion_factor(), Some(0.0555));
    let calcium = &table.rows[1];
    assert!(calcium.equivalent_name.is_none());
    assert!(!calcium.unit_conversion_needed);
}

#[test]
fn missing_file_is_reported_with_path() {
    let error = load_equivalent_labels(&PathBuf::from("/nonexistent/labels.csv")).unwrap_err();
    assert!(error.to_string().contains("/nonexistent/labels.csv"));
}

#[test]
fn reference_tables_skip_absent_paths() {
    let dir = TempDir::new().expect("temp dir");
    let ranges = write(&dir, "ranges.csv", "variable_label,Min,Max\nsodium,100,180\n");
    let tables = load_reference_tables(&ReferenceTablePaths {
        plausible_ranges: Some(ranges),
        ..ReferenceTablePaths::default()
    })
    .expect("load tables");
    assert!(tables.equivalent_labels.is_empty());
    assert!(tables.allowed_units.is_empty());
    assert_eq!(tables.plausible_ranges.len(), 1);
    assert!(tables.cross_system.is_none());
}
