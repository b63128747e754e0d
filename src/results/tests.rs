use std::fs;
use std::path::Path;

use tempfile::tempdir;

use super::*;

const SUFFIX: &str = "_results_fit.csv";

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn loads_matching_files_in_lexicographic_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "real_net_results_fit.csv", "step,test accuracy\n0,0.5\n");
    write(dir.path(), "complex_net_results_fit.csv", "step,test accuracy\n0,0.6\n");
    write(dir.path(), "notes.csv", "step,test accuracy\n0,0.1\n");

    let loader = ResultLoader::<RunTable>::new(dir.path(), SUFFIX).unwrap();
    assert_eq!(loader.labels(), vec!["complex net", "real net"]);
    assert_eq!(loader.entries()[0].table.records[0].network, "complex net");
}

#[test]
fn missing_directory_is_reported() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = ResultLoader::<RunTable>::new(&missing, SUFFIX).unwrap_err();
    assert!(matches!(err, LoadError::MissingDir { path } if path == missing));
}

#[test]
fn suffix_without_extension_gets_csv() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a_results_fit.csv", "x\n1\n");
    let loader = ResultLoader::<RunTable>::new(dir.path(), "_results_fit").unwrap();
    assert_eq!(loader.suffix(), SUFFIX);
    assert_eq!(loader.len(), 1);
}

#[test]
fn reload_reflects_new_files_and_is_idempotent() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a_results_fit.csv", "step,loss\n0,1.0\n1,0.5\n");
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), SUFFIX).unwrap();
    let first = loader.aggregate().unwrap();
    let again = loader.aggregate().unwrap();
    assert_eq!(first, again);

    write(dir.path(), "b_results_fit.csv", "step,loss\n0,0.9\n1,0.4\n");
    loader.reload().unwrap();
    assert_eq!(loader.labels(), vec!["a", "b"]);
    assert_eq!(loader.aggregate().unwrap().len(), 4);
}

#[test]
fn aggregate_rejects_tables_of_different_length() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a_results_fit.csv", "step,loss\n0,1.0\n1,0.5\n");
    write(dir.path(), "b_results_fit.csv", "step,loss\n0,0.9\n");
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), SUFFIX).unwrap();
    let err = loader.aggregate().unwrap_err();
    assert!(matches!(
        err,
        LoadError::LengthMismatch { label, expected: 2, found: 1 } if label == "b"
    ));
}

#[test]
fn aggregate_of_empty_directory_fails() {
    let dir = tempdir().unwrap();
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), SUFFIX).unwrap();
    assert!(loader.is_empty());
    assert!(matches!(loader.aggregate(), Err(LoadError::Empty { .. })));
}

#[test]
fn network_name_comes_from_metadata_file_name() {
    let dir = tempdir().unwrap();
    write(dir.path(), "complex_network_metadata.txt", "ignored contents");
    let loader = ResultLoader::<RunTable>::new(dir.path(), SUFFIX).unwrap();
    assert_eq!(
        loader.network_name("_metadata.txt").unwrap().as_deref(),
        Some("complex network")
    );
    assert_eq!(loader.network_name("_other.txt").unwrap(), None);
}

#[test]
fn aggregate_named_fills_networks_from_metadata() {
    let dir = tempdir().unwrap();
    write(dir.path(), "complex_network_metadata.txt", "");
    write(dir.path(), "run_results_fit.csv", "step,test accuracy\n0,0.5\n1,0.6\n");
    write(dir.path(), "tagged_results_fit.csv", "network,step,test accuracy\nreal,0,0.4\n,1,0.7\n");
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), SUFFIX).unwrap();

    let named = loader.aggregate_named("_metadata.txt").unwrap();
    assert_eq!(named.networks(), vec!["complex network", "real"]);
    assert_eq!(named.rows()[3].record.network, "complex network");

    let plain = loader.aggregate().unwrap();
    assert_eq!(plain.networks(), vec!["run", "real", "tagged"]);
}

#[test]
fn aggregate_named_without_metadata_keeps_labels() {
    let dir = tempdir().unwrap();
    write(dir.path(), "run_results_fit.csv", "step,test accuracy\n0,0.5\n");
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), SUFFIX).unwrap();
    assert_eq!(loader.aggregate_named("_metadata.txt").unwrap().networks(), vec!["run"]);
}

#[test]
fn trailing_number_reads_digits_before_extension() {
    assert_eq!(trailing_number("my/path/any_43_start_name9872.csv"), Some(9872));
    assert_eq!(trailing_number("my/path/any_43_start_name.csv"), None);
    assert_eq!(trailing_number("my/path/any_43_start_name85498.txt"), None);
}

#[test]
fn run_table_parses_identity_columns_and_missing_cells() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    fs::write(
        &path,
        ",network,step,train loss,comment\n0,A,1.0,0.3,ok\n1,B,2,,fine\n2,A,3,NaN,\n",
    )
    .unwrap();
    let table = RunTable::read(&path, "run").unwrap();
    assert_eq!(table.metrics, vec!["train loss"]);
    let steps: Vec<u64> = table.records.iter().map(|record| record.step).collect();
    assert_eq!(steps, vec![1, 2, 3]);
    assert_eq!(table.records[1].network, "B");
    assert_eq!(table.records[0].values, vec![Some(0.3)]);
    assert_eq!(table.records[1].values, vec![None]);
    assert_eq!(table.records[2].values, vec![None]);
}

#[test]
fn missing_step_column_uses_row_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    fs::write(&path, "loss,accuracy\n1.0,0.1\n0.5,0.2\n").unwrap();
    let table = RunTable::read(&path, "net").unwrap();
    assert_eq!(table.records[1].step, 1);
    assert_eq!(table.metrics_matching("loss").collect::<Vec<_>>(), vec!["loss"]);
}

#[test]
fn invalid_step_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    fs::write(&path, "step,loss\n-1,1.0\n").unwrap();
    assert!(matches!(
        RunTable::read(&path, "net"),
        Err(LoadError::InvalidStep { row: 0, .. })
    ));
}

#[test]
fn aggregated_table_widens_schema_and_round_trips() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.csv", "step,loss\n0,1.0\n");
    write(dir.path(), "b.csv", "step,accuracy,loss\n0,0.7,0.8\n");
    let a = RunTable::read(&dir.path().join("a.csv"), "A").unwrap();
    let b = RunTable::read(&dir.path().join("b.csv"), "B").unwrap();

    let table = AggregatedTable::from_tables([("A", &a), ("B", &b)]);
    assert_eq!(table.metrics(), ["loss", "accuracy"]);
    assert_eq!(table.rows()[0].record.values, vec![Some(1.0), None]);
    assert_eq!(table.rows()[1].record.values, vec![Some(0.8), Some(0.7)]);
    assert_eq!(table.networks(), vec!["A", "B"]);

    let saved = dir.path().join("out").join(RUN_DATA_FILE);
    table.write_csv(&saved).unwrap();
    let restored = AggregatedTable::read_csv(&saved).unwrap();
    assert_eq!(restored, table);
}

#[test]
fn select_filters_on_network_and_step() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "data.csv",
        "network,step,acc\nA,1,0.5\nA,2,0.6\nB,2,0.4\nA,2,0.8\n",
    );
    let table = AggregatedTable::read_csv(&dir.path().join("data.csv")).unwrap();
    assert_eq!(table.select("A", 2, "acc"), vec![0.6, 0.8]);
    assert_eq!(table.select("B", 1, "acc"), Vec::<f64>::new());
    assert_eq!(table.select("A", 2, "loss"), Vec::<f64>::new());
    assert_eq!(table.steps(Some("B")), vec![2]);
    assert_eq!(table.max_step(), Some(2));
}
