use std::path::PathBuf;

use tempfile::tempdir;

use super::*;
use crate::results::{AggregatedRow, AggregatedTable, RunRecord, TableFile};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn row(network: &str, step: u64, values: &[Option<f64>]) -> AggregatedRow {
    AggregatedRow {
        run: network.to_string(),
        path: PathBuf::from(format!("{network}.csv")),
        record: RunRecord {
            network: network.to_string(),
            step,
            values: values.to_vec(),
        },
    }
}

fn accuracy_table(rows: Vec<AggregatedRow>) -> AggregatedTable {
    AggregatedTable::from_rows(vec!["test accuracy".to_string()], rows)
}

fn tracked() -> Vec<String> {
    vec!["test accuracy".to_string()]
}

#[test]
fn describe_matches_linear_quantiles_and_sample_std() {
    let summary = describe(&[1.0, 3.0, 3.0, 6.0, 7.0, 8.0, 9.0]);
    assert_eq!(summary.count, 7);
    assert!(close(summary.mean, 37.0 / 7.0));
    assert!(close(summary.q25, 3.0));
    assert!(close(summary.q50, 6.0));
    assert!(close(summary.q75, 7.5));
    assert_eq!(summary.min, 1.0);
    assert_eq!(summary.max, 9.0);
    assert!(close(summary.std, (187.0_f64 / 21.0).sqrt()));
}

#[test]
fn describe_handles_small_and_empty_groups() {
    let single = describe(&[0.7]);
    assert_eq!(single.count, 1);
    assert_eq!(single.mean, 0.7);
    assert!(single.std.is_nan());
    assert_eq!(single.q25, 0.7);

    let empty = describe(&[f64::NAN]);
    assert!(empty.is_empty());
    assert!(empty.mean.is_nan());
    assert_eq!(empty.get(StatKind::Count), 0.0);
}

#[test]
fn single_sample_groups_compare_equal() {
    let one = describe(&[0.9]);
    assert!(one.std.is_nan());
    assert_eq!(one, describe(&[0.9]));
    assert_eq!(describe(&[]), describe(&[f64::NAN]));
    assert_ne!(one, describe(&[0.8]));
}

#[test]
fn quantile_interpolates_between_order_statistics() {
    let sorted = [0.0, 10.0];
    assert!(close(quantile_sorted(&sorted, 0.25), 2.5));
    assert!(close(quantile_sorted(&sorted, 1.5), 10.0));
    assert!(quantile_sorted(&[], 0.5).is_nan());
}

#[test]
fn stat_kind_names_round_trip() {
    for kind in StatKind::ALL {
        assert_eq!(kind.as_str().parse::<StatKind>(), Ok(kind));
    }
    assert!("median".parse::<StatKind>().is_err());
}

#[test]
fn networks_are_summarized_independently_per_step() {
    let mut rows = Vec::new();
    for (step, value) in [(1, 0.5), (2, 0.6), (3, 0.7)] {
        rows.push(row("A", step, &[Some(value)]));
    }
    for (step, value) in [(1, 0.4), (2, 0.5), (3, 0.9)] {
        rows.push(row("B", step, &[Some(value)]));
    }
    let summary = StatSummary::compute(&accuracy_table(rows), &tracked());

    let a = summary.describe("A", 3, "test accuracy").unwrap();
    let b = summary.describe("B", 3, "test accuracy").unwrap();
    assert_eq!((a.count, a.mean), (1, 0.7));
    assert_eq!((b.count, b.mean), (1, 0.9));
    assert!(close(summary.cross_network_mean(3, "test accuracy").unwrap(), 0.8));
    assert!(summary.missing.is_empty());
}

#[test]
fn adding_other_groups_does_not_change_existing_summary() {
    let base = vec![
        row("A", 1, &[Some(0.2)]),
        row("A", 1, &[Some(0.4)]),
        row("A", 2, &[Some(0.9)]),
    ];
    let before = StatSummary::compute(&accuracy_table(base.clone()), &tracked());

    let mut extended = base;
    extended.insert(1, row("B", 1, &[Some(100.0)]));
    extended.push(row("A", 3, &[Some(-5.0)]));
    let after = StatSummary::compute(&accuracy_table(extended), &tracked());

    assert_eq!(before.get("A", 1), after.get("A", 1));
    assert_eq!(before.get("A", 2), after.get("A", 2));
}

#[test]
fn incomplete_groups_are_reported() {
    let rows = vec![
        row("A", 1, &[Some(0.2)]),
        row("A", 2, &[None]),
        row("B", 1, &[Some(0.3)]),
    ];
    let tracked = vec!["test accuracy".to_string(), "test loss".to_string()];
    let summary = StatSummary::compute(&accuracy_table(rows), &tracked);

    assert_eq!(summary.metrics(), ["test accuracy"]);
    assert_eq!(summary.absent_metrics, vec!["test loss"]);
    assert_eq!(summary.missing, vec![("B".to_string(), 2)]);
    assert_eq!(
        summary.empty_groups,
        vec![("A".to_string(), 2, "test accuracy".to_string())]
    );
    assert_eq!(summary.get("A", 2).unwrap().rows, 1);
}

#[test]
fn network_files_are_written_and_read_back() {
    let dir = tempdir().unwrap();
    let rows = vec![
        row("complex net", 0, &[Some(0.5)]),
        row("complex net", 0, &[Some(0.7)]),
        row("complex net", 1, &[Some(0.8)]),
    ];
    let summary = StatSummary::compute(&accuracy_table(rows), &tracked());
    let written = summary
        .write_network_files(dir.path(), "_statistical_result.csv")
        .unwrap();
    assert_eq!(
        written,
        vec![dir.path().join("complex_net_statistical_result.csv")]
    );

    let text = std::fs::read_to_string(&written[0]).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("step,stats,test accuracy"));
    assert_eq!(lines.next(), Some("0,count,2"));
    assert_eq!(lines.next(), Some("0,mean,0.6"));

    let stats = NetworkStats::read(&written[0], "complex net").unwrap();
    assert_eq!(stats.steps(), [0, 1]);
    let means = stats.series(StatKind::Mean, "test accuracy").unwrap();
    assert!(close(means[0], 0.6));
    assert!(close(means[1], 0.8));
    let stds = stats.series(StatKind::Std, "test accuracy").unwrap();
    assert!(stds[1].is_nan());
    assert!(stats.series(StatKind::Mean, "train loss").is_none());
}
