mod support;

use std::process::Command;

use mcstat::app_dirs::CONFIG_HOME_ENV;
use mcstat::config::{self, ReportConfig};
use mcstat::figure::{ChartOutput, OutputFormat};
use mcstat::montecarlo::{MonteCarloAnalyzer, StepSelector};
use mcstat::results::{RUN_DATA_FILE, ResultLoader, RunTable, TableFile};
use mcstat::stats::{NetworkStats, StatKind, StatSummary};
use support::mcstat_env::McstatEnvGuard;
use support::runs::{FIT_SUFFIX, write_run_file, write_two_networks};

fn accuracy_config() -> ReportConfig {
    ReportConfig {
        tracked_metrics: vec!["accuracy".to_string()],
        ..ReportConfig::default()
    }
}

#[test]
fn networks_are_summarized_independently_per_step() {
    let dir = tempfile::tempdir().unwrap();
    write_two_networks(dir.path());
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), FIT_SUFFIX).unwrap();
    let table = loader.aggregate().unwrap();

    let summary = StatSummary::compute(&table, &["accuracy".to_string()]);
    let a = summary.describe("A", 3, "accuracy").unwrap();
    let b = summary.describe("B", 3, "accuracy").unwrap();
    assert_eq!((a.count, b.count), (1, 1));
    assert!((a.mean - 0.7).abs() < 1e-12);
    assert!((b.mean - 0.9).abs() < 1e-12);
    let combined = summary.cross_network_mean(3, "accuracy").unwrap();
    assert!((combined - 0.8).abs() < 1e-12);
}

#[test]
fn reloading_an_unchanged_directory_gives_the_same_table() {
    let dir = tempfile::tempdir().unwrap();
    write_two_networks(dir.path());
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), "_results_fit").unwrap();
    let first = loader.aggregate().unwrap();
    loader.reload().unwrap();
    let second = loader.aggregate().unwrap();
    assert_eq!(first, second);
    assert_eq!(loader.labels(), vec!["run 0", "run 1"]);
}

#[test]
fn mismatched_run_lengths_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_two_networks(dir.path());
    write_run_file(dir.path(), "run_2", "accuracy", &[("C", 1, 0.3)]);
    let mut loader = ResultLoader::<RunTable>::new(dir.path(), FIT_SUFFIX).unwrap();
    assert!(loader.aggregate().is_err());
}

#[test]
fn analyzer_writes_statistics_that_read_back() {
    let runs = tempfile::tempdir().unwrap();
    write_two_networks(runs.path());
    let table = ResultLoader::<RunTable>::new(runs.path(), FIT_SUFFIX)
        .unwrap()
        .aggregate()
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    let mut analyzer = MonteCarloAnalyzer::with_data(out.path(), table, accuracy_config())
        .unwrap()
        .with_output(ChartOutput::new(vec![OutputFormat::Html]));
    assert!(out.path().join(RUN_DATA_FILE).is_file());
    let written = analyzer.save_stat_results().unwrap();
    assert_eq!(written.len(), 2);

    let stats = NetworkStats::read(&out.path().join("A_statistical_result.csv"), "A").unwrap();
    assert_eq!(stats.steps(), &[1, 2, 3]);
    assert_eq!(stats.series(StatKind::Mean, "accuracy").unwrap(), vec![0.5, 0.6, 0.7]);

    let reopened =
        MonteCarloAnalyzer::open(out.path().join("run_data"), accuracy_config()).unwrap();
    assert_eq!(reopened.data(), analyzer.data());

    let boxes = analyzer.box_plot(StepSelector::Final, "accuracy").unwrap();
    assert_eq!(
        boxes,
        vec![out.path().join("plots/box_plot/montecarlo_accuracy_box_plot.html")]
    );
}

#[test]
fn settings_are_read_from_the_config_home() {
    let home = tempfile::tempdir().unwrap();
    let _guard = McstatEnvGuard::set_config_home(home.path().to_path_buf());
    let path = config::config_path().unwrap();
    assert!(path.starts_with(home.path()));
    std::fs::write(
        &path,
        "formats = [\"svg\"]\nhistogram_bins = 1\n\n[colors]\n\"A\" = \"rgb(1, 2, 3)\"\n",
    )
    .unwrap();
    let config = config::load_or_default().unwrap();
    assert_eq!(config.formats, vec!["svg".to_string()]);
    assert_eq!(config.histogram_bins, 2);
    assert_eq!(config.pinned_colors().unwrap()["A"].to_string(), "rgb(1, 2, 3)");
}

#[test]
fn summarize_command_writes_network_files() {
    let home = tempfile::tempdir().unwrap();
    let runs = tempfile::tempdir().unwrap();
    write_two_networks(runs.path());
    let table = ResultLoader::<RunTable>::new(runs.path(), FIT_SUFFIX)
        .unwrap()
        .aggregate()
        .unwrap();
    let run_data = runs.path().join(RUN_DATA_FILE);
    table.write_csv(&run_data).unwrap();
    let config = runs.path().join("settings.toml");
    std::fs::write(&config, "tracked_metrics = [\"accuracy\"]\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mcstat"))
        .env(CONFIG_HOME_ENV, home.path())
        .arg("summarize")
        .arg("--run-data")
        .arg(&run_data)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(runs.path().join("A_statistical_result.csv").is_file());
    assert!(runs.path().join("B_statistical_result.csv").is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("accuracy at step 3: mean 0.8000 across networks"));
}

#[test]
fn unknown_commands_fail() {
    let home = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_mcstat"))
        .env(CONFIG_HOME_ENV, home.path())
        .arg("frobnicate")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown command"));
}
