use std::path::{Path, PathBuf};

use mcstat::config::{self, ReportConfig};
use mcstat::confusion::{ClassLabel, ConfusionMatrix, ConfusionReplicates};
use mcstat::figure::ChartOutput;
use mcstat::logging::{self, LogSettings};
use mcstat::montecarlo::{IndependentValue, MonteCarloAnalyzer, Plotter, RunComparison};
use mcstat::plots::{CONFUSION_DIR, file_stem, heatmap};
use mcstat::results::AggregatedTable;
use mcstat::stats::StatSummary;

use super::options::{CliOptions, Command, parse_args};

const PREDICTED_COLUMN: &str = "predicted";
const ACTUAL_COLUMN: &str = "actual";

pub(super) fn run(args: Vec<String>) -> Result<(), String> {
    let Some(options) = parse_args(args)? else {
        return Ok(());
    };
    let config = load_config(&options)?;
    if let Err(err) = logging::init_with(&LogSettings::from_config(&config)) {
        eprintln!("Logging disabled: {err}");
    }
    let output = ChartOutput::from_config(&config).opening(options.open);
    let written = match options.command {
        Command::Summarize { run_data } => summarize(&run_data, &config)?,
        Command::MonteCarlo { run_data } => MonteCarloAnalyzer::open(&run_data, config)
            .and_then(|analyzer| analyzer.with_output(output).do_all())
            .map_err(|err| err.to_string())?,
        Command::Plot { dir, suffix, key } => {
            let mut config = config;
            if let Some(suffix) = suffix {
                config.fit_suffix = suffix;
            }
            let plotter = Plotter::new(dir, &config.normalized())
                .map_err(|err| err.to_string())?
                .with_output(output);
            let written = match key {
                Some(key) => plotter.plot_key(&key),
                None => plotter.plot_everything(),
            };
            written.map_err(|err| err.to_string())?
        }
        Command::Compare {
            label,
            x_kind,
            x,
            paths,
            key,
            step,
            out,
            stats_dir,
        } => {
            let x = x
                .iter()
                .map(|value| IndependentValue::parse(x_kind, value, config.float_decimals))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| err.to_string())?;
            let mut comparison = RunComparison::new(label, x, &paths, config)
                .map_err(|err| err.to_string())?
                .with_output(output);
            let mut written = comparison
                .box_plot(&key, step, &out)
                .map_err(|err| err.to_string())?;
            if let Some(dir) = stats_dir {
                written.extend(
                    comparison
                        .save_stats_csv(&dir, step)
                        .map_err(|err| err.to_string())?,
                );
            }
            written
        }
        Command::Confusion {
            pairs,
            name,
            out,
            plot_dir,
        } => confusion(&pairs, name, out, plot_dir, &output)?,
    };
    for path in &written {
        println!("Wrote {}", path.display());
    }
    if written.is_empty() {
        println!("Nothing written");
    }
    Ok(())
}

fn load_config(options: &CliOptions) -> Result<ReportConfig, String> {
    let mut config = match &options.config {
        Some(path) => config::load_from_path(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(formats) = &options.formats {
        config.formats = formats.clone();
    }
    if let Some(path) = &options.plotly_js {
        config.plotly_js = Some(path.clone());
    }
    Ok(config.normalized())
}

/// Per-network statistics files next to the run data.
fn summarize(run_data: &Path, config: &ReportConfig) -> Result<Vec<PathBuf>, String> {
    let table = AggregatedTable::read_csv(run_data).map_err(|err| err.to_string())?;
    let summary = StatSummary::compute(&table, &config.tracked_metrics);
    if let Some(step) = table.max_step() {
        for metric in summary.metrics() {
            if let Some(mean) = summary.cross_network_mean(step, metric) {
                println!("{metric} at step {step}: mean {mean:.4} across networks");
            }
        }
    }
    let dir = match run_data.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    summary
        .write_network_files(dir, &config.stats_suffix)
        .map_err(|err| err.to_string())
}

fn confusion(
    pairs: &Path,
    name: Option<String>,
    out: Option<PathBuf>,
    plot_dir: Option<PathBuf>,
    output: &ChartOutput,
) -> Result<Vec<PathBuf>, String> {
    let (predicted, actual) = read_pairs(pairs)?;
    let matrix = ConfusionMatrix::from_labels(predicted, actual).map_err(|err| err.to_string())?;
    let name = name.unwrap_or_else(|| {
        pairs
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "labels".to_string())
    });
    let out = out.unwrap_or_else(|| {
        let dir = pairs.parent().unwrap_or(Path::new("."));
        dir.join(ConfusionReplicates::new(name.as_str(), Vec::new()).file_name())
    });
    matrix.write_csv(&out).map_err(|err| err.to_string())?;
    let mut written = vec![out];
    if let Some(dir) = plot_dir {
        let figure = heatmap::confusion_figure(&matrix, &format!("{name} confusion matrix"));
        let stem = format!("{}_confusion_matrix", file_stem(&name));
        written.extend(
            output
                .write(&figure, &dir.join(CONFUSION_DIR), &stem)
                .map_err(|err| err.to_string())?,
        );
    }
    Ok(written)
}

/// `predicted` and `actual` columns of a label pairs file.
fn read_pairs(path: &Path) -> Result<(Vec<ClassLabel>, Vec<ClassLabel>), String> {
    let read_err = |err: csv::Error| format!("Failed to read {}: {err}", path.display());
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;
    let headers = reader.headers().map_err(read_err)?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| format!("{} has no {name:?} column", path.display()))
    };
    let (predicted_idx, actual_idx) = (column(PREDICTED_COLUMN)?, column(ACTUAL_COLUMN)?);
    let mut predicted = Vec::new();
    let mut actual = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let (Some(pred), Some(act)) = (record.get(predicted_idx), record.get(actual_idx)) else {
            tracing::warn!("Skipping short row in {}", path.display());
            continue;
        };
        predicted.push(ClassLabel::parse(pred));
        actual.push(ClassLabel::parse(act));
    }
    Ok((predicted, actual))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_pairs_parses_both_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        std::fs::write(&path, "actual,predicted\n0,1\ncat, cat\n").unwrap();
        let (predicted, actual) = read_pairs(&path).unwrap();
        assert_eq!(predicted, vec![ClassLabel::Index(1), ClassLabel::Name("cat".into())]);
        assert_eq!(actual, vec![ClassLabel::Index(0), ClassLabel::Name("cat".into())]);
    }

    #[test]
    fn read_pairs_requires_both_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        std::fs::write(&path, "predicted\n0\n").unwrap();
        assert!(read_pairs(&path).unwrap_err().contains("\"actual\""));
    }

    #[test]
    fn confusion_command_writes_csv_next_to_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = dir.path().join("complex net.csv");
        std::fs::write(&pairs, "predicted,actual\n0,0\n1,0\n1,1\n").unwrap();
        let output = ChartOutput::new(Vec::new());
        let written = confusion(&pairs, None, None, None, &output).unwrap();
        let expected = dir.path().join("complex_net_confusion_matrix.csv");
        assert_eq!(written, vec![expected.clone()]);
        let matrix = ConfusionMatrix::read_csv(&expected).unwrap();
        assert_eq!(matrix.get("0", "1"), Some(1.0));
        assert_eq!(matrix.total(), 3.0);
    }
}
