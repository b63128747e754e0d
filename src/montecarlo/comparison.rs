use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ordered_float::OrderedFloat;

use crate::color::ColorMap;
use crate::config::ReportConfig;
use crate::figure::ChartOutput;
use crate::plots::boxplot::{self, BoxGroup, BoxLayout};
use crate::plots::{display_name, file_stem};
use crate::results::{format_value, writer_at};
use crate::stats::{StatKind, StatSummary, StatsError};

use super::{ComparisonError, MonteCarloAnalyzer, StepSelector};

/// How the independent values of a comparison are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XKind {
    Int,
    Float,
    Label,
}

impl XKind {
    fn name(self) -> &'static str {
        match self {
            XKind::Int => "int",
            XKind::Float => "float",
            XKind::Label => "label",
        }
    }
}

impl FromStr for XKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(XKind::Int),
            "float" => Ok(XKind::Float),
            "label" | "text" => Ok(XKind::Label),
            other => Err(format!("Unknown x kind {other:?} (expected int, float or label)")),
        }
    }
}

/// Value of the quantity that changed between the compared runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndependentValue {
    Int(i64),
    /// Rounded to the configured number of decimals on construction.
    Float(OrderedFloat<f64>),
    Label(String),
}

impl IndependentValue {
    pub fn float(value: f64, decimals: u32) -> Self {
        let scale = 10_f64.powi(decimals as i32);
        IndependentValue::Float(OrderedFloat((value * scale).round() / scale))
    }

    pub fn parse(kind: XKind, value: &str, decimals: u32) -> Result<Self, ComparisonError> {
        let value = value.trim();
        let invalid = || ComparisonError::InvalidValue {
            kind: kind.name(),
            value: value.to_string(),
        };
        match kind {
            XKind::Int => value.parse().map(IndependentValue::Int).map_err(|_| invalid()),
            XKind::Float => value
                .parse::<f64>()
                .ok()
                .filter(|parsed| parsed.is_finite())
                .map(|parsed| Self::float(parsed, decimals))
                .ok_or_else(invalid),
            XKind::Label => Ok(IndependentValue::Label(value.to_string())),
        }
    }
}

impl fmt::Display for IndependentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndependentValue::Int(value) => write!(f, "{value}"),
            IndependentValue::Float(value) => write!(f, "{}", value.0),
            IndependentValue::Label(value) => f.write_str(value),
        }
    }
}

/// Several Monte Carlo runs that differ in one quantity, e.g. the learning
/// rate, compared network by network.
#[derive(Debug, Clone)]
pub struct RunComparison {
    label: String,
    x: Vec<IndependentValue>,
    runs: Vec<MonteCarloAnalyzer>,
    config: ReportConfig,
    colors: ColorMap,
    output: ChartOutput,
}

impl RunComparison {
    /// Open the `run_data` file of every run; `x[i]` describes `paths[i]`.
    pub fn new(
        label: impl Into<String>,
        x: Vec<IndependentValue>,
        paths: &[PathBuf],
        config: ReportConfig,
    ) -> Result<Self, ComparisonError> {
        if x.len() != paths.len() {
            let err = ComparisonError::LengthMismatch {
                x: x.len(),
                paths: paths.len(),
            };
            tracing::error!("{err}");
            return Err(err);
        }
        let config = config.normalized();
        let runs = paths
            .iter()
            .map(|path| MonteCarloAnalyzer::open(path, config.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            label: label.into(),
            x,
            runs,
            colors: config.color_map(),
            output: ChartOutput::from_config(&config),
            config,
        })
    }

    pub fn with_output(mut self, output: ChartOutput) -> Self {
        self.output = output;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn x(&self) -> &[IndependentValue] {
        &self.x
    }

    pub fn runs(&self) -> &[MonteCarloAnalyzer] {
        &self.runs
    }

    /// One box per `(run, network)` of `key` at `step`.
    ///
    /// `StepSelector::Final` uses the final step of each run. The chart is
    /// written next to `out`, named after it without the extension.
    pub fn box_plot(
        &mut self,
        key: &str,
        step: StepSelector,
        out: &Path,
    ) -> Result<Vec<PathBuf>, ComparisonError> {
        let mut groups = Vec::new();
        for (run, x) in self.runs.iter().zip(&self.x) {
            let Some(step) = step.resolve(run.data()) else {
                tracing::warn!("Run in {} has no data; skipping it", run.dir().display());
                continue;
            };
            for network in run.data().networks() {
                let name = display_name(network);
                groups.push(BoxGroup {
                    values: run.data().select(network, step, key),
                    color: self.colors.color_for(&name),
                    name: format!("{name} {x}"),
                });
            }
        }
        let figure = boxplot::figure(
            &groups,
            BoxLayout {
                title: format!("{} Box Plot", self.label),
                x_title: None,
                y_title: key,
                dtick: self.config.box_dtick,
                show_legend: true,
            },
        );
        let (dir, stem) = split_output(out);
        Ok(self.output.write(&figure, &dir, &stem)?)
    }

    /// Describe every tracked metric of each `(run, network)` at `step` into
    /// `<dir>/<network>_<x>_stats.csv`.
    pub fn save_stats_csv(
        &self,
        dir: &Path,
        step: StepSelector,
    ) -> Result<Vec<PathBuf>, ComparisonError> {
        let mut written = Vec::new();
        for (run, x) in self.runs.iter().zip(&self.x) {
            let Some(step) = step.resolve(run.data()) else {
                tracing::warn!("Run in {} has no data; skipping it", run.dir().display());
                continue;
            };
            let summary = StatSummary::compute(run.data(), &self.config.tracked_metrics);
            for network in summary.networks() {
                let Some(step_summary) = network.step(step) else {
                    tracing::warn!("{:?} has no rows at step {step}", network.network);
                    continue;
                };
                let path = dir.join(format!(
                    "{}_{}_stats.csv",
                    network.network.replace(' ', "_"),
                    file_stem(&x.to_string())
                ));
                let write_err = |source| StatsError::Write {
                    path: path.clone(),
                    source,
                };
                let mut writer = writer_at(&path).map_err(StatsError::from)?;
                let mut header = vec!["stats"];
                header.extend(summary.metrics().iter().map(String::as_str));
                writer.write_record(&header).map_err(write_err)?;
                for kind in StatKind::ALL {
                    let mut row = vec![kind.to_string()];
                    row.extend(
                        step_summary
                            .metrics
                            .iter()
                            .map(|describe| format_value(describe.get(kind))),
                    );
                    writer.write_record(&row).map_err(write_err)?;
                }
                writer
                    .flush()
                    .map_err(|source| write_err(csv::Error::from(source)))?;
                tracing::info!(
                    "Saved {} statistics at step {step} to {}",
                    network.network,
                    path.display()
                );
                written.push(path);
            }
        }
        Ok(written)
    }
}

/// Directory and file stem of a chart target like `out/lr.html`.
fn split_output(out: &Path) -> (PathBuf, String) {
    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let stem = match out.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "svg") => out.file_stem(),
        _ => out.file_name(),
    };
    let stem = stem
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "comparison".to_string());
    (dir, stem)
}
