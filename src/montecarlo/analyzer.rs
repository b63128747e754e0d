use std::path::{Path, PathBuf};

use crate::app_dirs::{self, DEFAULT_MONTECARLO_DIR};
use crate::color::ColorMap;
use crate::config::{ReportConfig, with_csv_extension};
use crate::confusion::{ConfusionMatrix, ConfusionReplicates};
use crate::figure::ChartOutput;
use crate::plots::boxplot::{self, BoxGroup, BoxLayout};
use crate::plots::heatmap::confusion_figure;
use crate::plots::histogram::{self, Hist3dGroup, HistGroup};
use crate::plots::{BOX_PLOT_DIR, CONFUSION_DIR, HISTOGRAM_DIR, display_name, file_stem};
use crate::results::{AggregatedTable, RUN_DATA_FILE};
use crate::stats::StatSummary;

use super::{AnalyzerError, LINE_KEYS, MonteCarloPlotter, StepSelector};

/// An averaged confusion matrix and the file it is saved to.
#[derive(Debug, Clone, PartialEq)]
struct SavedConfusion {
    name: String,
    file_name: PathBuf,
    matrix: ConfusionMatrix,
}

/// All results of one Monte Carlo run: the aggregated table, its statistics
/// files and every chart drawn from them.
///
/// Everything is written below one directory, which also holds `run_data.csv`.
#[derive(Debug, Clone)]
pub struct MonteCarloAnalyzer {
    dir: PathBuf,
    data: AggregatedTable,
    confusion: Vec<SavedConfusion>,
    config: ReportConfig,
    colors: ColorMap,
    output: ChartOutput,
    plotter: MonteCarloPlotter,
}

impl MonteCarloAnalyzer {
    /// Load a saved `run_data` file; `.csv` is appended when missing.
    ///
    /// Outputs go to the directory containing the file.
    pub fn open(path: impl AsRef<Path>, config: ReportConfig) -> Result<Self, AnalyzerError> {
        let path = PathBuf::from(with_csv_extension(&path.as_ref().to_string_lossy()));
        let data = AggregatedTable::read_csv(&path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tracing::info!("Loaded {} rows from {}", data.len(), path.display());
        Self::build(dir, data, config)
    }

    /// Use `dir` for `table`, persisting it as `run_data.csv` there.
    pub fn with_data(
        dir: impl Into<PathBuf>,
        table: AggregatedTable,
        config: ReportConfig,
    ) -> Result<Self, AnalyzerError> {
        let dir = dir.into();
        app_dirs::create_dir(&dir)?;
        table.write_csv(&dir.join(RUN_DATA_FILE))?;
        Self::build(dir, table, config)
    }

    /// Like [`with_data`](Self::with_data) in a fresh timestamped directory
    /// under `./log/montecarlo/`.
    pub fn in_default_dir(
        table: AggregatedTable,
        config: ReportConfig,
    ) -> Result<Self, AnalyzerError> {
        let dir = app_dirs::timestamped_dir(Path::new(DEFAULT_MONTECARLO_DIR))?;
        Self::with_data(dir, table, config)
    }

    fn build(
        dir: PathBuf,
        data: AggregatedTable,
        config: ReportConfig,
    ) -> Result<Self, AnalyzerError> {
        let config = config.normalized();
        let output = ChartOutput::from_config(&config);
        let plotter = MonteCarloPlotter::new(dir.clone(), &config)?.with_output(output.clone());
        Ok(Self {
            dir,
            data,
            confusion: Vec::new(),
            colors: config.color_map(),
            config,
            output,
            plotter,
        })
    }

    /// Replace the chart output of the analyzer and its statistics plotter.
    pub fn with_output(mut self, output: ChartOutput) -> Self {
        self.plotter = self.plotter.with_output(output.clone());
        self.output = output;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn data(&self) -> &AggregatedTable {
        &self.data
    }

    pub fn plotter(&self) -> &MonteCarloPlotter {
        &self.plotter
    }

    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    /// Averaged confusion matrices by network name.
    pub fn confusion_matrices(&self) -> impl Iterator<Item = (&str, &ConfusionMatrix)> {
        self.confusion
            .iter()
            .map(|saved| (saved.name.as_str(), &saved.matrix))
    }

    /// Swap in new run data and confusion replicates, then rewrite every
    /// statistics file and reload the statistics plotter.
    pub fn set_data(
        &mut self,
        table: AggregatedTable,
        confusion: Vec<ConfusionReplicates>,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        table.write_csv(&self.dir.join(RUN_DATA_FILE))?;
        self.data = table;
        for replicates in confusion {
            let matrix = replicates.average()?;
            let file_name = replicates.file_name();
            self.confusion.retain(|saved| saved.name != replicates.name);
            self.confusion.push(SavedConfusion {
                name: replicates.name,
                file_name,
                matrix,
            });
        }
        let written = self.save_stat_results()?;
        self.plotter.reload()?;
        Ok(written)
    }

    /// Write the per-network statistics and the averaged confusion matrices.
    pub fn save_stat_results(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let summary = StatSummary::compute(&self.data, &self.config.tracked_metrics);
        let mut written = summary.write_network_files(&self.dir, &self.config.stats_suffix)?;
        for saved in &self.confusion {
            let path = self.dir.join(&saved.file_name);
            saved.matrix.write_csv(&path)?;
            tracing::info!("Saved confusion matrix of {:?} to {}", saved.name, path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn resolve_step(&self, step: StepSelector) -> Result<u64, AnalyzerError> {
        let Some(resolved) = step.resolve(&self.data) else {
            return Err(AnalyzerError::NoData(self.dir.display().to_string()));
        };
        if !self.data.steps(None).contains(&resolved) {
            return Err(AnalyzerError::UnknownStep { step: resolved });
        }
        Ok(resolved)
    }

    /// Whether `key` can be drawn; absent metrics are warned about.
    fn has_metric(&self, key: &str) -> bool {
        let present = self.data.has_metric(key);
        if !present {
            tracing::warn!("Metric {key:?} is not in the run data; skipping its chart");
        }
        present
    }

    fn networks(&self) -> Vec<String> {
        self.data.networks().into_iter().map(str::to_string).collect()
    }

    /// One notched box per network at `step`.
    pub fn box_plot(
        &mut self,
        step: StepSelector,
        key: &str,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        if !self.has_metric(key) {
            return Ok(Vec::new());
        }
        let step = self.resolve_step(step)?;
        let groups: Vec<BoxGroup> = self
            .networks()
            .into_iter()
            .map(|network| {
                let name = display_name(&network);
                BoxGroup {
                    values: self.data.select(&network, step, key),
                    color: self.colors.color_for(&name),
                    name,
                }
            })
            .collect();
        let figure = boxplot::figure(
            &groups,
            BoxLayout {
                title: format!("Montecarlo Box Plot {key}"),
                x_title: Some("network"),
                y_title: key,
                dtick: self.config.box_dtick,
                show_legend: false,
            },
        );
        let stem = format!("montecarlo_{}_box_plot", file_stem(key));
        Ok(self.output.write(&figure, &self.dir.join(BOX_PLOT_DIR), &stem)?)
    }

    /// Staircase histograms of `key` per network at each of `steps`.
    ///
    /// Without explicit steps, log-spaced steps of the run are used. Steps
    /// missing from the data are warned about and skipped.
    pub fn plot_3d_hist(
        &mut self,
        steps: Option<&[u64]>,
        key: &str,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        if !self.has_metric(key) {
            return Ok(Vec::new());
        }
        let present = self.data.steps(None);
        let steps = match steps {
            Some(steps) => steps.to_vec(),
            None => histogram::default_steps(&present, self.config.histogram_3d_steps),
        };
        let mut groups = Vec::new();
        for step in steps {
            if !present.contains(&step) {
                tracing::warn!("Step {step} is not in the run data; skipping it");
                continue;
            }
            for network in self.networks() {
                let values = self.data.select(&network, step, key);
                if values.is_empty() {
                    tracing::debug!("No {key:?} values for {network:?} at step {step}");
                    continue;
                }
                groups.push(Hist3dGroup {
                    color: self.colors.color_for(&display_name(&network)),
                    network,
                    step,
                    values,
                });
            }
        }
        let figure = histogram::figure_3d(&groups, key, self.config.histogram_bins)?;
        let stem = format!("montecarlo_{}_3d_histogram", file_stem(key));
        Ok(self.output.write(&figure, &self.dir.join(HISTOGRAM_DIR), &stem)?)
    }

    /// Overlaid histograms of `key` per network at `step`.
    pub fn plot_histogram(
        &mut self,
        key: &str,
        step: StepSelector,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        if !self.has_metric(key) {
            return Ok(Vec::new());
        }
        let step = self.resolve_step(step)?;
        let groups: Vec<HistGroup> = self
            .networks()
            .into_iter()
            .map(|network| HistGroup {
                values: self.data.select(&network, step, key),
                color: self.colors.color_for(&display_name(&network)),
                name: network,
            })
            .collect();
        let figure = histogram::overlay_figure(&groups, key, self.config.histogram_bin_size);
        let stem = format!("montecarlo_{}_histogram", file_stem(key));
        Ok(self.output.write(&figure, &self.dir.join(HISTOGRAM_DIR), &stem)?)
    }

    /// Heatmap of every averaged confusion matrix.
    pub fn plot_confusion_matrices(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut written = Vec::new();
        for saved in &self.confusion {
            let title = format!("{} confusion matrix", display_name(&saved.name));
            let figure = confusion_figure(&saved.matrix, &title);
            let stem = format!("{}_confusion_matrix", file_stem(&saved.name));
            written.extend(self.output.write(&figure, &self.dir.join(CONFUSION_DIR), &stem)?);
        }
        Ok(written)
    }

    /// Statistics files followed by every chart of the run.
    ///
    /// A chart that fails is reported and the remaining charts are still
    /// drawn. Returns the written paths.
    pub fn do_all(&mut self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut written = self.save_stat_results()?;
        self.plotter.reload()?;

        let mut keep = |label: &str, result: Result<Vec<PathBuf>, AnalyzerError>| match result {
            Ok(paths) => written.extend(paths),
            Err(err) => tracing::error!("Failed to draw {label}: {err}"),
        };
        for key in LINE_KEYS {
            for median in [false, true] {
                let result = self
                    .plotter
                    .plot_train_vs_test(key, median)
                    .map_err(AnalyzerError::from);
                keep(&format!("train vs test {key}"), result);
            }
        }
        for key in self.config.tracked_metrics.clone() {
            keep(&format!("{key} 3-D histogram"), self.plot_3d_hist(None, &key));
            let result = self
                .plotter
                .plot_distribution(&key, true, &mut self.colors)
                .map_err(AnalyzerError::from);
            keep(&format!("{key} distribution"), result);
            keep(&format!("{key} box plot"), self.box_plot(StepSelector::Final, &key));
            keep(&format!("{key} histogram"), self.plot_histogram(&key, StepSelector::Final));
        }
        keep("confusion matrices", self.plot_confusion_matrices());
        Ok(written)
    }
}
