use std::path::{Path, PathBuf};

use crate::color::ColorMap;
use crate::config::ReportConfig;
use crate::figure::{ChartOutput, RenderError};
use crate::plots::distribution::{BandSeries, band_figure};
use crate::plots::line::{
    Extremum, LineSource, TrainTestSeries, progress_figure, train_vs_test_figure,
};
use crate::plots::{LINES_DIR, display_name, file_stem};
use crate::results::{LoadError, ResultLoader};
use crate::stats::{NetworkStats, StatKind};

/// Charts drawn from the per-network statistics files of a Monte Carlo run.
#[derive(Debug, Clone)]
pub struct MonteCarloPlotter {
    loader: ResultLoader<NetworkStats>,
    output: ChartOutput,
    decimals: usize,
}

impl MonteCarloPlotter {
    pub fn new(dir: impl Into<PathBuf>, config: &ReportConfig) -> Result<Self, LoadError> {
        Ok(Self {
            loader: ResultLoader::new(dir, &config.stats_suffix)?,
            output: ChartOutput::from_config(config),
            decimals: config.float_decimals as usize,
        })
    }

    pub fn with_output(mut self, output: ChartOutput) -> Self {
        self.output = output;
        self
    }

    pub fn dir(&self) -> &Path {
        self.loader.dir()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.loader.labels()
    }

    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.loader.reload()
    }

    fn lines_dir(&self) -> PathBuf {
        self.dir().join(LINES_DIR)
    }

    /// Mean progress of every column containing `key`.
    pub fn plot_key(&self, key: &str) -> Result<Vec<PathBuf>, RenderError> {
        let mut sources = Vec::new();
        for entry in self.loader.entries() {
            let stats = &entry.table;
            let mut columns = Vec::new();
            for metric in stats.metrics().iter().filter(|metric| metric.contains(key)) {
                match stats.series(StatKind::Mean, metric) {
                    Some(values) => columns.push((metric.clone(), values)),
                    None => {
                        tracing::warn!("{} has no mean rows for {metric:?}", entry.path.display())
                    }
                }
            }
            sources.push(LineSource {
                label: entry.label.clone(),
                x: steps_of(stats),
                columns,
            });
        }
        let figure = progress_figure(&sources, key, Extremum::for_key(key), self.decimals);
        let stem = format!("montecarlo_{}_progress", file_stem(key));
        self.output.write(&figure, &self.lines_dir(), &stem)
    }

    /// Percentile bands of `key` for every network.
    pub fn plot_distribution(
        &self,
        key: &str,
        full_border: bool,
        colors: &mut ColorMap,
    ) -> Result<Vec<PathBuf>, RenderError> {
        let mut bands = Vec::new();
        for entry in self.loader.entries() {
            let color = colors.color_for(&display_name(&entry.label));
            match BandSeries::from_stats(&entry.table, key, color) {
                Some(band) => bands.push(band),
                None => tracing::warn!(
                    "{} lacks the statistics needed for a {key:?} band; skipping it",
                    entry.path.display()
                ),
            }
        }
        let figure = band_figure(&bands, key, full_border)?;
        let stem = format!("montecarlo_{}", file_stem(key));
        self.output.write(&figure, &self.lines_dir(), &stem)
    }

    /// `train <key>` against `test <key>`, using the median rows when `median`.
    pub fn plot_train_vs_test(&self, key: &str, median: bool) -> Result<Vec<PathBuf>, RenderError> {
        let (kind, statistic) = if median {
            (StatKind::Median, "median")
        } else {
            (StatKind::Mean, "mean")
        };
        let mut series = Vec::new();
        for entry in self.loader.entries() {
            let pick = |split: &str| {
                let metric = format!("{split} {key}");
                let values = entry.table.series(kind, &metric);
                if values.is_none() {
                    tracing::warn!("{} has no {statistic} of {metric:?}", entry.path.display());
                }
                values
            };
            let (test, train) = (pick("test"), pick("train"));
            if test.is_none() && train.is_none() {
                continue;
            }
            series.push(TrainTestSeries {
                label: entry.label.clone(),
                steps: steps_of(&entry.table),
                test,
                train,
            });
        }
        let figure = train_vs_test_figure(&series, key, statistic);
        let stem = format!("montecarlo_{}_{statistic}", file_stem(key));
        self.output.write(&figure, &self.lines_dir(), &stem)
    }
}

fn steps_of(stats: &NetworkStats) -> Vec<f64> {
    stats.steps().iter().map(|step| *step as f64).collect()
}
