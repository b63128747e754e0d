use std::path::{Path, PathBuf};

use crate::config::ReportConfig;
use crate::figure::{ChartOutput, RenderError};
use crate::plots::line::{Extremum, LineSource, progress_figure};
use crate::plots::{LINES_DIR, file_stem};
use crate::results::{AggregatedTable, LoadError, ResultLoader, RunTable};

use super::LINE_KEYS;

/// Loss and accuracy progress of the runs written during one training.
///
/// Wraps a [`ResultLoader`] over the fit result files of one directory and
/// writes its charts under `plots/lines/`.
#[derive(Debug, Clone)]
pub struct Plotter {
    loader: ResultLoader<RunTable>,
    output: ChartOutput,
    metadata_suffix: String,
    decimals: usize,
}

impl Plotter {
    pub fn new(dir: impl Into<PathBuf>, config: &ReportConfig) -> Result<Self, LoadError> {
        Ok(Self {
            loader: ResultLoader::new(dir, &config.fit_suffix)?,
            output: ChartOutput::from_config(config),
            metadata_suffix: config.metadata_suffix.clone(),
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

    /// Every run tagged and concatenated, read afresh from disk.
    ///
    /// Rows without a `network` cell take the name of the metadata file.
    pub fn aggregate(&mut self) -> Result<AggregatedTable, LoadError> {
        self.loader.aggregate_named(&self.metadata_suffix)
    }

    pub fn network_name(&self) -> Result<Option<String>, LoadError> {
        self.loader.network_name(&self.metadata_suffix)
    }

    /// Draw every column containing `key` against the steps of its run.
    pub fn plot_key(&self, key: &str) -> Result<Vec<PathBuf>, RenderError> {
        let sources: Vec<LineSource> = self
            .loader
            .entries()
            .iter()
            .map(|entry| LineSource {
                label: entry.label.clone(),
                x: entry.table.records.iter().map(|record| record.step as f64).collect(),
                columns: entry
                    .table
                    .metrics_matching(key)
                    .filter_map(|metric| Some((metric.to_string(), entry.table.column(metric)?)))
                    .collect(),
            })
            .collect();
        if sources.iter().all(|source| source.columns.is_empty()) {
            tracing::warn!("No column matching {key:?} in {}", self.dir().display());
        }
        let figure = progress_figure(&sources, key, Extremum::for_key(key), self.decimals);
        self.output
            .write(&figure, &self.dir().join(LINES_DIR), &file_stem(key))
    }

    /// Loss and accuracy charts; an empty result set is reported and skipped.
    pub fn plot_everything(&self) -> Result<Vec<PathBuf>, RenderError> {
        if self.loader.is_empty() {
            tracing::error!("Empty result set to plot in {}", self.dir().display());
            return Ok(Vec::new());
        }
        let mut written = Vec::new();
        for key in LINE_KEYS {
            written.extend(self.plot_key(key)?);
        }
        Ok(written)
    }
}
