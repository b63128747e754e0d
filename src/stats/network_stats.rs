use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::StatKind;
use crate::results::{LoadError, RawFrame, TableFile, parse_step, parse_value};

/// A per-network statistics file read back from disk.
///
/// Rows are keyed by `(step, stats)`; columns are metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    pub label: String,
    pub path: PathBuf,
    metrics: Vec<String>,
    steps: Vec<u64>,
    cells: BTreeMap<(u64, StatKind), Vec<f64>>,
}

impl NetworkStats {
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.metrics.iter().any(|name| name == metric)
    }

    /// Steps in file order.
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    /// Whether any row carries the given statistic.
    pub fn has_stat(&self, kind: StatKind) -> bool {
        self.cells.keys().any(|(_, stat)| *stat == kind)
    }

    /// Values of `metric` for one statistic across all steps.
    ///
    /// Steps without that statistic yield `NaN`; `None` if the metric is unknown
    /// or the statistic appears nowhere in the file.
    pub fn series(&self, kind: StatKind, metric: &str) -> Option<Vec<f64>> {
        let idx = self.metrics.iter().position(|name| name == metric)?;
        if !self.has_stat(kind) {
            return None;
        }
        Some(
            self.steps
                .iter()
                .map(|step| {
                    self.cells
                        .get(&(*step, kind))
                        .and_then(|values| values.get(idx).copied())
                        .unwrap_or(f64::NAN)
                })
                .collect(),
        )
    }
}

impl TableFile for NetworkStats {
    fn read(path: &Path, label: &str) -> Result<Self, LoadError> {
        let frame = RawFrame::read(path)?;
        let step_col = frame.require_column(path, "step")?;
        let stat_col = frame.require_column(path, "stats")?;
        let metric_cols = frame.metric_columns(&[Some(step_col), Some(stat_col)]);

        let mut seen = BTreeSet::new();
        let mut steps = Vec::new();
        let mut cells = BTreeMap::new();
        for (row_idx, row) in frame.rows.iter().enumerate() {
            let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or_default();
            let step = parse_step(cell(step_col)).ok_or_else(|| LoadError::InvalidStep {
                path: path.to_path_buf(),
                row: row_idx,
                value: cell(step_col).to_string(),
            })?;
            let kind = cell(stat_col)
                .parse::<StatKind>()
                .map_err(|_| LoadError::InvalidValue {
                    path: path.to_path_buf(),
                    row: row_idx,
                    column: "stats".to_string(),
                    value: cell(stat_col).to_string(),
                })?;
            if seen.insert(step) {
                steps.push(step);
            }
            let values = metric_cols
                .iter()
                .map(|(idx, _)| parse_value(cell(*idx)).unwrap_or(f64::NAN))
                .collect();
            cells.insert((step, kind), values);
        }

        Ok(Self {
            label: label.to_string(),
            path: path.to_path_buf(),
            metrics: metric_cols.into_iter().map(|(_, name)| name).collect(),
            steps,
            cells,
        })
    }

    fn row_count(&self) -> usize {
        self.cells.len()
    }
}
