use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::csv_io::{RawFrame, format_value, record_from_row, writer_at};
use super::{LoadError, NETWORK_COLUMN, PATH_COLUMN, RUN_COLUMN, RunRecord, RunTable, STEP_COLUMN};

/// File name the analyzer persists its full table under.
pub const RUN_DATA_FILE: &str = "run_data.csv";

/// One record tagged with the run it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub run: String,
    pub path: PathBuf,
    pub record: RunRecord,
}

/// Union of run tables over a shared metric schema.
///
/// Rows keep the order of their source table; tables follow the order they
/// were supplied in. Metrics absent from one table are missing cells there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedTable {
    metrics: Vec<String>,
    rows: Vec<AggregatedRow>,
}

impl AggregatedTable {
    /// Concatenate `(run label, table)` pairs.
    pub fn from_tables<'a>(tables: impl IntoIterator<Item = (&'a str, &'a RunTable)>) -> Self {
        let mut aggregated = Self::default();
        for (label, table) in tables {
            aggregated.push_table(label, table);
        }
        aggregated
    }

    /// Build a table directly from tagged rows over `metrics`.
    pub fn from_rows(metrics: Vec<String>, rows: Vec<AggregatedRow>) -> Self {
        let width = metrics.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.record.values.resize(width, None);
                row
            })
            .collect();
        Self { metrics, rows }
    }

    /// Append every record of `table`, widening the schema as needed.
    pub fn push_table(&mut self, label: &str, table: &RunTable) {
        let positions = table
            .metrics
            .iter()
            .map(|metric| self.ensure_metric(metric))
            .collect::<Vec<_>>();
        let width = self.metrics.len();
        for row in &mut self.rows {
            row.record.values.resize(width, None);
        }
        for record in &table.records {
            let mut values = vec![None; width];
            for (source_idx, target_idx) in positions.iter().enumerate() {
                values[*target_idx] = record.values.get(source_idx).copied().flatten();
            }
            self.rows.push(AggregatedRow {
                run: label.to_string(),
                path: table.path.clone(),
                record: RunRecord {
                    network: record.network.clone(),
                    step: record.step,
                    values,
                },
            });
        }
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn rows(&self) -> &[AggregatedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|name| name == metric)
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.metric_index(metric).is_some()
    }

    /// Networks in order of first appearance.
    pub fn networks(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .map(|row| row.record.network.as_str())
            .filter(|network| seen.insert(*network))
            .collect()
    }

    /// Steps in order of first appearance, optionally for one network.
    pub fn steps(&self, network: Option<&str>) -> Vec<u64> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|row| network.is_none_or(|network| row.record.network == network))
            .map(|row| row.record.step)
            .filter(|step| seen.insert(*step))
            .collect()
    }

    pub fn max_step(&self) -> Option<u64> {
        self.rows.iter().map(|row| row.record.step).max()
    }

    pub fn min_step(&self) -> Option<u64> {
        self.rows.iter().map(|row| row.record.step).min()
    }

    /// Non-missing values of `metric` for one `(network, step)` group.
    pub fn select(&self, network: &str, step: u64, metric: &str) -> Vec<f64> {
        let Some(idx) = self.metric_index(metric) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter(|row| row.record.network == network && row.record.step == step)
            .filter_map(|row| row.record.values[idx])
            .collect()
    }

    /// Persist as `network,step,run,path,<metrics…>`.
    pub fn write_csv(&self, path: &Path) -> Result<(), LoadError> {
        let write_err = |source| LoadError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = writer_at(path)?;
        let mut header = vec![NETWORK_COLUMN, STEP_COLUMN, RUN_COLUMN, PATH_COLUMN];
        header.extend(self.metrics.iter().map(String::as_str));
        writer.write_record(&header).map_err(write_err)?;
        for row in &self.rows {
            let mut cells = vec![
                row.record.network.clone(),
                row.record.step.to_string(),
                row.run.clone(),
                row.path.display().to_string(),
            ];
            cells.extend(
                row.record
                    .values
                    .iter()
                    .map(|value| value.map(format_value).unwrap_or_default()),
            );
            writer.write_record(&cells).map_err(write_err)?;
        }
        writer
            .flush()
            .map_err(|source| write_err(csv::Error::from(source)))?;
        Ok(())
    }

    /// Read a table written by [`write_csv`](Self::write_csv) or any run file.
    ///
    /// Rows without `run`/`path` tags are attributed to the file itself.
    pub fn read_csv(path: &Path) -> Result<Self, LoadError> {
        let frame = RawFrame::read(path)?;
        let layout = frame.layout();
        let label = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let mut rows = Vec::with_capacity(frame.rows.len());
        for (row_idx, cells) in frame.rows.iter().enumerate() {
            let record = record_from_row(&layout, cells, row_idx, path, &label)?;
            let tag = |column: Option<usize>| {
                column
                    .and_then(|idx| cells.get(idx))
                    .filter(|cell| !cell.is_empty())
                    .cloned()
            };
            rows.push(AggregatedRow {
                run: tag(layout.run).unwrap_or_else(|| label.clone()),
                path: tag(layout.path)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| path.to_path_buf()),
                record,
            });
        }
        Ok(Self {
            metrics: layout.metrics.into_iter().map(|(_, name)| name).collect(),
            rows,
        })
    }

    fn ensure_metric(&mut self, metric: &str) -> usize {
        if let Some(idx) = self.metric_index(metric) {
            return idx;
        }
        self.metrics.push(metric.to_string());
        self.metrics.len() - 1
    }
}
