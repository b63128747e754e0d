use std::path::{Path, PathBuf};

use super::{
    LoadError, NETWORK_COLUMN, PATH_COLUMN, RUN_COLUMN, RunRecord, RunTable, STEP_COLUMN,
};

/// Header and string cells of one delimited file.
#[derive(Debug, Clone)]
pub(crate) struct RawFrame {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

/// Column positions of the identity columns plus the numeric metric columns.
#[derive(Debug, Default)]
pub(crate) struct ColumnLayout {
    pub(crate) network: Option<usize>,
    pub(crate) step: Option<usize>,
    pub(crate) run: Option<usize>,
    pub(crate) path: Option<usize>,
    pub(crate) metrics: Vec<(usize, String)>,
}

impl RawFrame {
    pub(crate) fn read(path: &Path) -> Result<Self, LoadError> {
        let read_err = |source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(read_err)?;
        let headers = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub(crate) fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub(crate) fn require_column(&self, path: &Path, name: &str) -> Result<usize, LoadError> {
        self.column_index(name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    }

    /// Whether every non-empty cell of the column parses as a number.
    pub(crate) fn is_numeric_column(&self, idx: usize) -> bool {
        self.rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter(|cell| !cell.is_empty())
            .all(|cell| cell.parse::<f64>().is_ok())
    }

    /// Numeric metric columns, skipping the given identity columns.
    pub(crate) fn metric_columns(&self, reserved: &[Option<usize>]) -> Vec<(usize, String)> {
        let mut metrics = Vec::new();
        for (idx, header) in self.headers.iter().enumerate() {
            if reserved.contains(&Some(idx)) || is_index_header(header) {
                continue;
            }
            if self.is_numeric_column(idx) {
                metrics.push((idx, header.clone()));
            } else {
                tracing::debug!("Ignoring text column {header:?}");
            }
        }
        metrics
    }

    pub(crate) fn layout(&self) -> ColumnLayout {
        let mut layout = ColumnLayout {
            network: self.column_index(NETWORK_COLUMN),
            step: self.column_index(STEP_COLUMN),
            run: self.column_index(RUN_COLUMN),
            path: self.column_index(PATH_COLUMN),
            metrics: Vec::new(),
        };
        layout.metrics =
            self.metric_columns(&[layout.network, layout.step, layout.run, layout.path]);
        layout
    }

    pub(crate) fn into_run_table(self, path: &Path, label: &str) -> Result<RunTable, LoadError> {
        let layout = self.layout();
        let mut records = Vec::with_capacity(self.rows.len());
        let mut unnamed_rows = Vec::new();
        for (row_idx, row) in self.rows.iter().enumerate() {
            if network_cell(&layout, row).is_none() {
                unnamed_rows.push(row_idx);
            }
            records.push(record_from_row(&layout, row, row_idx, path, label)?);
        }
        Ok(RunTable {
            label: label.to_string(),
            path: path.to_path_buf(),
            metrics: layout.metrics.into_iter().map(|(_, name)| name).collect(),
            records,
            unnamed_rows,
        })
    }
}

/// Non-empty `network` cell of a row.
fn network_cell<'a>(layout: &ColumnLayout, row: &'a [String]) -> Option<&'a String> {
    layout
        .network
        .and_then(|idx| row.get(idx))
        .filter(|cell| !cell.is_empty())
}

pub(crate) fn record_from_row(
    layout: &ColumnLayout,
    row: &[String],
    row_idx: usize,
    path: &Path,
    label: &str,
) -> Result<RunRecord, LoadError> {
    let network = network_cell(layout, row)
        .cloned()
        .unwrap_or_else(|| label.to_string());
    let step = match layout.step.and_then(|idx| row.get(idx)) {
        Some(cell) => parse_step(cell).ok_or_else(|| LoadError::InvalidStep {
            path: path.to_path_buf(),
            row: row_idx,
            value: cell.clone(),
        })?,
        None => row_idx as u64,
    };
    let values = layout
        .metrics
        .iter()
        .map(|(idx, _)| row.get(*idx).and_then(|cell| parse_value(cell)))
        .collect();
    Ok(RunRecord {
        network,
        step,
        values,
    })
}

/// Parse a numeric cell; empty and `NaN` cells are missing.
pub(crate) fn parse_value(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Format a numeric cell; missing values become empty cells.
pub(crate) fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

pub(crate) fn parse_step(cell: &str) -> Option<u64> {
    if let Ok(step) = cell.parse::<u64>() {
        return Some(step);
    }
    // Training loops that store steps as floats write `3.0`.
    let value = cell.parse::<f64>().ok()?;
    (value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64).then_some(value as u64)
}

pub(crate) fn create_parent(path: &Path) -> Result<(), LoadError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|source| LoadError::CreateDir {
        path: PathBuf::from(parent),
        source,
    })
}

/// Open a CSV writer at `path`, creating parent directories.
pub(crate) fn writer_at(path: &Path) -> Result<csv::Writer<std::fs::File>, LoadError> {
    create_parent(path)?;
    csv::Writer::from_path(path).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn is_index_header(header: &str) -> bool {
    header.is_empty() || header.starts_with("Unnamed:")
}
