//! Per-run training result tables and their discovery on disk.
//!
//! A training process writes one delimited file per run. Each file is parsed
//! into a [`RunTable`]; a [`ResultLoader`] keeps the ordered set of tables for
//! one directory and rebuilds it from scratch on every reload.

mod aggregate;
mod csv_io;
mod loader;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use aggregate::{AggregatedRow, AggregatedTable, RUN_DATA_FILE};
pub use loader::{LoadedTable, ResultLoader, label_from_file_name, trailing_number};

pub(crate) use csv_io::{RawFrame, format_value, parse_step, parse_value, writer_at};

/// Name of the column holding the network identifier.
pub const NETWORK_COLUMN: &str = "network";
/// Name of the column holding the training step.
pub const STEP_COLUMN: &str = "step";
/// Name of the column tagging rows with their originating run.
pub const RUN_COLUMN: &str = "run";
/// Name of the column tagging rows with their originating file.
pub const PATH_COLUMN: &str = "path";

/// Errors raised while reading, joining or writing result tables.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The results directory does not exist.
    #[error("Path {path} does not exist")]
    MissingDir { path: PathBuf },
    /// Listing the results directory failed.
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Reading or parsing a delimited file failed.
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },
    /// Writing a delimited file failed.
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
    /// Creating an output directory failed.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A required column is absent.
    #[error("{path} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: String },
    /// A step cell is not a non-negative integer.
    #[error("{path} row {row}: invalid step {value:?}")]
    InvalidStep {
        path: PathBuf,
        row: usize,
        value: String,
    },
    /// A cell has an unexpected value.
    #[error("{path} row {row}, column {column:?}: invalid value {value:?}")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    /// Tables of one collection do not have the same number of rows.
    #[error("Data frame {label:?} length should have been {expected} and was {found}")]
    LengthMismatch {
        label: String,
        expected: usize,
        found: usize,
    },
    /// No file in the directory matched the suffix.
    #[error("No files ending in {suffix:?} in {dir}")]
    Empty { dir: PathBuf, suffix: String },
}

/// A table type that can be discovered and parsed by a [`ResultLoader`].
pub trait TableFile: Sized {
    /// Parse the file at `path`; `label` is the name derived from the file name.
    fn read(path: &Path, label: &str) -> Result<Self, LoadError>;

    /// Number of data rows in the table.
    fn row_count(&self) -> usize;
}

/// One metric snapshot of one network at one training step.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub network: String,
    pub step: u64,
    /// Values aligned with the owning table's metric schema; `None` is a missing cell.
    pub values: Vec<Option<f64>>,
}

/// All records parsed from one run file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTable {
    pub label: String,
    pub path: PathBuf,
    pub metrics: Vec<String>,
    pub records: Vec<RunRecord>,
    /// Rows without a `network` cell, named after the file label for now.
    pub unnamed_rows: Vec<usize>,
}

impl RunTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|name| name == metric)
    }

    /// Column values in row order, `NaN` for missing cells.
    pub fn column(&self, metric: &str) -> Option<Vec<f64>> {
        let idx = self.metric_index(metric)?;
        Some(
            self.records
                .iter()
                .map(|record| record.values[idx].unwrap_or(f64::NAN))
                .collect(),
        )
    }

    /// Give every row read without a `network` cell the network `name`.
    pub fn name_unnamed(&mut self, name: &str) {
        for &idx in &self.unnamed_rows {
            if let Some(record) = self.records.get_mut(idx) {
                record.network = name.to_string();
            }
        }
    }

    /// Metric names containing `key`, e.g. `loss` → `train loss`, `test loss`.
    pub fn metrics_matching<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.metrics
            .iter()
            .map(String::as_str)
            .filter(move |name| name.contains(key))
    }
}

impl TableFile for RunTable {
    fn read(path: &Path, label: &str) -> Result<Self, LoadError> {
        let frame = RawFrame::read(path)?;
        frame.into_run_table(path, label)
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests;
