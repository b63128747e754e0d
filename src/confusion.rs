//! Cross-tabulation of predicted against actual class labels.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Axis};
use thiserror::Error;

use crate::results::{LoadError, RawFrame, format_value, writer_at};

/// Label of the trailing total row and column.
pub const MARGIN_LABEL: &str = "All";
/// First header cell of a persisted matrix; rows are actual labels.
pub const ACTUAL_HEADER: &str = "Actual";

#[derive(Debug, Error)]
pub enum ConfusionError {
    /// Predicted and actual sequences differ in length.
    #[error("Predicted ({predicted}) and actual ({actual}) labels must have the same length")]
    LengthMismatch { predicted: usize, actual: usize },
    /// A score matrix has no class columns to take the arg-max over.
    #[error("Score matrix has no class columns")]
    NoClasses,
    /// Replicates to average do not share row and column labels.
    #[error("Replicate {index} does not share the labels of the first confusion matrix")]
    LabelMismatch { index: usize },
    /// Nothing to average.
    #[error("No confusion matrices to average")]
    NoReplicates,
    /// An integer class has no entry in the axis legends.
    #[error("No axis legend for class {class} ({available} legends given)")]
    MissingLegend { class: usize, available: usize },
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// One class label: integer classes sort numerically, named classes after them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassLabel {
    Index(i64),
    Name(String),
}

impl ClassLabel {
    /// Integer when the text parses as one, otherwise a name.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<i64>() {
            Ok(idx) => ClassLabel::Index(idx),
            Err(_) => ClassLabel::Name(text.trim().to_string()),
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Index(idx) => write!(f, "{idx}"),
            ClassLabel::Name(name) => f.write_str(name),
        }
    }
}

/// A label sequence: hard labels, or one score/one-hot row per sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    Classes(Vec<ClassLabel>),
    /// `samples x classes`; each row collapses to the arg-max column.
    Scores(Array2<f64>),
}

impl Labels {
    pub fn len(&self) -> usize {
        match self {
            Labels::Classes(classes) => classes.len(),
            Labels::Scores(scores) => scores.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hard labels; score rows take the first column holding their maximum.
    pub fn into_classes(self) -> Result<Vec<ClassLabel>, ConfusionError> {
        match self {
            Labels::Classes(classes) => Ok(classes),
            Labels::Scores(scores) => {
                if scores.ncols() == 0 && scores.nrows() > 0 {
                    return Err(ConfusionError::NoClasses);
                }
                Ok(scores
                    .axis_iter(Axis(0))
                    .map(|row| {
                        let mut best = 0;
                        for (idx, value) in row.iter().enumerate() {
                            if *value > row[best] {
                                best = idx;
                            }
                        }
                        ClassLabel::Index(best as i64)
                    })
                    .collect())
            }
        }
    }
}

impl From<Vec<ClassLabel>> for Labels {
    fn from(classes: Vec<ClassLabel>) -> Self {
        Labels::Classes(classes)
    }
}

impl From<Vec<i64>> for Labels {
    fn from(classes: Vec<i64>) -> Self {
        Labels::Classes(classes.into_iter().map(ClassLabel::Index).collect())
    }
}

impl From<Vec<String>> for Labels {
    fn from(classes: Vec<String>) -> Self {
        Labels::Classes(classes.iter().map(|text| ClassLabel::parse(text)).collect())
    }
}

impl From<Array2<f64>> for Labels {
    fn from(scores: Array2<f64>) -> Self {
        Labels::Scores(scores)
    }
}

/// Counts of actual (rows) against predicted (columns) labels with `All` margins.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    rows: Vec<String>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl ConfusionMatrix {
    /// Cross-tabulate paired label sequences.
    ///
    /// Both axes list the sorted union of observed labels followed by
    /// [`MARGIN_LABEL`]; margins hold row and column sums.
    pub fn from_labels(
        predicted: impl Into<Labels>,
        actual: impl Into<Labels>,
    ) -> Result<Self, ConfusionError> {
        let predicted = predicted.into();
        let actual = actual.into();
        if predicted.len() != actual.len() {
            return Err(ConfusionError::LengthMismatch {
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }
        let predicted = predicted.into_classes()?;
        let actual = actual.into_classes()?;

        let classes: Vec<&ClassLabel> = predicted
            .iter()
            .chain(&actual)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let position = |label: &ClassLabel| classes.binary_search(&label).unwrap_or_default();
        let n = classes.len();
        let mut values = Array2::<f64>::zeros((n + 1, n + 1));
        for (pred, act) in predicted.iter().zip(&actual) {
            let (row, col) = (position(act), position(pred));
            values[[row, col]] += 1.0;
            values[[row, n]] += 1.0;
            values[[n, col]] += 1.0;
            values[[n, n]] += 1.0;
        }

        let mut labels: Vec<String> = classes.iter().map(|label| label.to_string()).collect();
        labels.push(MARGIN_LABEL.to_string());
        Ok(Self {
            rows: labels.clone(),
            columns: labels,
            values,
        })
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Cell at (actual `row`, predicted `column`), looked up by label.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let row = self.rows.iter().position(|label| label == row)?;
        let column = self.columns.iter().position(|label| label == column)?;
        Some(self.values[[row, column]])
    }

    /// Grand total in the bottom-right margin cell.
    pub fn total(&self) -> f64 {
        let (rows, cols) = self.values.dim();
        if rows == 0 || cols == 0 {
            return 0.0;
        }
        self.values[[rows - 1, cols - 1]]
    }

    /// Element-wise mean of matrices sharing the same labels in the same order.
    pub fn average(replicates: &[ConfusionMatrix]) -> Result<Self, ConfusionError> {
        let Some(first) = replicates.first() else {
            return Err(ConfusionError::NoReplicates);
        };
        let mut sum = first.values.clone();
        for (index, other) in replicates.iter().enumerate().skip(1) {
            if other.rows != first.rows || other.columns != first.columns {
                tracing::error!(
                    "Confusion matrix {index} has labels that do not match the first one"
                );
                return Err(ConfusionError::LabelMismatch { index });
            }
            sum += &other.values;
        }
        Ok(Self {
            rows: first.rows.clone(),
            columns: first.columns.clone(),
            values: sum / replicates.len() as f64,
        })
    }

    /// Replace non-negative integer class labels with `legends[class]`; names
    /// and margins stay.
    pub fn with_axis_legends(mut self, legends: &[String]) -> Result<Self, ConfusionError> {
        let relabel = |label: &mut String| -> Result<(), ConfusionError> {
            if let ClassLabel::Index(idx) = ClassLabel::parse(label) {
                let Ok(class) = usize::try_from(idx) else {
                    return Ok(());
                };
                *label = legends
                    .get(class)
                    .ok_or(ConfusionError::MissingLegend {
                        class,
                        available: legends.len(),
                    })?
                    .clone();
            }
            Ok(())
        };
        for label in self.rows.iter_mut().chain(self.columns.iter_mut()) {
            relabel(label)?;
        }
        Ok(self)
    }

    /// Persist with an `Actual` header cell followed by the column labels.
    pub fn write_csv(&self, path: &Path) -> Result<(), ConfusionError> {
        let write_err = |source| LoadError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = writer_at(path)?;
        let mut header = vec![ACTUAL_HEADER.to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header).map_err(write_err)?;
        for (label, row) in self.rows.iter().zip(self.values.axis_iter(Axis(0))) {
            let mut cells = vec![label.clone()];
            cells.extend(row.iter().map(|value| format_value(*value)));
            writer.write_record(&cells).map_err(write_err)?;
        }
        writer
            .flush()
            .map_err(|source| write_err(csv::Error::from(source)))?;
        Ok(())
    }

    /// Read a matrix written by [`write_csv`](Self::write_csv).
    pub fn read_csv(path: &Path) -> Result<Self, ConfusionError> {
        let frame = RawFrame::read(path)?;
        if frame.headers.first().map(String::as_str) != Some(ACTUAL_HEADER) {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: ACTUAL_HEADER.to_string(),
            }
            .into());
        }
        let columns = frame.headers[1..].to_vec();
        let mut rows = Vec::with_capacity(frame.rows.len());
        let mut values = Array2::<f64>::zeros((frame.rows.len(), columns.len()));
        for (row_idx, cells) in frame.rows.iter().enumerate() {
            rows.push(cells.first().cloned().unwrap_or_default());
            for (col_idx, column) in columns.iter().enumerate() {
                let cell = cells.get(col_idx + 1).map(String::as_str).unwrap_or_default();
                values[[row_idx, col_idx]] = parse_count(cell).ok_or_else(|| {
                    LoadError::InvalidValue {
                        path: path.to_path_buf(),
                        row: row_idx,
                        column: column.clone(),
                        value: cell.to_string(),
                    }
                })?;
            }
        }
        Ok(Self {
            rows,
            columns,
            values,
        })
    }
}

fn parse_count(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(0.0);
    }
    cell.parse::<f64>().ok()
}

/// Replicate confusion matrices of one network, averaged before saving.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionReplicates {
    pub name: String,
    pub matrices: Vec<ConfusionMatrix>,
}

impl ConfusionReplicates {
    pub fn new(name: impl Into<String>, matrices: Vec<ConfusionMatrix>) -> Self {
        Self {
            name: name.into(),
            matrices,
        }
    }

    pub fn average(&self) -> Result<ConfusionMatrix, ConfusionError> {
        ConfusionMatrix::average(&self.matrices)
    }

    /// `<name>_confusion_matrix.csv`, spaces replaced by underscores.
    pub fn file_name(&self) -> PathBuf {
        PathBuf::from(format!("{}_confusion_matrix.csv", self.name.replace(' ', "_")))
    }
}
