use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{AggregatedTable, LoadError, RunTable, TableFile};
use crate::config::with_csv_extension;

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.csv$").expect("trailing number pattern compiles"));

/// One discovered file together with its parsed table.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable<T> {
    /// File name without the suffix, `_` replaced by spaces.
    pub label: String,
    pub path: PathBuf,
    /// Number right before the `.csv` extension, if any.
    pub run_index: Option<u64>,
    pub table: T,
}

/// Ordered set of result tables discovered in one directory.
///
/// Files are visited in lexicographic name order. Every [`reload`](Self::reload)
/// throws away the previous tables and rescans the directory, so files added
/// by a training process that is still running show up on the next reload.
#[derive(Debug, Clone)]
pub struct ResultLoader<T> {
    dir: PathBuf,
    suffix: String,
    entries: Vec<LoadedTable<T>>,
}

impl<T: TableFile> ResultLoader<T> {
    /// Open `dir` and load every file ending in `suffix` (`.csv` is appended if absent).
    pub fn new(dir: impl Into<PathBuf>, suffix: &str) -> Result<Self, LoadError> {
        let dir = dir.into();
        if !dir.is_dir() {
            tracing::error!("Path {} does not exist", dir.display());
            return Err(LoadError::MissingDir { path: dir });
        }
        let mut loader = Self {
            dir,
            suffix: with_csv_extension(suffix),
            entries: Vec::new(),
        };
        loader.reload()?;
        Ok(loader)
    }

    /// Discard the loaded tables and read the directory again.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.entries.clear();
        for (name, path) in matching_files(&self.dir, &self.suffix)? {
            let label = label_from_file_name(&name, &self.suffix);
            let table = T::read(&path, &label)?;
            tracing::debug!("Loaded {} ({} rows)", path.display(), table.row_count());
            self.entries.push(LoadedTable {
                label,
                run_index: trailing_number(&name),
                path,
                table,
            });
        }
        Ok(())
    }

    pub fn entries(&self) -> &[LoadedTable<T>] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Human-readable network name carried by the `<name><metadata_suffix>` file name.
    ///
    /// Only the file name is used; the file is never opened.
    pub fn network_name(&self, metadata_suffix: &str) -> Result<Option<String>, LoadError> {
        let mut names = list_file_names(&self.dir)?;
        names.sort();
        Ok(names
            .iter()
            .find(|name| name.ends_with(metadata_suffix))
            .map(|name| label_from_file_name(name, metadata_suffix)))
    }
}

impl ResultLoader<RunTable> {
    /// Rescan the directory and concatenate every run into one tagged table.
    ///
    /// All runs of one collection must have the same number of rows.
    pub fn aggregate(&mut self) -> Result<AggregatedTable, LoadError> {
        self.reload()?;
        self.concatenate()
    }

    /// Like [`aggregate`](Self::aggregate), with rows that have no `network`
    /// cell named after the metadata file when there is one.
    pub fn aggregate_named(&mut self, metadata_suffix: &str) -> Result<AggregatedTable, LoadError> {
        self.reload()?;
        if let Some(name) = self.network_name(metadata_suffix)? {
            for entry in &mut self.entries {
                entry.table.name_unnamed(&name);
            }
        }
        self.concatenate()
    }

    fn concatenate(&self) -> Result<AggregatedTable, LoadError> {
        let Some(first) = self.entries.first() else {
            tracing::error!("Empty result set in {}", self.dir.display());
            return Err(LoadError::Empty {
                dir: self.dir.clone(),
                suffix: self.suffix.clone(),
            });
        };
        let expected = first.table.len();
        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| entry.table.len() != expected)
        {
            let err = LoadError::LengthMismatch {
                label: entry.label.clone(),
                expected,
                found: entry.table.len(),
            };
            tracing::error!("{err}");
            return Err(err);
        }
        Ok(AggregatedTable::from_tables(
            self.entries
                .iter()
                .map(|entry| (entry.label.as_str(), &entry.table)),
        ))
    }
}

/// Strip `suffix` from a file name and turn `_` into spaces.
pub fn label_from_file_name(name: &str, suffix: &str) -> String {
    name.strip_suffix(suffix).unwrap_or(name).replace('_', " ")
}

/// Number right before a `.csv` extension.
///
/// `"path/any_43_start_name9872.csv"` gives `Some(9872)`;
/// `"any_43_start_name.csv"` and `"name85498.txt"` give `None`.
pub fn trailing_number(name: &str) -> Option<u64> {
    TRAILING_NUMBER
        .captures(name)
        .and_then(|captures| captures[1].parse().ok())
}

fn matching_files(dir: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>, LoadError> {
    let mut names = list_file_names(dir)?;
    names.retain(|name| name.ends_with(suffix));
    names.sort();
    Ok(names
        .into_iter()
        .map(|name| {
            let path = dir.join(&name);
            (name, path)
        })
        .collect())
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, LoadError> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect())
}
