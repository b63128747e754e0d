//! Monte Carlo reporting: fit-result plots, statistics plots, the analyzer
//! that owns one Monte Carlo run and the comparison of several runs.

mod analyzer;
mod comparison;
mod plotter;
mod stat_plotter;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::app_dirs::AppDirError;
use crate::confusion::ConfusionError;
use crate::figure::RenderError;
use crate::plots::histogram::MeshError;
use crate::results::{AggregatedTable, LoadError};
use crate::stats::StatsError;

pub use analyzer::MonteCarloAnalyzer;
pub use comparison::{IndependentValue, RunComparison, XKind};
pub use plotter::Plotter;
pub use stat_plotter::MonteCarloPlotter;

/// Metric families drawn by the line plots.
pub const LINE_KEYS: [&str; 2] = ["loss", "accuracy"];

/// Training step a step-wise chart is drawn at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepSelector {
    /// Largest step in the data.
    #[default]
    Final,
    At(u64),
}

impl StepSelector {
    /// Concrete step for `table`, `None` when the table is empty.
    pub fn resolve(self, table: &AggregatedTable) -> Option<u64> {
        match self {
            StepSelector::Final => table.max_step(),
            StepSelector::At(step) => Some(step),
        }
    }
}

impl fmt::Display for StepSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepSelector::Final => f.write_str("final"),
            StepSelector::At(step) => write!(f, "{step}"),
        }
    }
}

impl FromStr for StepSelector {
    type Err = String;

    /// `final`, `last` or `-1` select the final step; otherwise a step number.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "final" | "last" | "-1" => Ok(StepSelector::Final),
            other => other
                .parse()
                .map(StepSelector::At)
                .map_err(|_| format!("Invalid step {value:?}")),
        }
    }
}

/// Errors raised by the Monte Carlo analyzer.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Confusion(#[from] ConfusionError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    /// The run data holds no rows.
    #[error("No Monte Carlo data in {0}")]
    NoData(String),
    /// The requested step does not appear in the run data.
    #[error("Step {step} not found in the run data")]
    UnknownStep { step: u64 },
}

/// Errors raised while comparing several Monte Carlo runs.
#[derive(Debug, Error)]
pub enum ComparisonError {
    /// Independent values and run paths do not pair up.
    #[error("x ({x}) and paths ({paths}) must be the same size")]
    LengthMismatch { x: usize, paths: usize },
    /// An independent value does not parse as the requested kind.
    #[error("Invalid {kind} value {value:?}")]
    InvalidValue { kind: &'static str, value: String },
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Stats(#[from] StatsError),
}
