//! Descriptive statistics of Monte Carlo runs grouped by network and step.

mod network_stats;
mod summary;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::results::LoadError;

pub use network_stats::NetworkStats;
pub use summary::{NetworkSummary, StatSummary, StepSummary};

/// Errors raised while persisting statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Writing a statistics file failed.
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
}

/// Row names of a describe block, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKind {
    Count,
    Mean,
    Std,
    Min,
    Q25,
    Median,
    Q75,
    Max,
}

impl StatKind {
    pub const ALL: [StatKind; 8] = [
        StatKind::Count,
        StatKind::Mean,
        StatKind::Std,
        StatKind::Min,
        StatKind::Q25,
        StatKind::Median,
        StatKind::Q75,
        StatKind::Max,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKind::Count => "count",
            StatKind::Mean => "mean",
            StatKind::Std => "std",
            StatKind::Min => "min",
            StatKind::Q25 => "25%",
            StatKind::Median => "50%",
            StatKind::Q75 => "75%",
            StatKind::Max => "max",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        StatKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("Unknown statistic {value:?}"))
    }
}

/// Count, mean, sample standard deviation, extremes and quartiles of one group.
///
/// Equality treats NaN statistics as equal so undefined `std` values of
/// single-sample groups still compare.
#[derive(Debug, Clone, Copy)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl PartialEq for Describe {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && StatKind::ALL
                .into_iter()
                .all(|kind| same_value(self.get(kind), other.get(kind)))
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl Describe {
    pub fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Count => self.count as f64,
            StatKind::Mean => self.mean,
            StatKind::Std => self.std,
            StatKind::Min => self.min,
            StatKind::Q25 => self.q25,
            StatKind::Median => self.q50,
            StatKind::Q75 => self.q75,
            StatKind::Max => self.max,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Describe the non-NaN entries of `values`.
///
/// `std` uses `n − 1` and is NaN below two samples; every statistic but the
/// count is NaN for an empty input.
pub fn describe(values: &[f64]) -> Describe {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    if count == 0 {
        return Describe {
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count < 2 {
        f64::NAN
    } else {
        let sq = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (sq / (count - 1) as f64).sqrt()
    };
    Describe {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        q50: quantile_sorted(&sorted, 0.50),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[count - 1],
    }
}

/// Quantile with linear interpolation between order statistics.
///
/// `sorted` must be ascending; `q` is clamped to `[0, 1]`. Empty input is NaN.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Arithmetic mean of the non-NaN entries, NaN if there are none.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests;
