//! Statistics and charts for repeated ("Monte Carlo") training runs.
/// Application directories under the user's config dir.
pub mod app_dirs;
/// Chart colors and the network color assignment.
pub mod color;
/// TOML report settings.
pub mod config;
/// Confusion matrices of classification runs.
pub mod confusion;
/// Chart model and its HTML/SVG writers.
pub mod figure;
/// Tracing subscriber setup.
pub mod logging;
/// Monte Carlo analyzer, plotters and run comparison.
pub mod montecarlo;
/// Figure builders for each chart type.
pub mod plots;
/// Discovery and parsing of run result files.
pub mod results;
/// Descriptive statistics per network and step.
pub mod stats;
