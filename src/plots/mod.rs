//! Figure builders.
//!
//! Every builder is a pure function of its input series and display options;
//! where the figures land on disk is decided by the callers in
//! [`crate::montecarlo`] through [`crate::figure::ChartOutput`].

pub mod boxplot;
pub mod distribution;
pub mod heatmap;
pub mod histogram;
pub mod line;

/// Line charts, relative to a results directory.
pub const LINES_DIR: &str = "plots/lines";
pub const BOX_PLOT_DIR: &str = "plots/box_plot";
pub const HISTOGRAM_DIR: &str = "plots/histogram";
pub const CONFUSION_DIR: &str = "plots/confusion_matrix";

/// File stem for a metric key, e.g. `test accuracy` → `test_accuracy`.
pub fn file_stem(key: &str) -> String {
    key.replace(' ', "_")
}

/// Human-readable series name, e.g. `complex_net` → `complex net`.
pub fn display_name(name: &str) -> String {
    name.replace('_', " ")
}

pub(crate) fn format_decimals(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}
