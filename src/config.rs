//! Report settings persisted as TOML in the application directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::color::{ColorError, ColorMap, Rgb};
use crate::figure::OutputFormat;

/// File name of the settings file inside the `.mcstat` root.
pub const CONFIG_FILE_NAME: &str = "mcstat.toml";

/// Metrics recorded by the training loop for every network.
pub const DEFAULT_TRACKED_METRICS: [&str; 4] =
    ["train loss", "test loss", "train accuracy", "test accuracy"];

/// Errors that may occur while loading report configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path that failed to create.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// A pinned network color is not `rgb(INT, INT, INT)`.
    #[error("Invalid color for network {network:?}: {source}")]
    InvalidColor {
        /// Network name the color was pinned to.
        network: String,
        /// Color parse error.
        source: ColorError,
    },
}

/// Settings shared by the loaders, summaries and plot renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Metrics summarized per (network, step).
    pub tracked_metrics: Vec<String>,
    /// Suffix of per-run training result files.
    pub fit_suffix: String,
    /// Suffix of per-network statistics files.
    pub stats_suffix: String,
    /// Suffix of the file whose name carries the network name.
    pub metadata_suffix: String,
    /// Equal-width bins per 3-D histogram slice.
    pub histogram_bins: usize,
    /// Bin width of the overlaid 2-D histograms.
    pub histogram_bin_size: f64,
    /// Number of log-spaced steps shown by default in 3-D histograms.
    pub histogram_3d_steps: usize,
    /// Output formats written for every chart.
    pub formats: Vec<String>,
    /// Y-axis tick spacing of box plots.
    pub box_dtick: f64,
    /// Decimals kept when rounding float independent variables.
    pub float_decimals: u32,
    /// Explicit network → `rgb(r, g, b)` color pins.
    pub colors: BTreeMap<String, String>,
    /// Local plotly.js bundle embedded in HTML charts; linked from the CDN when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plotly_js: Option<PathBuf>,
    /// File name prefix of the per-launch log files.
    pub log_prefix: String,
    /// Log files of this prefix kept in the logs directory.
    pub max_log_files: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            tracked_metrics: DEFAULT_TRACKED_METRICS
                .iter()
                .map(|metric| metric.to_string())
                .collect(),
            fit_suffix: "_results_fit.csv".to_string(),
            stats_suffix: "_statistical_result.csv".to_string(),
            metadata_suffix: "_metadata.txt".to_string(),
            histogram_bins: 10,
            histogram_bin_size: 0.01,
            histogram_3d_steps: 8,
            formats: vec!["html".to_string(), "svg".to_string()],
            box_dtick: 0.05,
            float_decimals: 2,
            colors: BTreeMap::new(),
            plotly_js: None,
            log_prefix: crate::logging::LOG_FILE_PREFIX.to_string(),
            max_log_files: crate::logging::MAX_LOG_FILES,
        }
    }
}

impl ReportConfig {
    /// Clamp values into their usable ranges.
    pub fn normalized(mut self) -> Self {
        self.fit_suffix = with_csv_extension(&self.fit_suffix);
        self.stats_suffix = with_csv_extension(&self.stats_suffix);
        self.histogram_bins = self.histogram_bins.max(2);
        self.max_log_files = self.max_log_files.max(1);
        self.histogram_3d_steps = self.histogram_3d_steps.max(1);
        if !(self.histogram_bin_size.is_finite() && self.histogram_bin_size > 0.0) {
            self.histogram_bin_size = Self::default().histogram_bin_size;
        }
        if self.tracked_metrics.is_empty() {
            self.tracked_metrics = Self::default().tracked_metrics;
        }
        self
    }

    /// Parse every pinned color.
    pub fn pinned_colors(&self) -> Result<BTreeMap<String, Rgb>, ConfigError> {
        self.colors
            .iter()
            .map(|(network, color)| {
                Rgb::parse(color)
                    .map(|rgb| (network.clone(), rgb))
                    .map_err(|source| ConfigError::InvalidColor {
                        network: network.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Color map seeded with the pinned colors.
    pub fn color_map(&self) -> ColorMap {
        // Pins are validated during load; anything invalid here was set in code.
        ColorMap::with_pins(&self.pinned_colors().unwrap_or_default())
    }

    /// Recognized output formats; unknown names are logged and skipped.
    pub fn output_formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::new();
        for name in &self.formats {
            match name.parse::<OutputFormat>() {
                Ok(format) if !formats.contains(&format) => formats.push(format),
                Ok(_) => {}
                Err(err) => tracing::warn!("Skipping output format: {err}"),
            }
        }
        formats
    }
}

/// Resolve the configuration file path inside the application directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load the app-level configuration, returning defaults if missing.
pub fn load_or_default() -> Result<ReportConfig, ConfigError> {
    load_from_path(&config_path()?)
}

/// Load configuration from an explicit file, returning defaults if missing.
pub fn load_from_path(path: &Path) -> Result<ReportConfig, ConfigError> {
    if !path.exists() {
        return Ok(ReportConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    config.pinned_colors()?;
    Ok(config)
}

fn parse_config(text: &str) -> Result<ReportConfig, toml::de::Error> {
    toml::from_str::<ReportConfig>(text).map(ReportConfig::normalized)
}

pub(crate) fn with_csv_extension(suffix: &str) -> String {
    if suffix.ends_with(".csv") {
        suffix.to_string()
    } else {
        format!("{suffix}.csv")
    }
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
        app_dirs::AppDirError::NoBaseDir | app_dirs::AppDirError::FormatTime(_) => {
            ConfigError::NoConfigDir
        }
    }
}
