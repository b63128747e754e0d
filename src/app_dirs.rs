//! Application directory helpers anchored to a single `.mcstat` folder.
//!
//! Config and log files live under the OS config directory by default; the
//! `MCSTAT_CONFIG_HOME` variable relocates the root for tests or portable use.
//! Report output directories are created relative to the caller instead.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

/// Name of the application directory that lives under the OS config root.
pub const APP_DIR_NAME: &str = ".mcstat";

/// Environment variable that overrides the config base directory.
pub const CONFIG_HOME_ENV: &str = "MCSTAT_CONFIG_HOME";

/// Default base directory for analyzer output when no path is given.
pub const DEFAULT_MONTECARLO_DIR: &str = "./log/montecarlo/";

static CONFIG_BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to format the timestamp used for an output directory name.
    #[error("Failed to format output directory time: {0}")]
    FormatTime(time::error::Format),
}

/// Return the root `.mcstat` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    let path = base.join(APP_DIR_NAME);
    create_dir(&path)?;
    Ok(path)
}

/// Return the logs directory inside the `.mcstat` root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let path = app_root_dir()?.join("logs");
    create_dir(&path)?;
    Ok(path)
}

/// Create `base/<date>/run-<time>/` and return it.
pub fn timestamped_dir(base: &Path) -> Result<PathBuf, AppDirError> {
    timestamped_dir_at(base, now_local_or_utc())
}

fn timestamped_dir_at(base: &Path, now: OffsetDateTime) -> Result<PathBuf, AppDirError> {
    const DAY_FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");
    const TIME_FORMAT: &[FormatItem<'_>] = format_description!("[hour]-[minute]-[second]");
    let day = now.format(DAY_FORMAT).map_err(AppDirError::FormatTime)?;
    let time = now.format(TIME_FORMAT).map_err(AppDirError::FormatTime)?;
    let path = base.join(day).join(format!("run-{time}"));
    create_dir(&path)?;
    Ok(path)
}

/// Create a directory and all its parents.
pub fn create_dir(path: &Path) -> Result<(), AppDirError> {
    std::fs::create_dir_all(path).map_err(|source| AppDirError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn config_base_dir() -> Option<PathBuf> {
    if let Some(path) = CONFIG_BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone())
    {
        return Some(path);
    }
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV) {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
fn set_config_base_override(path: PathBuf) {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .expect("config base override mutex poisoned");
    *guard = Some(path);
}

#[cfg(test)]
fn clear_config_base_override() {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .expect("config base override mutex poisoned");
    *guard = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct OverrideGuard;

    impl OverrideGuard {
        fn set(path: PathBuf) -> Self {
            set_config_base_override(path);
            Self
        }
    }

    impl Drop for OverrideGuard {
        fn drop(&mut self) {
            clear_config_base_override();
        }
    }

    #[test]
    fn uses_override_for_root_dir() {
        let base = tempdir().unwrap();
        let _guard = OverrideGuard::set(base.path().to_path_buf());
        let root = app_root_dir().unwrap();
        assert_eq!(root, base.path().join(APP_DIR_NAME));
        assert!(root.is_dir());
        assert!(logs_dir().unwrap().ends_with("logs"));
    }

    #[test]
    fn timestamped_dir_nests_day_and_time() {
        let base = tempdir().unwrap();
        let fixed = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let dir = timestamped_dir_at(base.path(), fixed).unwrap();
        assert_eq!(dir, base.path().join("2023-11-14").join("run-22-13-20"));
        assert!(dir.is_dir());
    }
}
