//! Location of the `.strata` directory holding the run config and logs.
//!
//! The root sits under the OS config directory unless `STRATA_CONFIG_HOME`
//! names another base. Resolving paths never touches the filesystem; only
//! [`AppDirs::ensure_logs_dir`] creates directories.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

use crate::config::CONFIG_FILE_NAME;

/// Name of the application directory under the config base.
pub const APP_DIR_NAME: &str = ".strata";

/// Environment variable that replaces the OS config base.
pub const CONFIG_HOME_ENV: &str = "STRATA_CONFIG_HOME";

const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum AppDirError {
    /// Neither the override nor the OS config directory is available.
    #[error("No config directory: set STRATA_CONFIG_HOME or a user config directory")]
    NoBaseDir,
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolved `.strata` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Root from `STRATA_CONFIG_HOME`, falling back to the OS config directory.
    pub fn from_env() -> Result<Self, AppDirError> {
        let base = std::env::var_os(CONFIG_HOME_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
            .ok_or(AppDirError::NoBaseDir)?;
        Ok(Self::under(&base))
    }

    /// Root placed directly under `base`.
    pub fn under(base: &Path) -> Self {
        Self {
            root: base.join(APP_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Default run config path; the file may not exist.
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Log directory, created on demand.
    pub fn ensure_logs_dir(&self) -> Result<PathBuf, AppDirError> {
        let path = self.root.join(LOGS_DIR_NAME);
        std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolving_paths_creates_nothing() {
        let base = tempdir().unwrap();
        let dirs = AppDirs::under(base.path());
        assert_eq!(dirs.root(), base.path().join(".strata"));
        assert_eq!(dirs.config_file(), base.path().join(".strata/config.toml"));
        assert!(!dirs.root().exists());
    }

    #[test]
    fn logs_dir_is_created_inside_root() {
        let base = tempdir().unwrap();
        let dirs = AppDirs::under(base.path());
        let logs = dirs.ensure_logs_dir().unwrap();
        assert_eq!(logs, dirs.root().join("logs"));
        assert!(logs.is_dir());
        assert_eq!(dirs.ensure_logs_dir().unwrap(), logs);
    }

    #[test]
    fn logs_dir_reports_unwritable_root() {
        let base = tempdir().unwrap();
        std::fs::write(base.path().join(".strata"), "not a directory").unwrap();
        let err = AppDirs::under(base.path()).ensure_logs_dir().unwrap_err();
        assert!(matches!(err, AppDirError::CreateDir { .. }));
    }
}
