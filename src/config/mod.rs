//! TOML run configuration for the `strata` command line tool.
//!
//! The file declares the dataset schema, the stratification column and seed,
//! and the resampling, model and logging settings. Every field except the
//! column list has a default, so a minimal file only lists `[[columns]]`.

mod defaults;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::dataset::{ColumnSpec, DatasetError, Schema};
use crate::ml::logreg::TrainOptions;
use crate::ml::transform::FeatureTransform;
use crate::ml::workflow::{Estimator, Resampling, Workflow};
use crate::resample::{ResampleError, Splitter, SplitterConfig};

use defaults::*;

/// Default filename of the run configuration inside the app directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that may occur while loading or saving the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the directory of a saved config.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
    /// The config declares no columns.
    #[error("Config declares no `[[columns]]`")]
    NoColumns,
    /// The declared columns do not form a valid schema.
    #[error("Invalid schema: {0}")]
    Schema(#[from] DatasetError),
    /// Split settings rejected by the splitter.
    #[error("Invalid split settings: {0}")]
    Split(#[from] ResampleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingKind {
    Holdout,
    KFold,
    TrainValidationTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    LogisticRegression,
    ClassPrior,
}

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            label_column: default_label_column(),
            seed: default_seed(),
            columns: Vec::new(),
            split: SplitSettings::default(),
            model: ModelSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// `[split]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSettings {
    /// Held-out share for `split`, test share for three-way splits.
    #[serde(default = "default_held_out_fraction")]
    pub held_out_fraction: f64,
    #[serde(default = "default_validation_fraction")]
    pub validation_fraction: f64,
    #[serde(default = "default_folds")]
    pub folds: usize,
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    /// Resampling used by `evaluate`.
    #[serde(default = "default_resampling")]
    pub resampling: ResamplingKind,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            held_out_fraction: default_held_out_fraction(),
            validation_fraction: default_validation_fraction(),
            folds: default_folds(),
            repeats: default_repeats(),
            resampling: default_resampling(),
        }
    }
}

/// `[model]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_estimator")]
    pub estimator: EstimatorKind,
    #[serde(default = "default_transform")]
    pub transform: FeatureTransform,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_false")]
    pub balance_classes: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            estimator: default_estimator(),
            transform: default_transform(),
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            batch_size: default_batch_size(),
            balance_classes: default_false(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Write a per-launch log file under the app directory.
    #[serde(default = "default_true")]
    pub file: bool,
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: default_true(),
            max_files: default_max_log_files(),
        }
    }
}

impl RunConfig {
    /// Clamp counters that must stay positive.
    pub fn normalized(mut self) -> Self {
        self.model.epochs = self.model.epochs.max(1);
        self.model.batch_size = self.model.batch_size.max(1);
        self.logging.max_files = self.logging.max_files.max(1);
        if self.logging.filter.trim().is_empty() {
            self.logging.filter = default_log_filter();
        }
        self
    }

    /// Schema built from the declared `[[columns]]`.
    pub fn schema(&self) -> Result<Schema, ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns);
        }
        Ok(Schema::new(self.columns.clone())?)
    }

    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            label_column: self.label_column.clone(),
            held_out_fraction: self.split.held_out_fraction,
            validation_fraction: self.split.validation_fraction,
            folds: self.split.folds,
            repeats: self.split.repeats,
            seed: self.seed,
        }
    }

    pub fn splitter(&self) -> Result<Splitter, ConfigError> {
        Ok(Splitter::new(self.splitter_config())?)
    }

    /// Workflow described by the `[split]` and `[model]` sections.
    pub fn workflow(&self) -> Workflow {
        let split = &self.split;
        let resampling = match split.resampling {
            ResamplingKind::Holdout => Resampling::Holdout {
                held_out_fraction: split.held_out_fraction,
            },
            ResamplingKind::KFold => Resampling::KFold {
                folds: split.folds,
                repeats: split.repeats,
            },
            ResamplingKind::TrainValidationTest => Resampling::TrainValidationTest {
                test_fraction: split.held_out_fraction,
                validation_fraction: split.validation_fraction,
            },
        };
        let estimator = match self.model.estimator {
            EstimatorKind::LogisticRegression => Estimator::LogisticRegression(TrainOptions {
                epochs: self.model.epochs,
                learning_rate: self.model.learning_rate,
                batch_size: self.model.batch_size,
                seed: self.seed,
                balance_classes: self.model.balance_classes,
            }),
            EstimatorKind::ClassPrior => Estimator::ClassPrior,
        };
        Workflow {
            label_column: self.label_column.clone(),
            seed: self.seed,
            resampling,
            transform: self.model.transform,
            estimator,
        }
    }
}

/// Default configuration path. Nothing is created.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dirs = AppDirs::from_env().map_err(|_| ConfigError::NoConfigDir)?;
    Ok(dirs.config_file())
}

/// Load an explicit config file, or the default one if it exists.
///
/// An explicit path must exist. A missing default file yields defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<RunConfig, ConfigError> {
    match explicit {
        Some(path) => load_from(path),
        None => {
            let dirs = AppDirs::from_env().map_err(|_| ConfigError::NoConfigDir)?;
            load_default_in(&dirs)
        }
    }
}

/// Load `config.toml` from `dirs`, or defaults when the file is absent.
pub fn load_default_in(dirs: &AppDirs) -> Result<RunConfig, ConfigError> {
    let path = dirs.config_file();
    if path.is_file() {
        load_from(&path)
    } else {
        tracing::debug!("No config at {}; using defaults", path.display());
        Ok(RunConfig::default())
    }
}

/// Parse a TOML config file.
pub fn load_from(path: &Path) -> Result<RunConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
        .map(RunConfig::normalized)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &RunConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
