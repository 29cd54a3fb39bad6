//! Library exports for reuse in the CLI, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// TOML run configuration.
pub mod config;
/// Schema-validated tabular datasets and CSV loading.
pub mod dataset;
/// Logging setup.
pub mod logging;
/// Feature transforms, estimators, metrics and resampled evaluation.
pub mod ml;
/// Stratified splitting and fold assignment.
pub mod resample;
