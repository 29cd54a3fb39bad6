//! Stratified resampling of labeled datasets.
//!
//! Every operation is a pure function of the dataset, its configuration and an
//! explicit seed. Records are grouped by the label column and each group is
//! permuted by a generator derived from `blake3(seed | label)`, so a class's
//! permutation does not depend on which other classes are present.
//!
//! The held-out total is the nearest integer to `fraction * len`, shared out
//! between classes by largest remainder. Fold numbers are dealt round-robin
//! inside each class.

mod partition;
mod stratify;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{Dataset, DatasetError};

pub use partition::{FoldAssignment, PartitionMap, PartitionName, Split, ThreeWaySplit};

/// Smallest class that can be split into two non-empty sides.
pub const MIN_CLASS_RECORDS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResampleError {
    /// Parameters or label column unusable regardless of the data.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A class (or the whole pool) is too small for the request.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl ResampleError {
    fn class_too_small(label: &str, count: usize, required: usize) -> Self {
        ResampleError::InsufficientData(format!(
            "class `{label}` has {count} records, at least {required} required"
        ))
    }
}

impl From<DatasetError> for ResampleError {
    fn from(error: DatasetError) -> Self {
        ResampleError::InvalidConfiguration(error.to_string())
    }
}

/// Fixed configuration of a [`Splitter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Factor column used for stratification.
    pub label_column: String,
    /// Share of each class held out by `split` (the test share of a three-way split).
    pub held_out_fraction: f64,
    /// Share of the remaining pool carved out as validation in a three-way split.
    pub validation_fraction: f64,
    /// Number of cross-validation folds.
    pub folds: usize,
    /// Number of independent fold assignments for repeated cross-validation.
    pub repeats: usize,
    pub seed: u64,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            label_column: "class".to_string(),
            held_out_fraction: 0.25,
            validation_fraction: 0.2,
            folds: 10,
            repeats: 1,
            seed: 42,
        }
    }
}

/// Validated splitter configuration; immutable after construction.
#[derive(Debug, Clone)]
pub struct Splitter {
    config: SplitterConfig,
}

impl Splitter {
    pub fn new(config: SplitterConfig) -> Result<Self, ResampleError> {
        check_label_column(&config.label_column)?;
        stratify::check_fraction("held-out fraction", config.held_out_fraction)?;
        stratify::check_fraction("validation fraction", config.validation_fraction)?;
        check_folds(config.folds)?;
        check_repeats(config.repeats)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    pub fn split(&self, dataset: &Dataset) -> Result<Split, ResampleError> {
        split(
            dataset,
            &self.config.label_column,
            self.config.held_out_fraction,
            self.config.seed,
        )
    }

    pub fn k_fold(&self, dataset: &Dataset) -> Result<FoldAssignment, ResampleError> {
        k_fold(
            dataset,
            &self.config.label_column,
            self.config.folds,
            self.config.seed,
        )
    }

    pub fn repeated_k_fold(&self, dataset: &Dataset) -> Result<Vec<FoldAssignment>, ResampleError> {
        repeated_k_fold(
            dataset,
            &self.config.label_column,
            self.config.folds,
            self.config.repeats,
            self.config.seed,
        )
    }

    /// Three-way split using the held-out fraction as the test share.
    pub fn train_validation_test(&self, dataset: &Dataset) -> Result<ThreeWaySplit, ResampleError> {
        train_validation_test(
            dataset,
            &self.config.label_column,
            self.config.held_out_fraction,
            self.config.validation_fraction,
            self.config.seed,
        )
    }
}

/// Stratified train/held-out split of the whole dataset.
///
/// Fails with `InvalidConfiguration` for a fraction outside (0, 1) or an
/// unusable label column, and with `InsufficientData` when a class has fewer
/// than [`MIN_CLASS_RECORDS`] records or rounding leaves a side empty.
pub fn split(
    dataset: &Dataset,
    label_column: &str,
    held_out_fraction: f64,
    seed: u64,
) -> Result<Split, ResampleError> {
    let labels = stratification_labels(dataset, label_column)?;
    let pool: Vec<usize> = (0..labels.len()).collect();
    let split = stratify::split_pool(&labels, &pool, held_out_fraction, seed)?;
    tracing::debug!(
        "Split {} records on `{label_column}`: {} train, {} held out",
        pool.len(),
        split.train.len(),
        split.held_out.len()
    );
    Ok(split)
}

/// Stratified k-fold assignment.
///
/// Requires `2 <= k <= smallest class size`.
pub fn k_fold(
    dataset: &Dataset,
    label_column: &str,
    k: usize,
    seed: u64,
) -> Result<FoldAssignment, ResampleError> {
    let labels = stratification_labels(dataset, label_column)?;
    let folds = stratify::assign_folds(&labels, k, seed)?;
    tracing::debug!("Assigned {} records on `{label_column}` to {k} folds", labels.len());
    Ok(folds)
}

/// `repeats` independent k-fold assignments; repeat `r` uses `seed + r`.
pub fn repeated_k_fold(
    dataset: &Dataset,
    label_column: &str,
    k: usize,
    repeats: usize,
    seed: u64,
) -> Result<Vec<FoldAssignment>, ResampleError> {
    check_repeats(repeats)?;
    let labels = stratification_labels(dataset, label_column)?;
    (0..repeats)
        .map(|repeat| stratify::assign_folds(&labels, k, seed.wrapping_add(repeat as u64)))
        .collect()
}

/// Carve a test set, then a validation set from what remains.
///
/// The second split runs on the remaining pool with seed `seed + 1`, so each
/// side keeps class proportions relative to its parent pool.
pub fn train_validation_test(
    dataset: &Dataset,
    label_column: &str,
    test_fraction: f64,
    validation_fraction: f64,
    seed: u64,
) -> Result<ThreeWaySplit, ResampleError> {
    stratify::check_fraction("test fraction", test_fraction)?;
    stratify::check_fraction("validation fraction", validation_fraction)?;
    let labels = stratification_labels(dataset, label_column)?;
    let pool: Vec<usize> = (0..labels.len()).collect();
    let outer = stratify::split_pool(&labels, &pool, test_fraction, seed)?;
    let inner = stratify::split_pool(
        &labels,
        &outer.train,
        validation_fraction,
        seed.wrapping_add(1),
    )?;
    let three_way = ThreeWaySplit {
        train: inner.train,
        validation: inner.held_out,
        test: outer.held_out,
    };
    tracing::debug!(
        "Three-way split of {} records on `{label_column}`: {} train, {} validation, {} test",
        pool.len(),
        three_way.train.len(),
        three_way.validation.len(),
        three_way.test.len()
    );
    Ok(three_way)
}

fn stratification_labels<'a>(
    dataset: &'a Dataset,
    label_column: &str,
) -> Result<Vec<&'a str>, ResampleError> {
    check_label_column(label_column)?;
    let labels = dataset.labels(label_column)?;
    if labels.is_empty() {
        return Err(ResampleError::InvalidConfiguration(format!(
            "label column `{label_column}` is empty"
        )));
    }
    Ok(labels)
}

fn check_label_column(label_column: &str) -> Result<(), ResampleError> {
    if label_column.trim().is_empty() {
        return Err(ResampleError::InvalidConfiguration(
            "label column name is empty".to_string(),
        ));
    }
    Ok(())
}

fn check_folds(folds: usize) -> Result<(), ResampleError> {
    if folds < 2 {
        return Err(ResampleError::InvalidConfiguration(format!(
            "number of folds must be at least 2, got {folds}"
        )));
    }
    Ok(())
}

fn check_repeats(repeats: usize) -> Result<(), ResampleError> {
    if repeats == 0 {
        return Err(ResampleError::InvalidConfiguration(
            "repeats must be at least 1".to_string(),
        ));
    }
    Ok(())
}
