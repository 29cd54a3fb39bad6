use super::{EstimatorKind, ResamplingKind};
use crate::ml::transform::FeatureTransform;

pub(super) const MAX_LOG_FILES: usize = 10;

pub(super) fn default_label_column() -> String {
    "class".to_string()
}

pub(super) fn default_seed() -> u64 {
    42
}

pub(super) fn default_held_out_fraction() -> f64 {
    0.25
}

pub(super) fn default_validation_fraction() -> f64 {
    0.2
}

pub(super) fn default_folds() -> usize {
    10
}

pub(super) fn default_repeats() -> usize {
    1
}

pub(super) fn default_resampling() -> ResamplingKind {
    ResamplingKind::KFold
}

pub(super) fn default_estimator() -> EstimatorKind {
    EstimatorKind::LogisticRegression
}

pub(super) fn default_transform() -> FeatureTransform {
    FeatureTransform::Standardize
}

pub(super) fn default_epochs() -> usize {
    50
}

pub(super) fn default_learning_rate() -> f32 {
    0.1
}

pub(super) fn default_batch_size() -> usize {
    32
}

pub(super) fn default_false() -> bool {
    false
}

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_log_filter() -> String {
    "info".to_string()
}

pub(super) fn default_max_log_files() -> usize {
    MAX_LOG_FILES
}
