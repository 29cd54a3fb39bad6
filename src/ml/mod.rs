//! Model fitting and assessment over resampled partitions.
//!
//! A [`workflow::Workflow`] composes a fixed sequence of stages: resampling,
//! feature transform, estimator. The estimators here are small baselines used
//! to exercise the partitions end to end.

pub mod logreg;
pub mod metrics;
pub mod prior;
pub mod transform;
pub mod workflow;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MlError {
    #[error("empty training set")]
    EmptyTrainingSet,
    #[error("{rows} feature rows but {labels} labels")]
    MismatchedInputs { rows: usize, labels: usize },
    #[error("no classes available for training")]
    NoClasses,
    #[error("row {row} has {found} features, expected {expected}")]
    InconsistentRowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("label index {label} out of range for {classes} classes")]
    LabelOutOfRange { label: usize, classes: usize },
    #[error("no predictor columns besides the label `{0}`")]
    NoFeatures(String),
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// In-memory training data: dense feature rows and class indices.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    pub classes: Vec<String>,
    pub x: Vec<Vec<f32>>,
    pub y: Vec<usize>,
}

impl TrainDataset {
    /// Check shapes and label ranges; returns the feature width.
    pub fn validate(&self) -> Result<usize, MlError> {
        if self.x.is_empty() || self.y.is_empty() {
            return Err(MlError::EmptyTrainingSet);
        }
        if self.x.len() != self.y.len() {
            return Err(MlError::MismatchedInputs {
                rows: self.x.len(),
                labels: self.y.len(),
            });
        }
        let classes = self.classes.len();
        if classes == 0 {
            return Err(MlError::NoClasses);
        }
        let dim = self.x[0].len();
        for (row, features) in self.x.iter().enumerate() {
            if features.len() != dim {
                return Err(MlError::InconsistentRowLength {
                    row,
                    expected: dim,
                    found: features.len(),
                });
            }
        }
        if let Some(&label) = self.y.iter().find(|&&label| label >= classes) {
            return Err(MlError::LabelOutOfRange { label, classes });
        }
        Ok(dim)
    }
}

/// Index of the largest value; the first wins on ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &val) in values.iter().enumerate() {
        if val > best_val {
            best_val = val;
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_shape_problems() {
        let mut data = TrainDataset {
            classes: vec!["a".into(), "b".into()],
            x: vec![vec![0.0, 1.0], vec![1.0]],
            y: vec![0, 1],
        };
        assert_eq!(
            data.validate(),
            Err(MlError::InconsistentRowLength {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        data.x[1].push(2.0);
        assert_eq!(data.validate(), Ok(2));
        data.y[1] = 5;
        assert_eq!(
            data.validate(),
            Err(MlError::LabelOutOfRange {
                label: 5,
                classes: 2
            })
        );
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
