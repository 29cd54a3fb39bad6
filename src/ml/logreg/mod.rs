//! Multinomial logistic regression on dense feature rows.

use serde::{Deserialize, Serialize};

use super::MlError;

mod train;
pub use train::{TrainOptions, train_logreg};

/// Fitted logistic regression weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRegModel {
    pub model_version: i64,
    pub classes: Vec<String>,
    pub n_features: usize,
    /// Row-major `[class][feature]`.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl LogRegModel {
    /// Validate the model dimensions.
    pub fn validate(&self) -> Result<(), MlError> {
        let classes = self.classes.len();
        if classes == 0 {
            return Err(MlError::NoClasses);
        }
        if self.weights.len() != classes * self.n_features {
            return Err(MlError::InvalidModel("weights length mismatch".to_string()));
        }
        if self.bias.len() != classes {
            return Err(MlError::InvalidModel("bias length mismatch".to_string()));
        }
        if self.weights.iter().chain(&self.bias).any(|w| !w.is_finite()) {
            return Err(MlError::InvalidModel("non-finite coefficient".to_string()));
        }
        Ok(())
    }

    pub(super) fn logits(&self, features: &[f32]) -> Vec<f32> {
        logits(&self.weights, &self.bias, self.n_features, features)
    }

    /// Class probabilities for one feature row; empty on a width mismatch.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        if features.len() != self.n_features || self.classes.is_empty() {
            return Vec::new();
        }
        softmax(&self.logits(features))
    }
}

fn logits(weights: &[f32], bias: &[f32], dim: usize, features: &[f32]) -> Vec<f32> {
    bias.iter()
        .enumerate()
        .map(|(class, &b)| {
            let row = &weights[class * dim..(class + 1) * dim];
            b + row.iter().zip(features).map(|(w, x)| w * x).sum::<f32>()
        })
        .collect()
}

/// Numerically stable softmax.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_model_predicts_uniform() {
        let model = LogRegModel {
            model_version: 1,
            classes: vec!["a".into(), "b".into(), "c".into()],
            n_features: 2,
            weights: vec![0.0; 6],
            bias: vec![0.0; 3],
        };
        model.validate().unwrap();
        let out = model.predict_proba(&[1.0, -1.0]);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-6));
        assert!(model.predict_proba(&[1.0]).is_empty());
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        let model = LogRegModel {
            model_version: 1,
            classes: vec!["a".into(), "b".into()],
            n_features: 2,
            weights: vec![0.0; 3],
            bias: vec![0.0; 2],
        };
        assert!(matches!(model.validate(), Err(MlError::InvalidModel(_))));
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let out = softmax(&[1000.0, 1000.0]);
        assert!((out[0] - 0.5).abs() < 1e-6);
        let sum: f32 = softmax(&[3.0, -2.0, 0.5]).iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
}
