use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};

use super::{LogRegModel, softmax};
use crate::ml::{MlError, TrainDataset};

/// Minibatch gradient descent options for [`train_logreg`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub seed: u64,
    /// Weight each class inversely to its frequency.
    pub balance_classes: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 50,
            learning_rate: 0.1,
            batch_size: 32,
            seed: 42,
            balance_classes: false,
        }
    }
}

/// Fit an unpenalized softmax regression.
pub fn train_logreg(
    dataset: &TrainDataset,
    options: &TrainOptions,
) -> Result<LogRegModel, MlError> {
    let dim = dataset.validate()?;
    let classes = dataset.classes.len();

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut weights = vec![0.0f32; classes * dim];
    let mut bias = vec![0.0f32; classes];
    for w in &mut weights {
        *w = (rng.random::<f32>() - 0.5) * 0.01;
    }

    let mut indices: Vec<usize> = (0..dataset.x.len()).collect();
    let batch_size = options.batch_size.max(1);
    let lr = options.learning_rate;
    let class_weights = class_weights(&dataset.y, classes, options.balance_classes);

    for _epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        for chunk in indices.chunks(batch_size) {
            let mut grad_w = vec![0.0f32; weights.len()];
            let mut grad_b = vec![0.0f32; bias.len()];
            let mut batch_weight = 0.0f32;
            for &idx in chunk {
                let x = &dataset.x[idx];
                let y = dataset.y[idx];
                let weight = class_weights[y];
                if weight == 0.0 {
                    continue;
                }
                let probs = softmax(&super::logits(&weights, &bias, dim, x));
                for c in 0..classes {
                    let diff = (probs[c] - if c == y { 1.0 } else { 0.0 }) * weight;
                    let base = c * dim;
                    for i in 0..dim {
                        grad_w[base + i] += diff * x[i];
                    }
                    grad_b[c] += diff;
                }
                batch_weight += weight;
            }
            if batch_weight == 0.0 {
                continue;
            }
            let step = lr / batch_weight;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= step * g;
            }
            for (b, g) in bias.iter_mut().zip(&grad_b) {
                *b -= step * g;
            }
        }
    }

    let model = LogRegModel {
        model_version: 1,
        classes: dataset.classes.clone(),
        n_features: dim,
        weights,
        bias,
    };
    model.validate()?;
    tracing::debug!(
        "Trained logistic regression on {} rows, {} features, {} classes",
        dataset.x.len(),
        dim,
        classes
    );
    Ok(model)
}

fn class_weights(y: &[usize], classes: usize, balance: bool) -> Vec<f32> {
    if !balance {
        return vec![1.0; classes];
    }
    let mut counts = vec![0f32; classes];
    for &label in y {
        counts[label] += 1.0;
    }
    let total: f32 = counts.iter().sum();
    counts
        .into_iter()
        .map(|count| {
            if count == 0.0 {
                0.0
            } else {
                total / (classes as f32 * count)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::argmax;

    fn separable() -> TrainDataset {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let offset = (i % 10) as f32 * 0.05;
            x.push(vec![-1.0 - offset, 0.5]);
            y.push(0);
            x.push(vec![1.0 + offset, 0.5]);
            y.push(1);
        }
        TrainDataset {
            classes: vec!["no".into(), "yes".into()],
            x,
            y,
        }
    }

    #[test]
    fn learns_a_separable_boundary() {
        let data = separable();
        let model = train_logreg(&data, &TrainOptions::default()).unwrap();
        assert_eq!(argmax(&model.predict_proba(&[-1.2, 0.5])), 0);
        assert_eq!(argmax(&model.predict_proba(&[1.2, 0.5])), 1);
        assert!(model.predict_proba(&[2.0, 0.5])[1] > 0.9);
    }

    #[test]
    fn training_is_reproducible_for_a_seed() {
        let data = separable();
        let options = TrainOptions {
            epochs: 5,
            ..TrainOptions::default()
        };
        let a = train_logreg(&data, &options).unwrap();
        let b = train_logreg(&data, &options).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
    }

    #[test]
    fn balanced_weights_are_inverse_frequency() {
        let weights = class_weights(&[0, 0, 0, 1], 3, true);
        assert_eq!(weights, vec![4.0 / 9.0, 4.0 / 3.0, 0.0]);
        assert_eq!(class_weights(&[0, 1], 2, false), vec![1.0, 1.0]);
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let data = TrainDataset {
            classes: vec!["a".into()],
            x: Vec::new(),
            y: Vec::new(),
        };
        assert_eq!(
            train_logreg(&data, &TrainOptions::default()).unwrap_err(),
            MlError::EmptyTrainingSet
        );
    }
}
