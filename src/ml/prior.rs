//! Class-prior baseline: predicts the training class frequencies for every row.

use serde::{Deserialize, Serialize};

use super::{MlError, TrainDataset};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassPriorModel {
    pub classes: Vec<String>,
    pub priors: Vec<f32>,
}

impl ClassPriorModel {
    pub fn fit(dataset: &TrainDataset) -> Result<Self, MlError> {
        dataset.validate()?;
        let mut counts = vec![0f32; dataset.classes.len()];
        for &label in &dataset.y {
            counts[label] += 1.0;
        }
        let total = dataset.y.len() as f32;
        Ok(Self {
            classes: dataset.classes.clone(),
            priors: counts.into_iter().map(|count| count / total).collect(),
        })
    }

    pub fn predict_proba(&self, _features: &[f32]) -> Vec<f32> {
        self.priors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priors_follow_training_frequencies() {
        let data = TrainDataset {
            classes: vec!["a".into(), "b".into()],
            x: vec![vec![0.0]; 4],
            y: vec![0, 0, 0, 1],
        };
        let model = ClassPriorModel::fit(&data).unwrap();
        assert_eq!(model.predict_proba(&[9.0]), vec![0.75, 0.25]);
    }
}
