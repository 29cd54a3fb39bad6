//! Fixed-order composition of resampling, feature transform and estimator.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logreg::{LogRegModel, TrainOptions, train_logreg};
use super::metrics::{
    ConfusionMatrix, PerClassStats, accuracy, macro_f1, precision_recall_by_class,
    roc_auc_one_vs_rest,
};
use super::prior::ClassPriorModel;
use super::transform::FeatureTransform;
use super::{MlError, TrainDataset, argmax};
use crate::dataset::{Dataset, DatasetError};
use crate::resample::{self, PartitionName, ResampleError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Resample(#[from] ResampleError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("model error: {0}")]
    Model(#[from] MlError),
}

/// How analysis and assessment rows are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resampling {
    /// One stratified split; assessed on the held-out side.
    Holdout { held_out_fraction: f64 },
    /// Stratified (repeated) cross-validation; assessed on every fold.
    KFold { folds: usize, repeats: usize },
    /// Fit on train; assessed on validation and on test.
    TrainValidationTest {
        test_fraction: f64,
        validation_fraction: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Estimator {
    LogisticRegression(TrainOptions),
    ClassPrior,
}

#[derive(Debug, Clone)]
pub enum FittedModel {
    LogisticRegression(LogRegModel),
    ClassPrior(ClassPriorModel),
}

impl Estimator {
    pub fn fit(&self, data: &TrainDataset) -> Result<FittedModel, MlError> {
        match self {
            Estimator::LogisticRegression(options) => {
                train_logreg(data, options).map(FittedModel::LogisticRegression)
            }
            Estimator::ClassPrior => ClassPriorModel::fit(data).map(FittedModel::ClassPrior),
        }
    }
}

impl FittedModel {
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        match self {
            FittedModel::LogisticRegression(model) => model.predict_proba(features),
            FittedModel::ClassPrior(model) => model.predict_proba(features),
        }
    }
}

/// Performance of one fitted model on one assessment partition.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub repeat: usize,
    pub partition: PartitionName,
    pub analysis_rows: usize,
    pub assessment_rows: usize,
    pub accuracy: f32,
    pub macro_f1: f32,
    pub roc_auc: Option<f64>,
    /// Precision, recall and support keyed by class name.
    pub per_class: BTreeMap<String, PerClassStats>,
}

/// Mean and standard error of one metric across assessments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: String,
    pub mean: f64,
    pub std_err: f64,
    pub n: usize,
}

#[derive(Debug, Clone)]
pub struct Workflow {
    pub label_column: String,
    pub seed: u64,
    pub resampling: Resampling,
    pub transform: FeatureTransform,
    pub estimator: Estimator,
}

struct Target<'a> {
    column: usize,
    classes: Vec<String>,
    class_index: BTreeMap<&'a str, usize>,
    labels: Vec<&'a str>,
}

impl Workflow {
    /// Fit and assess the estimator on every partition the resampling yields.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<Vec<Assessment>, WorkflowError> {
        let labels = dataset.labels(&self.label_column)?;
        let levels: BTreeSet<&str> = labels.iter().copied().collect();
        let target = Target {
            column: dataset.schema().position(&self.label_column)?,
            classes: levels.iter().map(|level| level.to_string()).collect(),
            class_index: levels.iter().enumerate().map(|(i, &level)| (level, i)).collect(),
            labels,
        };

        let label = self.label_column.as_str();
        let mut assessments = Vec::new();
        match &self.resampling {
            Resampling::Holdout { held_out_fraction } => {
                let split = resample::split(dataset, label, *held_out_fraction, self.seed)?;
                assessments.push(self.assess(
                    dataset,
                    &target,
                    0,
                    PartitionName::Test,
                    &split.train,
                    &split.held_out,
                )?);
            }
            Resampling::KFold { folds, repeats } => {
                let assignments =
                    resample::repeated_k_fold(dataset, label, *folds, *repeats, self.seed)?;
                for (repeat, assignment) in assignments.iter().enumerate() {
                    for fold in 0..assignment.k() {
                        assessments.push(self.assess(
                            dataset,
                            &target,
                            repeat,
                            PartitionName::Fold(fold),
                            &assignment.analysis(fold),
                            &assignment.assessment(fold),
                        )?);
                    }
                }
            }
            Resampling::TrainValidationTest {
                test_fraction,
                validation_fraction,
            } => {
                let three = resample::train_validation_test(
                    dataset,
                    label,
                    *test_fraction,
                    *validation_fraction,
                    self.seed,
                )?;
                for (name, rows) in [
                    (PartitionName::Validation, &three.validation),
                    (PartitionName::Test, &three.test),
                ] {
                    assessments.push(self.assess(dataset, &target, 0, name, &three.train, rows)?);
                }
            }
        }
        tracing::info!(
            "Evaluated {} assessment partitions on `{}`",
            assessments.len(),
            self.label_column
        );
        Ok(assessments)
    }

    fn assess(
        &self,
        dataset: &Dataset,
        target: &Target<'_>,
        repeat: usize,
        partition: PartitionName,
        analysis: &[usize],
        assessment: &[usize],
    ) -> Result<Assessment, WorkflowError> {
        let class_of = |row: usize| target.class_index[target.labels[row]];
        let fitted = self.transform.fit(dataset, analysis, target.column)?;
        tracing::debug!("{} features: {:?}", fitted.width(), fitted.feature_names());
        let train = TrainDataset {
            classes: target.classes.clone(),
            x: fitted.apply(dataset, analysis),
            y: analysis.iter().map(|&row| class_of(row)).collect(),
        };
        let model = self.estimator.fit(&train)?;

        let mut cm = ConfusionMatrix::new(target.classes.len());
        let mut probabilities = Vec::with_capacity(assessment.len());
        let mut truth = Vec::with_capacity(assessment.len());
        for (features, &row) in fitted.apply(dataset, assessment).iter().zip(assessment) {
            let proba = model.predict_proba(features);
            let actual = class_of(row);
            cm.add(actual, argmax(&proba));
            probabilities.push(proba);
            truth.push(actual);
        }
        let stats = precision_recall_by_class(&cm);
        let assessed = Assessment {
            repeat,
            partition,
            analysis_rows: analysis.len(),
            assessment_rows: assessment.len(),
            accuracy: accuracy(&cm),
            macro_f1: macro_f1(&stats),
            roc_auc: roc_auc_one_vs_rest(&probabilities, &truth, target.classes.len()),
            per_class: target.classes.iter().cloned().zip(stats).collect(),
        };
        tracing::debug!(
            "repeat {repeat} {partition}: accuracy {:.4}, macro F1 {:.4}, roc_auc {:?}",
            assessed.accuracy,
            assessed.macro_f1,
            assessed.roc_auc
        );
        Ok(assessed)
    }
}

/// Mean and standard error of accuracy, macro F1 and ROC AUC across assessments.
pub fn summarize(assessments: &[Assessment]) -> Vec<MetricSummary> {
    let accuracy: Vec<f64> = assessments.iter().map(|a| a.accuracy as f64).collect();
    let macro_f1: Vec<f64> = assessments.iter().map(|a| a.macro_f1 as f64).collect();
    let roc_auc: Vec<f64> = assessments.iter().filter_map(|a| a.roc_auc).collect();
    [("accuracy", accuracy), ("macro_f1", macro_f1), ("roc_auc", roc_auc)]
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(metric, values)| {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let std_err = if values.len() > 1 {
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
                (var / n).sqrt()
            } else {
                0.0
            };
            MetricSummary {
                metric: metric.to_string(),
                mean,
                std_err,
                n: values.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnSpec, ColumnType, Schema, Value};

    fn bookings() -> Dataset {
        let schema = Schema::new(vec![
            ColumnSpec::new("lead_time", ColumnType::Numeric),
            ColumnSpec::new("children", ColumnType::Factor),
        ])
        .unwrap();
        let mut rows = Vec::new();
        for i in 0..60 {
            let jitter = (i % 7) as f64;
            rows.push(vec![
                Value::Numeric(10.0 + jitter),
                Value::Factor("children".to_string()),
            ]);
            rows.push(vec![
                Value::Numeric(40.0 + jitter),
                Value::Factor("none".to_string()),
            ]);
        }
        Dataset::from_rows(schema, rows).unwrap()
    }

    fn workflow(resampling: Resampling, estimator: Estimator) -> Workflow {
        Workflow {
            label_column: "children".to_string(),
            seed: 7,
            resampling,
            transform: FeatureTransform::Standardize,
            estimator,
        }
    }

    #[test]
    fn k_fold_yields_one_assessment_per_fold_and_repeat() {
        let wf = workflow(
            Resampling::KFold {
                folds: 4,
                repeats: 2,
            },
            Estimator::LogisticRegression(TrainOptions::default()),
        );
        let assessments = wf.evaluate(&bookings()).unwrap();
        assert_eq!(assessments.len(), 8);
        assert_eq!(assessments[5].repeat, 1);
        assert_eq!(assessments[5].partition, PartitionName::Fold(1));
        for a in &assessments {
            assert_eq!(a.assessment_rows, 30);
            assert_eq!(a.analysis_rows, 90);
            assert!(a.accuracy > 0.95, "{a:?}");
            assert!(a.macro_f1 > 0.95, "{a:?}");
            assert!(a.roc_auc.unwrap() > 0.99, "{a:?}");
            let classes: Vec<&str> = a.per_class.keys().map(String::as_str).collect();
            assert_eq!(classes, vec!["children", "none"]);
            assert_eq!(a.per_class["children"].support, 15);
            assert_eq!(a.per_class["none"].support, 15);
            assert!(a.per_class["children"].recall > 0.9, "{a:?}");
        }
    }

    #[test]
    fn class_prior_baseline_has_chance_auc() {
        let wf = workflow(
            Resampling::Holdout {
                held_out_fraction: 0.25,
            },
            Estimator::ClassPrior,
        );
        let assessments = wf.evaluate(&bookings()).unwrap();
        assert_eq!(assessments.len(), 1);
        assert_eq!(assessments[0].partition, PartitionName::Test);
        assert_eq!(assessments[0].assessment_rows, 30);
        assert_eq!(assessments[0].roc_auc, Some(0.5));
    }

    #[test]
    fn three_way_assesses_validation_and_test() {
        let wf = workflow(
            Resampling::TrainValidationTest {
                test_fraction: 0.25,
                validation_fraction: 0.2,
            },
            Estimator::LogisticRegression(TrainOptions::default()),
        );
        let assessments = wf.evaluate(&bookings()).unwrap();
        let names: Vec<PartitionName> = assessments.iter().map(|a| a.partition).collect();
        assert_eq!(names, vec![PartitionName::Validation, PartitionName::Test]);
        assert_eq!(assessments[0].assessment_rows, 18);
        assert_eq!(assessments[1].assessment_rows, 30);
        assert_eq!(assessments[0].analysis_rows, 72);
    }

    #[test]
    fn resampling_errors_surface() {
        let wf = workflow(
            Resampling::KFold {
                folds: 100,
                repeats: 1,
            },
            Estimator::ClassPrior,
        );
        let err = wf.evaluate(&bookings()).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Resample(ResampleError::InsufficientData(_))
        ));
    }

    #[test]
    fn label_problems_keep_their_error_kind() {
        let mut wf = workflow(
            Resampling::Holdout {
                held_out_fraction: 0.25,
            },
            Estimator::ClassPrior,
        );
        wf.label_column = "kids".to_string();
        let err = wf.evaluate(&bookings()).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Dataset(DatasetError::UnknownColumn(ref name)) if name == "kids"
        ));

        let schema = Schema::new(vec![ColumnSpec::new("children", ColumnType::Factor)]).unwrap();
        let rows = ["children", "none"]
            .iter()
            .cycle()
            .take(8)
            .map(|label| vec![Value::Factor(label.to_string())])
            .collect();
        let labels_only = Dataset::from_rows(schema, rows).unwrap();
        wf.label_column = "children".to_string();
        let err = wf.evaluate(&labels_only).unwrap_err();
        assert_eq!(
            err.to_string(),
            "model error: no predictor columns besides the label `children`"
        );
    }

    #[test]
    fn summary_reports_mean_and_standard_error() {
        let make = |accuracy: f32, roc_auc: Option<f64>| Assessment {
            repeat: 0,
            partition: PartitionName::Fold(0),
            analysis_rows: 1,
            assessment_rows: 1,
            accuracy,
            macro_f1: 0.5,
            roc_auc,
            per_class: BTreeMap::new(),
        };
        let summary = summarize(&[make(0.5, Some(0.6)), make(1.0, None), make(0.75, Some(0.8))]);
        let names: Vec<&str> = summary.iter().map(|m| m.metric.as_str()).collect();
        assert_eq!(names, vec!["accuracy", "macro_f1", "roc_auc"]);
        assert!((summary[0].mean - 0.75).abs() < 1e-9);
        assert!((summary[0].std_err - (0.0625f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(summary[1].std_err, 0.0);
        assert_eq!(summary[2].n, 2);
        assert!((summary[2].mean - 0.7).abs() < 1e-9);
    }
}
