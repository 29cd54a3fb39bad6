//! Feature encoding fitted on the analysis rows of a resample.
//!
//! Numeric columns fill missing values with the analysis mean and are
//! optionally standardized. Factor columns are one-hot encoded on the levels
//! seen in the analysis rows; unseen levels encode as all zeros. Text columns
//! and the label column never become features.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::MlError;
use crate::dataset::{ColumnType, Dataset, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureTransform {
    /// Numeric columns as-is (after mean imputation).
    Raw,
    /// Numeric columns centred and scaled to unit variance.
    #[default]
    Standardize,
}

#[derive(Debug, Clone, PartialEq)]
enum Encoder {
    Numeric {
        column: usize,
        fill: f64,
        center: f64,
        scale: f64,
    },
    OneHot {
        column: usize,
        levels: Vec<String>,
    },
}

/// Encoders learned from one set of analysis rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedTransform {
    encoders: Vec<Encoder>,
    names: Vec<String>,
}

impl FeatureTransform {
    /// Fit encoders on `rows`, skipping the column at position `label`.
    pub fn fit(
        self,
        dataset: &Dataset,
        rows: &[usize],
        label: usize,
    ) -> Result<FittedTransform, MlError> {
        let mut encoders = Vec::new();
        let mut names = Vec::new();
        for (column, spec) in dataset.schema().columns().iter().enumerate() {
            if column == label {
                continue;
            }
            match spec.kind {
                ColumnType::Numeric => {
                    let values: Vec<f64> = rows
                        .iter()
                        .filter_map(|&row| dataset.value(row, column).as_f64())
                        .collect();
                    let (mean, std) = mean_std(&values);
                    let (center, scale) = match self {
                        FeatureTransform::Raw => (0.0, 1.0),
                        FeatureTransform::Standardize => {
                            (mean, if std > f64::EPSILON { std } else { 1.0 })
                        }
                    };
                    encoders.push(Encoder::Numeric {
                        column,
                        fill: mean,
                        center,
                        scale,
                    });
                    names.push(spec.name.clone());
                }
                ColumnType::Factor => {
                    let levels: BTreeSet<&str> = rows
                        .iter()
                        .filter_map(|&row| dataset.value(row, column).as_str())
                        .collect();
                    names.extend(levels.iter().map(|level| format!("{}_{level}", spec.name)));
                    encoders.push(Encoder::OneHot {
                        column,
                        levels: levels.into_iter().map(str::to_string).collect(),
                    });
                }
                ColumnType::Text => {}
            }
        }
        if names.is_empty() {
            let label_name = dataset
                .schema()
                .columns()
                .get(label)
                .map(|spec| spec.name.clone())
                .unwrap_or_default();
            return Err(MlError::NoFeatures(label_name));
        }
        Ok(FittedTransform { encoders, names })
    }
}

impl FittedTransform {
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Names of the encoded features (`column` or `column_level`).
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Encode the listed rows in order.
    pub fn apply(&self, dataset: &Dataset, rows: &[usize]) -> Vec<Vec<f32>> {
        rows.iter().map(|&row| self.encode(dataset, row)).collect()
    }

    fn encode(&self, dataset: &Dataset, row: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.width());
        for encoder in &self.encoders {
            match encoder {
                Encoder::Numeric {
                    column,
                    fill,
                    center,
                    scale,
                } => {
                    let value = dataset.value(row, *column).as_f64().unwrap_or(*fill);
                    out.push(((value - center) / scale) as f32);
                }
                Encoder::OneHot { column, levels } => {
                    let value = match dataset.value(row, *column) {
                        Value::Factor(level) => Some(level.as_str()),
                        _ => None,
                    };
                    out.extend(
                        levels
                            .iter()
                            .map(|level| if Some(level.as_str()) == value { 1.0 } else { 0.0 }),
                    );
                }
            }
        }
        out
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnSpec, Schema};

    fn dataset() -> Dataset {
        let schema = Schema::new(vec![
            ColumnSpec::new("nights", ColumnType::Numeric),
            ColumnSpec::new("meal", ColumnType::Factor),
            ColumnSpec::new("comment", ColumnType::Text),
            ColumnSpec::new("children", ColumnType::Factor),
        ])
        .unwrap();
        let row = |nights: Option<f64>, meal: &str, children: &str| {
            vec![
                nights.map(Value::Numeric).unwrap_or(Value::Missing),
                Value::Factor(meal.to_string()),
                Value::Text("free text".to_string()),
                Value::Factor(children.to_string()),
            ]
        };
        Dataset::from_rows(
            schema,
            vec![
                row(Some(1.0), "BB", "none"),
                row(Some(3.0), "HB", "children"),
                row(None, "BB", "none"),
                row(Some(5.0), "FB", "none"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn standardizes_and_one_hot_encodes_analysis_rows() {
        let data = dataset();
        let fitted = FeatureTransform::Standardize
            .fit(&data, &[0, 1, 2], 3)
            .unwrap();
        assert_eq!(fitted.feature_names(), &["nights", "meal_BB", "meal_HB"]);
        let rows = fitted.apply(&data, &[0, 2, 3]);
        // Analysis mean 2, std 1.
        assert_eq!(rows[0], vec![-1.0, 1.0, 0.0]);
        assert_eq!(rows[1], vec![0.0, 1.0, 0.0]);
        // "FB" was not seen while fitting.
        assert_eq!(rows[2], vec![3.0, 0.0, 0.0]);
    }

    #[test]
    fn raw_keeps_numeric_scale() {
        let data = dataset();
        let fitted = FeatureTransform::Raw.fit(&data, &[0, 1, 2, 3], 3).unwrap();
        let rows = fitted.apply(&data, &[2, 3]);
        assert_eq!(rows[0][0], 3.0);
        assert_eq!(rows[1][0], 5.0);
        assert_eq!(fitted.width(), 4);
    }

    #[test]
    fn label_only_dataset_has_no_features() {
        let schema = Schema::new(vec![ColumnSpec::new("y", ColumnType::Factor)]).unwrap();
        let data =
            Dataset::from_rows(schema, vec![vec![Value::Factor("a".to_string())]]).unwrap();
        let err = FeatureTransform::Raw.fit(&data, &[0], 0).unwrap_err();
        assert_eq!(err, MlError::NoFeatures("y".to_string()));
    }
}
