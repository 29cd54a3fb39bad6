//! Tabular datasets with an explicit, load-time validated schema.
//!
//! Records are stored row-major and aligned with the schema's column order.
//! Every cell either matches its column's declared type or is `Missing`.

mod loader;
mod schema;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub use loader::{MISSING_TOKENS, load_csv, read_csv};
pub use schema::{ColumnSpec, ColumnType, Schema};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("column name at position {position} is empty")]
    EmptyColumnName { position: usize },
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("row {row}: expected {expected} values, found {found}")]
    Arity {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}: column `{column}` expects a {expected} value")]
    TypeMismatch {
        row: usize,
        column: String,
        expected: ColumnType,
    },
    #[error("row {row}: column `{column}` has non-numeric value `{value}`")]
    ParseNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("column `{column}` is {kind}, not a factor")]
    NotCategorical { column: String, kind: ColumnType },
    #[error("row {row}: label column `{column}` is missing")]
    MissingLabel { row: usize, column: String },
    #[error("record index {index} out of range for {len} records")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("CSV header has no column `{0}`")]
    MissingCsvColumn(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Numeric(f64),
    Factor(String),
    Text(String),
    Missing,
}

impl Value {
    /// Column type this value satisfies; `None` for `Missing`.
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            Value::Numeric(_) => Some(ColumnType::Numeric),
            Value::Factor(_) => Some(ColumnType::Factor),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Missing => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Factor(value) | Value::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(value) => write!(f, "{value}"),
            Value::Factor(value) | Value::Text(value) => f.write_str(value),
            Value::Missing => f.write_str("NA"),
        }
    }
}

/// Ordered, schema-validated records.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Build a dataset from pre-assembled rows, validating each one.
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        let mut dataset = Self::new(schema);
        dataset.rows.reserve(rows.len());
        for values in rows {
            dataset.push(values)?;
        }
        Ok(dataset)
    }

    /// Append a record after checking arity and per-column types.
    pub fn push(&mut self, values: Vec<Value>) -> Result<(), DatasetError> {
        let row = self.rows.len();
        if values.len() != self.schema.len() {
            return Err(DatasetError::Arity {
                row,
                expected: self.schema.len(),
                found: values.len(),
            });
        }
        for (column, value) in self.schema.columns().iter().zip(&values) {
            if let Some(kind) = value.kind()
                && kind != column.kind
            {
                return Err(DatasetError::TypeMismatch {
                    row,
                    column: column.name.clone(),
                    expected: column.kind,
                });
            }
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at (`row`, column position). Panics on out-of-range positions.
    pub fn value(&self, row: usize, column: usize) -> &Value {
        &self.rows[row][column]
    }

    /// Values of one column in record order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>, DatasetError> {
        let position = self.schema.position(name)?;
        Ok(self.rows.iter().map(move |row| &row[position]))
    }

    /// Label of every record, for stratification.
    ///
    /// The column must be a factor and have no missing values.
    pub fn labels(&self, column: &str) -> Result<Vec<&str>, DatasetError> {
        let kind = self.schema.kind_of(column)?;
        if kind != ColumnType::Factor {
            return Err(DatasetError::NotCategorical {
                column: column.to_string(),
                kind,
            });
        }
        self.column(column)?
            .enumerate()
            .map(|(row, value)| {
                value.as_str().ok_or_else(|| DatasetError::MissingLabel {
                    row,
                    column: column.to_string(),
                })
            })
            .collect()
    }

    /// Count of records per label over the listed indices.
    pub fn class_counts(
        &self,
        column: &str,
        indices: &[usize],
    ) -> Result<BTreeMap<String, usize>, DatasetError> {
        let labels = self.labels(column)?;
        let mut counts = BTreeMap::new();
        for &index in indices {
            let label = labels.get(index).ok_or(DatasetError::IndexOutOfRange {
                index,
                len: labels.len(),
            })?;
            *counts.entry((*label).to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::new("x", ColumnType::Numeric),
            ColumnSpec::new("class", ColumnType::Factor),
            ColumnSpec::new("note", ColumnType::Text),
        ])
        .unwrap()
    }

    fn row(x: f64, class: &str) -> Vec<Value> {
        vec![
            Value::Numeric(x),
            Value::Factor(class.to_string()),
            Value::Missing,
        ]
    }

    #[test]
    fn push_validates_arity_and_types() {
        let mut dataset = Dataset::new(schema());
        dataset.push(row(1.0, "a")).unwrap();
        let err = dataset.push(vec![Value::Numeric(1.0)]).unwrap_err();
        assert!(matches!(err, DatasetError::Arity { row: 1, expected: 3, found: 1 }));
        let err = dataset
            .push(vec![
                Value::Factor("oops".into()),
                Value::Factor("a".into()),
                Value::Missing,
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::TypeMismatch { row: 1, expected: ColumnType::Numeric, .. }
        ));
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn labels_require_a_complete_factor_column() {
        let mut dataset = Dataset::from_rows(schema(), vec![row(1.0, "a"), row(2.0, "b")]).unwrap();
        assert_eq!(dataset.labels("class").unwrap(), vec!["a", "b"]);
        assert!(matches!(
            dataset.labels("x").unwrap_err(),
            DatasetError::NotCategorical { kind: ColumnType::Numeric, .. }
        ));
        assert!(matches!(
            dataset.labels("nope").unwrap_err(),
            DatasetError::UnknownColumn(_)
        ));
        dataset
            .push(vec![Value::Numeric(3.0), Value::Missing, Value::Missing])
            .unwrap();
        assert!(matches!(
            dataset.labels("class").unwrap_err(),
            DatasetError::MissingLabel { row: 2, .. }
        ));
    }

    #[test]
    fn class_counts_over_indices() {
        let dataset = Dataset::from_rows(
            schema(),
            vec![row(1.0, "a"), row(2.0, "b"), row(3.0, "a")],
        )
        .unwrap();
        let counts = dataset.class_counts("class", &[0, 2]).unwrap();
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), None);
        assert!(matches!(
            dataset.class_counts("class", &[3]).unwrap_err(),
            DatasetError::IndexOutOfRange { index: 3, len: 3 }
        ));
    }
}
