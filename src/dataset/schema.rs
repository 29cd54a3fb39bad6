use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::DatasetError;

/// Declared type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Floating point measurements.
    Numeric,
    /// Categorical values drawn from a finite set of levels.
    Factor,
    /// Free-form text, never used as a predictor.
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Factor => "factor",
            ColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

/// Name and declared type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered set of uniquely named columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema, rejecting empty or duplicate column names.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, DatasetError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(DatasetError::EmptyColumnName { position });
            }
            if index.insert(column.name.clone(), position).is_some() {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `name` in the schema.
    pub fn position(&self, name: &str) -> Result<usize, DatasetError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    /// Declared type of `name`.
    pub fn kind_of(&self, name: &str) -> Result<ColumnType, DatasetError> {
        Ok(self.columns[self.position(name)?].kind)
    }
}
