//! CSV loader validating records against a declared schema.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{ColumnSpec, ColumnType, Dataset, DatasetError, Schema, Value};

/// Cell contents treated as a missing value.
pub const MISSING_TOKENS: &[&str] = &["", "NA"];

/// Load `path` as a CSV with a header row.
pub fn load_csv(path: &Path, schema: &Schema) -> Result<Dataset, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = read_csv(BufReader::new(file), schema)?;
    tracing::info!(
        "Loaded {} records x {} columns from {}",
        dataset.len(),
        schema.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse CSV from any reader.
///
/// Every schema column must appear in the header; extra header columns are
/// skipped. Cells are trimmed before parsing.
pub fn read_csv<R: Read>(reader: R, schema: &Schema) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let positions = schema
        .columns()
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|header| header == column.name)
                .ok_or_else(|| DatasetError::MissingCsvColumn(column.name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let skipped = headers.len().saturating_sub(positions.len());
    if skipped > 0 {
        tracing::debug!("Ignoring {skipped} CSV columns not declared in the schema");
    }

    let mut dataset = Dataset::new(schema.clone());
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let values = schema
            .columns()
            .iter()
            .zip(&positions)
            .map(|(column, &position)| parse_cell(record.get(position).unwrap_or(""), column, row))
            .collect::<Result<Vec<_>, _>>()?;
        dataset.push(values)?;
    }
    Ok(dataset)
}

fn parse_cell(raw: &str, column: &ColumnSpec, row: usize) -> Result<Value, DatasetError> {
    if MISSING_TOKENS.contains(&raw) {
        return Ok(Value::Missing);
    }
    match column.kind {
        ColumnType::Numeric => raw
            .parse::<f64>()
            .map(Value::Numeric)
            .map_err(|_| DatasetError::ParseNumber {
                row,
                column: column.name.clone(),
                value: raw.to_string(),
            }),
        ColumnType::Factor => Ok(Value::Factor(raw.to_string())),
        ColumnType::Text => Ok(Value::Text(raw.to_string())),
    }
}
