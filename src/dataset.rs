use std::collections::HashSet;

use serde_json::Value;

use crate::scope::resolved_identifier;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("column names must not be empty")]
    EmptyColumnName,
    #[error("column {0:?} appears more than once")]
    DuplicateColumn(String),
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("record {0} is not a JSON object")]
    NotARecord(usize),
    #[error("dataset must be a JSON array of records")]
    NotAnArray,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Named columns and rows of JSON values, column order preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.is_empty() {
                return Err(DatasetError::EmptyColumnName);
            }
            if !seen.insert(resolved_identifier(column)) {
                return Err(DatasetError::DuplicateColumn(column.clone()));
            }
        }
        if let Some(row) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(DatasetError::RowWidth {
                row,
                expected: columns.len(),
                found: rows[row].len(),
            });
        }
        Ok(Dataset { columns, rows })
    }

    /// Columns are the union of record keys in first-seen order.
    /// A record missing a key gets `null` for that column.
    pub fn from_records(records: &[Value]) -> Result<Self, DatasetError> {
        let mut columns: Vec<String> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or(DatasetError::NotARecord(index))?;
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                columns
                    .iter()
                    .map(|column| object.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Dataset::new(columns, rows)
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Array(records) => Dataset::from_records(&records),
            _ => Err(DatasetError::NotAnArray),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
