// Row-set domain model - the table shape every report is displayed and exported as
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub type Record = Map<String, Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowSetError {
    #[error("expected a JSON array of records")]
    NotAnArray,
    #[error("element {index} is not a JSON object")]
    NotARecord { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    /// Build a row-set from records, collecting columns in first-appearance order
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn from_json(value: Value) -> Result<Self, RowSetError> {
        let Value::Array(items) = value else {
            return Err(RowSetError::NotAnArray);
        };

        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(record) => rows.push(record),
                _ => return Err(RowSetError::NotARecord { index }),
            }
        }

        Ok(Self::from_records(rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as display text, one cell per column; missing cells are empty
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| cell_text(row.get(column)))
                    .collect()
            })
            .collect()
    }
}

/// Text form of a cell, shared by the HTML table and the CSV export.
///
/// Strings are emitted verbatim, null or missing cells as the empty string,
/// and everything else as its JSON text (`1.5`, `true`, `[1,2]`).
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
