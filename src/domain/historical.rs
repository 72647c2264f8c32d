// Historical series - flattens time-bucketed API responses into one table
use super::row_set::{Record, RowSet};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const TIME_COLUMN: &str = "Time";

/// One sampling interval of a historical response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeBucket {
    #[serde(rename = "Time")]
    pub time: Value,
    #[serde(rename = "Data", default)]
    pub data: Vec<Record>,
}

impl TimeBucket {
    pub fn new(time: impl Into<Value>, data: Vec<Record>) -> Self {
        Self {
            time: time.into(),
            data,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FlattenError {
    #[error("historical response contains no time buckets")]
    EmptyResponse,
    #[error("bucket {bucket} reports columns {found:?}, expected {expected:?}")]
    InconsistentSchema {
        bucket: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("bucket {bucket} already carries a `Time` column")]
    ReservedColumn { bucket: usize },
}

/// Concatenate every bucket's rows, tagging each row with its bucket's label.
///
/// Row order is bucket order, then the order within each bucket. Buckets
/// without rows add nothing and do not take part in the schema check. The
/// output columns are the first non-empty bucket's columns followed by
/// [`TIME_COLUMN`].
pub fn flatten(buckets: Vec<TimeBucket>) -> Result<RowSet, FlattenError> {
    if buckets.is_empty() {
        return Err(FlattenError::EmptyResponse);
    }

    let total: usize = buckets.iter().map(|b| b.data.len()).sum();
    let mut schema: Option<Vec<String>> = None;
    let mut rows = Vec::with_capacity(total);

    for (index, bucket) in buckets.into_iter().enumerate() {
        if bucket.data.is_empty() {
            continue;
        }

        let nested = RowSet::from_records(bucket.data);
        if nested.columns.iter().any(|c| c == TIME_COLUMN) {
            return Err(FlattenError::ReservedColumn { bucket: index });
        }

        match &schema {
            None => schema = Some(nested.columns.clone()),
            Some(expected) if !same_columns(expected, &nested.columns) => {
                return Err(FlattenError::InconsistentSchema {
                    bucket: index,
                    expected: expected.clone(),
                    found: nested.columns,
                });
            }
            Some(_) => {}
        }

        for mut row in nested.rows {
            row.insert(TIME_COLUMN.to_string(), bucket.time.clone());
            rows.push(row);
        }
    }

    let mut columns = schema.unwrap_or_default();
    columns.push(TIME_COLUMN.to_string());

    Ok(RowSet::new(columns, rows))
}

fn same_columns(expected: &[String], found: &[String]) -> bool {
    expected.len() == found.len() && found.iter().all(|c| expected.contains(c))
}
