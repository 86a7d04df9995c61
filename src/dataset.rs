use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::error::{AnalysisError, Result};

/// One repository record as returned by the hosting API.
pub type Row = Map<String, Value>;

/// Tabular view of a repository listing: one row per repository, one column
/// per field name seen in any row.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Row>,
    columns: Vec<String>,
    source_url: String,
    fetched_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>, source_url: impl Into<String>) -> Self {
        let columns = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();

        Self {
            rows,
            columns,
            source_url: source_url.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Numeric values of `name`, one entry per row.
    ///
    /// Null or absent cells are `None`. Fails when the dataset is empty, when
    /// no row carries a number for the column, or when a cell holds something
    /// other than a number or null.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        if self.rows.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let values = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, record)| match record.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::Number(number)) => Ok(number.as_f64()),
                Some(_) => Err(AnalysisError::NonNumericValue {
                    column: name.to_string(),
                    row,
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        if values.iter().all(Option::is_none) {
            return Err(AnalysisError::MissingColumn {
                column: name.to_string(),
            });
        }

        Ok(values)
    }
}
