//! Statement result types.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::error::{DriverError, DriverResult};
use super::value::{FromValue, Value};

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows changed by INSERT/UPDATE/DELETE.
    pub rows_affected: u64,
    /// Row id of the most recent successful INSERT on the connection.
    pub last_insert_id: i64,
}

/// A single result row.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get a column value by name.
    pub fn get<T: FromValue>(&self, column: &str) -> DriverResult<T> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DriverError::ColumnNotFound(column.to_string()))?;
        self.get_index(index)
    }

    /// Get a column value by position.
    pub fn get_index<T: FromValue>(&self, index: usize) -> DriverResult<T> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| DriverError::ColumnNotFound(format!("#{index}")))?;
        T::from_value(value)
    }

    /// Decode the row into a record, matching fields to column names.
    pub fn decode<T: DeserializeOwned>(&self) -> DriverResult<T> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect();
        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }
}

/// Rows returned by a query, fully materialized.
#[derive(Debug, Clone)]
pub struct Rows {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl Rows {
    /// Create an empty result set with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: columns.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row; values are in column order.
    pub fn push(&mut self, values: Vec<Value>) {
        self.rows.push(Row::new(self.columns.clone(), values));
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// First row, or [`DriverError::NoRows`].
    pub fn first(&self) -> DriverResult<&Row> {
        self.rows.first().ok_or(DriverError::NoRows)
    }

    /// Decode every row into a record.
    pub fn decode_all<T: DeserializeOwned>(&self) -> DriverResult<Vec<T>> {
        self.rows.iter().map(Row::decode).collect()
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
