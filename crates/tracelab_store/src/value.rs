//! Column values, rows and row iteration.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single column value.
///
/// Values are totally ordered so they can form primary keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// UTF-8 string.
    String(String),
}

impl Value {
    /// Returns the name of the value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int64(_) => "INT64",
            Value::String(_) => "STRING",
        }
    }

    /// Returns true if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion from a column value into a Rust type.
pub trait FromValue: Sized {
    /// Decodes the value, failing on a type mismatch.
    fn from_value(value: &Value) -> StoreResult<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> StoreResult<Self> {
        match value {
            Value::Int64(v) => Ok(*v),
            other => Err(StoreError::column(format!(
                "expected INT64, found {}",
                other.type_name()
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> StoreResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(StoreError::column(format!(
                "expected STRING, found {}",
                other.type_name()
            ))),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> StoreResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> StoreResult<Self> {
        Ok(value.clone())
    }
}

/// A result row: named columns in projection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row. `columns` and `values` must have the same length.
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the raw values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Decodes the column at `index`.
    pub fn get<T: FromValue>(&self, index: usize) -> StoreResult<T> {
        let value = self.values.get(index).ok_or_else(|| {
            StoreError::column(format!(
                "column index {index} out of range for row of {} columns",
                self.values.len()
            ))
        })?;
        T::from_value(value)
    }

    /// Decodes the column named `name`.
    pub fn get_by_name<T: FromValue>(&self, name: &str) -> StoreResult<T> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| StoreError::column(format!("no column named {name}")))?;
        self.get(index)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match value {
                Value::String(s) => f.write_str(s)?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

/// Iterator over the rows of a query result.
///
/// `None` means the stream is done; `Some(Err(_))` is a failure while
/// streaming and is never confused with the end of the stream.
#[derive(Debug)]
pub struct RowIterator {
    rows: std::vec::IntoIter<StoreResult<Row>>,
}

impl RowIterator {
    /// Creates an iterator over already-materialized results.
    #[must_use]
    pub fn from_results(rows: Vec<StoreResult<Row>>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// Creates an iterator over successful rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::from_results(rows.into_iter().map(Ok).collect())
    }

    /// Creates an iterator that is immediately done.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_results(Vec::new())
    }
}

impl Iterator for RowIterator {
    type Item = StoreResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(
            vec!["SingerId".into(), "FirstName".into(), "Nickname".into()],
            vec![Value::Int64(7), Value::from("Captain A"), Value::Null],
        )
    }

    #[test]
    fn typed_access_by_index_and_name() {
        let row = sample_row();
        assert_eq!(row.get::<i64>(0).unwrap(), 7);
        assert_eq!(row.get_by_name::<String>("FirstName").unwrap(), "Captain A");
        assert_eq!(row.get::<Option<String>>(2).unwrap(), None);
    }

    #[test]
    fn type_mismatch_is_column_error() {
        let row = sample_row();
        assert!(matches!(row.get::<String>(0), Err(StoreError::Column { .. })));
        assert!(matches!(row.get::<i64>(9), Err(StoreError::Column { .. })));
        assert!(matches!(
            row.get_by_name::<i64>("Missing"),
            Err(StoreError::Column { .. })
        ));
    }

    #[test]
    fn string_literals_are_quoted_and_escaped() {
        assert_eq!(Value::from("O'Brien").to_string(), "'O''Brien'");
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(None::<i64>).to_string(), "NULL");
    }

    #[test]
    fn iterator_separates_done_from_error() {
        let mut rows = RowIterator::from_results(vec![
            Ok(sample_row()),
            Err(StoreError::transport("stream reset")),
        ]);
        assert!(rows.next().unwrap().is_ok());
        assert!(rows.next().unwrap().is_err());
        assert!(rows.next().is_none());
        assert!(RowIterator::empty().next().is_none());
    }

    #[test]
    fn row_display_joins_values() {
        assert_eq!(sample_row().to_string(), "7 Captain A NULL");
    }
}
