//! Result-grid data model.
//!
//! This module contains:
//! - `Value` - a decoded SQLite value
//! - `Cell` - a cell in a query result row
//! - `Row` - a row of cells from a query result
//! - `ColumnInfo` - metadata about a column in a result set
//!
//! SQLite stores everything as NULL/INTEGER/REAL/TEXT/BLOB; the extra
//! variants here come from declared-type affinity (a `DATETIME` column
//! holding ISO text decodes to `DateTime`, a `DECIMAL` column to
//! `Decimal`, and so on).

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A decoded value from a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean (stored by SQLite as 0/1)
    Bool(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Real(f64),
    /// UTF-8 text
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Date without time (from a DATE-declared column)
    Date(NaiveDate),
    /// Time without date (from a TIME-declared column)
    Time(NaiveTime),
    /// Date and time (from a DATETIME/TIMESTAMP-declared column)
    DateTime(NaiveDateTime),
    /// Arbitrary-precision numeric (from a NUMERIC/DECIMAL-declared column)
    Decimal(Decimal),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name for display purposes
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Decimal(_) => "decimal",
        }
    }

    /// Convert this value to a display string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Real(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => format!("\\x{}", hex::encode(b)),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::Decimal(d) => d.to_string(),
        }
    }

    /// Try to extract as an i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as an f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Metadata about a column in a query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name as reported by the engine
    pub name: String,
    /// Declared type name (may be empty for expressions)
    pub type_name: String,
    /// Column position (0-indexed)
    pub ordinal: usize,
}

impl ColumnInfo {
    pub fn new(name: String, type_name: String, ordinal: usize) -> Self {
        Self {
            name,
            type_name,
            ordinal,
        }
    }
}

/// A cell in a query result row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The value of this cell
    pub value: Value,
    /// The column index (0-indexed)
    pub column_index: usize,
}

impl Cell {
    pub fn new(value: Value, column_index: usize) -> Self {
        Self {
            value,
            column_index,
        }
    }

    /// Check if this cell is NULL
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Get the display string for this cell
    pub fn to_display_string(&self) -> String {
        self.value.to_display_string()
    }
}

/// A row of cells from a query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// The cells in this row
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Create a row from values (auto-assigns column indices)
    pub fn from_values(values: Vec<Value>) -> Self {
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| Cell::new(value, idx))
            .collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Get a value by index
    pub fn get_value(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).map(|c| &c.value)
    }

    /// Iterate over values
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|c| &c.value)
    }
}

impl IntoIterator for Row {
    type Item = Cell;
    type IntoIter = std::vec::IntoIter<Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null_check() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());
        assert!(!Value::Integer(42).is_null());
        assert!(!Value::Text("hello".to_string()).is_null());
    }

    #[test]
    fn test_value_display_string() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(false).to_display_string(), "false");
        assert_eq!(Value::Integer(-123).to_display_string(), "-123");
        assert_eq!(Value::Real(3.14).to_display_string(), "3.14");
        assert_eq!(Value::Text("hello".to_string()).to_display_string(), "hello");
    }

    #[test]
    fn test_value_blob_display() {
        let blob = Value::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(blob.to_display_string(), "\\xdeadbeef");
    }

    #[test]
    fn test_value_from_option() {
        let some_val: Value = Some(42i64).into();
        assert_eq!(some_val, Value::Integer(42));

        let none_val: Value = Option::<i64>::None.into();
        assert_eq!(none_val, Value::Null);
    }

    #[test]
    fn test_row_from_values() {
        let row = Row::from_values(vec![
            Value::Integer(1),
            Value::Text("hello".to_string()),
            Value::Bool(true),
        ]);

        assert_eq!(row.len(), 3);
        assert_eq!(row.get_value(0), Some(&Value::Integer(1)));
        assert_eq!(row.get_value(1), Some(&Value::Text("hello".to_string())));
        assert_eq!(row.get_value(2), Some(&Value::Bool(true)));
        assert_eq!(row.get_value(3), None);
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Integer(0).type_name(), "integer");
        assert_eq!(Value::Real(0.0).type_name(), "real");
        assert_eq!(Value::Text(String::new()).type_name(), "text");
        assert_eq!(Value::Blob(vec![]).type_name(), "blob");
    }
}
