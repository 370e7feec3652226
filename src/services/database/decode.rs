//! SQLite value decoding.
//!
//! Converts SQLx rows into the grid model in `row.rs`, honoring SQLite's
//! type-affinity rules:
//! - INTEGER: 64-bit signed integer
//! - REAL: 64-bit floating point
//! - TEXT: UTF-8 string
//! - BLOB: binary data
//! - NULL: null value
//!
//! Declared temporal and numeric column types decode to richer variants
//! when the stored representation parses, and fall back to the raw value
//! otherwise.

use sqlx::sqlite::{SqliteColumn, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::row::{Cell, ColumnInfo, Row as GridRow, Value};

/// Convert a SQLite row to a grid row.
pub fn convert_row(sqlite_row: &SqliteRow) -> GridRow {
    let cells = sqlite_row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let value = extract_value(sqlite_row, col, idx);
            Cell::new(value, idx)
        })
        .collect();

    GridRow::new(cells)
}

/// Build column metadata from a SQLite row.
pub fn build_column_info(sqlite_row: &SqliteRow) -> Vec<ColumnInfo> {
    sqlite_row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            ColumnInfo::new(
                col.name().to_string(),
                col.type_info().name().to_string(),
                idx,
            )
        })
        .collect()
}

/// Extract a value from a SQLite row at the given column index.
fn extract_value(row: &SqliteRow, column: &SqliteColumn, index: usize) -> Value {
    // Check for NULL first
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        _ => {}
    }

    let type_name = column.type_info().name().to_uppercase();
    decode_by_type(row, index, &type_name)
}

/// Decode a value based on its declared SQLite type name.
fn decode_by_type(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match type_name {
        // Integer affinity
        "INTEGER" | "INT" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT"
        | "UNSIGNED BIG INT" | "INT2" | "INT8" => row
            .try_get::<i64, _>(index)
            .map(Value::Integer)
            .unwrap_or(Value::Null),

        // Boolean (stored as 0/1 integer)
        "BOOLEAN" | "BOOL" => row
            .try_get::<bool, _>(index)
            .map(Value::Bool)
            .or_else(|_| row.try_get::<i64, _>(index).map(|v| Value::Bool(v != 0)))
            .unwrap_or(Value::Null),

        // Real affinity
        "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" => row
            .try_get::<f64, _>(index)
            .map(Value::Real)
            .unwrap_or(Value::Null),

        // Text affinity
        "TEXT" | "VARCHAR" | "VARYING CHARACTER" | "NCHAR" | "NATIVE CHARACTER"
        | "NVARCHAR" | "CLOB" | "CHARACTER" | "CHAR" => row
            .try_get::<String, _>(index)
            .map(Value::Text)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Blob)
            .unwrap_or(Value::Null),

        // Declared temporal types (stored as TEXT, REAL, or INTEGER)
        "DATE" => decode_date(row, index),
        "TIME" => decode_time(row, index),
        "DATETIME" | "TIMESTAMP" => decode_datetime(row, index),

        // Declared numeric types (stored as TEXT or REAL)
        "NUMERIC" | "DECIMAL" => decode_numeric(row, index),

        _ => decode_unknown(row, index),
    }
}

/// Decode a DATE value (ISO 8601 text, `YYYY-MM-DD`).
fn decode_date(row: &SqliteRow, index: usize) -> Value {
    if let Ok(s) = row.try_get::<String, _>(index) {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            return Value::Date(date);
        }
        return Value::Text(s);
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Value::Integer(v);
    }

    Value::Null
}

/// Decode a TIME value (`HH:MM:SS` with optional fraction).
fn decode_time(row: &SqliteRow, index: usize) -> Value {
    if let Ok(s) = row.try_get::<String, _>(index) {
        if let Ok(time) = chrono::NaiveTime::parse_from_str(&s, "%H:%M:%S") {
            return Value::Time(time);
        }
        if let Ok(time) = chrono::NaiveTime::parse_from_str(&s, "%H:%M:%S%.f") {
            return Value::Time(time);
        }
        return Value::Text(s);
    }

    Value::Null
}

/// Decode a DATETIME value, trying the common ISO 8601 shapes.
fn decode_datetime(row: &SqliteRow, index: usize) -> Value {
    if let Ok(s) = row.try_get::<String, _>(index) {
        for format in [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
        ] {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&s, format) {
                return Value::DateTime(dt);
            }
        }
        return Value::Text(s);
    }

    // Unix timestamp (seconds since epoch)
    if let Ok(timestamp) = row.try_get::<i64, _>(index) {
        if let Some(dt) = chrono::DateTime::from_timestamp(timestamp, 0) {
            return Value::DateTime(dt.naive_utc());
        }
    }

    Value::Null
}

/// Decode a NUMERIC/DECIMAL value, preferring the text path for precision.
fn decode_numeric(row: &SqliteRow, index: usize) -> Value {
    if let Ok(s) = row.try_get::<String, _>(index) {
        if let Ok(decimal) = s.parse::<rust_decimal::Decimal>() {
            return Value::Decimal(decimal);
        }
        return Value::Text(s);
    }

    if let Ok(f) = row.try_get::<f64, _>(index) {
        return Value::Real(f);
    }

    if let Ok(i) = row.try_get::<i64, _>(index) {
        return Value::Integer(i);
    }

    Value::Null
}

/// Decode an unknown declared type by trying the storage classes in turn.
fn decode_unknown(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Value::Integer(v);
    }

    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Value::Real(v);
    }

    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::Text(v);
    }

    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return Value::Blob(v);
    }

    Value::Null
}
