use crate::schema::{Column, ColumnType};
use crate::value::Value;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultSetError {
    #[error("Could not find column {0:?} in results")]
    ColumnNotFound(String),

    #[error("Column ordinal {ordinal} out of range, result has {count} columns")]
    OrdinalOutOfRange { ordinal: usize, count: usize },

    #[error("No current row")]
    NoCurrentRow,

    #[error("Column {column} holds {found:?}, not {expected}")]
    TypeMismatch {
        column: usize,
        expected: ColumnType,
        found: Option<ColumnType>,
    },
}

/// One materialized row, aligned 1:1 with the result's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub values: Vec<Value>,
    /// Display text as formatted by the server, `None` for nulls.
    pub formatted: Vec<Option<String>>,
}

impl Row {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Metadata describing one column, in the shape tabular readers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaRow {
    pub column_name: String,
    pub column_ordinal: usize,
    pub data_type: ColumnType,
    pub numeric_precision: u32,
    pub numeric_scale: u32,
    pub allow_null: bool,
    pub is_read_only: bool,
}

/// The flat table built from one query response. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub(crate) fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        ResultSet { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ordinal of the first column with exactly this name.
    pub fn ordinal(&self, name: &str) -> Result<usize, ResultSetError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ResultSetError::ColumnNotFound(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column, ResultSetError> {
        let ordinal = self.ordinal(name)?;
        Ok(&self.columns[ordinal])
    }

    pub fn value(&self, row: usize, ordinal: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.values.get(ordinal))
    }

    pub fn cursor(&self) -> RowCursor<'_> {
        RowCursor {
            result: self,
            position: None,
        }
    }

    pub fn schema_table(&self) -> Vec<SchemaRow> {
        self.columns
            .iter()
            .map(|column| {
                let (numeric_precision, numeric_scale) = match column.column_type {
                    ColumnType::Decimal => (19, 4),
                    _ => (0, 0),
                };
                SchemaRow {
                    column_name: column.name.clone(),
                    column_ordinal: column.ordinal,
                    data_type: column.column_type,
                    numeric_precision,
                    numeric_scale,
                    allow_null: true,
                    is_read_only: true,
                }
            })
            .collect()
    }
}

/// Forward-only access to the rows of a [`ResultSet`].
///
/// Positioned before the first row; call [`RowCursor::read`] to advance.
pub struct RowCursor<'a> {
    result: &'a ResultSet,
    position: Option<usize>,
}

impl<'a> RowCursor<'a> {
    pub fn read(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.result.rows.len()));
        next < self.result.rows.len()
    }

    pub fn field_count(&self) -> usize {
        self.result.column_count()
    }

    pub fn has_rows(&self) -> bool {
        !self.result.is_empty()
    }

    pub fn name(&self, ordinal: usize) -> Result<&'a str, ResultSetError> {
        self.result
            .columns
            .get(ordinal)
            .map(|c| c.name.as_str())
            .ok_or(ResultSetError::OrdinalOutOfRange {
                ordinal,
                count: self.result.column_count(),
            })
    }

    pub fn ordinal(&self, name: &str) -> Result<usize, ResultSetError> {
        self.result.ordinal(name)
    }

    /// Declared type of the column, independent of the current row.
    pub fn field_type(&self, ordinal: usize) -> Result<ColumnType, ResultSetError> {
        self.result
            .columns
            .get(ordinal)
            .map(|c| c.column_type)
            .ok_or(ResultSetError::OrdinalOutOfRange {
                ordinal,
                count: self.result.column_count(),
            })
    }

    pub fn data_type_name(&self, ordinal: usize) -> Result<&'static str, ResultSetError> {
        Ok(self.field_type(ordinal)?.name())
    }

    /// Every value of the current row, in column order.
    pub fn values(&self) -> Result<&'a [Value], ResultSetError> {
        Ok(&self.current()?.values)
    }

    pub fn value(&self, ordinal: usize) -> Result<&'a Value, ResultSetError> {
        let row = self.current()?;
        row.values.get(ordinal).ok_or(ResultSetError::OrdinalOutOfRange {
            ordinal,
            count: self.result.column_count(),
        })
    }

    pub fn value_by_name(&self, name: &str) -> Result<&'a Value, ResultSetError> {
        self.value(self.ordinal(name)?)
    }

    pub fn is_null(&self, ordinal: usize) -> Result<bool, ResultSetError> {
        Ok(self.value(ordinal)?.is_null())
    }

    pub fn get_str(&self, ordinal: usize) -> Result<&'a str, ResultSetError> {
        match self.value(ordinal)? {
            Value::String(s) => Ok(s),
            other => Err(mismatch(ordinal, ColumnType::String, other)),
        }
    }

    pub fn get_bool(&self, ordinal: usize) -> Result<bool, ResultSetError> {
        match self.value(ordinal)? {
            Value::Boolean(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Boolean, other)),
        }
    }

    pub fn get_byte(&self, ordinal: usize) -> Result<u8, ResultSetError> {
        match self.value(ordinal)? {
            Value::Byte(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Byte, other)),
        }
    }

    pub fn get_i16(&self, ordinal: usize) -> Result<i16, ResultSetError> {
        match self.value(ordinal)? {
            Value::Byte(v) => Ok(i16::from(*v)),
            Value::Int16(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Int16, other)),
        }
    }

    pub fn get_i32(&self, ordinal: usize) -> Result<i32, ResultSetError> {
        match self.value(ordinal)? {
            Value::Byte(v) => Ok(i32::from(*v)),
            Value::Int16(v) => Ok(i32::from(*v)),
            Value::Int32(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Int32, other)),
        }
    }

    pub fn get_i64(&self, ordinal: usize) -> Result<i64, ResultSetError> {
        match self.value(ordinal)? {
            Value::Byte(v) => Ok(i64::from(*v)),
            Value::Int16(v) => Ok(i64::from(*v)),
            Value::Int32(v) => Ok(i64::from(*v)),
            Value::Int64(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Int64, other)),
        }
    }

    pub fn get_f32(&self, ordinal: usize) -> Result<f32, ResultSetError> {
        match self.value(ordinal)? {
            Value::Float(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Float, other)),
        }
    }

    pub fn get_f64(&self, ordinal: usize) -> Result<f64, ResultSetError> {
        match self.value(ordinal)? {
            Value::Float(v) => Ok(f64::from(*v)),
            Value::Double(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Double, other)),
        }
    }

    pub fn get_decimal(&self, ordinal: usize) -> Result<Decimal, ResultSetError> {
        match self.value(ordinal)? {
            Value::Decimal(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::Decimal, other)),
        }
    }

    pub fn get_datetime(&self, ordinal: usize) -> Result<NaiveDateTime, ResultSetError> {
        match self.value(ordinal)? {
            Value::DateTime(v) => Ok(*v),
            other => Err(mismatch(ordinal, ColumnType::DateTime, other)),
        }
    }

    fn current(&self) -> Result<&'a Row, ResultSetError> {
        self.position
            .and_then(|p| self.result.rows.get(p))
            .ok_or(ResultSetError::NoCurrentRow)
    }
}

fn mismatch(column: usize, expected: ColumnType, found: &Value) -> ResultSetError {
    ResultSetError::TypeMismatch {
        column,
        expected,
        found: found.column_type(),
    }
}
