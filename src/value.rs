use crate::schema::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single typed value of a materialized row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The column type this value carries, `None` for null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Byte(_) => Some(ColumnType::Byte),
            Value::Int16(_) => Some(ColumnType::Int16),
            Value::Int32(_) => Some(ColumnType::Int32),
            Value::Int64(_) => Some(ColumnType::Int64),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Double(_) => Some(ColumnType::Double),
            Value::Decimal(_) => Some(ColumnType::Decimal),
            Value::DateTime(_) => Some(ColumnType::DateTime),
            Value::String(_) => Some(ColumnType::String),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::String(v) => f.write_str(v),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot convert {raw:?} to {target}: {reason}")]
pub struct CoercionError {
    pub raw: String,
    pub target: ColumnType,
    pub reason: String,
}

impl CoercionError {
    fn new(raw: &str, target: ColumnType, reason: impl ToString) -> Self {
        CoercionError {
            raw: raw.to_string(),
            target,
            reason: reason.to_string(),
        }
    }
}

/// Converts raw cell text into a value of the given column type.
///
/// The cube always serializes numbers canonically (decimal point, optional
/// exponent, no grouping), so parsing goes through the locale-independent
/// `FromStr` implementations only.
pub fn coerce(raw: &str, target: ColumnType) -> Result<Value, CoercionError> {
    let text = raw.trim();
    let value = match target {
        ColumnType::String => Value::String(raw.to_string()),
        ColumnType::Boolean => Value::Boolean(parse_bool(text).ok_or_else(|| {
            CoercionError::new(raw, target, "expected true, false, 1 or 0")
        })?),
        ColumnType::Byte => Value::Byte(parse_number(raw, text, target)?),
        ColumnType::Int16 => Value::Int16(parse_number(raw, text, target)?),
        ColumnType::Int32 => Value::Int32(parse_number(raw, text, target)?),
        ColumnType::Int64 => Value::Int64(parse_number(raw, text, target)?),
        ColumnType::Float => Value::Float(parse_number(raw, text, target)?),
        ColumnType::Double => Value::Double(parse_number(raw, text, target)?),
        ColumnType::Decimal => Value::Decimal(parse_decimal(raw, text)?),
        ColumnType::DateTime => Value::DateTime(parse_datetime(raw, text)?),
    };

    Ok(value)
}

fn parse_number<T>(raw: &str, text: &str, target: ColumnType) -> Result<T, CoercionError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| CoercionError::new(raw, target, e))
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

fn parse_decimal(raw: &str, text: &str) -> Result<Decimal, CoercionError> {
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    parsed.map_err(|e| CoercionError::new(raw, ColumnType::Decimal, e))
}

fn parse_datetime(raw: &str, text: &str) -> Result<NaiveDateTime, CoercionError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| CoercionError::new(raw, ColumnType::DateTime, "unrecognized date format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::exponent("5.324145E1", ColumnType::Double, Value::Double(53.24145))]
    #[case::plain_double("96", ColumnType::Double, Value::Double(96.0))]
    #[case::int32("96", ColumnType::Int32, Value::Int32(96))]
    #[case::int64(" 9000000000 ", ColumnType::Int64, Value::Int64(9_000_000_000))]
    #[case::int16("-12", ColumnType::Int16, Value::Int16(-12))]
    #[case::byte("255", ColumnType::Byte, Value::Byte(255))]
    #[case::boolean("True", ColumnType::Boolean, Value::Boolean(true))]
    #[case::boolean_digit("0", ColumnType::Boolean, Value::Boolean(false))]
    #[case::string_untouched(" 5,3 ", ColumnType::String, Value::String(" 5,3 ".to_string()))]
    fn test_coerce(#[case] raw: &str, #[case] target: ColumnType, #[case] expected: Value) {
        assert_eq!(coerce(raw, target).unwrap(), expected);
    }

    #[test]
    fn test_coerce_decimal_scientific() {
        let value = coerce("7.72727272727273E1", ColumnType::Decimal).unwrap();
        assert_eq!(
            value,
            Value::Decimal(Decimal::from_str("77.2727272727273").unwrap())
        );
    }

    #[test]
    fn test_coerce_datetime() {
        let expected = NaiveDate::from_ymd_opt(2012, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        assert_eq!(
            coerce("2012-03-04T05:06:07", ColumnType::DateTime).unwrap(),
            Value::DateTime(expected)
        );
        assert_eq!(
            coerce("2012-03-04", ColumnType::DateTime).unwrap(),
            Value::DateTime(NaiveDate::from_ymd_opt(2012, 3, 4).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[rstest]
    #[case::grouped_thousands("1,234", ColumnType::Int32)]
    #[case::comma_decimal("5,3", ColumnType::Double)]
    #[case::fraction_into_int("1.5", ColumnType::Int32)]
    #[case::overflow("300", ColumnType::Byte)]
    #[case::not_a_bool("yes", ColumnType::Boolean)]
    #[case::not_a_date("tomorrow", ColumnType::DateTime)]
    fn test_coerce_failure(#[case] raw: &str, #[case] target: ColumnType) {
        let err = coerce(raw, target).unwrap_err();
        assert_eq!(err.target, target);
        assert_eq!(err.raw, raw);
    }
}
