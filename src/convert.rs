//! Cell text → typed [`Value`] conversion.

use thiserror::Error;

use crate::types::{ColumnType, Value};

/// A cell's text does not conform to the literal grammar of the target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}: {message} (raw='{raw}')")]
pub struct ParseError {
    /// Type the text was being converted to.
    pub expected: ColumnType,
    /// Offending cell text.
    pub raw: String,
    /// Parser message.
    pub message: String,
}

impl ParseError {
    fn new(expected: ColumnType, raw: &str, message: impl Into<String>) -> Self {
        Self {
            expected,
            raw: raw.to_owned(),
            message: message.into(),
        }
    }
}

/// Convert one cell's text into a value of `column_type`.
///
/// - `Int`: base-10 signed integer (`i64`)
/// - `Double`: floating point literal
/// - `Bool`: `true`/`false`, ignoring ASCII case
/// - `String`: the text, unchanged
///
/// No trimming is applied and failures are never coerced into a text value.
pub fn convert(column_type: ColumnType, text: &str) -> Result<Value, ParseError> {
    match column_type {
        ColumnType::Int => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| ParseError::new(column_type, text, e.to_string())),
        ColumnType::Double => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| ParseError::new(column_type, text, e.to_string())),
        ColumnType::Bool => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| ParseError::new(column_type, text, "expected bool (true/false)")),
        ColumnType::String => Ok(Value::String(text.to_owned())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
