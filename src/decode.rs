//! Field validators for the status document.
//!
//! The box firmware is loose about types, so every field of the status
//! document is checked against the kind it is declared with before it ends
//! up in a [BoxInfo](crate::BoxInfo). Nothing is defaulted: a missing key is
//! treated exactly like an explicit `null`, and both fail validation.

use std::num::ParseIntError;

use serde_json::{Number, Value};

/// Why a status document could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The document itself is not a JSON object.
    #[error("Expected object, got {found}")]
    NotAnObject {
        /// The JSON kind that was found instead.
        found: &'static str,
    },

    /// A field held a value of the wrong JSON kind.
    #[error("Field {field} ({key}): expected {expected}, got {found}")]
    TypeMismatch {
        /// The field of the status record.
        field: &'static str,
        /// The key on the wire.
        key: &'static str,
        /// The kind the field is declared with.
        expected: &'static str,
        /// The kind that was found.
        found: &'static str,
    },

    /// A string field that should hold a number did not.
    #[error("Field {field} ({key}): {value:?} is not an integer: {source}")]
    Parse {
        /// The field of the status record.
        field: &'static str,
        /// The key on the wire.
        key: &'static str,
        /// The string that failed to parse.
        value: String,
        /// The parse failure.
        #[source]
        source: ParseIntError,
    },
}

/// Name of the JSON kind of a value, as reported in [DecodeError].
pub fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(n)) if is_integer(n) => "integer",
        Some(Value::Number(_)) => "float",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// Whether a number was written as an integer literal. serde_json reads `-0`
/// as a negative zero float, so that one float counts too.
fn is_integer(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f == 0.0 && f.is_sign_negative())
}

/// Parse a base-10 integer leniently: surrounding whitespace is ignored and
/// single `_` may separate digits.
fn parse_int(s: &str) -> Result<i64, ParseIntError> {
    let trimmed = s.trim();
    if trimmed.contains('_') {
        let digits = trimmed.trim_start_matches(|c: char| c == '+' || c == '-');
        if !digits.starts_with('_') && !digits.ends_with('_') && !digits.contains("__") {
            return trimmed.replace('_', "").parse();
        }
    }
    trimmed.parse()
}

/// Identifies the field being decoded, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    /// The field of the status record.
    pub field: &'static str,
    /// The key on the wire.
    pub key: &'static str,
}

impl FieldRef {
    fn mismatch(self, expected: &'static str, value: Option<&Value>) -> DecodeError {
        DecodeError::TypeMismatch {
            field: self.field,
            key: self.key,
            expected,
            found: kind_of(value),
        }
    }

    fn parse_error(self, value: &str, source: ParseIntError) -> DecodeError {
        DecodeError::Parse {
            field: self.field,
            key: self.key,
            value: value.to_string(),
            source,
        }
    }
}

/// A plain string.
pub fn string(at: FieldRef, value: Option<&Value>) -> Result<String, DecodeError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(at.mismatch("string", other)),
    }
}

/// A whole number. Booleans are rejected even though the firmware may mean 0/1.
pub fn integer(at: FieldRef, value: Option<&Value>) -> Result<i64, DecodeError> {
    match value {
        Some(Value::Number(n)) if is_integer(n) => n
            .as_i64()
            .or_else(|| n.is_f64().then_some(0))
            .ok_or_else(|| at.mismatch("integer", value)),
        other => Err(at.mismatch("integer", other)),
    }
}

/// A flag sent as a number: zero is false, anything else true.
pub fn flag(at: FieldRef, value: Option<&Value>) -> Result<bool, DecodeError> {
    match value {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) if is_integer(n) => Ok(n.as_f64() != Some(0.0)),
        other => Err(at.mismatch("integer", other)),
    }
}

/// A number sent as a string, where the empty string means zero.
pub fn integer_string(at: FieldRef, value: Option<&Value>) -> Result<i64, DecodeError> {
    let s = string(at, value)?;
    if s.is_empty() {
        return Ok(0);
    }
    parse_int(&s).map_err(|err| at.parse_error(&s, err))
}

/// A unix timestamp sent as a string. Unlike [integer_string], empty is an error.
pub fn timestamp_string(at: FieldRef, value: Option<&Value>) -> Result<i64, DecodeError> {
    let s = string(at, value)?;
    parse_int(&s).map_err(|err| at.parse_error(&s, err))
}
