//! # Response Documents
//!
//! JSON bodies are kept as [`serde_json::Value`], a tagged union whose numbers
//! remember whether they were parsed as integers or floats. This module adds
//! the type taxonomy used by assertions and the path navigation in [`path`].

pub mod path;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub use path::{FieldPath, PathError, Segment};

/// Type of a value inside a response document.
///
/// `Number` is an umbrella that accepts both `Integer` and `Float`; it is
/// never reported as the actual type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Null,
    Bool,
    Integer,
    Float,
    Number,
    String,
    Array,
    Object,
}

impl FieldType {
    /// The concrete type of `value`. Integers stay integers only when the
    /// JSON text had no fraction or exponent: `1` is `Integer`, `1.0` is `Float`.
    /// Magnitude does not matter, so `18446744073709551616` is still `Integer`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Bool,
            Value::Number(n) if is_integer_literal(n) => FieldType::Integer,
            Value::Number(_) => FieldType::Float,
            Value::String(_) => FieldType::String,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        let actual = FieldType::of(value);
        match self {
            FieldType::Number => matches!(actual, FieldType::Integer | FieldType::Float),
            expected => expected == actual,
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldType::Null => "null",
            FieldType::Bool => "bool",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        write!(f, "{label}")
    }
}

// Numbers keep their source text, so the literal decides.
fn is_integer_literal(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || !n.to_string().contains(['.', 'e', 'E'])
}

/// Structural equality that is strict about integer vs float but not about
/// how a float was spelled: `1.50` equals `1.5`, `1.0` never equals `1`.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (is_integer_literal(a), is_integer_literal(b)) {
            (true, true) => a.to_string() == b.to_string(),
            (false, false) => a.as_f64().is_some() && a.as_f64() == b.as_f64(),
            _ => false,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

/// Parse a response body. Empty bodies and bodies that are not JSON come back
/// as `None`; callers substitute [`empty_document`].
pub fn parse_document(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

/// The document a snapshot exposes when its body could not be parsed.
pub fn empty_document() -> Value {
    Value::Object(Map::new())
}

/// Number of entries in a container, or characters in a string.
pub fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        Value::String(s) => Some(s.chars().count()),
        _ => None,
    }
}

/// Short rendering of a value for diagnostics.
pub fn preview(value: &Value) -> String {
    const LIMIT: usize = 120;
    let rendered = value.to_string();
    if rendered.chars().count() <= LIMIT {
        return rendered;
    }
    let cut: String = rendered.chars().take(LIMIT).collect();
    format!("{cut}…")
}
