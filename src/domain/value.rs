//! Annotation values: coercion from text and display

use serde_json::{Number, Value};

/// Coerce raw input text into an annotation value.
///
/// Integers become JSON integers, finite floats become JSON floats,
/// everything else is kept as a string.
pub fn coerce_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

/// Render a value for messages: strings unquoted, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
