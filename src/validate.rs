use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::types::{DocumentStats, TopLevelShape, Validation};

/// Raw input to the validator: either text that still needs a structural
/// parse, or a value that was already decoded elsewhere (the embed/share
/// path). Pre-built values are accepted as-is — nothing re-checks them, so
/// a malformed non-text input is never rejected on this path.
#[derive(Debug, Clone)]
pub enum RawInput {
    Text(String),
    Value(Value),
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        RawInput::Text(text.to_string())
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        RawInput::Text(text)
    }
}

impl From<Value> for RawInput {
    fn from(value: Value) -> Self {
        RawInput::Value(value)
    }
}

/// Validate raw input into a document.
///
/// Parse failures come back as `is_valid = false` with the parser's message
/// verbatim; this function never returns `Err` and never panics. Timing is
/// measured with a monotonic clock and reported in milliseconds.
pub fn validate(input: RawInput) -> Validation {
    let started = Instant::now();
    match input {
        RawInput::Text(text) => {
            let size_bytes = text.len();
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => {
                    let parse_ms = started.elapsed().as_secs_f64() * 1000.0;
                    debug!(size_bytes, parse_ms, "parsed document");
                    accept(value, size_bytes, parse_ms)
                }
                Err(err) => {
                    let parse_ms = started.elapsed().as_secs_f64() * 1000.0;
                    debug!(size_bytes, error = %err, "parse failed");
                    Validation {
                        is_valid: false,
                        error: Some(err.to_string()),
                        parsed_data: None,
                        stats: DocumentStats {
                            size_bytes,
                            parse_ms,
                            ..DocumentStats::empty()
                        },
                    }
                }
            }
        }
        RawInput::Value(value) => {
            // No parse step; re-serialize only to measure the byte size.
            let size_bytes = serde_json::to_string(&value).map(|s| s.len()).unwrap_or(0);
            let parse_ms = started.elapsed().as_secs_f64() * 1000.0;
            accept(value, size_bytes, parse_ms)
        }
    }
}

fn accept(value: Value, size_bytes: usize, parse_ms: f64) -> Validation {
    let (shape, top_level_count) = top_level_of(&value);
    Validation {
        is_valid: true,
        error: None,
        parsed_data: Some(value),
        stats: DocumentStats {
            size_bytes,
            parse_ms,
            shape,
            top_level_count,
            ..DocumentStats::empty()
        },
    }
}

fn top_level_of(value: &Value) -> (TopLevelShape, usize) {
    match value {
        Value::Object(map) => (TopLevelShape::Object, map.len()),
        Value::Array(arr) => (TopLevelShape::Array, arr.len()),
        Value::Null => (TopLevelShape::Null, 0),
        _ => (TopLevelShape::Primitive, 0),
    }
}
