use regex::Regex;
use serde_json::Value;

use crate::types::FormatInfo;

pub const DEFAULT_PREVIEW_LEN: usize = 50;

/// Char-safe truncation with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}…")
    }
}

/// Display string for a value: strings quoted and truncated past `max_len`,
/// containers summarized by their entry count, the rest in natural form.
pub fn format_value(value: &Value, max_len: usize) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", truncate(s, max_len)),
        Value::Object(map) => format!("{{{} keys}}", map.len()),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Infer how raw JSON text was formatted. Heuristics only: single-line input
/// counts as minified, indentation comes from the first indented line, and
/// trailing-comma detection is a regex scan, not a grammar check.
pub fn detect_format(text: &str) -> FormatInfo {
    let trimmed = text.trim();
    let is_minified = !trimmed.contains('\n');
    let line_count = text.lines().count();

    let indentation = text
        .lines()
        .find_map(|line| {
            let leading = line.len() - line.trim_start().len();
            (leading > 0 && !line.trim().is_empty()).then_some(leading)
        })
        .unwrap_or(2);

    // Comma immediately preceding a closing bracket/brace.
    let has_trailing_comma = Regex::new(r",\s*[}\]]")
        .map(|re| re.is_match(text))
        .unwrap_or(false);

    FormatInfo {
        is_minified,
        indentation,
        line_count,
        has_trailing_comma,
    }
}
