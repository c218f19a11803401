//! Response-body interpretation shared by every gateway call.

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::ClientError;

/// Longest raw body kept on an error for diagnostics.
const MAX_DETAIL: usize = 512;

/// Fold any non-success response into a `ClientError::Http` with a usable message.
///
/// A structured body's `message` (or `error`) wins; anything else falls back to
/// the status reason phrase. The raw body is kept as `detail`.
pub fn normalize_error(status: StatusCode, body: &[u8]) -> ClientError {
    let text = String::from_utf8_lossy(body).trim().to_string();
    let structured = serde_json::from_slice::<Value>(body).ok().and_then(|v| structured_message(&v));
    let message = structured.unwrap_or_else(|| status_text(status));
    let detail = if text.is_empty() { None } else { Some(truncate(&text, MAX_DETAIL)) };
    ClientError::Http { status: status.as_u16(), message, detail }
}

/// Success bodies: empty → `null`, JSON → parsed, anything else → a JSON string.
pub fn parse_success(body: &[u8]) -> Value {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Value::Null;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(v) => v,
        Err(_) => Value::String(String::from_utf8_lossy(body).trim().to_string()),
    }
}

fn structured_message(v: &Value) -> Option<String> {
    let pick = |key: &str| {
        v.get(key)
            .and_then(|m| m.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    };
    match v {
        Value::Object(_) => pick("message").or_else(|| pick("error")).or_else(|| pick("detail")),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max - 1).collect::<String>() + "…"
}
