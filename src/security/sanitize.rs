//! Input sanitization, envelope validation and log redaction.

use axum::http::HeaderMap;
use serde_json::{Map, Value};

pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "apikey", "secret", "authorization"];

/// Removes `<` and `>` from every string, recursing through object values.
///
/// Arrays and scalars other than strings are returned unchanged.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace(['<', '>'], "")),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, sanitize(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Checks the JSON-RPC 2.0 envelope shape.
pub fn validate_envelope(body: &Value) -> bool {
    let Some(obj) = body.as_object() else {
        return false;
    };
    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return false;
    }
    if !obj.get("method").is_some_and(Value::is_string) {
        return false;
    }
    match obj.get("id") {
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Number(_)) => true,
        Some(_) => false,
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|k| key.contains(k))
}

/// Replaces the value of every sensitive object key with [`REDACTED`].
pub fn redact_for_logging(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let redacted: Map<String, Value> = map
                .iter()
                .map(|(key, value)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), redact_for_logging(value))
                    }
                })
                .collect();
            Value::Object(redacted)
        }
        other => other.clone(),
    }
}

/// Header pairs ready for logging, with credentials redacted.
///
/// Names are compared without dashes and underscores, so `x-api-key`
/// counts as `xapikey`.
pub fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let normalized: String = name
                .as_str()
                .chars()
                .filter(|c| *c != '-' && *c != '_')
                .collect();
            let value = if is_sensitive_key(&normalized) {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
