//! Flatten the server's heterogeneous error shapes into display strings.
//!
//! Error bodies arrive as `{error}`, `{detail}`, `{message}`, a field-keyed
//! validation map, or (for imports) a bare list. Everything leaving this
//! module is an ordered `Vec<String>`.

use serde_json::Value;

/// Key the server uses for errors not tied to one field.
const NON_FIELD_KEY: &str = "non_field_errors";

/// Messages carried by an error response body.
///
/// `error`, `detail` and `message` win, in that order; anything else is
/// treated as a field-keyed map.
pub fn error_messages(body: &Value) -> Vec<String> {
    if let Value::Object(map) = body {
        for key in ["error", "detail", "message"] {
            if let Some(text) = map.get(key).and_then(Value::as_str) {
                return vec![text.to_string()];
            }
        }
    }
    flatten_errors(body)
}

/// Flatten a list or field map of errors, preserving server order.
pub fn flatten_errors(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    push_flattened(&mut out, None, value);
    out
}

fn push_flattened(out: &mut Vec<String>, prefix: Option<&str>, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(text) if text.trim().is_empty() => {}
        Value::Array(items) => {
            for item in items {
                push_flattened(out, prefix, item);
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                let label = match prefix {
                    _ if key == NON_FIELD_KEY => prefix.map(str::to_string),
                    Some(outer) => Some(format!("{outer}.{key}")),
                    None => Some(key.clone()),
                };
                push_flattened(out, label.as_deref(), nested);
            }
        }
        leaf => {
            let text = match leaf {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            out.push(match prefix {
                Some(label) => format!("{label}: {text}"),
                None => text,
            });
        }
    }
}
