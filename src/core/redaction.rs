//! Redaction callbacks applied to structured fields before they leave the process

use serde_json::Value;
use std::sync::Arc;

/// Per-field redaction function.
///
/// Receives the field key and its current value and returns the value to emit
/// in its place. Runs once per context key, and once per error field
/// (`name`, `message`, `stack`) in transports that redact errors.
pub type Redactor = Arc<dyn Fn(&str, &Value) -> Value + Send + Sync>;

/// Placeholder written by [`redact_keys`]
pub const REDACTED: &str = "[REDACTED]";

/// Build a redactor that replaces the value of any listed key with `"[REDACTED]"`.
///
/// Key comparison is ASCII case-insensitive. Other keys pass through unchanged.
///
/// # Example
///
/// ```
/// use cargolog::core::redaction::redact_keys;
/// use serde_json::json;
///
/// let redact = redact_keys(["password", "token"]);
/// assert_eq!(redact("Password", &json!("hunter2")), json!("[REDACTED]"));
/// assert_eq!(redact("user", &json!("alice")), json!("alice"));
/// ```
pub fn redact_keys<I, S>(keys: I) -> Redactor
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
    Arc::new(move |key: &str, value: &Value| -> Value {
        if keys.iter().any(|k| k.eq_ignore_ascii_case(key)) {
            Value::String(REDACTED.to_string())
        } else {
            value.clone()
        }
    })
}

/// Wrap a closure as a [`Redactor`]
pub fn redactor<F>(f: F) -> Redactor
where
    F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_keys_case_insensitive() {
        let redact = redact_keys(["api_key"]);
        assert_eq!(redact("API_KEY", &json!("abc")), json!(REDACTED));
        assert_eq!(redact("api_key", &json!(42)), json!(REDACTED));
    }

    #[test]
    fn test_redact_keys_passthrough() {
        let redact = redact_keys(Vec::<String>::new());
        let nested = json!({"a": [1, 2, 3]});
        assert_eq!(redact("payload", &nested), nested);
    }

    #[test]
    fn test_custom_redactor() {
        let redact = redactor(|key, value| {
            if key.ends_with("_email") {
                json!("***")
            } else {
                value.clone()
            }
        });
        assert_eq!(redact("user_email", &json!("a@b.c")), json!("***"));
        assert_eq!(redact("user_id", &json!(7)), json!(7));
    }
}
