//! Structured logging context for key-value fields
//!
//! `LogContext` holds the static fields a logger attaches to every record,
//! the per-call additions, and the merged result carried by a `LogRecord`.
//! Values are arbitrary JSON values.

use super::redaction::Redactor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Context for structured logging with key-value fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogContext {
    fields: Map<String, Value>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Add a field to the context
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Check if context has any fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Overlay `other` onto this context. Keys from `other` win.
    pub fn merge(&mut self, other: &LogContext) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Copy of this context with `other` overlaid
    #[must_use]
    pub fn merged(&self, other: &LogContext) -> LogContext {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Copy of this context with every value passed through `redact`
    #[must_use]
    pub fn redacted(&self, redact: &Redactor) -> LogContext {
        let fields = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), redact(key, value)))
            .collect();
        LogContext { fields }
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl From<Map<String, Value>> for LogContext {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K, V> FromIterator<(K, V)> for LogContext
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::redaction::redact_keys;
    use serde_json::json;

    #[test]
    fn test_log_context_creation() {
        let ctx = LogContext::new();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_log_context_with_fields() {
        let ctx = LogContext::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("username"), Some(&json!("john_doe")));
    }

    #[test]
    fn test_log_context_format() {
        let ctx = LogContext::new()
            .with_field("key1", "value1")
            .with_field("key2", 42);

        let formatted = ctx.format_fields();
        assert!(formatted.contains("key1=value1"));
        assert!(formatted.contains("key2=42"));
    }

    #[test]
    fn test_merge_priority() {
        let base = LogContext::new().with_field("a", 1).with_field("keep", "x");
        let overlay = LogContext::new().with_field("a", 2).with_field("b", 3);

        let merged = base.merged(&overlay);

        assert_eq!(merged.get("a"), Some(&json!(2)));
        assert_eq!(merged.get("b"), Some(&json!(3)));
        assert_eq!(merged.get("keep"), Some(&json!("x")));
        // base is untouched
        assert_eq!(base.get("a"), Some(&json!(1)));
        assert!(base.get("b").is_none());
    }

    #[test]
    fn test_redacted_leaves_original() {
        let ctx = LogContext::new()
            .with_field("password", "x")
            .with_field("other", "y");

        let redacted = ctx.redacted(&redact_keys(["password"]));

        assert_eq!(redacted.get("password"), Some(&json!("[REDACTED]")));
        assert_eq!(redacted.get("other"), Some(&json!("y")));
        assert_eq!(ctx.get("password"), Some(&json!("x")));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let ctx: LogContext = [("n", json!(1)), ("nested", json!({"k": [true]}))]
            .into_iter()
            .collect();

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, json!({"n": 1, "nested": {"k": [true]}}));
    }
}
