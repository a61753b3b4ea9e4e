//! Log record structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use super::redaction::Redactor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::error::Error;
use std::fmt;

const UNKNOWN_ERROR: &str = "UnknownError";

/// Stable, serializable shape of an error attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedError {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl SerializedError {
    /// Serialize a Rust error value.
    ///
    /// `name` is the short type name of `E`, `message` its `Display` output and
    /// `stack` the `source()` chain, one cause per line.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + 'static,
    {
        Self {
            name: short_type_name(std::any::type_name::<E>()).to_string(),
            message: err.to_string(),
            stack: source_chain(err),
        }
    }

    /// Serialize a type-erased error. The concrete type is not known, so the
    /// name is `"Error"`.
    pub fn from_dyn(err: &(dyn Error + 'static)) -> Self {
        Self {
            name: "Error".to_string(),
            message: err.to_string(),
            stack: source_chain(err),
        }
    }

    /// Serialize a value that is not an error
    pub fn unknown(value: impl fmt::Display) -> Self {
        Self {
            name: UNKNOWN_ERROR.to_string(),
            message: value.to_string(),
            stack: None,
        }
    }

    /// Copy with `name`, `message` and `stack` (if present) passed through `redact`
    #[must_use]
    pub fn redacted(&self, redact: &Redactor) -> Self {
        Self {
            name: redact_string(redact, "name", &self.name),
            message: redact_string(redact, "message", &self.message),
            stack: self
                .stack
                .as_ref()
                .map(|stack| redact_string(redact, "stack", stack)),
        }
    }
}

fn redact_string(redact: &Redactor, key: &str, value: &str) -> String {
    match redact(key, &Value::String(value.to_string())) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn source_chain(err: &(dyn Error + 'static)) -> Option<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        causes.push(format!("caused by: {}", cause));
        current = cause.source();
    }
    if causes.is_empty() {
        None
    } else {
        Some(causes.join("\n"))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// One structured log event. Immutable once built by the logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    #[serde(rename = "msg")]
    pub message: String,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "time")]
    pub timestamp: i64,
    #[serde(rename = "ns", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,
    #[serde(rename = "err", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SerializedError>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now().timestamp_millis(),
            namespace: None,
            context: None,
            error: None,
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Attach a context. An empty context is stored as `None`.
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = if context.is_empty() { None } else { Some(context) };
        self
    }

    pub fn with_error(mut self, error: Option<SerializedError>) -> Self {
        self.error = error;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Timestamp as a UTC date-time
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// Copy with every context entry and every error field passed through `redact`
    #[must_use]
    pub fn redacted(&self, redact: &Redactor) -> LogRecord {
        let context = self
            .context
            .as_ref()
            .map(|ctx| ctx.redacted(redact))
            .unwrap_or_default();

        LogRecord {
            level: self.level,
            message: self.message.clone(),
            timestamp: self.timestamp,
            namespace: self.namespace.clone(),
            context: None,
            error: self.error.as_ref().map(|err| err.redacted(redact)),
        }
        .with_context(context)
    }
}
