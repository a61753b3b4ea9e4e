//! Declarative logger configuration
//!
//! `LoggerSettings` is the serde form of a logger: level, namespace, static
//! context, keys to redact and a list of transports named by registry key.
//! Custom redactors and notifiers are code, not data, so they are supplied on
//! the builder that [`LoggerSettings::builder`] returns.
//!
//! ```
//! use cargolog::core::{LoggerSettings, TransportRegistry};
//!
//! let settings = LoggerSettings::from_json(r#"{
//!     "level": "debug",
//!     "namespace": "my-app",
//!     "context": {"version": "1.0.0"},
//!     "redact": ["password"],
//!     "transports": [{"type": "memory", "options": {"minLevel": "warn"}}]
//! }"#).unwrap();
//!
//! let registry = TransportRegistry::with_builtins();
//! let logger = settings.build(&registry).unwrap();
//! assert_eq!(logger.namespace(), Some("my-app"));
//! ```

use super::error::Result;
use super::log_context::LogContext;
use super::log_level::LogLevel;
use super::logger::{Logger, LoggerBuilder};
use super::redaction::redact_keys;
use super::registry::TransportRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One transport entry: registry key plus factory options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSettings {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Value,
}

impl TransportSettings {
    pub fn new(kind: impl Into<String>, options: Value) -> Self {
        Self {
            kind: kind.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerSettings {
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub context: LogContext,
    /// Context keys masked with `[REDACTED]`, matched case-insensitively
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redact: Vec<String>,
    pub transports: Vec<TransportSettings>,
}

impl LoggerSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::error::LoggerError::io_operation(
                format!("reading '{}'", path.display()),
                "cannot read logger settings",
                e,
            )
        })?;
        Self::from_json(&content)
    }

    /// Create every transport through `registry` and return a builder
    /// pre-filled with these settings.
    ///
    /// Fails on the first transport whose name is unknown or whose options
    /// are rejected.
    pub fn builder(&self, registry: &TransportRegistry) -> Result<LoggerBuilder> {
        let mut builder = Logger::builder()
            .min_level(self.level)
            .context(self.context.clone());

        if let Some(ref namespace) = self.namespace {
            builder = builder.namespace(namespace.clone());
        }

        if !self.redact.is_empty() {
            builder = builder.redact(redact_keys(self.redact.iter().cloned()));
        }

        for transport in &self.transports {
            builder = builder.shared_transport(registry.create(&transport.kind, &transport.options)?);
        }

        Ok(builder)
    }

    pub fn build(&self, registry: &TransportRegistry) -> Result<Logger> {
        Ok(self.builder(registry)?.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggerError;
    use serde_json::json;

    #[test]
    fn test_parse_minimal() {
        let settings = LoggerSettings::from_json(r#"{"level": "info", "transports": []}"#).unwrap();
        assert_eq!(settings.level, LogLevel::Info);
        assert!(settings.namespace.is_none());
        assert!(settings.context.is_empty());
    }

    #[test]
    fn test_missing_level_is_rejected() {
        let err = LoggerSettings::from_json(r#"{"transports": []}"#).unwrap_err();
        assert!(matches!(err, LoggerError::JsonError(_)));
    }

    #[test]
    fn test_build_uses_registry() {
        let settings = LoggerSettings {
            level: LogLevel::Warn,
            namespace: Some("svc".to_string()),
            context: LogContext::new().with_field("region", "eu"),
            redact: Vec::new(),
            transports: vec![
                TransportSettings::new("memory", Value::Null),
                TransportSettings::new("memory", json!({"minLevel": "fatal"})),
            ],
        };

        let logger = settings.build(&TransportRegistry::with_builtins()).unwrap();
        assert_eq!(logger.min_level(), LogLevel::Warn);
        assert_eq!(logger.transports().len(), 2);
        assert_eq!(logger.context().get("region"), Some(&json!("eu")));
        assert_eq!(logger.transports()[1].min_level(), Some(LogLevel::Fatal));
    }

    #[test]
    fn test_redact_keys_from_settings() {
        use crate::transports::MemoryTransport;
        use std::sync::Arc;

        let settings = LoggerSettings::from_json(
            r#"{"level": "info", "redact": ["Password"], "transports": []}"#,
        )
        .unwrap();
        let memory = Arc::new(MemoryTransport::new());
        let logger = settings
            .builder(&TransportRegistry::new())
            .unwrap()
            .shared_transport(memory.clone())
            .build();

        logger.info_with(
            "login",
            crate::core::LogOptions::new().field("password", "hunter2"),
        );
        let context = memory.records()[0].context.clone().unwrap();
        assert_eq!(context.get("password"), Some(&json!("[REDACTED]")));
    }

    #[test]
    fn test_unknown_transport_fails_build() {
        let settings = LoggerSettings {
            level: LogLevel::Info,
            namespace: None,
            context: LogContext::new(),
            redact: Vec::new(),
            transports: vec![TransportSettings::new("carrier-pigeon", Value::Null)],
        };

        let err = settings.build(&TransportRegistry::new()).unwrap_err();
        assert!(matches!(err, LoggerError::UnknownTransport { .. }));
    }
}
