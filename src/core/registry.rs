//! Named transport factories
//!
//! A `TransportRegistry` is owned by whatever assembles the logger
//! configuration and passed to it explicitly. Registering a name twice and
//! looking up a name that was never registered are both errors returned at
//! the offending call.

use super::error::{LoggerError, Result};
use super::transport::SharedTransport;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Builds a transport from its JSON options
pub type TransportFactory = Box<dyn Fn(&Value) -> Result<SharedTransport> + Send + Sync>;

#[derive(Default)]
pub struct TransportRegistry {
    factories: HashMap<String, TransportFactory>,
}

impl TransportRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the transports this crate ships: `console`, `file`,
    /// `memory` and `http`, depending on enabled features
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        use crate::transports::MemoryTransport;
        use std::sync::Arc;

        self.insert_builtin("memory", |options: &Value| {
            #[derive(serde::Deserialize, Default)]
            #[serde(rename_all = "camelCase", default)]
            struct MemoryOptions {
                min_level: Option<super::log_level::LogLevel>,
            }

            let options: MemoryOptions = parse_options("memory", options)?;
            let transport = match options.min_level {
                Some(level) => MemoryTransport::with_min_level(level),
                None => MemoryTransport::new(),
            };
            Ok(Arc::new(transport) as SharedTransport)
        });

        #[cfg(feature = "console")]
        self.insert_builtin("console", |options: &Value| {
            use crate::transports::{ConsoleOptions, ConsoleTransport};
            let options: ConsoleOptions = parse_options("console", options)?;
            Ok(Arc::new(ConsoleTransport::with_options(options)) as SharedTransport)
        });

        #[cfg(feature = "file")]
        self.insert_builtin("file", |options: &Value| {
            use crate::transports::{FileOptions, FileTransport};
            let options: FileOptions = parse_options("file", options)?;
            Ok(Arc::new(FileTransport::with_options(options)?) as SharedTransport)
        });

        #[cfg(feature = "http")]
        self.insert_builtin("http", |options: &Value| {
            use crate::transports::{HttpTransport, HttpTransportOptions};
            let options: HttpTransportOptions = parse_options("http", options)?;
            Ok(Arc::new(HttpTransport::new(options)?) as SharedTransport)
        });
    }

    fn insert_builtin<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Value) -> Result<SharedTransport> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Register `factory` under `name`.
    ///
    /// # Errors
    ///
    /// [`LoggerError::DuplicateTransport`] if `name` is already taken.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&Value) -> Result<SharedTransport> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(LoggerError::duplicate_transport(name));
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Build the transport registered under `name`.
    ///
    /// # Errors
    ///
    /// [`LoggerError::UnknownTransport`] if nothing is registered under `name`,
    /// or whatever the factory returns.
    pub fn create(&self, name: &str, options: &Value) -> Result<SharedTransport> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| LoggerError::unknown_transport(name))?;
        factory(options)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Deserialize factory options, treating `null` as `{}`
pub fn parse_options<T: DeserializeOwned>(component: &str, options: &Value) -> Result<T> {
    let options = match options {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(options).map_err(|e| LoggerError::config(component, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::MemoryTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn memory_factory(_: &Value) -> Result<SharedTransport> {
        Ok(Arc::new(MemoryTransport::new()))
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = TransportRegistry::new();
        registry.register("mem", memory_factory).unwrap();

        let transport = registry.create("mem", &Value::Null).unwrap();
        assert_eq!(transport.name(), "memory");
        assert!(registry.contains("mem"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = TransportRegistry::new();
        registry.register("mem", memory_factory).unwrap();

        let err = registry.register("mem", memory_factory).unwrap_err();
        assert_eq!(err.to_string(), "Transport 'mem' already registered");
    }

    #[test]
    fn test_unknown_transport_fails() {
        let registry = TransportRegistry::new();
        let err = registry.create("kafka", &json!({})).err().unwrap();
        assert!(matches!(err, LoggerError::UnknownTransport { ref name } if name == "kafka"));
    }

    #[test]
    fn test_builtins_cannot_be_shadowed() {
        let mut registry = TransportRegistry::with_builtins();
        assert!(registry.contains("memory"));
        assert!(registry.register("memory", memory_factory).is_err());
    }

    #[test]
    fn test_builtin_memory_options() {
        let registry = TransportRegistry::with_builtins();
        let transport = registry
            .create("memory", &json!({"minLevel": "error"}))
            .unwrap();
        assert_eq!(transport.min_level(), Some(crate::core::LogLevel::Error));

        let err = registry
            .create("memory", &json!({"minLevel": "loud"}))
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_builtin_http_requires_url() {
        let registry = TransportRegistry::with_builtins();
        let err = registry.create("http", &json!({})).err().unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
