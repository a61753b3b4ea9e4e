//! Error types for the logger system

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A transport factory was registered twice under the same name
    #[error("Transport '{name}' already registered")]
    DuplicateTransport { name: String },

    /// Lookup of a transport factory that was never registered
    #[error("Unknown transport '{name}'")]
    UnknownTransport { name: String },

    /// Write to a transport that already released its resources
    #[error("Transport '{name}' is closed")]
    TransportClosed { name: String },

    /// File transport error with path
    #[error("File transport error for '{path}': {message}")]
    FileTransportError { path: String, message: String },

    /// Network delivery of a batch failed
    #[error("Delivery to '{url}' failed: {message}")]
    Delivery { url: String, message: String },

    /// Network delivery of a batch did not finish in time
    #[error("Delivery to '{url}' timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// One or more transports failed to drain
    #[error(
        "{operation} failed for {} transport(s): {}",
        .failures.len(),
        describe_failures(.failures)
    )]
    DrainFailed {
        operation: String,
        failures: Vec<(String, LoggerError)>,
    },

    /// An output stream refused a write
    #[error("Writer error: {0}")]
    WriterError(String),
}

fn describe_failures(failures: &[(String, LoggerError)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{}: {}", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_transport(name: impl Into<String>) -> Self {
        LoggerError::DuplicateTransport { name: name.into() }
    }

    pub fn unknown_transport(name: impl Into<String>) -> Self {
        LoggerError::UnknownTransport { name: name.into() }
    }

    pub fn transport_closed(name: impl Into<String>) -> Self {
        LoggerError::TransportClosed { name: name.into() }
    }

    /// Create a file transport error
    pub fn file_transport(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileTransportError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a delivery error
    pub fn delivery(url: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Delivery {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a delivery timeout error
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        LoggerError::Timeout {
            url: url.into(),
            timeout,
        }
    }

    /// Create a drain error from per-transport failures
    pub fn drain(operation: impl Into<String>, failures: Vec<(String, LoggerError)>) -> Self {
        LoggerError::DrainFailed {
            operation: operation.into(),
            failures,
        }
    }

    /// Create a writer error
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::duplicate_transport("http");
        assert!(matches!(err, LoggerError::DuplicateTransport { .. }));

        let err = LoggerError::config("HttpTransport", "Missing url");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::file_transport("/var/log/app.log", "Permission denied");
        assert!(matches!(err, LoggerError::FileTransportError { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::duplicate_transport("http");
        assert_eq!(err.to_string(), "Transport 'http' already registered");

        let err = LoggerError::unknown_transport("kafka");
        assert_eq!(err.to_string(), "Unknown transport 'kafka'");

        let err = LoggerError::timeout("http://localhost/logs", Duration::from_millis(50));
        assert_eq!(
            err.to_string(),
            "Delivery to 'http://localhost/logs' timed out after 50ms"
        );
    }

    #[test]
    fn test_drain_error_display() {
        let err = LoggerError::drain(
            "flush",
            vec![
                ("file".to_string(), LoggerError::writer("disk full")),
                ("http".to_string(), LoggerError::transport_closed("http")),
            ],
        );

        assert_eq!(
            err.to_string(),
            "flush failed for 2 transport(s): file: Writer error: disk full; http: Transport 'http' is closed"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
