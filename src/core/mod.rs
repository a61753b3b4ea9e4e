//! Core logger types and traits

pub mod config;
pub mod error;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod notifier;
pub mod redaction;
pub mod registry;
pub mod timestamp;
pub mod transport;

pub use config::{LoggerSettings, TransportSettings};
pub use error::{LoggerError, Result};
pub use log_context::LogContext;
pub use log_level::{level_at_least, LogLevel};
pub use log_record::{LogRecord, SerializedError};
pub use logger::{ChildOptions, LogOptions, Logger, LoggerBuilder, LoggerConfig};
pub use metrics::{DeliveryMetrics, LoggerMetrics};
pub use notifier::{silent_notifier, stderr_notifier, FailureKind, FailureNotifier, FailureReport};
pub use redaction::{redact_keys, redactor, Redactor, REDACTED};
pub use registry::{parse_options, TransportFactory, TransportRegistry};
pub use timestamp::TimestampFormat;
pub use transport::{SharedTransport, Transport};
