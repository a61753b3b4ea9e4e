//! # Cargolog
//!
//! A small structured logging library with pluggable transports.
//!
//! ## Features
//!
//! - **Structured records**: level, message, timestamp, namespace, context and error
//! - **Pluggable transports**: console, JSON-lines file, in-memory and batched HTTP
//! - **Child loggers**: derived loggers share transports and layer their context
//! - **Redaction**: a hook applied to every context field before records leave the process
//! - **Failure isolation**: a failing transport never breaks the caller or its peers
//!
//! ```
//! use cargolog::prelude::*;
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemoryTransport::new());
//! let logger = Logger::builder()
//!     .namespace("api")
//!     .redact(redact_keys(["password"]))
//!     .shared_transport(memory.clone())
//!     .build();
//!
//! let request = logger.child(ChildOptions::new().field("request_id", "r-1"));
//! request.info_with("login", LogOptions::new().field("password", "hunter2"));
//!
//! let record = &memory.records()[0];
//! assert_eq!(record.namespace.as_deref(), Some("api"));
//! assert_eq!(record.context.as_ref().unwrap().get("password").unwrap(), "[REDACTED]");
//! ```

pub mod core;
pub mod macros;
pub mod transports;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::transports::{ConsoleFormat, ConsoleTransport};
    #[cfg(feature = "file")]
    pub use crate::transports::FileTransport;
    pub use crate::transports::{HttpTransport, HttpTransportOptions, MemoryTransport};
    pub use crate::core::{
        redact_keys, ChildOptions, FailureKind, FailureReport, LogContext, LogLevel, LogOptions,
        LogRecord, Logger, LoggerBuilder, LoggerError, LoggerSettings, Redactor, Result,
        SerializedError, SharedTransport, TimestampFormat, Transport, TransportRegistry,
    };
}

pub use core::{
    level_at_least, redact_keys, redactor, silent_notifier, stderr_notifier, ChildOptions,
    DeliveryMetrics, FailureKind, FailureNotifier, FailureReport, LogContext, LogLevel,
    LogOptions, LogRecord, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
    LoggerSettings, Redactor, Result, SerializedError, SharedTransport, TimestampFormat,
    Transport, TransportRegistry, TransportSettings, REDACTED,
};
pub use transports::{HttpTransport, HttpTransportOptions, MemoryTransport};
