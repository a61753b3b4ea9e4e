//! Main logger implementation

use super::{
    error::{LoggerError, Result},
    log_context::LogContext,
    log_level::LogLevel,
    log_record::{panic_message, LogRecord, SerializedError},
    metrics::LoggerMetrics,
    notifier::{stderr_notifier, FailureKind, FailureNotifier, FailureReport},
    redaction::Redactor,
    transport::{SharedTransport, Transport},
};
use futures::future::join_all;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Per-call extras for [`Logger::emit`]
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub context: LogContext,
    pub error: Option<SerializedError>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one context field
    #[must_use]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.context.add_field(key, value);
        self
    }

    /// Overlay a whole context
    #[must_use]
    pub fn context(mut self, context: LogContext) -> Self {
        self.context.merge(&context);
        self
    }

    /// Attach an error value
    #[must_use]
    pub fn error<E: Error + 'static>(mut self, err: &E) -> Self {
        self.error = Some(SerializedError::from_error(err));
        self
    }

    /// Attach a type-erased error, such as the contents of a `Box<dyn Error>`
    #[must_use]
    pub fn dyn_error(mut self, err: &(dyn Error + 'static)) -> Self {
        self.error = Some(SerializedError::from_dyn(err));
        self
    }

    /// Attach a non-error value as an `UnknownError`
    #[must_use]
    pub fn error_value(mut self, value: impl fmt::Display) -> Self {
        self.error = Some(SerializedError::unknown(value));
        self
    }

    /// Attach an already serialized error
    #[must_use]
    pub fn serialized_error(mut self, error: SerializedError) -> Self {
        self.error = Some(error);
        self
    }
}

impl From<LogContext> for LogOptions {
    fn from(context: LogContext) -> Self {
        Self {
            context,
            error: None,
        }
    }
}

/// Everything a logger needs. See [`Logger::new`].
#[derive(Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub namespace: Option<String>,
    pub redact: Option<Redactor>,
    /// Static fields merged into every record
    pub context: LogContext,
    pub transports: Vec<SharedTransport>,
}

impl LoggerConfig {
    pub fn new(min_level: LogLevel, transports: Vec<SharedTransport>) -> Self {
        Self {
            min_level,
            namespace: None,
            redact: None,
            context: LogContext::new(),
            transports,
        }
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("min_level", &self.min_level)
            .field("namespace", &self.namespace)
            .field("redact", &self.redact.is_some())
            .field("context", &self.context)
            .field(
                "transports",
                &self.transports.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Overrides for [`Logger::child`]. Anything left unset is inherited.
#[derive(Clone, Default)]
pub struct ChildOptions {
    namespace: Option<String>,
    context: LogContext,
    min_level: Option<LogLevel>,
    redact: Option<Redactor>,
    transports: Option<Vec<SharedTransport>>,
}

impl ChildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.context.add_field(key, value);
        self
    }

    #[must_use]
    pub fn context(mut self, context: LogContext) -> Self {
        self.context.merge(&context);
        self
    }

    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    #[must_use]
    pub fn redact(mut self, redact: Redactor) -> Self {
        self.redact = Some(redact);
        self
    }

    /// Replace the inherited transport list
    #[must_use]
    pub fn transports(mut self, transports: Vec<SharedTransport>) -> Self {
        self.transports = Some(transports);
        self
    }
}

pub struct Logger {
    min_level: LogLevel,
    namespace: Option<String>,
    context: LogContext,
    redact: Option<Redactor>,
    transports: Arc<[SharedTransport]>,
    notifier: FailureNotifier,
    /// Shared with every child derived from this logger
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            min_level: config.min_level,
            namespace: config.namespace,
            context: config.context,
            redact: config.redact,
            transports: config.transports.into(),
            notifier: stderr_notifier(),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use cargolog::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .min_level(LogLevel::Debug)
    ///     .namespace("api")
    ///     .field("service", "checkout")
    ///     .transport(MemoryTransport::new())
    ///     .build();
    /// assert_eq!(logger.namespace(), Some("api"));
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Static context merged into every record
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn transports(&self) -> &[SharedTransport] {
        &self.transports
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Whether a call at `level` would produce a record
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level.at_least(self.min_level)
    }

    /// Derive a logger that shares this one's transports.
    ///
    /// The child's namespace replaces the parent's when given. Its context is
    /// the parent's overlaid with the child's fields. Level, redactor and
    /// transports are shared unless replaced. The parent is not modified.
    #[must_use]
    pub fn child(&self, overrides: ChildOptions) -> Logger {
        Logger {
            min_level: overrides.min_level.unwrap_or(self.min_level),
            namespace: overrides.namespace.or_else(|| self.namespace.clone()),
            context: self.context.merged(&overrides.context),
            redact: overrides.redact.or_else(|| self.redact.clone()),
            transports: match overrides.transports {
                Some(transports) => transports.into(),
                None => Arc::clone(&self.transports),
            },
            notifier: Arc::clone(&self.notifier),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Build a record and hand it to every transport whose floor it clears.
    ///
    /// Below the logger's level this returns before any allocation. Transport
    /// failures are reported to the notifier and never reach the caller.
    pub fn emit(&self, level: LogLevel, message: impl Into<String>, options: LogOptions) {
        if !self.is_enabled(level) {
            self.metrics.record_filtered();
            return;
        }

        let mut context = self.context.merged(&options.context);
        if let Some(ref redact) = self.redact {
            context = context.redacted(redact);
        }

        let record = LogRecord::new(level, message)
            .with_namespace(self.namespace.clone())
            .with_context(context)
            .with_error(options.error);

        self.dispatch(&record);
    }

    /// Per-transport isolation: an `Err` or a panic from one transport is
    /// reported and the loop continues with the next.
    fn dispatch(&self, record: &LogRecord) {
        let mut has_error = false;

        for transport in self.transports.iter() {
            if !transport.accepts(record.level) {
                continue;
            }

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                transport.write(record)
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    has_error = true;
                    self.report(transport.as_ref(), FailureKind::Write, e);
                }
                Err(panic_info) => {
                    has_error = true;
                    self.report(
                        transport.as_ref(),
                        FailureKind::Panic,
                        panic_message(panic_info.as_ref()),
                    );
                }
            }
        }

        if has_error {
            self.metrics.record_write_failure();
        }
        self.metrics.record_logged();
    }

    fn report(&self, transport: &dyn Transport, kind: FailureKind, error: impl fmt::Display) {
        (self.notifier)(&FailureReport::new(transport.name(), kind, error, 1));
    }

    #[inline]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, message, LogOptions::default());
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    pub fn trace_with(&self, message: impl Into<String>, options: LogOptions) {
        self.emit(LogLevel::Trace, message, options);
    }

    pub fn debug_with(&self, message: impl Into<String>, options: LogOptions) {
        self.emit(LogLevel::Debug, message, options);
    }

    pub fn info_with(&self, message: impl Into<String>, options: LogOptions) {
        self.emit(LogLevel::Info, message, options);
    }

    pub fn warn_with(&self, message: impl Into<String>, options: LogOptions) {
        self.emit(LogLevel::Warn, message, options);
    }

    pub fn error_with(&self, message: impl Into<String>, options: LogOptions) {
        self.emit(LogLevel::Error, message, options);
    }

    pub fn fatal_with(&self, message: impl Into<String>, options: LogOptions) {
        self.emit(LogLevel::Fatal, message, options);
    }

    /// Flush every transport concurrently.
    ///
    /// Waits for all of them. Transports whose flush failed are listed in
    /// the returned [`LoggerError::DrainFailed`].
    pub async fn flush(&self) -> Result<()> {
        let results = join_all(self.transports.iter().map(|t| t.flush())).await;
        self.collect_drain("flush", results)
    }

    /// Close every transport concurrently, with the same contract as [`flush`](Self::flush)
    pub async fn close(&self) -> Result<()> {
        let results = join_all(self.transports.iter().map(|t| t.close())).await;
        self.collect_drain("close", results)
    }

    fn collect_drain(&self, operation: &str, results: Vec<Result<()>>) -> Result<()> {
        let failures: Vec<(String, LoggerError)> = self
            .transports
            .iter()
            .zip(results)
            .filter_map(|(t, result)| result.err().map(|e| (t.name().to_string(), e)))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::drain(operation, failures))
        }
    }
}

impl Clone for Logger {
    fn clone(&self) -> Self {
        self.child(ChildOptions::default())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("namespace", &self.namespace)
            .field("context", &self.context)
            .field("transports", &self.transports.len())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use cargolog::prelude::*;
/// use std::sync::Arc;
///
/// let shared = Arc::new(MemoryTransport::new());
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .shared_transport(shared.clone())
///     .redact(redact_keys(["password"]))
///     .on_failure(Arc::new(|report: &FailureReport| eprintln!("ALERT: {}", report)))
///     .build();
///
/// logger.info("ready");
/// assert_eq!(shared.len(), 1);
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    notifier: Option<FailureNotifier>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::new(LogLevel::Info, Vec::new()),
            notifier: None,
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    /// Add a static context field
    #[must_use = "builder methods return a new value"]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.config.context.add_field(key, value);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: LogContext) -> Self {
        self.config.context.merge(&context);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn redact(mut self, redact: Redactor) -> Self {
        self.config.redact = Some(redact);
        self
    }

    /// Add an owned transport
    #[must_use = "builder methods return a new value"]
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.config.transports.push(Arc::new(transport));
        self
    }

    /// Add a transport that is also held elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_transport(mut self, transport: SharedTransport) -> Self {
        self.config.transports.push(transport);
        self
    }

    /// Set the callback receiving transport write failures.
    ///
    /// Defaults to [`stderr_notifier`].
    #[must_use = "builder methods return a new value"]
    pub fn on_failure(mut self, notifier: FailureNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let mut logger = Logger::new(self.config);
        if let Some(notifier) = self.notifier {
            logger.notifier = notifier;
        }
        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
