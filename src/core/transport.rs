//! Transport trait for log output destinations

use super::{error::Result, log_level::LogLevel, log_record::LogRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// A destination for log records.
///
/// `write` is required and must not block: transports that do I/O either
/// write through a cheap local buffer or hand the work to a spawned task.
/// `flush` and `close` are optional. The defaults are a no-op flush and a
/// close that only flushes, which is correct for transports holding no
/// buffered state.
///
/// The logger only holds shared references, so one transport can serve a
/// logger and all of its children. Implementations use interior mutability.
///
/// # Example
///
/// ```
/// use cargolog::core::{LogRecord, Result, Transport};
/// use async_trait::async_trait;
///
/// struct StdoutJson;
///
/// #[async_trait]
/// impl Transport for StdoutJson {
///     fn name(&self) -> &str {
///         "stdout-json"
///     }
///
///     fn write(&self, record: &LogRecord) -> Result<()> {
///         println!("{}", serde_json::to_string(record)?);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in failure reports
    fn name(&self) -> &str;

    /// This transport's own floor, independent of the logger's
    fn min_level(&self) -> Option<LogLevel> {
        None
    }

    /// Accept one record
    fn write(&self, record: &LogRecord) -> Result<()>;

    /// Return once every previously accepted record has been delivered or given up on
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Flush, then release held resources. Safe to call more than once.
    async fn close(&self) -> Result<()> {
        self.flush().await
    }

    /// Whether a record at `level` clears this transport's floor
    fn accepts(&self, level: LogLevel) -> bool {
        self.min_level().map_or(true, |floor| level.at_least(floor))
    }
}

/// Transport handle shared between loggers
pub type SharedTransport = Arc<dyn Transport>;
