//! File transport implementation
//!
//! Appends each record as one line of wire-format JSON (JSONL).

use crate::core::{LogLevel, LogRecord, LoggerError, Result, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Construction options, also accepted by the `file` registry factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    pub path: PathBuf,
    #[serde(default = "default_file_level")]
    pub min_level: Option<LogLevel>,
}

fn default_file_level() -> Option<LogLevel> {
    Some(LogLevel::Info)
}

pub struct FileTransport {
    path: PathBuf,
    min_level: Option<LogLevel>,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileTransport {
    /// Open `path` for appending, creating it if needed. The floor defaults to `Info`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(FileOptions {
            path: path.into(),
            min_level: default_file_level(),
        })
    }

    pub fn with_options(options: FileOptions) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&options.path)
            .map_err(|e| {
                LoggerError::io_operation(
                    format!("opening '{}'", options.path.display()),
                    "cannot open log file for appending",
                    e,
                )
            })?;

        Ok(Self {
            path: options.path,
            min_level: options.min_level,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    #[must_use]
    pub fn with_min_level(mut self, level: Option<LogLevel>) -> Self {
        self.min_level = level;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }

    fn flush_writer(&self) -> Result<()> {
        if let Some(ref mut writer) = *self.writer.lock() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for FileTransport {
    fn name(&self) -> &str {
        "file"
    }

    fn min_level(&self) -> Option<LogLevel> {
        self.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;

        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| {
            LoggerError::file_transport(self.path.display().to_string(), "file already closed")
        })?;

        writeln!(writer, "{}", line)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flush_writer()
    }

    async fn close(&self) -> Result<()> {
        let writer = self.writer.lock().take();
        if let Some(mut writer) = writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileTransport {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush_writer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogContext;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_writes_json_lines() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("app.jsonl");

        let transport = FileTransport::new(&log_path)?;
        for i in 0..3 {
            let record = LogRecord::new(LogLevel::Info, format!("Iteration {}", i))
                .with_context(LogContext::new().with_field("iteration", i));
            transport.write(&record)?;
        }
        transport.flush().await?;

        let content = fs::read_to_string(&log_path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        for (i, line) in lines.iter().enumerate() {
            let parsed: LogRecord = serde_json::from_str(line)?;
            assert_eq!(parsed.message, format!("Iteration {}", i));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_rejects_writes() -> Result<()> {
        let dir = tempdir()?;
        let transport = FileTransport::new(dir.path().join("closed.jsonl"))?;

        transport.write(&LogRecord::new(LogLevel::Info, "before close"))?;
        transport.close().await?;
        transport.close().await?;
        assert!(transport.is_closed());

        let err = transport
            .write(&LogRecord::new(LogLevel::Info, "after close"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::FileTransportError { .. }));

        let content = fs::read_to_string(transport.path())?;
        assert_eq!(content.lines().count(), 1);
        Ok(())
    }

    #[test]
    fn test_default_floor_is_info() -> Result<()> {
        let dir = tempdir()?;
        let transport = FileTransport::new(dir.path().join("floor.jsonl"))?;
        assert!(!transport.accepts(LogLevel::Debug));
        assert!(transport.accepts(LogLevel::Info));
        Ok(())
    }
}
