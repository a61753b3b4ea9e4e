//! Console transport implementation

use crate::core::{LogLevel, LogRecord, LoggerError, Result, TimestampFormat, Transport};
use async_trait::async_trait;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Line layout for console output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// `2025-01-08T10:30:45.123Z INFO  [api] Request processed {"user":1}`
    #[default]
    Text,
    /// The record's wire JSON, one object per line
    Json,
}

/// Construction options, also accepted by the `console` registry factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleOptions {
    pub min_level: Option<LogLevel>,
    pub colors: bool,
    pub format: ConsoleFormat,
    pub timestamp_format: TimestampFormat,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            min_level: Some(LogLevel::Trace),
            colors: true,
            format: ConsoleFormat::Text,
            timestamp_format: TimestampFormat::default(),
        }
    }
}

pub struct ConsoleTransport {
    options: ConsoleOptions,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::with_options(ConsoleOptions::default())
    }

    pub fn with_options(options: ConsoleOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.options.min_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.options.colors = use_colors;
        self
    }

    /// Set the output format for this transport
    ///
    /// # Example
    ///
    /// ```
    /// use cargolog::transports::{ConsoleFormat, ConsoleTransport};
    ///
    /// let transport = ConsoleTransport::new().with_format(ConsoleFormat::Json);
    /// ```
    #[must_use]
    pub fn with_format(mut self, format: ConsoleFormat) -> Self {
        self.options.format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.options.timestamp_format = format;
        self
    }

    /// Render one record as a single output line
    pub fn format_line(&self, record: &LogRecord) -> Result<String> {
        match self.options.format {
            ConsoleFormat::Text => Ok(self.format_text(record)),
            ConsoleFormat::Json => Ok(serde_json::to_string(record)?),
        }
    }

    fn format_text(&self, record: &LogRecord) -> String {
        let level_str = if self.options.colors {
            format!("{:5}", record.level.to_str())
                .color(record.level.color_code())
                .to_string()
        } else {
            format!("{:5}", record.level.to_str())
        };

        let timestamp_str = self.options.timestamp_format.format_millis(record.timestamp);

        let mut line = format!("{} {}", timestamp_str, level_str);
        if let Some(ref ns) = record.namespace {
            line.push_str(&format!(" [{}]", ns));
        }
        line.push(' ');
        line.push_str(&sanitize_message(&record.message));

        let mut extras = Map::new();
        if let Some(ref context) = record.context {
            for (key, value) in context.fields() {
                extras.insert(key.clone(), value.clone());
            }
        }
        if let Some(ref err) = record.error {
            if let Ok(value) = serde_json::to_value(err) {
                extras.insert("err".to_string(), value);
            }
        }
        if !extras.is_empty() {
            line.push(' ');
            line.push_str(&Value::Object(extras).to_string());
        }

        line
    }
}

/// Escape newlines, carriage returns and tabs so one record stays on one line
fn sanitize_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// A closed pipe is reported as an error instead of panicking like `println!`
fn write_line(out: &mut impl std::io::Write, line: &str) -> Result<()> {
    writeln!(out, "{}", line).map_err(|e| LoggerError::writer(format!("console: {}", e)))
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    fn min_level(&self) -> Option<LogLevel> {
        self.options.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let output = self.format_line(record)?;

        // Route Error and Fatal levels to stderr, others to stdout
        match record.level {
            LogLevel::Error | LogLevel::Fatal => {
                write_line(&mut std::io::stderr().lock(), &output)
            }
            _ => write_line(&mut std::io::stdout().lock(), &output),
        }
    }

    async fn flush(&self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}
