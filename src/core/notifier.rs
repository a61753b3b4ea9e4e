//! Operator-facing side channel for failures inside the logging pipeline
//!
//! Transport write failures and dropped batches cannot be logged through the
//! logger that produced them. They are reported to a [`FailureNotifier`]
//! instead, which defaults to writing to stderr.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// A transport's `write` returned an error
    Write,
    /// A transport's `write` panicked
    Panic,
    /// A batch send failed
    Delivery,
    /// A batch send exceeded its deadline
    Timeout,
    /// A transport was dropped with records still buffered
    Undelivered,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Write => write!(f, "write"),
            FailureKind::Panic => write!(f, "panic"),
            FailureKind::Delivery => write!(f, "delivery"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Undelivered => write!(f, "undelivered"),
        }
    }
}

/// A single failure notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Name of the transport involved
    pub transport: String,
    pub kind: FailureKind,
    /// Rendered error
    pub error: String,
    /// Number of records lost with this failure
    pub records: usize,
}

impl FailureReport {
    pub fn new(
        transport: impl Into<String>,
        kind: FailureKind,
        error: impl fmt::Display,
        records: usize,
    ) -> Self {
        Self {
            transport: transport.into(),
            kind,
            error: error.to_string(),
            records,
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transport '{}' {} failure, {} record(s) dropped: {}",
            self.transport, self.kind, self.records, self.error
        )
    }
}

/// Callback invoked for every failure report
pub type FailureNotifier = Arc<dyn Fn(&FailureReport) + Send + Sync>;

/// Default notifier: one line per failure on stderr
pub fn stderr_notifier() -> FailureNotifier {
    Arc::new(|report: &FailureReport| {
        let tag = match report.kind {
            FailureKind::Panic => "LOGGER CRITICAL",
            FailureKind::Undelivered => "LOGGER WARNING",
            _ => "LOGGER ERROR",
        };
        eprintln!("[{}] {}", tag, report);
    })
}

/// Notifier that discards every report
pub fn silent_notifier() -> FailureNotifier {
    Arc::new(|_: &FailureReport| {})
}
