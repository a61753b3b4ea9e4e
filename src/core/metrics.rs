//! Logger and transport metrics for observability
//!
//! Provides counters for monitoring logger health: records dispatched,
//! calls filtered below the floor, transport write failures, and batch
//! delivery outcomes for buffering transports.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a [`Logger`](crate::Logger) and shared with its children
///
/// # Example
///
/// ```
/// use cargolog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.write_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records built and dispatched to transports
    total_logged: AtomicU64,

    /// Calls rejected by the logger's minimum level
    filtered: AtomicU64,

    /// Transport writes that returned an error or panicked
    write_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for a batching transport's deliveries
#[derive(Debug)]
pub struct DeliveryMetrics {
    batches_sent: AtomicU64,
    batches_dropped: AtomicU64,
    records_sent: AtomicU64,
    records_dropped: AtomicU64,
}

impl DeliveryMetrics {
    pub const fn new() -> Self {
        Self {
            batches_sent: AtomicU64::new(0),
            batches_dropped: AtomicU64::new(0),
            records_sent: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_dropped(&self) -> u64 {
        self.batches_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_sent(&self) -> u64 {
        self.records_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_dropped(&self) -> u64 {
        self.records_dropped.load(Ordering::Relaxed)
    }

    /// Record a delivered batch of `records` entries
    pub fn record_sent(&self, records: usize) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.records_sent.fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Record a discarded batch of `records` entries
    pub fn record_dropped(&self, records: usize) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
        self.records_dropped.fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Percentage of records dropped (0.0 - 100.0), 0.0 when nothing was attempted
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.records_dropped() as f64;
        let total = self.records_sent() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for DeliveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}
