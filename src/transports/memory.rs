//! In-memory transport, mostly useful in tests

use crate::core::{LogLevel, LogRecord, Result, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Keeps every accepted record in memory
#[derive(Debug, Default)]
pub struct MemoryTransport {
    min_level: Option<LogLevel>,
    records: Mutex<Vec<LogRecord>>,
    flushes: AtomicU64,
    closes: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_level(level: LogLevel) -> Self {
        Self {
            min_level: Some(level),
            ..Self::default()
        }
    }

    /// Snapshot of the records written so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Remove and return every stored record
    pub fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn close_count(&self) -> u64 {
        self.closes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn min_level(&self) -> Option<LogLevel> {
        self.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_empties_buffer() {
        let memory = MemoryTransport::new();
        memory.write(&LogRecord::new(LogLevel::Info, "one")).unwrap();
        memory.write(&LogRecord::new(LogLevel::Info, "two")).unwrap();

        let taken = memory.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1].message, "two");
        assert!(memory.is_empty());
    }
}
