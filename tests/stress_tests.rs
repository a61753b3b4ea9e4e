//! Stress tests for concurrent logging
//!
//! These tests verify:
//! - No record is lost or duplicated when many threads share a logger
//! - Batches sent by the HTTP transport under concurrent writes cover every
//!   record exactly once

use async_trait::async_trait;
use cargolog::core::Result;
use cargolog::prelude::*;
use cargolog::transports::{BatchRequest, BatchSender};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

#[derive(Default)]
struct CollectingSender {
    batches: Mutex<Vec<Vec<LogRecord>>>,
}

#[async_trait]
impl BatchSender for CollectingSender {
    async fn send(&self, request: BatchRequest) -> Result<()> {
        let records = request.decode_records()?;
        self.batches.lock().push(records);
        Ok(())
    }
}

fn assert_each_once(messages: impl IntoIterator<Item = String>) {
    let mut seen = HashSet::new();
    let mut total = 0;
    for message in messages {
        assert!(seen.insert(message.clone()), "Duplicate record: {}", message);
        total += 1;
    }
    assert_eq!(total, THREADS * PER_THREAD, "Some records were lost");
}

#[test]
fn test_concurrent_logging_through_children() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .min_level(LogLevel::Trace)
        .shared_transport(memory.clone())
        .build();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let worker = logger.child(ChildOptions::new().field("thread", t as u64));
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    worker.info(format!("thread {} message {}", t, i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_each_once(memory.take().into_iter().map(|r| r.message));
    assert_eq!(logger.metrics().total_logged(), (THREADS * PER_THREAD) as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_http_batches() {
    let sender = Arc::new(CollectingSender::default());
    let http = Arc::new(
        HttpTransport::with_sender(
            HttpTransportOptions::new("http://collector.test/ingest")
                .batch_size(64)
                .notifier(cargolog::silent_notifier()),
            sender.clone(),
        )
        .unwrap(),
    );

    let logger = Logger::builder()
        .shared_transport(http.clone())
        .build();

    let tasks: Vec<_> = (0..THREADS)
        .map(|t| {
            let worker = logger.clone();
            tokio::spawn(async move {
                for i in 0..PER_THREAD {
                    worker.info(format!("task {} message {}", t, i));
                    if i % 100 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }
    logger.flush().await.unwrap();

    assert_eq!(http.pending(), 0);
    let batches = sender.batches.lock();
    assert!(batches.iter().all(|batch| batch.len() <= 64));
    assert_each_once(batches.iter().flatten().map(|r| r.message.clone()));
    assert_eq!(http.metrics().records_sent(), (THREADS * PER_THREAD) as u64);
}
