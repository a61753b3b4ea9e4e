//! Batching HTTP transport
//!
//! Records are buffered in memory and POSTed as one JSON array per batch.
//! A batch is sent when the buffer reaches `batch_size` (in a spawned task,
//! so `write` never waits) or when `flush`/`close` is called. Each send is
//! bounded by `timeout`. Failed or timed-out batches are reported to the
//! failure notifier and dropped; there is no retry.

use crate::core::{
    stderr_notifier, DeliveryMetrics, FailureKind, FailureNotifier, FailureReport, LogLevel,
    LogRecord, LoggerError, Redactor, Result, Transport,
};
use async_trait::async_trait;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";
const TRANSPORT_NAME: &str = "http";

/// A batch send that any number of flushes can wait on
type InFlight = Shared<BoxFuture<'static, ()>>;

/// One outgoing POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub url: String,
    /// Header pairs in send order, content type first
    pub headers: Vec<(String, String)>,
    /// JSON array of wire-format records
    pub body: Vec<u8>,
    /// Number of records in `body`
    pub records: usize,
}

impl BatchRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body back into records
    pub fn decode_records(&self) -> Result<Vec<LogRecord>> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Performs the network send for [`HttpTransport`].
///
/// The transport wraps every call in its own deadline and drops the future
/// when it passes, so implementations need no timeout of their own.
#[async_trait]
pub trait BatchSender: Send + Sync {
    async fn send(&self, request: BatchRequest) -> Result<()>;
}

/// [`BatchSender`] backed by a `reqwest` client
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl ReqwestSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl BatchSender for ReqwestSender {
    async fn send(&self, request: BatchRequest) -> Result<()> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| LoggerError::delivery(&request.url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoggerError::delivery(
                &request.url,
                format!("server responded with HTTP {}", status.as_u16()),
            ));
        }
        Ok(())
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

/// Construction options, also accepted by the `http` registry factory
///
/// ```
/// use cargolog::transports::HttpTransportOptions;
///
/// let options: HttpTransportOptions = serde_json::from_str(
///     r#"{"url": "https://logs.example.com/ingest", "minLevel": "warn", "batchSize": 50}"#,
/// ).unwrap();
/// assert_eq!(options.batch_size, 50);
/// assert_eq!(options.timeout_ms, 5000);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTransportOptions {
    pub url: String,
    #[serde(default)]
    pub min_level: Option<LogLevel>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-send deadline in milliseconds
    #[serde(default = "default_timeout_ms", rename = "timeout")]
    pub timeout_ms: u64,
    /// Merged under the fixed `Content-Type: application/json` header
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub redact: Option<Redactor>,
    #[serde(skip)]
    pub notifier: Option<FailureNotifier>,
}

impl HttpTransportOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_level: None,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_ms: default_timeout_ms(),
            headers: BTreeMap::new(),
            redact: None,
            notifier: None,
        }
    }

    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Redact context entries and error fields before buffering
    #[must_use]
    pub fn redact(mut self, redact: Redactor) -> Self {
        self.redact = Some(redact);
        self
    }

    /// Where delivery failures are reported. Defaults to stderr.
    #[must_use]
    pub fn notifier(mut self, notifier: FailureNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(LoggerError::config("HttpTransport", "url must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(LoggerError::config(
                "HttpTransport",
                "batchSize must be at least 1",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for HttpTransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransportOptions")
            .field("url", &self.url)
            .field("min_level", &self.min_level)
            .field("batch_size", &self.batch_size)
            .field("timeout_ms", &self.timeout_ms)
            .field("headers", &self.headers)
            .field("redact", &self.redact.is_some())
            .finish()
    }
}

/// Content type first; a caller header named `content-type` replaces it
fn merge_headers(custom: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
    for (name, value) in custom {
        if name.eq_ignore_ascii_case(CONTENT_TYPE) {
            headers[0] = (name.clone(), value.clone());
        } else {
            headers.push((name.clone(), value.clone()));
        }
    }
    headers
}

/// The parts of the transport a spawned send needs
struct Delivery {
    url: String,
    headers: Vec<(String, String)>,
    timeout: Duration,
    sender: Arc<dyn BatchSender>,
    notifier: FailureNotifier,
    metrics: DeliveryMetrics,
}

impl Delivery {
    async fn deliver(&self, batch: Vec<LogRecord>) {
        let records = batch.len();
        let body = match serde_json::to_vec(&batch) {
            Ok(body) => body,
            Err(e) => {
                self.fail(FailureKind::Delivery, LoggerError::from(e), records);
                return;
            }
        };

        let request = BatchRequest {
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
            records,
        };

        match tokio::time::timeout(self.timeout, self.sender.send(request)).await {
            Ok(Ok(())) => self.metrics.record_sent(records),
            Ok(Err(e)) => self.fail(FailureKind::Delivery, e, records),
            Err(_) => self.fail(
                FailureKind::Timeout,
                LoggerError::timeout(&self.url, self.timeout),
                records,
            ),
        }
    }

    fn fail(&self, kind: FailureKind, error: LoggerError, records: usize) {
        self.metrics.record_dropped(records);
        (self.notifier)(&FailureReport::new(TRANSPORT_NAME, kind, error, records));
    }
}

/// Batching network transport
///
/// # Example
///
/// ```no_run
/// use cargolog::prelude::*;
/// use std::time::Duration;
///
/// # async fn run() -> cargolog::Result<()> {
/// let http = HttpTransport::new(
///     HttpTransportOptions::new("https://logs.example.com/api/ingest")
///         .min_level(LogLevel::Warn)
///         .batch_size(50)
///         .timeout(Duration::from_secs(10))
///         .header("Authorization", "Bearer your-api-token"),
/// )?;
///
/// let logger = Logger::builder().transport(http).build();
/// logger.error("sent in the next batch");
/// logger.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpTransport {
    min_level: Option<LogLevel>,
    batch_size: usize,
    redact: Option<Redactor>,
    buffer: Mutex<Vec<LogRecord>>,
    /// Sends not yet known to be finished, automatic and explicit
    in_flight: Mutex<Vec<InFlight>>,
    closed: AtomicBool,
    delivery: Arc<Delivery>,
}

impl HttpTransport {
    /// Create a transport that sends with [`ReqwestSender`]
    #[cfg(feature = "http")]
    pub fn new(options: HttpTransportOptions) -> Result<Self> {
        Self::with_sender(options, Arc::new(ReqwestSender::new()))
    }

    /// Create a transport with a custom sender
    pub fn with_sender(options: HttpTransportOptions, sender: Arc<dyn BatchSender>) -> Result<Self> {
        options.validate()?;

        let delivery = Delivery {
            headers: merge_headers(&options.headers),
            url: options.url,
            timeout: Duration::from_millis(options.timeout_ms),
            sender,
            notifier: options.notifier.unwrap_or_else(stderr_notifier),
            metrics: DeliveryMetrics::new(),
        };

        Ok(Self {
            min_level: options.min_level,
            batch_size: options.batch_size,
            redact: options.redact,
            buffer: Mutex::new(Vec::with_capacity(options.batch_size)),
            in_flight: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            delivery: Arc::new(delivery),
        })
    }

    pub fn url(&self) -> &str {
        &self.delivery.url
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn timeout(&self) -> Duration {
        self.delivery.timeout
    }

    /// Headers sent with every batch
    pub fn headers(&self) -> &[(String, String)] {
        &self.delivery.headers
    }

    /// Records buffered and not yet part of any batch
    pub fn pending(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.delivery.metrics
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Swap out the buffer and hand it to a spawned send.
    ///
    /// Called with the buffer lock held so `flush` sees either the records
    /// or the task carrying them. Without a runtime the records stay buffered.
    fn spawn_batch(&self, buffer: &mut Vec<LogRecord>) {
        let Ok(runtime) = Handle::try_current() else {
            return;
        };

        let batch = std::mem::replace(buffer, Vec::with_capacity(self.batch_size));
        let delivery = Arc::clone(&self.delivery);
        let task = runtime.spawn({
            let delivery = Arc::clone(&delivery);
            async move { delivery.deliver(batch).await }
        });

        self.register(
            async move {
                if let Err(e) = task.await {
                    if e.is_panic() {
                        (delivery.notifier)(&FailureReport::new(
                            TRANSPORT_NAME,
                            FailureKind::Panic,
                            e,
                            0,
                        ));
                    }
                }
            }
            .boxed(),
        );
    }

    fn register(&self, send: BoxFuture<'static, ()>) {
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|pending| pending.peek().is_none());
        in_flight.push(send.shared());
    }

    /// Swap the buffer out as one tracked send and return every send the
    /// caller has to wait for.
    ///
    /// With `close` the transport is marked closed under the buffer lock, so
    /// a concurrent `write` either lands in this batch or is rejected.
    fn take_batch(&self, close: bool) -> Vec<InFlight> {
        let mut buffer = self.buffer.lock();
        if close {
            self.closed.store(true, Ordering::Release);
        }

        let batch = std::mem::take(&mut *buffer);
        if !batch.is_empty() {
            let earlier = self.in_flight.lock().clone();
            let delivery = Arc::clone(&self.delivery);
            self.register(
                async move {
                    // Earlier batches finish first so batches arrive in write order
                    join_all(earlier).await;
                    delivery.deliver(batch).await;
                }
                .boxed(),
            );
        }

        self.in_flight.lock().clone()
    }

    async fn drain(&self, close: bool) {
        let sends = self.take_batch(close);
        if sends.is_empty() {
            return;
        }
        join_all(sends).await;
        self.in_flight.lock().retain(|pending| pending.peek().is_none());
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        TRANSPORT_NAME
    }

    fn min_level(&self) -> Option<LogLevel> {
        self.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::transport_closed(TRANSPORT_NAME));
        }

        let record = match self.redact {
            Some(ref redact) => record.redacted(redact),
            None => record.clone(),
        };

        let mut buffer = self.buffer.lock();
        // Checked again under the lock that `close` takes to mark the transport closed
        if self.is_closed() {
            return Err(LoggerError::transport_closed(TRANSPORT_NAME));
        }
        buffer.push(record);
        if buffer.len() >= self.batch_size {
            self.spawn_batch(&mut buffer);
        }
        Ok(())
    }

    /// Resolves once every record accepted before the call was delivered
    /// or dropped, including batches another flush is still sending.
    async fn flush(&self) -> Result<()> {
        self.drain(false).await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.drain(true).await;
        Ok(())
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        let undelivered = self.buffer.get_mut().len();
        if undelivered > 0 {
            (self.delivery.notifier)(&FailureReport::new(
                TRANSPORT_NAME,
                FailureKind::Undelivered,
                "transport dropped before flush",
                undelivered,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSender {
        requests: Mutex<Vec<BatchRequest>>,
    }

    #[async_trait]
    impl BatchSender for RecordingSender {
        async fn send(&self, request: BatchRequest) -> Result<()> {
            self.requests.lock().push(request);
            Ok(())
        }
    }

    fn options() -> HttpTransportOptions {
        HttpTransportOptions::new("http://collector.test/ingest")
            .notifier(Arc::new(|_: &FailureReport| {}))
    }

    #[test]
    fn test_option_defaults() {
        let options: HttpTransportOptions =
            serde_json::from_str(r#"{"url": "http://collector.test"}"#).unwrap();
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(options.timeout_ms, 5000);
        assert!(options.min_level.is_none());
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_invalid_options_fail_fast() {
        let sender = Arc::new(RecordingSender::default());
        let err = HttpTransport::with_sender(HttpTransportOptions::new(" "), sender.clone())
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = HttpTransport::with_sender(options().batch_size(0), sender)
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_header_merge() {
        let mut custom = BTreeMap::new();
        custom.insert("Authorization".to_string(), "Bearer t".to_string());
        let headers = merge_headers(&custom);
        assert_eq!(
            headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer t".to_string()),
            ]
        );

        custom.insert("content-type".to_string(), "application/x-ndjson".to_string());
        let headers = merge_headers(&custom);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].1, "application/x-ndjson");
    }

    #[test]
    fn test_without_runtime_records_stay_buffered() {
        let sender = Arc::new(RecordingSender::default());
        let transport = HttpTransport::with_sender(options().batch_size(1), sender.clone()).unwrap();

        transport.write(&LogRecord::new(LogLevel::Info, "queued")).unwrap();
        assert_eq!(transport.pending(), 1);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(transport.flush()).unwrap();

        assert_eq!(transport.pending(), 0);
        let requests = sender.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].records, 1);
    }

    #[tokio::test]
    async fn test_empty_flush_sends_nothing() {
        let sender = Arc::new(RecordingSender::default());
        let transport = HttpTransport::with_sender(options(), sender.clone()).unwrap();

        transport.flush().await.unwrap();
        transport.close().await.unwrap();

        assert!(sender.requests.lock().is_empty());
        assert_eq!(transport.metrics().batches_sent(), 0);
    }

    #[tokio::test]
    async fn test_write_after_close_is_rejected() {
        let sender = Arc::new(RecordingSender::default());
        let transport = HttpTransport::with_sender(options(), sender).unwrap();

        transport.close().await.unwrap();
        let err = transport
            .write(&LogRecord::new(LogLevel::Info, "late"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::TransportClosed { .. }));
    }
}
