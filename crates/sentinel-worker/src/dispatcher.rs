//! Background alert delivery.
//!
//! Each alert becomes its own Tokio task. Concurrency is bounded by a
//! semaphore; when every permit is taken the alert is dropped instead of
//! queued, so a slow sink can never back up the frame loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use sentinel_models::AlertPayload;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::alert_state::AlertEvent;
use crate::config::DispatchConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// Destination for alert payloads.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, payload: &AlertPayload) -> WorkerResult<()>;
}

/// Posts alert payloads as JSON to an HTTP endpoint.
pub struct HttpAlertSink {
    client: Client,
    url: String,
}

impl HttpAlertSink {
    pub fn new(config: &DispatchConfig) -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(concat!("sentinel-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: config.sink_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertSink for HttpAlertSink {
    async fn send(&self, payload: &AlertPayload) -> WorkerResult<()> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::sink_rejected(status.as_u16(), body));
        }
        Ok(())
    }
}

/// What happened to an alert handed to [`AlertDispatcher::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A delivery task was started
    Spawned,
    /// Every slot was busy; the alert was discarded
    Dropped,
}

/// Fire-and-forget alert dispatcher.
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    timeout: Duration,
    jpeg_quality: u8,
    handle: Handle,
}

impl AlertDispatcher {
    /// Create a dispatcher that spawns deliveries on `handle`.
    pub fn new(sink: Arc<dyn AlertSink>, config: &DispatchConfig, handle: Handle) -> Self {
        let max_in_flight = config.max_in_flight.max(1);
        Self {
            sink,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            timeout: config.timeout,
            jpeg_quality: config.jpeg_quality,
            handle,
        }
    }

    /// Hand off an alert. Never blocks and never fails.
    pub fn dispatch(&self, event: AlertEvent) -> DispatchOutcome {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    level = %event.level,
                    max_in_flight = self.max_in_flight,
                    "All dispatch slots busy, dropping alert"
                );
                metrics::record_dispatch_dropped(event.level);
                return DispatchOutcome::Dropped;
            }
        };

        let sink = Arc::clone(&self.sink);
        let timeout = self.timeout;
        let quality = self.jpeg_quality;
        self.handle.spawn(async move {
            let _permit = permit;
            deliver(sink, event, timeout, quality).await;
        });
        DispatchOutcome::Spawned
    }

    /// Deliveries currently running.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Wait until every delivery has finished. Returns `false` on timeout.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.in_flight() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        true
    }
}

async fn deliver(sink: Arc<dyn AlertSink>, event: AlertEvent, timeout: Duration, quality: u8) {
    let level = event.level;
    let started = Instant::now();

    let payload = match tokio::task::spawn_blocking(move || build_payload(&event, quality)).await {
        Ok(Ok(payload)) => payload,
        Ok(Err(e)) => {
            warn!(level = %level, error = %e, "Failed to encode alert snapshot");
            metrics::record_dispatch_failed(level);
            return;
        }
        Err(e) => {
            warn!(level = %level, error = %e, "Snapshot encoding task failed");
            metrics::record_dispatch_failed(level);
            return;
        }
    };
    debug!(level = %level, bytes = payload.image_base64.len(), "Alert payload ready");

    match tokio::time::timeout(timeout, sink.send(&payload)).await {
        Ok(Ok(())) => {
            let elapsed = started.elapsed().as_secs_f64();
            info!(
                level = %level,
                message = %payload.message,
                elapsed_secs = elapsed,
                "Alert delivered"
            );
            metrics::record_dispatch_sent(level, elapsed);
        }
        Ok(Err(e)) => {
            warn!(level = %level, error = %e, "Alert delivery failed");
            metrics::record_dispatch_failed(level);
        }
        Err(_) => {
            warn!(level = %level, timeout_secs = timeout.as_secs_f64(), "Alert delivery timed out");
            metrics::record_dispatch_failed(level);
        }
    }
}

/// JPEG-encode the snapshot and wrap it in the wire payload.
pub fn build_payload(event: &AlertEvent, jpeg_quality: u8) -> WorkerResult<AlertPayload> {
    let jpeg = event.snapshot.encode_jpeg(jpeg_quality)?;
    Ok(AlertPayload {
        status: event.level,
        message: event.message.clone(),
        timestamp: event.timestamp,
        image_base64: STANDARD.encode(jpeg),
    })
}
