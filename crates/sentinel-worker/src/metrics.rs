//! Prometheus metrics for the monitor.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use sentinel_models::AlertLevel;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    // Frame loop
    pub const FRAMES_PROCESSED_TOTAL: &str = "sentinel_frames_processed_total";
    pub const FRAMES_SKIPPED_TOTAL: &str = "sentinel_frames_skipped_total";
    pub const MONITOR_FPS: &str = "sentinel_monitor_fps";

    // Alerts
    pub const ALERT_TRANSITIONS_TOTAL: &str = "sentinel_alert_transitions_total";
    pub const DISPATCH_SENT_TOTAL: &str = "sentinel_dispatch_sent_total";
    pub const DISPATCH_FAILED_TOTAL: &str = "sentinel_dispatch_failed_total";
    pub const DISPATCH_DROPPED_TOTAL: &str = "sentinel_dispatch_dropped_total";
    pub const DISPATCH_DURATION_SECONDS: &str = "sentinel_dispatch_duration_seconds";
}

/// Serve `/metrics` on `0.0.0.0:port`. Must run inside a Tokio runtime.
pub fn install_exporter(port: u16) -> WorkerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter on {addr}: {e}")))
}

pub fn record_frame_processed() {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
}

/// Record a frame dropped before classification.
pub fn record_frame_skipped(reason: &'static str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::FRAMES_SKIPPED_TOTAL, &labels).increment(1);
}

pub fn record_fps(fps: f64) {
    gauge!(names::MONITOR_FPS).set(fps);
}

/// Record a change of alert level.
pub fn record_transition(level: AlertLevel) {
    let labels = [("level", level.as_str().to_string())];
    counter!(names::ALERT_TRANSITIONS_TOTAL, &labels).increment(1);
}

pub fn record_dispatch_sent(level: AlertLevel, duration_secs: f64) {
    let labels = [("level", level.as_str().to_string())];
    counter!(names::DISPATCH_SENT_TOTAL, &labels).increment(1);
    histogram!(names::DISPATCH_DURATION_SECONDS).record(duration_secs);
}

pub fn record_dispatch_failed(level: AlertLevel) {
    let labels = [("level", level.as_str().to_string())];
    counter!(names::DISPATCH_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_dispatch_dropped(level: AlertLevel) {
    let labels = [("level", level.as_str().to_string())];
    counter!(names::DISPATCH_DROPPED_TOTAL, &labels).increment(1);
}
