//! Area sentinel monitor.
//!
//! This crate provides:
//! - The alert state machine and the per-frame processor
//! - Background alert dispatch with bounded concurrency
//! - The landmark sidecar client
//! - The frame loop and its configuration
//! - Prometheus metrics and structured session logging

pub mod alert_state;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod landmarks;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod processor;

pub use alert_state::{step, AlertDecision, AlertEvent, FrameObservation, SessionState};
pub use config::{AlertConfig, DispatchConfig, LandmarkServiceConfig, MonitorConfig, SourceConfig};
pub use dispatcher::{build_payload, AlertDispatcher, AlertSink, DispatchOutcome, HttpAlertSink};
pub use error::{WorkerError, WorkerResult};
pub use landmarks::HttpLandmarkSource;
pub use logging::SessionLogger;
pub use monitor::{open_frame_source, wall_clock, Monitor, MonitorSummary};
pub use processor::{FrameOutcome, FrameProcessor};
