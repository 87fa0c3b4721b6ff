//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Monitor failed: {0}")]
    MonitorFailed(String),

    #[error("Dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("Alert sink rejected payload with status {status}: {body}")]
    SinkRejected { status: u16, body: String },

    #[error("Landmark service error: {0}")]
    LandmarkService(String),

    #[error("Vision error: {0}")]
    Vision(#[from] sentinel_vision::VisionError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn monitor_failed(msg: impl Into<String>) -> Self {
        Self::MonitorFailed(msg.into())
    }

    pub fn dispatch_failed(msg: impl Into<String>) -> Self {
        Self::DispatchFailed(msg.into())
    }

    pub fn landmark_service(msg: impl Into<String>) -> Self {
        Self::LandmarkService(msg.into())
    }

    pub fn sink_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::SinkRejected {
            status,
            body: body.into(),
        }
    }
}
