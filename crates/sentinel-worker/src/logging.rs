//! Structured session logging utilities.
//!
//! Provides consistent, structured logging for a monitoring session with
//! tracing spans and contextual information.

use sentinel_models::AlertLevel;
use tracing::{info, warn, Span};
use uuid::Uuid;

/// Session logger for structured logging with consistent formatting.
///
/// Every event carries the session ID and the frame source name.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    source: String,
}

impl SessionLogger {
    /// Create a logger with a fresh session ID.
    pub fn new(source: &str) -> Self {
        Self {
            session_id: format!("monitor-{}", Uuid::new_v4()),
            source: source.to_string(),
        }
    }

    /// Log the start of the session.
    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            "Monitor started: {}", message
        );
    }

    /// Log a change of alert level.
    pub fn log_transition(&self, from: Option<AlertLevel>, to: AlertLevel, message: &str) {
        let from = from.map(|l| l.as_str()).unwrap_or("NONE");
        if to.is_alarming() {
            warn!(
                session_id = %self.session_id,
                source = %self.source,
                from,
                to = %to,
                "Alert level changed: {}", message
            );
        } else {
            info!(
                session_id = %self.session_id,
                source = %self.source,
                from,
                to = %to,
                "Alert level changed: {}", message
            );
        }
    }

    /// Log a warning during the session.
    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            source = %self.source,
            "Monitor warning: {}", message
        );
    }

    /// Log the end of the session.
    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            "Monitor stopped: {}", message
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Create a tracing span for this session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "monitor",
            session_id = %self.session_id,
            source = %self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_logger_creation() {
        let logger = SessionLogger::new("camera:0");
        assert!(logger.session_id().starts_with("monitor-"));
        assert_eq!(logger.source(), "camera:0");
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionLogger::new("camera:0");
        let b = SessionLogger::new("camera:0");
        assert_ne!(a.session_id(), b.session_id());
    }
}
