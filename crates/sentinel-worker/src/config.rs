//! Monitor configuration.
//!
//! Every value has a default and can be overridden through environment
//! variables; missing or unparsable variables fall back to the default.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sentinel_vision::{CaptureSettings, CaptureTarget, ClimbReference, DetectionConfig};

use crate::error::{WorkerError, WorkerResult};

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Camera index or stream URL
    pub source: String,
    /// Replay this directory of images instead of a live capture
    pub image_dir: Option<PathBuf>,
    /// Restart the image directory when it runs out
    pub loop_images: bool,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Flip frames horizontally before analysis
    pub mirror: bool,
    pub reconnect_delay: Duration,
    /// Consecutive reconnects before giving up; `None` uses the capture default
    pub max_reconnects: Option<u32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source: "0".to_string(),
            image_dir: None,
            loop_images: false,
            frame_width: 640,
            frame_height: 480,
            mirror: false,
            reconnect_delay: Duration::from_secs(2),
            max_reconnects: None,
        }
    }
}

impl SourceConfig {
    /// Capture settings for the live source.
    pub fn capture_settings(&self) -> CaptureSettings {
        let mut settings = CaptureSettings::new(CaptureTarget::parse(&self.source));
        settings.width = self.frame_width;
        settings.height = self.frame_height;
        settings.reconnect_delay = self.reconnect_delay;
        if self.max_reconnects.is_some() {
            settings.max_reconnects = self.max_reconnects;
        }
        settings
    }
}

/// Landmark sidecar client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkServiceConfig {
    pub url: String,
    pub timeout: Duration,
    /// JPEG quality of the frames sent to the sidecar
    pub jpeg_quality: u8,
}

impl Default for LandmarkServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5001/landmarks".to_string(),
            timeout: Duration::from_millis(1000),
            jpeg_quality: 90,
        }
    }
}

/// Alert delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub sink_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Concurrent deliveries; extra alerts are dropped
    pub max_in_flight: usize,
    /// Snapshot JPEG quality
    pub jpeg_quality: u8,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            sink_url: "http://localhost:3000/api/alert".to_string(),
            timeout: Duration::from_secs(2),
            max_in_flight: 4,
            jpeg_quality: 80,
        }
    }
}

/// Alert state machine timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Length of the safe-mode window opened by a wave, in seconds
    pub safe_duration_secs: f64,
    /// Minimum interval between two dispatched alerts, in seconds
    pub send_cooldown_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            safe_duration_secs: 30.0,
            send_cooldown_secs: 2.0,
        }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub source: SourceConfig,
    pub landmarks: LandmarkServiceConfig,
    pub dispatch: DispatchConfig,
    pub alerts: AlertConfig,
    pub detection: DetectionConfig,
    /// Prometheus exporter port; disabled when `None`
    pub metrics_port: Option<u16>,
}

impl MonitorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        fn or<T: FromStr>(value: Option<String>, default: T) -> T {
            value.and_then(|s| s.parse().ok()).unwrap_or(default)
        }

        let defaults = Self::default();

        let source = SourceConfig {
            source: parse("SENTINEL_SOURCE").unwrap_or(defaults.source.source),
            image_dir: parse("SENTINEL_IMAGE_DIR").map(PathBuf::from),
            loop_images: or(parse("SENTINEL_LOOP_IMAGES"), defaults.source.loop_images),
            frame_width: or(parse("SENTINEL_FRAME_WIDTH"), defaults.source.frame_width),
            frame_height: or(parse("SENTINEL_FRAME_HEIGHT"), defaults.source.frame_height),
            mirror: or(parse("SENTINEL_MIRROR"), defaults.source.mirror),
            reconnect_delay: Duration::from_secs(or(parse("SENTINEL_RECONNECT_DELAY_SECS"), 2)),
            max_reconnects: parse("SENTINEL_MAX_RECONNECTS").and_then(|s| s.parse().ok()),
        };

        let landmarks = LandmarkServiceConfig {
            url: parse("LANDMARK_SERVICE_URL").unwrap_or(defaults.landmarks.url),
            timeout: Duration::from_millis(or(parse("LANDMARK_TIMEOUT_MS"), 1000)),
            jpeg_quality: defaults.landmarks.jpeg_quality,
        };

        let dispatch = DispatchConfig {
            sink_url: parse("ALERT_SINK_URL").unwrap_or(defaults.dispatch.sink_url),
            timeout: Duration::from_secs(or(parse("ALERT_TIMEOUT_SECS"), 2)),
            max_in_flight: or(parse("ALERT_MAX_IN_FLIGHT"), defaults.dispatch.max_in_flight),
            jpeg_quality: or(parse("SNAPSHOT_JPEG_QUALITY"), defaults.dispatch.jpeg_quality),
        };

        let alerts = AlertConfig {
            safe_duration_secs: or(parse("SAFE_DURATION_SECS"), defaults.alerts.safe_duration_secs),
            send_cooldown_secs: or(parse("SEND_COOLDOWN_SECS"), defaults.alerts.send_cooldown_secs),
        };

        let mut detection = defaults.detection;
        detection.wave.threshold = or(parse("WAVE_THRESHOLD"), detection.wave.threshold);
        detection.wave.min_move = or(parse("WAVE_MIN_MOVE"), detection.wave.min_move);
        detection.pose.fallback_aspect_ratio =
            or(parse("FALL_FALLBACK_RATIO"), detection.pose.fallback_aspect_ratio);
        if let Some(y_norm) = parse("CLIMB_FIXED_LINE").and_then(|s| s.parse::<f32>().ok()) {
            detection.pose.climb_reference = ClimbReference::FixedLine { y_norm };
        }
        detection.face.variance_threshold =
            or(parse("MASK_VARIANCE_THRESHOLD"), detection.face.variance_threshold);

        Self {
            source,
            landmarks,
            dispatch,
            alerts,
            detection,
            metrics_port: parse("METRICS_PORT").and_then(|s| s.parse().ok()),
        }
    }

    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        for (name, url) in [
            ("LANDMARK_SERVICE_URL", &self.landmarks.url),
            ("ALERT_SINK_URL", &self.dispatch.sink_url),
        ] {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| WorkerError::config_error(format!("{name}={url}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(WorkerError::config_error(format!(
                    "{name} must be an http(s) URL, got {url}"
                )));
            }
        }
        if self.dispatch.max_in_flight == 0 {
            return Err(WorkerError::config_error("ALERT_MAX_IN_FLIGHT must be at least 1"));
        }
        for (name, quality) in [
            ("SNAPSHOT_JPEG_QUALITY", self.dispatch.jpeg_quality),
            ("landmark jpeg quality", self.landmarks.jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(WorkerError::config_error(format!(
                    "{name} must be within 1..=100, got {quality}"
                )));
            }
        }
        if !(self.alerts.safe_duration_secs > 0.0) {
            return Err(WorkerError::config_error("SAFE_DURATION_SECS must be positive"));
        }
        if !(self.alerts.send_cooldown_secs >= 0.0) {
            return Err(WorkerError::config_error("SEND_COOLDOWN_SECS must not be negative"));
        }
        if self.detection.wave.threshold == 0 {
            return Err(WorkerError::config_error("WAVE_THRESHOLD must be at least 1"));
        }
        if let ClimbReference::FixedLine { y_norm } = self.detection.pose.climb_reference {
            if !(0.0..=1.0).contains(&y_norm) {
                return Err(WorkerError::config_error(format!(
                    "CLIMB_FIXED_LINE must be within [0, 1], got {y_norm}"
                )));
            }
        }
        Ok(())
    }
}
