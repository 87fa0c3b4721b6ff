//! Alert level definitions and the outbound alert payload.
//!
//! The four levels describe what the monitored area currently contains:
//!
//! - `Normal`: nobody in view
//! - `Yellow`: a person is present but unverified
//! - `Red`: a dangerous event (fall, climbing, hidden or masked face)
//! - `Green`: a person has asserted safety with a wave gesture

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Alert level reported for every processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    /// No person detected in the monitored area.
    Normal,

    /// A person is present but has not been verified.
    Yellow,

    /// Dangerous event or concealed identity.
    Red,

    /// Person verified safe through the wave gesture.
    Green,
}

impl AlertLevel {
    /// All alert levels, least to most severe ordering not implied.
    pub const ALL: &'static [AlertLevel] = &[
        AlertLevel::Normal,
        AlertLevel::Yellow,
        AlertLevel::Red,
        AlertLevel::Green,
    ];

    /// Returns the wire name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "NORMAL",
            AlertLevel::Yellow => "YELLOW",
            AlertLevel::Red => "RED",
            AlertLevel::Green => "GREEN",
        }
    }

    /// Returns true for levels that require operator attention.
    pub fn is_alarming(&self) -> bool {
        matches!(self, AlertLevel::Red)
    }

    /// Display color for overlays, as RGB.
    pub fn color_rgb(&self) -> [u8; 3] {
        match self {
            AlertLevel::Normal => [128, 128, 128],
            AlertLevel::Yellow => [255, 255, 0],
            AlertLevel::Red => [255, 0, 0],
            AlertLevel::Green => [0, 255, 0],
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = AlertLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NORMAL" => Ok(AlertLevel::Normal),
            "YELLOW" => Ok(AlertLevel::Yellow),
            "RED" => Ok(AlertLevel::Red),
            "GREEN" => Ok(AlertLevel::Green),
            _ => Err(AlertLevelParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown alert level: {0}")]
pub struct AlertLevelParseError(String);

/// JSON body delivered to the alert sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Alert level
    pub status: AlertLevel,
    /// Human-readable description of the event
    pub message: String,
    /// Event time in seconds since the Unix epoch
    pub timestamp: f64,
    /// Base64-encoded JPEG snapshot of the annotated frame
    pub image_base64: String,
}
