//! Per-frame classification outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body posture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PoseStatus {
    #[default]
    Normal,
    /// Torso closer to horizontal than vertical
    Fall,
    /// Torso above the barrier line
    Climb,
}

impl PoseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoseStatus::Normal => "NORMAL",
            PoseStatus::Fall => "FALL",
            PoseStatus::Climb => "CLIMB",
        }
    }

    /// Returns true for statuses that always raise a red alert.
    pub fn is_dangerous(&self) -> bool {
        !matches!(self, PoseStatus::Normal)
    }
}

impl fmt::Display for PoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Face visibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaceStatus {
    /// Face visible with an unobstructed mouth
    Ok,
    /// Mouth region too flat, likely covered
    Mask,
    /// No face mesh: turned away or fully hidden
    NoFace,
}

impl FaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceStatus::Ok => "OK",
            FaceStatus::Mask => "MASK",
            FaceStatus::NoFace => "NO_FACE",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FaceStatus::Ok)
    }
}

impl fmt::Display for FaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Estimated barrier line for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WallEstimate {
    pub found: bool,
    /// Normalized vertical position; meaningful only when `found`
    pub y_norm: f32,
}

impl WallEstimate {
    pub fn found(y_norm: f32) -> Self {
        Self {
            found: true,
            y_norm,
        }
    }

    pub fn not_found() -> Self {
        Self::default()
    }

    /// Line position, if a line was found.
    pub fn line(&self) -> Option<f32> {
        self.found.then_some(self.y_norm)
    }
}
