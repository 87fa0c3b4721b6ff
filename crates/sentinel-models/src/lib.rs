//! Shared data models for the area sentinel.
//!
//! This crate provides Serde-serializable types for:
//! - Body and face landmarks returned by the pose estimator
//! - Per-frame classification outcomes (pose, face, wall line)
//! - Alert levels and the payload delivered to the alert sink

pub mod alert;
pub mod detection;
pub mod error;
pub mod landmarks;

// Re-export common types
pub use alert::{AlertLevel, AlertLevelParseError, AlertPayload};
pub use detection::{FaceStatus, PoseStatus, WallEstimate};
pub use error::{ModelError, ModelResult};
pub use landmarks::{
    BodyLandmark, BodyLandmarkSet, FaceLandmark, FaceLandmarkMesh, LandmarkBounds, LandmarkFrame,
    PoseLandmark, BODY_LANDMARK_COUNT,
};
