//! Per-frame perception for the area sentinel.
//!
//! This crate provides:
//! - Barrier (wall line) estimation from raw pixels
//! - Fall and climb classification from body landmarks
//! - Mask heuristic on the mouth region
//! - Wave gesture recognition with explicit state
//! - Snapshot annotation
//! - Frame sources (image sequences, and OpenCV capture)
//!
//! Pixel analysis runs on OpenCV `imgproc` behind the default `opencv`
//! feature. Without it the wall estimator reports "not found" and the mask
//! check fails open.

pub mod config;
pub mod error;
pub mod face;
pub mod frame;
pub mod overlay;
pub mod pose;
pub mod source;
pub mod wall;
pub mod wave;

#[cfg(feature = "opencv")]
pub mod capture;
#[cfg(feature = "opencv")]
mod cv;

pub use config::{ClimbReference, DetectionConfig, FaceConfig, PoseConfig, WallConfig, WaveConfig};
pub use error::{VisionError, VisionResult};
pub use face::{classify_face, face_status};
pub use frame::Frame;
pub use overlay::{annotate, Annotation};
pub use pose::{classify_pose, classify_pose_in_frame, torso_angle};
pub use source::{CaptureSettings, CaptureTarget, FrameSource, ImageSequenceSource, LandmarkSource};
pub use wall::estimate_wall;
pub use wave::{detect_wave, WaveState};

#[cfg(feature = "opencv")]
pub use capture::CaptureSource;
#[cfg(feature = "opencv")]
pub use face::laplacian_variance;
