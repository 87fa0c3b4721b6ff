//! Tunable thresholds for the per-frame classifiers.

use serde::{Deserialize, Serialize};

/// Configuration for every perception stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub wall: WallConfig,
    #[serde(default)]
    pub pose: PoseConfig,
    #[serde(default)]
    pub face: FaceConfig,
    #[serde(default)]
    pub wave: WaveConfig,
}

/// Barrier-edge estimator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Fraction of the frame height skipped from the top (default: 0.3)
    pub roi_top_fraction: f32,

    /// Canny hysteresis low threshold (default: 30)
    pub canny_low: i32,

    /// Canny hysteresis high threshold (default: 100)
    pub canny_high: i32,

    /// Hough accumulator votes needed for a line (default: 50)
    pub hough_threshold: u32,

    /// Minimum segment length as `width / divisor` (default: 3)
    pub min_length_divisor: u32,

    /// Largest gap, in pixels, bridged inside one segment (default: 20)
    pub max_line_gap: u32,

    /// Segments must be flatter than this absolute slope (default: 0.1)
    pub max_slope: f32,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            roi_top_fraction: 0.3,
            canny_low: 30,
            canny_high: 100,
            hough_threshold: 50,
            min_length_divisor: 3,
            max_line_gap: 20,
            max_slope: 0.1,
        }
    }
}

/// Where the climb test takes its barrier height from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClimbReference {
    /// Estimate the barrier from the frame every time.
    DetectedWall,
    /// A fixed horizontal line at normalized height `y_norm`.
    FixedLine { y_norm: f32 },
}

impl Default for ClimbReference {
    fn default() -> Self {
        Self::DetectedWall
    }
}

/// Fall and climb thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Shoulders and hips must all exceed this visibility for the angle test (default: 0.5)
    pub min_visibility: f32,

    /// Torso angles below this, or above `180 - this`, count as lying down (default: 45)
    pub horizontal_angle_deg: f32,

    /// Torso height below `ratio * shoulder width` counts as lying down (default: 0.8)
    pub compressed_torso_ratio: f32,

    /// Low-confidence fallback: bbox width above `ratio * height` is a fall (default: 1.5)
    pub fallback_aspect_ratio: f32,

    pub climb_reference: ClimbReference,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            horizontal_angle_deg: 45.0,
            compressed_torso_ratio: 0.8,
            fallback_aspect_ratio: 1.5,
            climb_reference: ClimbReference::default(),
        }
    }
}

/// Mask heuristic parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Half the side of the square mouth crop, in pixels (default: 20)
    pub crop_half_size: u32,

    /// Laplacian variance under which the mouth counts as covered (default: 50)
    pub variance_threshold: f64,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            crop_half_size: 20,
            variance_threshold: 50.0,
        }
    }
}

/// Wave recognizer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Direction reversals that make a wave (default: 3)
    pub threshold: u32,

    /// Minimum normalized wrist travel between frames (default: 0.02)
    pub min_move: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            min_move: 0.02,
        }
    }
}
