//! Fall and climb classification from body landmarks.

use sentinel_models::{BodyLandmark, BodyLandmarkSet, PoseLandmark, PoseStatus, WallEstimate};

use crate::config::{ClimbReference, DetectionConfig, PoseConfig};
use crate::frame::Frame;
use crate::wall::estimate_wall;

/// Classify the posture of one person.
///
/// `wall` is only evaluated when the climb test is reached with
/// [`ClimbReference::DetectedWall`]; a fall short-circuits it.
pub fn classify_pose<F>(landmarks: &BodyLandmarkSet, wall: F, config: &PoseConfig) -> PoseStatus
where
    F: FnOnce() -> WallEstimate,
{
    if is_fall(landmarks, config) {
        return PoseStatus::Fall;
    }

    let wall = match config.climb_reference {
        ClimbReference::DetectedWall => wall(),
        ClimbReference::FixedLine { y_norm } => WallEstimate::found(y_norm),
    };
    if let Some(wall_y) = wall.line() {
        let torso = torso_points(landmarks);
        let upper_body_y = torso.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        if upper_body_y < wall_y {
            return PoseStatus::Climb;
        }
    }

    PoseStatus::Normal
}

/// Classify posture, estimating the wall from `frame` if needed.
pub fn classify_pose_in_frame(
    landmarks: &BodyLandmarkSet,
    frame: &Frame,
    config: &DetectionConfig,
) -> PoseStatus {
    classify_pose(landmarks, || estimate_wall(frame, &config.wall), &config.pose)
}

/// Left shoulder, right shoulder, left hip, right hip.
fn torso_points(landmarks: &BodyLandmarkSet) -> [BodyLandmark; 4] {
    [
        landmarks.get(PoseLandmark::LeftShoulder),
        landmarks.get(PoseLandmark::RightShoulder),
        landmarks.get(PoseLandmark::LeftHip),
        landmarks.get(PoseLandmark::RightHip),
    ]
}

/// Torso angle against the horizontal in degrees, `[0, 180]`.
///
/// 90 is upright; values near 0 or 180 mean the body is lying down.
pub fn torso_angle(landmarks: &BodyLandmarkSet) -> f32 {
    let (dx, dy) = torso_vector(landmarks);
    dy.atan2(dx).to_degrees().abs()
}

fn torso_vector(landmarks: &BodyLandmarkSet) -> (f32, f32) {
    let [ls, rs, lh, rh] = torso_points(landmarks);
    let shoulder_mid = ((ls.x + rs.x) / 2.0, (ls.y + rs.y) / 2.0);
    let hip_mid = ((lh.x + rh.x) / 2.0, (lh.y + rh.y) / 2.0);
    (hip_mid.0 - shoulder_mid.0, hip_mid.1 - shoulder_mid.1)
}

fn is_fall(landmarks: &BodyLandmarkSet, config: &PoseConfig) -> bool {
    let torso = torso_points(landmarks);
    let confident = torso.iter().all(|p| p.visibility > config.min_visibility);

    if confident {
        let angle = torso_angle(landmarks);
        let horizontal = angle < config.horizontal_angle_deg
            || angle > 180.0 - config.horizontal_angle_deg;

        let (_, dy) = torso_vector(landmarks);
        let shoulder_width = (torso[0].x - torso[1].x).abs();
        let compressed = dy.abs() < shoulder_width * config.compressed_torso_ratio;

        horizontal || compressed
    } else {
        let bounds = landmarks.bounds();
        bounds.width() > bounds.height() * config.fallback_aspect_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_models::BODY_LANDMARK_COUNT;
    use std::cell::Cell;

    /// Body centred at `(cx, cy)` with the torso rotated to `angle_deg`.
    fn body(
        angle_deg: f32,
        torso_len: f32,
        shoulder_width: f32,
        visibility: f32,
    ) -> BodyLandmarkSet {
        let (cx, cy) = (0.5, 0.5);
        let rad = angle_deg.to_radians();
        let (dx, dy) = (rad.cos() * torso_len / 2.0, rad.sin() * torso_len / 2.0);
        let shoulder = (cx - dx, cy - dy);
        let hip = (cx + dx, cy + dy);
        let half = shoulder_width / 2.0;
        let base = vec![BodyLandmark::new(cx, cy, visibility); BODY_LANDMARK_COUNT];
        BodyLandmarkSet::new(base)
            .unwrap()
            .with(
                PoseLandmark::LeftShoulder,
                BodyLandmark::new(shoulder.0 + half, shoulder.1, visibility),
            )
            .with(
                PoseLandmark::RightShoulder,
                BodyLandmark::new(shoulder.0 - half, shoulder.1, visibility),
            )
            .with(
                PoseLandmark::LeftHip,
                BodyLandmark::new(hip.0 + half * 0.8, hip.1, visibility),
            )
            .with(
                PoseLandmark::RightHip,
                BodyLandmark::new(hip.0 - half * 0.8, hip.1, visibility),
            )
    }

    fn no_wall() -> WallEstimate {
        WallEstimate::not_found()
    }

    #[test]
    fn test_upright_is_normal() {
        let config = PoseConfig::default();
        for angle in [80.0, 90.0, 100.0] {
            let set = body(angle, 0.3, 0.2, 0.9);
            assert_eq!(classify_pose(&set, no_wall, &config), PoseStatus::Normal, "angle {angle}");
        }
    }

    #[test]
    fn test_lying_is_fall() {
        let config = PoseConfig::default();
        for angle in [0.0, 10.0, 20.0, 160.0, 170.0, 180.0] {
            let set = body(angle, 0.3, 0.05, 0.9);
            assert_eq!(classify_pose(&set, no_wall, &config), PoseStatus::Fall, "angle {angle}");
        }
    }

    #[test]
    fn test_compressed_torso_is_fall() {
        // Upright angle but the torso is shorter than the shoulders are wide.
        let set = body(90.0, 0.1, 0.3, 0.9);
        assert_eq!(classify_pose(&set, no_wall, &PoseConfig::default()), PoseStatus::Fall);
    }

    #[test]
    fn test_low_confidence_uses_bounding_box() {
        let config = PoseConfig::default();
        let wide = BodyLandmarkSet::new(vec![BodyLandmark::new(0.5, 0.5, 0.2); BODY_LANDMARK_COUNT])
            .unwrap()
            .with(PoseLandmark::Nose, BodyLandmark::new(0.1, 0.45, 0.2))
            .with(PoseLandmark::LeftAnkle, BodyLandmark::new(0.9, 0.55, 0.2));
        assert_eq!(classify_pose(&wide, no_wall, &config), PoseStatus::Fall);

        let tall = BodyLandmarkSet::new(vec![BodyLandmark::new(0.5, 0.5, 0.2); BODY_LANDMARK_COUNT])
            .unwrap()
            .with(PoseLandmark::Nose, BodyLandmark::new(0.45, 0.1, 0.2))
            .with(PoseLandmark::LeftAnkle, BodyLandmark::new(0.55, 0.9, 0.2));
        assert_eq!(classify_pose(&tall, no_wall, &config), PoseStatus::Normal);

        let legacy = PoseConfig {
            fallback_aspect_ratio: 1.2,
            ..PoseConfig::default()
        };
        let borderline =
            BodyLandmarkSet::new(vec![BodyLandmark::new(0.5, 0.5, 0.2); BODY_LANDMARK_COUNT])
                .unwrap()
                .with(PoseLandmark::Nose, BodyLandmark::new(0.2, 0.3, 0.2))
                .with(PoseLandmark::LeftAnkle, BodyLandmark::new(0.7, 0.7, 0.2));
        assert_eq!(classify_pose(&borderline, no_wall, &config), PoseStatus::Normal);
        assert_eq!(classify_pose(&borderline, no_wall, &legacy), PoseStatus::Fall);
    }

    #[test]
    fn test_climb_above_wall() {
        let config = PoseConfig::default();
        let set = body(90.0, 0.3, 0.2, 0.9);
        // Shoulders sit at y = 0.35.
        assert_eq!(
            classify_pose(&set, || WallEstimate::found(0.5), &config),
            PoseStatus::Climb
        );
        assert_eq!(
            classify_pose(&set, || WallEstimate::found(0.3), &config),
            PoseStatus::Normal
        );
    }

    #[test]
    fn test_fall_skips_wall_estimate() {
        let calls = Cell::new(0);
        let set = body(0.0, 0.3, 0.05, 0.9);
        let status = classify_pose(
            &set,
            || {
                calls.set(calls.get() + 1);
                WallEstimate::found(0.9)
            },
            &PoseConfig::default(),
        );
        assert_eq!(status, PoseStatus::Fall);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_fixed_line_reference() {
        let config = PoseConfig {
            climb_reference: ClimbReference::FixedLine { y_norm: 0.4 },
            ..PoseConfig::default()
        };
        let set = body(90.0, 0.3, 0.2, 0.9);
        let status = classify_pose(&set, || panic!("wall estimator must not run"), &config);
        assert_eq!(status, PoseStatus::Climb);
    }

    #[test]
    fn test_torso_angle() {
        assert!((torso_angle(&body(90.0, 0.3, 0.2, 1.0)) - 90.0).abs() < 1e-3);
        assert!(torso_angle(&body(10.0, 0.3, 0.2, 1.0)) < 11.0);
    }
}
