//! Side-to-side hand wave recognition.
//!
//! The recognizer is a pure function over an explicit [`WaveState`]; the
//! caller owns the state and threads it from frame to frame.

use sentinel_models::{BodyLandmarkSet, PoseLandmark};

use crate::config::WaveConfig;

/// Running state of the wave recognizer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveState {
    /// Direction reversals seen since the hand went up
    pub counter: u32,
    /// Wrist x at the last significant movement
    pub prev_x: Option<f32>,
    /// Last movement direction: -1 left, 1 right, 0 none yet
    pub prev_direction: i8,
}

impl WaveState {
    /// Progress towards a full wave in `[0, 1]`.
    pub fn progress(&self, config: &WaveConfig) -> f32 {
        if config.threshold == 0 {
            return 0.0;
        }
        (self.counter as f32 / config.threshold as f32).min(1.0)
    }
}

/// Advance the recognizer by one frame.
///
/// Returns `true` on the frame where the reversal count reaches the
/// threshold; the counter then starts over.
pub fn detect_wave(
    landmarks: &BodyLandmarkSet,
    state: WaveState,
    config: &WaveConfig,
) -> (bool, WaveState) {
    let left_wrist = landmarks.get(PoseLandmark::LeftWrist);
    let right_wrist = landmarks.get(PoseLandmark::RightWrist);
    let left_shoulder = landmarks.get(PoseLandmark::LeftShoulder);
    let right_shoulder = landmarks.get(PoseLandmark::RightShoulder);

    let left_raised = left_wrist.y < left_shoulder.y;
    let right_raised = right_wrist.y < right_shoulder.y;
    if !left_raised && !right_raised {
        return (false, WaveState::default());
    }

    let x = if right_raised { right_wrist.x } else { left_wrist.x };
    let Some(prev_x) = state.prev_x else {
        return (
            false,
            WaveState {
                prev_x: Some(x),
                ..state
            },
        );
    };

    let mut next = state;
    let dx = x - prev_x;
    if dx.abs() > config.min_move {
        let direction: i8 = if dx > 0.0 { 1 } else { -1 };
        if next.prev_direction != 0 && direction != next.prev_direction {
            next.counter += 1;
        }
        next.prev_direction = direction;
        next.prev_x = Some(x);
    }

    if next.counter >= config.threshold {
        next.counter = 0;
        return (true, next);
    }
    (false, next)
}
