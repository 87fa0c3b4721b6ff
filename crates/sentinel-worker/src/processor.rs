//! Per-frame pipeline.
//!
//! Runs the classifiers over one frame and its landmarks, advances the alert
//! state machine, and renders the annotated snapshot. Owns the session and
//! wave state; nothing else mutates them.

use sentinel_models::{AlertLevel, FaceStatus, LandmarkFrame, PoseStatus, WallEstimate};
use sentinel_vision::{
    annotate, classify_pose, detect_wave, estimate_wall, face_status, Annotation, ClimbReference,
    DetectionConfig, Frame, WaveState,
};
use tracing::debug;

use crate::alert_state::{step, AlertEvent, FrameObservation, SessionState};
use crate::config::AlertConfig;

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub level: AlertLevel,
    pub message: String,
    /// `None` when nobody is in view
    pub pose: Option<PoseStatus>,
    pub face: Option<FaceStatus>,
    pub wall: WallEstimate,
    pub wave_counter: u32,
    /// Level differs from the previous frame
    pub changed: bool,
    pub safe_mode_activated: bool,
    pub annotated: Frame,
    /// Alert to deliver, if the state machine asked for one
    pub event: Option<AlertEvent>,
}

/// Stateful frame processor for one monitoring session.
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    detection: DetectionConfig,
    alerts: AlertConfig,
    session: SessionState,
    wave: WaveState,
}

impl FrameProcessor {
    pub fn new(detection: DetectionConfig, alerts: AlertConfig) -> Self {
        Self {
            detection,
            alerts,
            session: SessionState::default(),
            wave: WaveState::default(),
        }
    }

    /// Start from an existing session state.
    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn wave_state(&self) -> &WaveState {
        &self.wave
    }

    pub fn detection(&self) -> &DetectionConfig {
        &self.detection
    }

    /// Process one frame taken at `now` (seconds since the Unix epoch).
    pub fn process(&mut self, frame: &Frame, landmarks: &LandmarkFrame, now: f64) -> FrameOutcome {
        let wall = match self.detection.pose.climb_reference {
            ClimbReference::DetectedWall => estimate_wall(frame, &self.detection.wall),
            ClimbReference::FixedLine { y_norm } => WallEstimate::found(y_norm),
        };

        let (pose, face) = match &landmarks.pose {
            Some(body) => {
                let pose = classify_pose(body, || wall, &self.detection.pose);
                let face = face_status(landmarks.face.as_ref(), frame, &self.detection.face);
                (Some(pose), Some(face))
            }
            None => (None, None),
        };
        let observation = match (pose, face) {
            (Some(pose), Some(face)) => FrameObservation::person(pose, face),
            _ => FrameObservation::no_person(),
        };

        let previous = self.session.current_status;
        let wave_config = &self.detection.wave;
        let wave = &mut self.wave;
        let wave_confirmed = || match &landmarks.pose {
            Some(body) => {
                let (confirmed, next) = detect_wave(body, *wave, wave_config);
                *wave = next;
                confirmed
            }
            None => false,
        };
        let (decision, session) =
            step(&observation, wave_confirmed, now, &self.alerts, self.session);
        self.session = session;

        debug!(
            level = %decision.level,
            pose = ?pose,
            face = ?face,
            wall = ?wall.line(),
            wave_counter = self.wave.counter,
            "Frame classified"
        );

        let annotated = annotate(
            frame,
            &Annotation {
                level: decision.level,
                wall,
                wave_progress: self.wave.progress(&self.detection.wave),
            },
        );

        let event = decision.dispatch.then(|| AlertEvent {
            level: decision.level,
            message: decision.message.clone(),
            timestamp: now,
            snapshot: annotated.clone(),
        });

        FrameOutcome {
            level: decision.level,
            message: decision.message,
            pose,
            face,
            wall,
            wave_counter: self.wave.counter,
            changed: previous != Some(decision.level),
            safe_mode_activated: decision.safe_mode_activated,
            annotated,
            event,
        }
    }
}
