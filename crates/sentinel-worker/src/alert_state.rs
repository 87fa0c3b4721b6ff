//! Alert state machine.
//!
//! Turns per-frame classifications into an alert level, keeps the safe-mode
//! timer, and decides which level changes are worth dispatching. The step
//! function is pure: the caller owns [`SessionState`] and passes it back in
//! on the next frame.

use sentinel_models::{AlertLevel, FaceStatus, PoseStatus};
use sentinel_vision::Frame;

use crate::config::AlertConfig;

pub const MSG_NO_PERSON: &str = "No person in view";
pub const MSG_FALL: &str = "DANGER: fall detected";
pub const MSG_CLIMB: &str = "DANGER: climbing over barrier detected";
pub const MSG_NO_FACE: &str = "WARNING: face not visible / turned away";
pub const MSG_MASK: &str = "WARNING: mask or face occlusion detected";
pub const MSG_SAFE_MODE_ACTIVATED: &str = "Safe mode activated";
pub const MSG_UNVERIFIED: &str = "Person detected - unverified";

/// What the classifiers saw in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameObservation {
    pub person_present: bool,
    pub pose: PoseStatus,
    pub face: FaceStatus,
}

impl FrameObservation {
    pub fn no_person() -> Self {
        Self {
            person_present: false,
            pose: PoseStatus::Normal,
            face: FaceStatus::NoFace,
        }
    }

    pub fn person(pose: PoseStatus, face: FaceStatus) -> Self {
        Self {
            person_present: true,
            pose,
            face,
        }
    }
}

/// Session-long alert state, owned by the frame loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionState {
    /// Level of the previous frame; `None` before the first frame
    pub current_status: Option<AlertLevel>,
    /// Time of the last dispatched alert
    pub last_sent_time: Option<f64>,
    /// End of the safe-mode window
    pub safe_mode_until: Option<f64>,
}

impl SessionState {
    pub fn safe_mode_active(&self, now: f64) -> bool {
        self.safe_mode_until.is_some_and(|until| now < until)
    }

    fn cooldown_elapsed(&self, now: f64, cooldown: f64) -> bool {
        self.last_sent_time.map_or(true, |last| now - last >= cooldown)
    }
}

/// Result of one state machine step.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDecision {
    pub level: AlertLevel,
    pub message: String,
    /// An alert should be sent for this frame
    pub dispatch: bool,
    /// A wave opened a new safe-mode window on this frame
    pub safe_mode_activated: bool,
}

/// An alert ready for delivery.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub level: AlertLevel,
    pub message: String,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// Annotated copy of the frame
    pub snapshot: Frame,
}

/// Advance the state machine by one frame.
///
/// `wave_confirmed` is only called when the outcome depends on it: a person
/// with a normal pose, a visible bare face, and no active safe mode.
pub fn step<F>(
    observation: &FrameObservation,
    wave_confirmed: F,
    now: f64,
    config: &AlertConfig,
    session: SessionState,
) -> (AlertDecision, SessionState)
where
    F: FnOnce() -> bool,
{
    let mut next = session;
    let mut safe_mode_activated = false;

    let (level, message) = if !observation.person_present {
        (AlertLevel::Normal, MSG_NO_PERSON.to_string())
    } else if observation.pose == PoseStatus::Fall {
        (AlertLevel::Red, MSG_FALL.to_string())
    } else if observation.pose == PoseStatus::Climb {
        (AlertLevel::Red, MSG_CLIMB.to_string())
    } else if observation.face == FaceStatus::NoFace {
        (AlertLevel::Red, MSG_NO_FACE.to_string())
    } else if observation.face == FaceStatus::Mask {
        (AlertLevel::Red, MSG_MASK.to_string())
    } else if let Some(until) = session.safe_mode_until.filter(|until| now < *until) {
        let remaining = (until - now) as i64;
        (AlertLevel::Green, format!("Verified safe ({remaining}s remaining)"))
    } else if wave_confirmed() {
        next.safe_mode_until = Some(now + config.safe_duration_secs);
        safe_mode_activated = true;
        (AlertLevel::Green, MSG_SAFE_MODE_ACTIVATED.to_string())
    } else {
        (AlertLevel::Yellow, MSG_UNVERIFIED.to_string())
    };

    let changed = session.current_status != Some(level);
    let dispatch = changed && session.cooldown_elapsed(now, config.send_cooldown_secs);
    if dispatch {
        next.last_sent_time = Some(now);
    }
    next.current_status = Some(level);

    (
        AlertDecision {
            level,
            message,
            dispatch,
            safe_mode_activated,
        },
        next,
    )
}
