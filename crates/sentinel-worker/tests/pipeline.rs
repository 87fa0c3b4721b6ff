//! End-to-end tests: landmarks and synthetic frames in, alert levels and
//! delivered payloads out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::sync::watch;

use sentinel_models::{
    AlertLevel, AlertPayload, BodyLandmark, BodyLandmarkSet, FaceLandmark, FaceLandmarkMesh,
    LandmarkFrame, PoseLandmark, BODY_LANDMARK_COUNT,
};
use sentinel_vision::{
    DetectionConfig, Frame, FrameSource, LandmarkSource, VisionError, VisionResult,
};
use sentinel_worker::alert_state::{
    MSG_FALL, MSG_NO_PERSON, MSG_SAFE_MODE_ACTIVATED, MSG_UNVERIFIED,
};
use sentinel_worker::{
    AlertConfig, AlertDispatcher, AlertSink, DispatchConfig, FrameProcessor, Monitor, SessionState,
    WorkerError, WorkerResult,
};

const NOW: f64 = 1_700_000_000.0;
const MOUTH: (f32, f32) = (0.5, 0.15);

/// Flat 320x240 frame; with `textured` a noise patch covers the mouth area.
/// The patch stays above the wall search region.
fn scene(textured: bool) -> Frame {
    let mut image = RgbImage::from_pixel(320, 240, Rgb([110, 110, 110]));
    if textured {
        let mut rng = StdRng::seed_from_u64(7);
        for y in 6..60 {
            for x in 130..190 {
                let v: u8 = rng.random();
                image.put_pixel(x, y, Rgb([v, v, v]));
            }
        }
    }
    Frame::new(image)
}

/// Body with the torso rotated to `angle_deg` against the horizontal.
fn body(angle_deg: f32) -> BodyLandmarkSet {
    let (cx, cy) = (0.5, 0.55);
    let rad = angle_deg.to_radians();
    let (dx, dy) = (rad.cos() * 0.15, rad.sin() * 0.15);
    let base = vec![BodyLandmark::new(cx, 0.9, 0.9); BODY_LANDMARK_COUNT];
    BodyLandmarkSet::new(base)
        .unwrap()
        .with(PoseLandmark::LeftShoulder, BodyLandmark::new(cx - dx + 0.05, cy - dy, 0.9))
        .with(PoseLandmark::RightShoulder, BodyLandmark::new(cx - dx - 0.05, cy - dy, 0.9))
        .with(PoseLandmark::LeftHip, BodyLandmark::new(cx + dx + 0.04, cy + dy, 0.9))
        .with(PoseLandmark::RightHip, BodyLandmark::new(cx + dx - 0.04, cy + dy, 0.9))
}

fn waving(x: f32) -> BodyLandmarkSet {
    body(90.0).with(PoseLandmark::RightWrist, BodyLandmark::new(x, 0.2, 0.9))
}

fn face() -> FaceLandmarkMesh {
    let mut points = vec![FaceLandmark::new(0.5, 0.1); 468];
    points[FaceLandmarkMesh::UPPER_LIP] = FaceLandmark::new(MOUTH.0, MOUTH.1);
    FaceLandmarkMesh::new(points)
}

fn person(body: BodyLandmarkSet) -> LandmarkFrame {
    LandmarkFrame::new(Some(body), Some(face()))
}

fn processor() -> FrameProcessor {
    FrameProcessor::new(DetectionConfig::default(), AlertConfig::default())
}

#[test]
fn test_no_person_is_normal() {
    let outcome = processor().process(&scene(true), &LandmarkFrame::empty(), NOW);
    assert_eq!(outcome.level, AlertLevel::Normal);
    assert_eq!(outcome.message, MSG_NO_PERSON);
}

#[test]
fn test_upright_bare_face_is_yellow() {
    let outcome = processor().process(&scene(true), &person(body(90.0)), NOW);
    assert_eq!(outcome.level, AlertLevel::Yellow);
    assert_eq!(outcome.message, MSG_UNVERIFIED);
    assert!(!outcome.wall.found);
}

#[test]
fn test_active_safe_mode_is_green() {
    let session = SessionState {
        safe_mode_until: Some(NOW + 10.0),
        ..SessionState::default()
    };
    let outcome = processor()
        .with_session(session)
        .process(&scene(true), &person(body(90.0)), NOW);
    assert_eq!(outcome.level, AlertLevel::Green);
    assert!(outcome.message.contains("10s"), "{}", outcome.message);
}

#[test]
fn test_lying_body_is_fall() {
    let session = SessionState {
        safe_mode_until: Some(NOW + 10.0),
        ..SessionState::default()
    };
    let outcome = processor()
        .with_session(session)
        .process(&scene(true), &person(body(10.0)), NOW);
    assert_eq!(outcome.level, AlertLevel::Red);
    assert_eq!(outcome.message, MSG_FALL);
}

#[cfg(feature = "opencv")]
#[test]
fn test_flat_mouth_is_mask() {
    use sentinel_worker::alert_state::MSG_MASK;

    let outcome = processor().process(&scene(false), &person(body(90.0)), NOW);
    assert_eq!(outcome.level, AlertLevel::Red);
    assert_eq!(outcome.message, MSG_MASK);
}

#[test]
fn test_wave_opens_safe_mode() {
    let mut processor = processor();
    let frame = scene(true);
    let xs = [0.5, 0.55, 0.50, 0.55, 0.50];

    let mut levels = Vec::new();
    for (i, x) in xs.into_iter().enumerate() {
        let outcome = processor.process(&frame, &person(waving(x)), NOW + i as f64 * 0.1);
        levels.push(outcome.level);
        if i == xs.len() - 1 {
            assert_eq!(outcome.message, MSG_SAFE_MODE_ACTIVATED);
            assert!(outcome.safe_mode_activated);
            assert_eq!(outcome.wave_counter, 0);
        }
    }
    assert_eq!(
        levels,
        vec![
            AlertLevel::Yellow,
            AlertLevel::Yellow,
            AlertLevel::Yellow,
            AlertLevel::Yellow,
            AlertLevel::Green
        ]
    );

    // Still inside the window a few seconds later, hands down.
    let later = processor.process(&frame, &person(body(90.0)), NOW + 5.0);
    assert_eq!(later.level, AlertLevel::Green);
    assert!(later.message.contains("25s"), "{}", later.message);

    // Window over.
    let expired = processor.process(&frame, &person(body(90.0)), NOW + 31.0);
    assert_eq!(expired.level, AlertLevel::Yellow);
}

struct ScriptedFrames {
    remaining: usize,
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> VisionResult<Option<Frame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(scene(true)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedLandmarks {
    script: VecDeque<VisionResult<LandmarkFrame>>,
}

impl LandmarkSource for ScriptedLandmarks {
    fn estimate(&mut self, _frame: &Frame) -> VisionResult<LandmarkFrame> {
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(LandmarkFrame::empty()))
    }
}

#[derive(Default)]
struct RecordingSink {
    payloads: Mutex<Vec<AlertPayload>>,
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, payload: &AlertPayload) -> WorkerResult<()> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_monitor_delivers_transitions() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = Arc::new(AlertDispatcher::new(
        sink.clone(),
        &DispatchConfig::default(),
        Handle::current(),
    ));

    let script = VecDeque::from(vec![
        Ok(LandmarkFrame::empty()),
        Err(VisionError::landmarks("sidecar timed out")),
        Ok(person(body(90.0))),
        Ok(person(body(10.0))),
    ]);
    let mut clock = NOW - 10.0;
    let monitor = Monitor::new(
        Box::new(ScriptedFrames { remaining: 4 }),
        Box::new(ScriptedLandmarks { script }),
        processor(),
        Arc::clone(&dispatcher),
        false,
    )
    .with_clock(move || {
        clock += 10.0;
        clock
    });

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let summary = monitor.run(shutdown_rx).unwrap();
    assert_eq!(summary.frames_processed, 3);
    assert_eq!(summary.frames_skipped, 1);
    assert_eq!(summary.alerts_emitted, 3);
    assert_eq!(summary.alerts_dropped, 0);

    assert!(dispatcher.wait_idle(Duration::from_secs(10)).await);
    let payloads = sink.payloads.lock().unwrap();
    let mut delivered: Vec<(f64, AlertLevel)> =
        payloads.iter().map(|p| (p.timestamp, p.status)).collect();
    delivered.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert_eq!(
        delivered,
        vec![
            (NOW, AlertLevel::Normal),
            (NOW + 10.0, AlertLevel::Yellow),
            (NOW + 20.0, AlertLevel::Red),
        ]
    );
    assert!(payloads.iter().all(|p| !p.image_base64.is_empty()));
}

#[tokio::test]
async fn test_monitor_mirrors_frames() {
    struct AssertMirrored;

    impl LandmarkSource for AssertMirrored {
        fn estimate(&mut self, frame: &Frame) -> VisionResult<LandmarkFrame> {
            // The source paints its left column; mirrored, it lands on the right.
            let right = frame.image().get_pixel(frame.width() - 1, 0);
            if right != &Rgb([255, 0, 0]) {
                return Err(VisionError::invalid_frame("frame was not mirrored"));
            }
            Ok(LandmarkFrame::empty())
        }
    }

    struct LeftMarked {
        sent: bool,
    }

    impl FrameSource for LeftMarked {
        fn next_frame(&mut self) -> VisionResult<Option<Frame>> {
            if self.sent {
                return Ok(None);
            }
            self.sent = true;
            let mut image = RgbImage::from_pixel(16, 8, Rgb([0, 0, 0]));
            for y in 0..8 {
                image.put_pixel(0, y, Rgb([255, 0, 0]));
            }
            Ok(Some(Frame::new(image)))
        }

        fn name(&self) -> &str {
            "left-marked"
        }
    }

    let dispatcher = Arc::new(AlertDispatcher::new(
        Arc::new(RecordingSink::default()),
        &DispatchConfig::default(),
        Handle::current(),
    ));
    let monitor = Monitor::new(
        Box::new(LeftMarked { sent: false }),
        Box::new(AssertMirrored),
        processor(),
        Arc::clone(&dispatcher),
        true,
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let summary = monitor.run(shutdown_rx).unwrap();
    assert_eq!(summary.frames_processed, 1);
    assert_eq!(summary.frames_skipped, 0);
    assert!(dispatcher.wait_idle(Duration::from_secs(10)).await);
}

/// Delivers one frame, then reports the device as gone.
struct DisconnectingCamera {
    frames: usize,
}

impl FrameSource for DisconnectingCamera {
    fn next_frame(&mut self) -> VisionResult<Option<Frame>> {
        if self.frames == 0 {
            return Err(VisionError::capture("device disconnected"));
        }
        self.frames -= 1;
        Ok(Some(scene(true)))
    }

    fn name(&self) -> &str {
        "disconnecting"
    }
}

/// Records payloads only after a delay.
struct SlowSink {
    delay: Duration,
    payloads: Mutex<Vec<AlertPayload>>,
}

#[async_trait]
impl AlertSink for SlowSink {
    async fn send(&self, payload: &AlertPayload) -> WorkerResult<()> {
        tokio::time::sleep(self.delay).await;
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_alert_before_source_failure_is_delivered() {
    let sink = Arc::new(SlowSink {
        delay: Duration::from_millis(300),
        payloads: Mutex::new(Vec::new()),
    });
    let dispatcher = Arc::new(AlertDispatcher::new(
        sink.clone(),
        &DispatchConfig::default(),
        Handle::current(),
    ));
    let monitor = Monitor::new(
        Box::new(DisconnectingCamera { frames: 1 }),
        Box::new(ScriptedLandmarks {
            script: VecDeque::from(vec![Ok(person(body(10.0)))]),
        }),
        processor(),
        Arc::clone(&dispatcher),
        false,
    )
    .with_clock(|| NOW);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let result = monitor
        .run_to_completion(shutdown_rx, Duration::from_secs(5))
        .await;
    assert!(matches!(result, Err(WorkerError::Vision(_))), "{result:?}");

    // Delivered before the error came back, with no extra waiting here.
    assert_eq!(dispatcher.in_flight(), 0);
    let payloads = sink.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].status, AlertLevel::Red);
    assert_eq!(payloads[0].message, MSG_FALL);
    assert_eq!(payloads[0].timestamp, NOW);
}
