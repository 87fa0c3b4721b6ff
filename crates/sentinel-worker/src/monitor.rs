//! Frame loop.
//!
//! Pulls frames one at a time, asks the landmark source about each, runs the
//! frame processor, and hands alerts to the dispatcher. The loop is
//! synchronous; the binary runs it on Tokio's blocking pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sentinel_vision::{FrameSource, ImageSequenceSource, LandmarkSource};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::SourceConfig;
use crate::dispatcher::{AlertDispatcher, DispatchOutcome};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::SessionLogger;
use crate::metrics;
use crate::processor::FrameProcessor;

const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Counters for one monitor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub frames_processed: u64,
    /// Frames dropped because landmark estimation failed
    pub frames_skipped: u64,
    /// Alerts handed to a delivery task
    pub alerts_emitted: u64,
    /// Alerts discarded because every dispatch slot was busy
    pub alerts_dropped: u64,
}

/// Seconds since the Unix epoch.
pub fn wall_clock() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// The monitoring session.
pub struct Monitor {
    frames: Box<dyn FrameSource>,
    landmarks: Box<dyn LandmarkSource>,
    processor: FrameProcessor,
    dispatcher: Arc<AlertDispatcher>,
    mirror: bool,
    clock: Box<dyn FnMut() -> f64 + Send>,
    logger: SessionLogger,
}

impl Monitor {
    pub fn new(
        frames: Box<dyn FrameSource>,
        landmarks: Box<dyn LandmarkSource>,
        processor: FrameProcessor,
        dispatcher: Arc<AlertDispatcher>,
        mirror: bool,
    ) -> Self {
        let logger = SessionLogger::new(frames.name());
        Self {
            frames,
            landmarks,
            processor,
            dispatcher,
            mirror,
            clock: Box::new(wall_clock),
            logger,
        }
    }

    /// Replace the wall clock, e.g. with a scripted one.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: FnMut() -> f64 + Send + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    /// Run until the source is exhausted or `shutdown` turns true.
    ///
    /// A landmark failure skips the frame; a frame source failure ends the
    /// run with an error.
    pub fn run(mut self, shutdown: watch::Receiver<bool>) -> WorkerResult<MonitorSummary> {
        let span = self.logger.create_span();
        let _guard = span.enter();
        self.logger.log_start(&format!("mirror={}", self.mirror));

        let mut summary = MonitorSummary::default();
        let mut window_start = Instant::now();
        let mut window_frames = 0u32;

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested");
                break;
            }

            let frame = match self.frames.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Frame source exhausted");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Frame source failed");
                    return Err(e.into());
                }
            };
            let frame = if self.mirror { frame.mirrored() } else { frame };

            let landmarks = match self.landmarks.estimate(&frame) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    self.logger.log_warning(&format!("skipping frame: {e}"));
                    metrics::record_frame_skipped("landmarks");
                    summary.frames_skipped += 1;
                    continue;
                }
            };

            let now = (self.clock)();
            let previous = self.processor.session().current_status;
            let outcome = self.processor.process(&frame, &landmarks, now);
            summary.frames_processed += 1;
            metrics::record_frame_processed();

            if outcome.changed {
                self.logger.log_transition(previous, outcome.level, &outcome.message);
                metrics::record_transition(outcome.level);
            }
            if outcome.safe_mode_activated {
                info!(
                    until = ?self.processor.session().safe_mode_until,
                    "Safe mode activated by wave"
                );
            }
            if let Some(event) = outcome.event {
                match self.dispatcher.dispatch(event) {
                    DispatchOutcome::Spawned => summary.alerts_emitted += 1,
                    DispatchOutcome::Dropped => summary.alerts_dropped += 1,
                }
            }

            window_frames += 1;
            let elapsed = window_start.elapsed();
            if elapsed >= FPS_WINDOW {
                let fps = window_frames as f64 / elapsed.as_secs_f64();
                info!(fps, "Monitor throughput");
                metrics::record_fps(fps);
                window_start = Instant::now();
                window_frames = 0;
            }
        }

        self.logger.log_completion(&format!(
            "{} frames processed, {} skipped, {} alerts sent, {} dropped",
            summary.frames_processed,
            summary.frames_skipped,
            summary.alerts_emitted,
            summary.alerts_dropped
        ));
        Ok(summary)
    }

    /// Run the loop on the blocking pool, then give in-flight alerts up to
    /// `drain` to finish. Alerts are drained even when the loop fails.
    pub async fn run_to_completion(
        self,
        shutdown: watch::Receiver<bool>,
        drain: Duration,
    ) -> WorkerResult<MonitorSummary> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let result = tokio::task::spawn_blocking(move || self.run(shutdown)).await;

        if !dispatcher.wait_idle(drain).await {
            warn!(in_flight = dispatcher.in_flight(), "Alerts still in flight at shutdown");
        }

        result.map_err(|e| WorkerError::monitor_failed(format!("Blocking task join error: {e}")))?
    }
}

/// Open the configured frame source: an image directory when one is set,
/// otherwise a live capture.
pub fn open_frame_source(config: &SourceConfig) -> WorkerResult<Box<dyn FrameSource>> {
    if let Some(dir) = &config.image_dir {
        let source = ImageSequenceSource::open(dir, config.loop_images)?;
        if source.is_empty() {
            return Err(WorkerError::config_error(format!(
                "no images found in {}",
                dir.display()
            )));
        }
        return Ok(Box::new(source));
    }
    open_capture(config)
}

#[cfg(feature = "opencv")]
fn open_capture(config: &SourceConfig) -> WorkerResult<Box<dyn FrameSource>> {
    let source = sentinel_vision::CaptureSource::open(config.capture_settings())?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "opencv"))]
fn open_capture(config: &SourceConfig) -> WorkerResult<Box<dyn FrameSource>> {
    Err(WorkerError::config_error(format!(
        "live capture of '{}' needs the `opencv` feature; set SENTINEL_IMAGE_DIR to replay images",
        config.source
    )))
}
