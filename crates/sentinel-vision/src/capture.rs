//! Live capture through OpenCV `VideoCapture`.

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::{imgproc, videoio};
use tracing::{info, warn};

use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;
use crate::source::{CaptureSettings, CaptureTarget, FrameSource};

/// Camera or network stream source with reconnect on read failure.
pub struct CaptureSource {
    settings: CaptureSettings,
    name: String,
    capture: videoio::VideoCapture,
    failures: u32,
}

impl CaptureSource {
    pub fn open(settings: CaptureSettings) -> VisionResult<Self> {
        let capture = open_capture(&settings)?;
        let name = settings.target.to_string();
        Ok(Self {
            settings,
            name,
            capture,
            failures: 0,
        })
    }

    fn read_once(&mut self) -> VisionResult<Option<Frame>> {
        let mut bgr = Mat::default();
        if !self.capture.read(&mut bgr)? || bgr.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb.data_bytes()?.to_vec();
        Frame::from_raw(width, height, data).map(Some)
    }

    fn reconnect(&mut self) -> VisionResult<()> {
        self.failures += 1;
        if let Some(max) = self.settings.max_reconnects {
            if self.failures > max {
                return Err(VisionError::capture(format!(
                    "{} stopped delivering frames after {} reconnect attempts",
                    self.name, max
                )));
            }
        }

        warn!(
            source = %self.name,
            attempt = self.failures,
            delay_secs = self.settings.reconnect_delay.as_secs_f64(),
            "Frame read failed, reconnecting"
        );
        std::thread::sleep(self.settings.reconnect_delay);
        let _ = self.capture.release();
        match open_capture(&self.settings) {
            Ok(capture) => self.capture = capture,
            Err(e) => warn!(source = %self.name, error = %e, "Reconnect failed"),
        }
        Ok(())
    }
}

fn open_capture(settings: &CaptureSettings) -> VisionResult<videoio::VideoCapture> {
    let mut capture = match &settings.target {
        CaptureTarget::Camera(index) => videoio::VideoCapture::new(*index, videoio::CAP_ANY)?,
        CaptureTarget::Url(url) => videoio::VideoCapture::from_file(url, videoio::CAP_ANY)?,
    };
    if !capture.is_opened()? {
        return Err(VisionError::capture(format!(
            "could not open {}",
            settings.target
        )));
    }
    capture.set(videoio::CAP_PROP_FRAME_WIDTH, settings.width as f64)?;
    capture.set(videoio::CAP_PROP_FRAME_HEIGHT, settings.height as f64)?;
    info!(
        source = %settings.target,
        width = settings.width,
        height = settings.height,
        "Capture opened"
    );
    Ok(capture)
}

impl FrameSource for CaptureSource {
    fn next_frame(&mut self) -> VisionResult<Option<Frame>> {
        loop {
            match self.read_once() {
                Ok(Some(frame)) => {
                    self.failures = 0;
                    return Ok(Some(frame));
                }
                Ok(None) => self.reconnect()?,
                Err(e) => {
                    warn!(source = %self.name, error = %e, "Frame read error");
                    self.reconnect()?;
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
