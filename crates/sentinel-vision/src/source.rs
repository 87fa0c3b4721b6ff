//! Frame and landmark source seams.
//!
//! Both traits are synchronous: the monitor loop pulls one frame at a time
//! and blocks on each call.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sentinel_models::LandmarkFrame;
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

/// Anything that produces video frames.
pub trait FrameSource: Send {
    /// Next frame; `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> VisionResult<Option<Frame>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// External body/face landmark estimator.
pub trait LandmarkSource: Send {
    fn estimate(&mut self, frame: &Frame) -> VisionResult<LandmarkFrame>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> VisionResult<Option<Frame>> {
        (**self).next_frame()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: LandmarkSource + ?Sized> LandmarkSource for Box<T> {
    fn estimate(&mut self, frame: &Frame) -> VisionResult<LandmarkFrame> {
        (**self).estimate(frame)
    }
}

/// Camera index or stream URL for a live capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Camera(i32),
    Url(String),
}

impl CaptureTarget {
    /// Integers are camera indices; anything else is a URL or file path.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.parse::<i32>() {
            Ok(index) => Self::Camera(index),
            Err(_) => Self::Url(value.to_string()),
        }
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, Self::Camera(_))
    }
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera(index) => write!(f, "camera:{index}"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Live capture settings.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub target: CaptureTarget,
    pub width: u32,
    pub height: u32,
    /// Pause before reopening a failed capture
    pub reconnect_delay: Duration,
    /// Consecutive reconnects before giving up; `None` retries forever
    pub max_reconnects: Option<u32>,
}

impl CaptureSettings {
    /// Defaults: 640x480, 2 s reconnect delay, no reconnects for local
    /// cameras and unlimited reconnects for streams.
    pub fn new(target: CaptureTarget) -> Self {
        let max_reconnects = if target.is_camera() { Some(0) } else { None };
        Self {
            target,
            width: 640,
            height: 480,
            reconnect_delay: Duration::from_secs(2),
            max_reconnects,
        }
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays still images from a directory in lexicographic order.
pub struct ImageSequenceSource {
    name: String,
    files: Vec<PathBuf>,
    position: usize,
    looping: bool,
}

impl ImageSequenceSource {
    /// List the images in `dir`. Non-image files are ignored.
    pub fn open(dir: impl AsRef<Path>, looping: bool) -> VisionResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(VisionError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();

        info!(dir = %dir.display(), count = files.len(), looping, "Opened image sequence");
        Ok(Self {
            name: format!("images:{}", dir.display()),
            files,
            position: 0,
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> VisionResult<Option<Frame>> {
        if self.position >= self.files.len() {
            if !self.looping || self.files.is_empty() {
                return Ok(None);
            }
            self.position = 0;
        }
        let path = &self.files[self.position];
        self.position += 1;
        debug!(path = %path.display(), "Loading frame");
        let image = image::open(path)?.to_rgb8();
        Ok(Some(Frame::new(image)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
