//! RGB frame wrapper shared by every classifier.
//!
//! Classifiers only ever borrow a `Frame`; drawing happens on a clone.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType, RgbImage};

use crate::error::{VisionError, VisionResult};

/// One decoded video frame, 8-bit RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from packed RGB bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> VisionResult<Self> {
        let expected = width as usize * height as usize * 3;
        let actual = data.len();
        RgbImage::from_raw(width, height, data)
            .map(Self::new)
            .ok_or_else(|| {
                VisionError::invalid_frame(format!(
                    "{width}x{height} RGB needs {expected} bytes, got {actual}"
                ))
            })
    }

    /// Decode an encoded image (PNG, JPEG, BMP) from memory.
    pub fn decode(bytes: &[u8]) -> VisionResult<Self> {
        Ok(Self::new(image::load_from_memory(bytes)?.to_rgb8()))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Horizontally flipped copy (selfie view).
    pub fn mirrored(&self) -> Frame {
        Frame::new(imageops::flip_horizontal(&self.image))
    }

    /// Encode as baseline JPEG.
    pub fn encode_jpeg(&self, quality: u8) -> VisionResult<Vec<u8>> {
        if self.is_empty() {
            return Err(VisionError::encoding("cannot encode an empty frame"));
        }
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .encode(
                self.image.as_raw(),
                self.width(),
                self.height(),
                ColorType::Rgb8,
            )
            .map_err(|e| VisionError::encoding(format!("jpeg: {e}")))?;
        Ok(buf)
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}
