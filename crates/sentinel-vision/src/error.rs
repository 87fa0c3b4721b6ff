//! Error types for perception operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for perception operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while acquiring or analysing frames.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    #[error("Landmark estimation failed: {0}")]
    Landmarks(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl VisionError {
    /// Create an image processing error.
    pub fn image_processing(message: impl Into<String>) -> Self {
        Self::ImageProcessing(message.into())
    }

    /// Create an invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame(message.into())
    }

    /// Create a capture error.
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a landmark estimation error.
    pub fn landmarks(message: impl Into<String>) -> Self {
        Self::Landmarks(message.into())
    }
}
