//! Error types for model construction and parsing.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or decoding shared models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid landmark count: expected {expected}, got {actual}")]
    InvalidLandmarkCount { expected: usize, actual: usize },
}

impl ModelError {
    /// Create an invalid landmark count error.
    pub fn invalid_landmark_count(expected: usize, actual: usize) -> Self {
        Self::InvalidLandmarkCount { expected, actual }
    }
}
