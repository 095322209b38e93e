//! Error types for marker_vision

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Region extraction error: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisionError {
    pub(crate) fn plane_mismatch(
        expected: (u32, u32, usize),
        actual: (u32, u32, usize),
    ) -> Self {
        VisionError::DimensionMismatch {
            expected: format!("{}x{}x{}", expected.0, expected.1, expected.2),
            actual: format!("{}x{}x{}", actual.0, actual.1, actual.2),
        }
    }
}
