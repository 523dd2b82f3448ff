use thiserror::Error;

use super::vector::VectorError;

/// Failures of the external `embed(image) -> vector` call.
///
/// None of these are retried inside the crate.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("image payload is empty")]
    EmptyImage,

    #[error("unsupported image format (expected jpeg, png, webp, gif or bmp)")]
    UnsupportedFormat,

    #[error("embedding service rejected the image: {reason}")]
    MalformedImage { reason: String },

    #[error("embedding service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("embedding service returned an invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("embedding timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid embedding vector: {0}")]
    InvalidVector(#[from] VectorError),
}

impl EmbeddingError {
    /// Returns `true` when the failure is attributable to the submitted image.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyImage | Self::UnsupportedFormat | Self::MalformedImage { .. }
        )
    }
}
