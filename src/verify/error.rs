use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;

/// Failures of one verification request.
///
/// "No reference data", "could not embed" and "store unusable" are distinct variants;
/// an insufficient match is not an error at all.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no reference data for landmark '{landmark}'")]
    UnknownLandmark { landmark: String },

    #[error("embedding failed: {0}")]
    EmbeddingFailed(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VerifyError {
    /// Stable machine-readable label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownLandmark { .. } => "unknown_landmark",
            Self::EmbeddingFailed(_) => "embedding_failed",
            Self::Store(StoreError::CorruptArtifact { .. }) => "corrupt_artifact",
            Self::Store(_) => "store_error",
        }
    }
}
