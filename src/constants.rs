//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! Every vector in one [`ReferenceStore`](crate::store::ReferenceStore) shares a single
//! dimension, and query vectors must match it. [`DEFAULT_EMBEDDING_DIM`] is the CLIP
//! ViT-L/14 image feature width; deployments with another model override it through
//! `LANDMARK_EMBEDDING_DIM`. Use [`validate_embedding_dim`] at module boundaries.

use thiserror::Error;

pub const DEFAULT_EMBEDDING_DIM: usize = 768;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.80;

pub const DEFAULT_MIN_MATCH_COUNT: usize = 3;

/// Reference file names encode the landmark as the text before this character.
pub const LANDMARK_DELIMITER: char = '.';

/// File extension of persisted reference embeddings.
pub const ARTIFACT_EXTENSION: &str = "npy";

pub const DEFAULT_EMBED_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// A vector width that cannot be used where a store dimension is expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimValidationError {
    #[error("embedding dimension must be positive")]
    ZeroDimension,

    #[error("expected {expected}-dimensional embeddings, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Checks a runtime width (`actual`) against the configured one (`expected`).
///
/// ```
/// use landmark::constants::{DEFAULT_EMBEDDING_DIM, validate_embedding_dim};
///
/// assert!(validate_embedding_dim(768, DEFAULT_EMBEDDING_DIM).is_ok());
/// assert!(validate_embedding_dim(512, DEFAULT_EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    match (expected, actual) {
        (0, _) => Err(DimValidationError::ZeroDimension),
        (e, a) if e != a => Err(DimValidationError::DimensionMismatch {
            expected: e,
            actual: a,
        }),
        _ => Ok(()),
    }
}
