use async_trait::async_trait;
use tracing::{debug, warn};

use super::ImageEmbedder;
use super::error::EmbeddingError;
use super::format::ImageFormat;
use super::vector::EmbeddingVector;

/// Deterministic embedder for runs without a model service.
///
/// Identical image bytes always produce the identical vector; different bytes produce
/// near-orthogonal vectors. Useless for real verification.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        warn!(dimension, "Image embedder running in STUB mode (testing only)");
        Self { dimension }
    }

    /// Computes the stub vector synchronously.
    pub fn embed_sync(&self, image: &[u8]) -> Result<EmbeddingVector, EmbeddingError> {
        if image.is_empty() {
            return Err(EmbeddingError::EmptyImage);
        }
        let format = ImageFormat::detect(image).ok_or(EmbeddingError::UnsupportedFormat)?;

        debug!(image_len = image.len(), %format, "Generating stub embedding");

        let hash = blake3::hash(image);
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&hash.as_bytes()[..8]);
        let mut state = u64::from_le_bytes(seed);

        let mut values = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            values.push(value);
        }

        Ok(EmbeddingVector::from_raw(values)?)
    }
}

#[async_trait]
impl ImageEmbedder for StubEmbedder {
    async fn embed(&self, image: &[u8]) -> Result<EmbeddingVector, EmbeddingError> {
        self.embed_sync(image)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_stub(&self) -> bool {
        true
    }
}
