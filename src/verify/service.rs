//! Caller-facing `verify(target_landmark, image_bytes)` boundary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::constants::validate_embedding_dim;
use crate::embedding::{EmbeddingError, ImageEmbedder, ImageFormat};
use crate::store::StoreHandle;

use super::engine::VerificationEngine;
use super::error::VerifyError;
use super::types::{VerificationQuery, VerificationResult};

/// Embeds an uploaded image and runs the engine against the active store snapshot.
#[derive(Clone)]
pub struct LandmarkVerifier {
    embedder: Arc<dyn ImageEmbedder>,
    store: StoreHandle,
    engine: VerificationEngine,
    embed_timeout: Duration,
}

impl std::fmt::Debug for LandmarkVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandmarkVerifier")
            .field("embedder_stub", &self.embedder.is_stub())
            .field("store", &self.store)
            .field("engine", &self.engine)
            .field("embed_timeout", &self.embed_timeout)
            .finish()
    }
}

impl LandmarkVerifier {
    pub fn new(
        embedder: Arc<dyn ImageEmbedder>,
        store: StoreHandle,
        engine: VerificationEngine,
        embed_timeout: Duration,
    ) -> Self {
        if let Err(e) = validate_embedding_dim(embedder.dimension(), store.dimension()) {
            warn!(
                error = %e,
                embedder_dim = embedder.dimension(),
                store_dim = store.dimension(),
                "Embedder dimension is incompatible with the reference store; every verification will fail"
            );
        }
        Self {
            embedder,
            store,
            engine,
            embed_timeout,
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn engine(&self) -> &VerificationEngine {
        &self.engine
    }

    pub fn is_embedder_stub(&self) -> bool {
        self.embedder.is_stub()
    }

    /// Verifies that `image` depicts `target_landmark`.
    ///
    /// The whole request runs against one store snapshot. Unknown landmarks are
    /// rejected before the embedding call.
    #[instrument(skip(self, image), fields(image_len = image.len()))]
    pub async fn verify(
        &self,
        target_landmark: &str,
        image: &[u8],
    ) -> Result<VerificationResult, VerifyError> {
        let snapshot = self.store.snapshot();

        if !snapshot.contains(target_landmark) {
            return Err(VerifyError::UnknownLandmark {
                landmark: target_landmark.to_string(),
            });
        }

        if image.is_empty() {
            return Err(EmbeddingError::EmptyImage.into());
        }
        let format = ImageFormat::detect(image).ok_or(EmbeddingError::UnsupportedFormat)?;
        debug!(%format, "Embedding query image");

        let query_vector = tokio::time::timeout(self.embed_timeout, self.embedder.embed(image))
            .await
            .map_err(|_| EmbeddingError::Timeout {
                timeout_ms: self.embed_timeout.as_millis() as u64,
            })??;

        let query = VerificationQuery::new(target_landmark, query_vector);
        self.engine.verify(&query, &snapshot)
    }
}
