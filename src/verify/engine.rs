use tracing::{debug, info};

use crate::artifact::ArtifactSource;
use crate::embedding::EmbeddingError;
use crate::store::{ReferenceStore, normalize_landmark_id};

use super::config::EngineConfig;
use super::error::VerifyError;
use super::types::{ScoredReference, VerificationQuery, VerificationResult};

/// Threshold-and-quorum decision over a landmark's full reference set.
///
/// Stateless: a pure function of the query, the store snapshot and the config.
#[derive(Debug, Clone, Default)]
pub struct VerificationEngine {
    config: EngineConfig,
}

impl VerificationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn verify(
        &self,
        query: &VerificationQuery,
        store: &ReferenceStore,
    ) -> Result<VerificationResult, VerifyError> {
        let references = store.entries_for(&query.target_landmark);
        if references.is_empty() {
            debug!(landmark = %query.target_landmark, "No references for landmark");
            return Err(VerifyError::UnknownLandmark {
                landmark: query.target_landmark.clone(),
            });
        }

        if query.query_vector.dim() != store.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: store.dimension(),
                actual: query.query_vector.dim(),
            }
            .into());
        }

        let mut scored: Vec<ScoredReference> = references
            .iter()
            .map(|entry| ScoredReference {
                source_name: entry.source_name.clone(),
                similarity: query.query_vector.dot(&entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.source_name.cmp(&b.source_name))
        });

        let threshold = self.config.similarity_threshold();
        let match_count = scored
            .iter()
            .filter(|s| s.meets_threshold(threshold))
            .count();
        let matched = match_count >= self.config.min_match_count();

        let result = VerificationResult {
            landmark_id: normalize_landmark_id(&query.target_landmark),
            matched,
            match_count,
            scored,
        };

        info!(
            landmark = %result.landmark_id,
            matched,
            match_count,
            references = result.scored.len(),
            top_score = result.top_score().unwrap_or_default(),
            threshold,
            min_match_count = self.config.min_match_count(),
            "Verification decided"
        );

        Ok(result)
    }

    /// Builds a fresh store from `source` and verifies against it.
    ///
    /// Surfaces [`StoreError::CorruptArtifact`](crate::store::StoreError::CorruptArtifact)
    /// when the artifact set is unusable.
    pub fn verify_with_source<S>(
        &self,
        query: &VerificationQuery,
        source: &S,
        dimension: usize,
    ) -> Result<VerificationResult, VerifyError>
    where
        S: ArtifactSource + ?Sized,
    {
        let store = ReferenceStore::load(source, dimension)?;
        self.verify(query, &store)
    }
}
