//! Landmark photo verification library (used by the server and integration tests).
//!
//! A photo claimed to show a landmark is embedded into a unit vector and compared by
//! cosine similarity against that landmark's reference embeddings. The claim is accepted
//! when at least `min_match_count` references score at or above `similarity_threshold`.
//!
//! ## Modules
//! - [`artifact`] - `.npy` reference artifacts and where they are read from
//! - [`store`] - [`ReferenceStore`] grouped by landmark, swapped atomically via [`StoreHandle`]
//! - [`embedding`] - [`EmbeddingVector`] and the [`ImageEmbedder`] seam
//! - [`verify`] - [`VerificationEngine`] (threshold and quorum) and [`LandmarkVerifier`]
//! - [`gateway`] - Axum HTTP surface
//! - [`config`] - `LANDMARK_*` environment configuration
//!
//! ## Test/Mock Support
//! [`MockEmbedder`](embedding::MockEmbedder) is available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod artifact;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod store;
pub mod verify;

pub use artifact::{Artifact, ArtifactSource, DirectorySource, MemorySource, NpyError};
pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use embedding::{
    EmbeddingError, EmbeddingVector, HttpEmbedder, ImageEmbedder, ImageFormat, StubEmbedder,
    VectorError,
};
pub use store::{
    LandmarkSummary, ReferenceEntry, ReferenceStore, ReloadOutcome, StoreError, StoreHandle,
};
pub use verify::{
    EngineConfig, LandmarkVerifier, ScoredReference, VerificationEngine, VerificationQuery,
    VerificationResult, VerifyError,
};
