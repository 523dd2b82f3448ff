//! Embedding vectors and the image embedder collaborator.
//!
//! The model that maps an image to a vector lives outside this crate. [`ImageEmbedder`]
//! is the seam: [`HttpEmbedder`] calls an external embedding service, [`StubEmbedder`]
//! produces deterministic vectors for local runs and tests.

mod error;
pub mod format;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stub;
pub mod vector;


pub use error::EmbeddingError;
pub use format::ImageFormat;
pub use http::HttpEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use stub::StubEmbedder;
pub use vector::{EmbeddingVector, VectorError};

use async_trait::async_trait;

/// External `embed(image_bytes) -> EmbeddingVector` call.
///
/// Implementations must return unit-norm vectors of [`dimension`](Self::dimension)
/// components. The caller bounds each call with a timeout and may drop the future.
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    async fn embed(&self, image: &[u8]) -> Result<EmbeddingVector, EmbeddingError>;

    fn dimension(&self) -> usize;

    /// Returns `true` if the embedder produces synthetic vectors.
    fn is_stub(&self) -> bool {
        false
    }
}
