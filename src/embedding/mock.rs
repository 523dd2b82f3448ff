use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::ImageEmbedder;
use super::error::EmbeddingError;
use super::vector::EmbeddingVector;

#[derive(Debug, Clone)]
enum MockBehavior {
    Return(EmbeddingVector),
    Unavailable(String),
    Hang,
}

/// Embedder returning a preset vector (or failure) regardless of the image.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    behavior: MockBehavior,
    dimension: usize,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    pub fn returning(vector: EmbeddingVector) -> Self {
        Self {
            dimension: vector.dim(),
            behavior: MockBehavior::Return(vector),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable(dimension: usize, reason: &str) -> Self {
        Self {
            behavior: MockBehavior::Unavailable(reason.to_string()),
            dimension,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Never completes; exercises caller timeouts.
    pub fn hanging(dimension: usize) -> Self {
        Self {
            behavior: MockBehavior::Hang,
            dimension,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageEmbedder for MockEmbedder {
    async fn embed(&self, _image: &[u8]) -> Result<EmbeddingVector, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Return(vector) => Ok(vector.clone()),
            MockBehavior::Unavailable(reason) => Err(EmbeddingError::Unavailable {
                reason: reason.clone(),
            }),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(EmbeddingError::Unavailable {
                    reason: "mock hang elapsed".to_string(),
                })
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
