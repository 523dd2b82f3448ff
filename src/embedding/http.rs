//! Client for an external image embedding service.
//!
//! The service receives the raw image as the request body and answers with
//! `{"embedding": [f32, ...]}`. Timeouts are applied by the caller.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use super::ImageEmbedder;
use super::error::EmbeddingError;
use super::format::ImageFormat;
use super::vector::EmbeddingVector;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>, dimension: usize) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, dimension)
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            dimension,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageEmbedder for HttpEmbedder {
    async fn embed(&self, image: &[u8]) -> Result<EmbeddingVector, EmbeddingError> {
        if image.is_empty() {
            return Err(EmbeddingError::EmptyImage);
        }
        let format = ImageFormat::detect(image).ok_or(EmbeddingError::UnsupportedFormat)?;

        debug!(
            endpoint = %self.endpoint,
            image_len = image.len(),
            %format,
            "Requesting image embedding"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, format.mime_type())
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::MalformedImage {
                reason: format!("{}: {}", status, body.trim()),
            });
        }
        if !status.is_success() {
            return Err(EmbeddingError::Unavailable {
                reason: format!("embedding service returned {}", status),
            });
        }

        let body: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        if body.embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: body.embedding.len(),
            });
        }

        Ok(EmbeddingVector::from_raw(body.embedding)?)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
