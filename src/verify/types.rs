use serde::Serialize;

use crate::embedding::EmbeddingVector;

/// One verification request after embedding.
#[derive(Debug, Clone)]
pub struct VerificationQuery {
    pub target_landmark: String,
    pub query_vector: EmbeddingVector,
}

impl VerificationQuery {
    pub fn new(target_landmark: impl Into<String>, query_vector: EmbeddingVector) -> Self {
        Self {
            target_landmark: target_landmark.into(),
            query_vector,
        }
    }
}

/// Similarity of the query to one reference image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredReference {
    pub source_name: String,
    pub similarity: f32,
}

impl ScoredReference {
    /// Returns `true` if `similarity` reaches `threshold` (inclusive).
    pub fn meets_threshold(&self, threshold: f32) -> bool {
        self.similarity >= threshold
    }
}

/// Outcome of a successful verification.
///
/// `matched = false` is a valid answer, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    /// Case-folded landmark id the query was checked against.
    pub landmark_id: String,
    pub matched: bool,
    /// References with similarity at or above the threshold.
    pub match_count: usize,
    /// Every reference, by similarity descending then source name ascending.
    pub scored: Vec<ScoredReference>,
}

impl VerificationResult {
    /// Highest similarity observed.
    pub fn top_score(&self) -> Option<f32> {
        self.scored.first().map(|s| s.similarity)
    }

    /// Returns a short status string.
    pub fn debug_status(&self) -> &'static str {
        if self.matched { "MATCHED" } else { "NOT_MATCHED" }
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}/{} references",
            self.debug_status(),
            self.landmark_id,
            self.match_count,
            self.scored.len()
        )?;
        if let Some(top) = self.top_score() {
            write!(f, ", top_score: {:.4}", top)?;
        }
        write!(f, ")")
    }
}
