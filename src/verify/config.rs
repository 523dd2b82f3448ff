use crate::config::ConfigError;
use crate::constants::{DEFAULT_MIN_MATCH_COUNT, DEFAULT_SIMILARITY_THRESHOLD};

/// Per-deployment decision parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    similarity_threshold: f32,
    min_match_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_match_count: DEFAULT_MIN_MATCH_COUNT,
        }
    }
}

impl EngineConfig {
    /// `similarity_threshold` must be finite and in [-1, 1]; `min_match_count` at least 1.
    pub fn new(similarity_threshold: f32, min_match_count: usize) -> Result<Self, ConfigError> {
        if !similarity_threshold.is_finite() || !(-1.0..=1.0).contains(&similarity_threshold) {
            return Err(ConfigError::InvalidThreshold {
                value: similarity_threshold,
            });
        }
        if min_match_count == 0 {
            return Err(ConfigError::InvalidMinMatchCount {
                value: min_match_count,
            });
        }
        Ok(Self {
            similarity_threshold,
            min_match_count,
        })
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold
    }

    pub fn min_match_count(&self) -> usize {
        self.min_match_count
    }
}
