//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// An environment variable held a value of the wrong shape.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Similarity threshold is not a finite number in [-1, 1].
    #[error("similarity threshold {value} must be a finite number in [-1, 1]")]
    InvalidThreshold { value: f32 },

    /// Quorum size must be positive.
    #[error("min match count must be at least 1, got {value}")]
    InvalidMinMatchCount { value: usize },

    /// Embedding dimension must be positive.
    #[error("embedding dimension must be greater than zero")]
    InvalidEmbeddingDim,

    /// Embedding timeout must be positive.
    #[error("embedding timeout must be greater than zero")]
    InvalidTimeout,

    /// Embedder URL is not an http(s) URL.
    #[error("embedder url '{value}' must start with http:// or https://")]
    InvalidEmbedderUrl { value: String },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
