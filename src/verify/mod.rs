//! Landmark verification.
//!
//! [`VerificationEngine`] scores a query vector against every reference of the target
//! landmark and applies the quorum rule: a match needs at least `min_match_count`
//! references with cosine similarity `>= similarity_threshold`, counted over the full
//! reference set rather than a top-k window.
//!
//! [`LandmarkVerifier`] wraps the engine with the embedding call and the swappable
//! store, and is what callers (the HTTP gateway) use.

pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod types;


pub use config::EngineConfig;
pub use engine::VerificationEngine;
pub use error::VerifyError;
pub use service::LandmarkVerifier;
pub use types::{ScoredReference, VerificationQuery, VerificationResult};
