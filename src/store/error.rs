use thiserror::Error;

/// Errors raised while materializing a reference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A reference artifact is unreadable, undecodable or dimensionally inconsistent.
    /// Aborts the whole load.
    #[error("corrupt reference artifact '{name}': {reason}")]
    CorruptArtifact { name: String, reason: String },

    /// The artifact source itself could not be listed.
    #[error("artifact source '{location}' unavailable: {source}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The background load task died before producing a store.
    #[error("store load task failed: {reason}")]
    LoadTaskFailed { reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
