//! Persisted reference embeddings.
//!
//! An artifact is a named byte blob holding one encoded vector. [`ArtifactSource`]
//! abstracts where artifacts live; [`DirectorySource`] reads the `.npy` files written by
//! the offline embedding job, [`MemorySource`] holds them in memory.

pub mod npy;


pub use npy::{NpyError, decode_npy, encode_npy};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::ARTIFACT_EXTENSION;
use crate::store::StoreError;

/// One persisted reference embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Source image name (artifact extension removed), e.g. `tower.01.jpg`.
    pub name: String,
    /// Encoded vector bytes.
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Anything producing the full set of reference artifacts.
///
/// Called off the async runtime (from a blocking task); implementations may block.
pub trait ArtifactSource: Send + Sync {
    fn artifacts(&self) -> Result<Vec<Artifact>, StoreError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// Directory of `{image_name}.npy` files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    path: PathBuf,
}

impl DirectorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_artifact(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
    }
}

impl ArtifactSource for DirectorySource {
    fn artifacts(&self) -> Result<Vec<Artifact>, StoreError> {
        let entries = std::fs::read_dir(&self.path).map_err(|e| StoreError::SourceUnavailable {
            location: self.describe(),
            source: e,
        })?;

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::SourceUnavailable {
                location: self.describe(),
                source: e,
            })?;
            let path = entry.path();

            if !path.is_file() || !Self::is_artifact(&path) {
                debug!(path = %path.display(), "Skipping non-artifact entry");
                continue;
            }

            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| StoreError::CorruptArtifact {
                    name: path.display().to_string(),
                    reason: "file name is not valid UTF-8".to_string(),
                })?
                .to_string();

            let bytes = std::fs::read(&path).map_err(|e| StoreError::CorruptArtifact {
                name: name.clone(),
                reason: format!("unreadable: {}", e),
            })?;

            artifacts.push(Artifact { name, bytes });
        }

        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory artifact set.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    artifacts: Vec<Artifact>,
}

impl MemorySource {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self { artifacts }
    }

    /// Adds an artifact encoding `values` as `.npy`.
    pub fn with_vector(mut self, name: impl Into<String>, values: &[f32]) -> Self {
        self.artifacts.push(Artifact::new(name, encode_npy(values)));
        self
    }

    pub fn push(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactSource for MemorySource {
    fn artifacts(&self) -> Result<Vec<Artifact>, StoreError> {
        Ok(self.artifacts.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} artifacts)", self.artifacts.len())
    }
}
