//! Reference embedding store.
//!
//! A [`ReferenceStore`] maps a landmark id to the reference vectors of that landmark.
//! It is immutable once built; [`StoreHandle`] publishes fresh snapshots atomically.

pub mod error;
pub mod handle;


pub use error::{StoreError, StoreResult};
pub use handle::{ReloadOutcome, StoreHandle};

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::artifact::{ArtifactSource, decode_npy};
use crate::constants::LANDMARK_DELIMITER;
use crate::embedding::EmbeddingVector;

/// Derives the landmark id from a source name: the text before the first
/// [`LANDMARK_DELIMITER`], lower-cased.
///
/// ```
/// use landmark::store::landmark_id_from_name;
///
/// assert_eq!(landmark_id_from_name("Eiffel.01.jpg").as_deref(), Some("eiffel"));
/// assert_eq!(landmark_id_from_name(".hidden"), None);
/// ```
pub fn landmark_id_from_name(name: &str) -> Option<String> {
    let prefix = name.split(LANDMARK_DELIMITER).next().unwrap_or_default();
    if prefix.is_empty() {
        None
    } else {
        Some(normalize_landmark_id(prefix))
    }
}

/// Case-folds a landmark id for lookup.
#[inline]
pub fn normalize_landmark_id(id: &str) -> String {
    id.to_lowercase()
}

/// One reference image of a landmark.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub landmark_id: String,
    pub source_name: String,
    pub vector: EmbeddingVector,
}

impl ReferenceEntry {
    /// Builds an entry, deriving `landmark_id` from `source_name`.
    pub fn new(source_name: impl Into<String>, vector: EmbeddingVector) -> StoreResult<Self> {
        let source_name = source_name.into();
        let landmark_id =
            landmark_id_from_name(&source_name).ok_or_else(|| StoreError::CorruptArtifact {
                name: source_name.clone(),
                reason: format!(
                    "name has no landmark prefix before '{}'",
                    LANDMARK_DELIMITER
                ),
            })?;
        Ok(Self {
            landmark_id,
            source_name,
            vector,
        })
    }
}

/// Per-landmark reference counts, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandmarkSummary {
    pub landmark_id: String,
    pub references: usize,
}

/// Immutable landmark → references mapping with a single fixed dimension.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    dimension: usize,
    buckets: HashMap<String, Vec<ReferenceEntry>>,
    fingerprint: [u8; 32],
    generation: u64,
}

impl ReferenceStore {
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            buckets: HashMap::new(),
            fingerprint: *blake3::Hasher::new().finalize().as_bytes(),
            generation: 0,
        }
    }

    /// Reads and decodes every artifact of `source`.
    ///
    /// Any undecodable artifact, dimension mismatch or duplicate name aborts the load
    /// with [`StoreError::CorruptArtifact`]. An empty source yields an empty store.
    pub fn load<S>(source: &S, dimension: usize) -> StoreResult<Self>
    where
        S: ArtifactSource + ?Sized,
    {
        let mut artifacts = source.artifacts()?;
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));

        let mut entries = Vec::with_capacity(artifacts.len());

        for artifact in &artifacts {
            let corrupt = |reason: String| StoreError::CorruptArtifact {
                name: artifact.name.clone(),
                reason,
            };

            let values = decode_npy(&artifact.bytes).map_err(|e| corrupt(e.to_string()))?;
            if values.len() != dimension {
                return Err(corrupt(format!(
                    "dimension {} does not match store dimension {}",
                    values.len(),
                    dimension
                )));
            }
            let vector = EmbeddingVector::from_raw(values).map_err(|e| corrupt(e.to_string()))?;

            entries.push(ReferenceEntry::new(artifact.name.clone(), vector)?);
        }

        let store = Self::from_entries(dimension, entries)?;

        info!(
            source = %source.describe(),
            landmarks = store.landmark_count(),
            references = store.len(),
            dimension,
            "Reference store loaded"
        );

        Ok(store)
    }

    /// Groups already-built entries by landmark.
    pub fn from_entries<I>(dimension: usize, entries: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = ReferenceEntry>,
    {
        let mut buckets: HashMap<String, Vec<ReferenceEntry>> = HashMap::new();

        for entry in entries {
            if entry.vector.dim() != dimension {
                return Err(StoreError::CorruptArtifact {
                    name: entry.source_name,
                    reason: format!(
                        "dimension {} does not match store dimension {}",
                        entry.vector.dim(),
                        dimension
                    ),
                });
            }
            buckets
                .entry(entry.landmark_id.clone())
                .or_default()
                .push(entry);
        }

        for (landmark_id, bucket) in buckets.iter_mut() {
            bucket.sort_by(|a, b| a.source_name.cmp(&b.source_name));
            if let Some(pair) = bucket
                .windows(2)
                .find(|pair| pair[0].source_name == pair[1].source_name)
            {
                return Err(StoreError::CorruptArtifact {
                    name: pair[0].source_name.clone(),
                    reason: format!("duplicate reference for landmark '{}'", landmark_id),
                });
            }
            debug!(landmark = %landmark_id, references = bucket.len(), "Indexed landmark");
        }

        let fingerprint = content_fingerprint(&buckets);
        Ok(Self {
            dimension,
            buckets,
            fingerprint,
            generation: 0,
        })
    }

    /// All references for a landmark (case-insensitive). Empty if unknown.
    pub fn entries_for(&self, landmark_id: &str) -> &[ReferenceEntry] {
        self.buckets
            .get(&normalize_landmark_id(landmark_id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, landmark_id: &str) -> bool {
        !self.entries_for(landmark_id).is_empty()
    }

    /// Landmarks with their reference counts, sorted by id.
    pub fn landmarks(&self) -> Vec<LandmarkSummary> {
        let mut out: Vec<LandmarkSummary> = self
            .buckets
            .iter()
            .map(|(id, bucket)| LandmarkSummary {
                landmark_id: id.clone(),
                references: bucket.len(),
            })
            .collect();
        out.sort_by(|a, b| a.landmark_id.cmp(&b.landmark_id));
        out
    }

    /// Fixed vector dimension of this store.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Total number of references.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn landmark_count(&self) -> usize {
        self.buckets.len()
    }

    /// BLAKE3 digest over every reference's source name and normalized vector.
    ///
    /// Equal for stores holding the same references, however they were built.
    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    /// Publication number assigned by [`StoreHandle`]; 0 until published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}

/// Hashes buckets in landmark order; each bucket is already sorted by source name.
fn content_fingerprint(buckets: &HashMap<String, Vec<ReferenceEntry>>) -> [u8; 32] {
    let mut landmark_ids: Vec<&String> = buckets.keys().collect();
    landmark_ids.sort();

    let mut hasher = blake3::Hasher::new();
    for entry in landmark_ids.into_iter().flat_map(|id| &buckets[id]) {
        hasher.update(&(entry.source_name.len() as u64).to_le_bytes());
        hasher.update(entry.source_name.as_bytes());
        hasher.update(&(entry.vector.dim() as u64).to_le_bytes());
        for value in entry.vector.as_slice() {
            hasher.update(&value.to_le_bytes());
        }
    }
    *hasher.finalize().as_bytes()
}
