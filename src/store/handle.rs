//! Atomically swappable reference store.
//!
//! Readers take an `Arc<ReferenceStore>` snapshot per request. A reload builds the next
//! store on a blocking thread and publishes it with a single pointer swap, so a reader
//! never observes a partially built store.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::ReferenceStore;
use super::error::{StoreError, StoreResult};
use crate::artifact::ArtifactSource;

/// Result of a reload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReloadOutcome {
    /// Artifacts are byte-identical to the active snapshot; nothing was swapped.
    Unchanged { generation: u64 },
    /// A new snapshot is active.
    Swapped {
        generation: u64,
        landmarks: usize,
        references: usize,
    },
}

impl ReloadOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Unchanged { generation } | Self::Swapped { generation, .. } => *generation,
        }
    }
}

/// Shared handle to the active [`ReferenceStore`] snapshot.
#[derive(Clone)]
pub struct StoreHandle {
    active: Arc<ArcSwap<ReferenceStore>>,
    source: Arc<dyn ArtifactSource>,
    dimension: usize,
    reload_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("source", &self.source.describe())
            .field("dimension", &self.dimension)
            .field("generation", &self.generation())
            .finish()
    }
}

impl StoreHandle {
    /// Performs the initial load. Errors are fatal to the caller.
    pub async fn load(source: Arc<dyn ArtifactSource>, dimension: usize) -> StoreResult<Self> {
        let store = Self::build(Arc::clone(&source), dimension).await?;
        Ok(Self::from_store(source, store))
    }

    /// Wraps an already built store (generation 1).
    pub fn from_store(source: Arc<dyn ArtifactSource>, store: ReferenceStore) -> Self {
        Self {
            dimension: store.dimension(),
            active: Arc::new(ArcSwap::from_pointee(store.with_generation(1))),
            source,
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the active snapshot. Hold it for the duration of one request.
    ///
    /// The snapshot carries its own [`generation`](ReferenceStore::generation).
    #[inline]
    pub fn snapshot(&self) -> Arc<ReferenceStore> {
        self.active.load_full()
    }

    /// Generation of the active snapshot (starts at 1).
    pub fn generation(&self) -> u64 {
        self.active.load().generation()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Rebuilds the store from the artifact source and publishes it.
    ///
    /// Concurrent reloads are serialized. On error the active snapshot is untouched.
    pub async fn reload(&self) -> StoreResult<ReloadOutcome> {
        let _guard = self.reload_lock.lock().await;

        let next = Self::build(Arc::clone(&self.source), self.dimension).await?;

        let current = self.active.load_full();
        if current.fingerprint() == next.fingerprint() {
            let generation = current.generation();
            debug!(generation, "Reference artifacts unchanged; keeping snapshot");
            return Ok(ReloadOutcome::Unchanged { generation });
        }

        let landmarks = next.landmark_count();
        let references = next.len();
        let generation = current.generation() + 1;

        self.active.store(Arc::new(next.with_generation(generation)));

        info!(
            generation,
            landmarks, references, "Published new reference store snapshot"
        );

        Ok(ReloadOutcome::Swapped {
            generation,
            landmarks,
            references,
        })
    }

    /// Starts a background task reloading every `interval`.
    ///
    /// Failed reloads are logged and the previous snapshot stays active.
    pub fn spawn_reload_task(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let handle = self.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; the initial load already happened.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match handle.reload().await {
                    Ok(outcome) => debug!(?outcome, "Periodic reference reload"),
                    Err(e) => warn!(
                        error = %e,
                        generation = handle.generation(),
                        "Periodic reference reload failed; keeping previous snapshot"
                    ),
                }
            }
        })
    }

    async fn build(
        source: Arc<dyn ArtifactSource>,
        dimension: usize,
    ) -> StoreResult<ReferenceStore> {
        tokio::task::spawn_blocking(move || ReferenceStore::load(source.as_ref(), dimension))
            .await
            .map_err(|e| StoreError::LoadTaskFailed {
                reason: e.to_string(),
            })?
    }
}
