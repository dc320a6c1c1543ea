//! Cached board state backed by a snapshot.

use crate::backend::SnapshotBackend;
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::SystemTime;
use syncboard_protocol::ApplicationState;
use tracing::{debug, info, warn};

/// Where the state came from during [`StateStore::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// A stored snapshot was read and decoded.
    Loaded,
    /// No usable snapshot; the seed was installed.
    Seeded,
}

/// The authoritative board state.
///
/// Holds an in-memory copy that is always readable without I/O, and mirrors
/// every change to a [`SnapshotBackend`].
///
/// # Saving
///
/// A save has two halves that callers may run separately:
/// - [`commit`](Self::commit) stamps the state and replaces the cached copy
/// - [`persist`](Self::persist) writes a committed snapshot to the backend
///
/// [`save`](Self::save) does both. A failed write never rolls the cache back,
/// so the cache can be ahead of the backend until the next successful write.
#[derive(Debug)]
pub struct StateStore {
    backend: Arc<dyn SnapshotBackend>,
    seed: ApplicationState,
    cache: RwLock<ApplicationState>,
}

impl StateStore {
    /// Creates a store over `backend`. `seed` is installed whenever no usable
    /// snapshot exists; until [`initialize`](Self::initialize) runs it is also
    /// the cached state.
    pub fn new(backend: Arc<dyn SnapshotBackend>, seed: ApplicationState) -> Self {
        Self {
            backend,
            cache: RwLock::new(seed.clone()),
            seed,
        }
    }

    /// Prepares the storage location and loads the stored snapshot, seeding
    /// and persisting the default state if there is none or it is unreadable.
    ///
    /// The cache holds a usable state whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be prepared (the seed is then
    /// kept in memory only) or if writing the seed fails.
    pub async fn initialize(&self) -> StoreResult<SnapshotSource> {
        if let Err(e) = self.backend.prepare().await {
            self.commit(self.seed.clone());
            return Err(e);
        }

        match self.load().await {
            Ok(state) => {
                info!(
                    location = %self.backend.location(),
                    sections = state.section_list().len(),
                    items = state.item_count(),
                    "loaded state snapshot"
                );
                *self.cache.write() = state;
                return Ok(SnapshotSource::Loaded);
            }
            Err(StoreError::Missing) => {
                info!(location = %self.backend.location(), "no snapshot found, seeding defaults");
            }
            Err(e) => {
                warn!(location = %self.backend.location(), error = %e, "unreadable snapshot, seeding defaults");
            }
        }

        self.save(self.seed.clone()).await?;
        Ok(SnapshotSource::Seeded)
    }

    async fn load(&self) -> StoreResult<ApplicationState> {
        let bytes = self.backend.read().await?.ok_or(StoreError::Missing)?;
        ApplicationState::from_slice(&bytes).map_err(StoreError::Corrupted)
    }

    /// Stamps `state`, makes it the cached state and writes it to the backend.
    ///
    /// Returns the stamped snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the cache keeps the new state.
    pub async fn save(&self, state: ApplicationState) -> StoreResult<ApplicationState> {
        let snapshot = self.commit(state);
        self.persist(&snapshot).await?;
        Ok(snapshot)
    }

    /// Stamps `state` with the current time and replaces the cached state.
    ///
    /// Stamps strictly increase: if the clock has not moved past the previous
    /// stamp, the previous stamp plus one is used.
    pub fn commit(&self, state: ApplicationState) -> ApplicationState {
        let mut cache = self.cache.write();
        let stamp = now_millis().max(cache.last_updated.saturating_add(1));
        let snapshot = state.stamped(stamp);
        *cache = snapshot.clone();
        snapshot
    }

    /// Writes a committed snapshot to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub async fn persist(&self, snapshot: &ApplicationState) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Encode)?;
        self.backend.write(&bytes).await?;
        debug!(
            location = %self.backend.location(),
            last_updated = snapshot.last_updated,
            "state saved"
        );
        Ok(())
    }

    /// Returns the cached state.
    pub fn state(&self) -> ApplicationState {
        self.cache.read().clone()
    }

    /// Stamp of the cached state.
    pub fn last_updated(&self) -> u64 {
        self.cache.read().last_updated
    }

    /// Human-readable backend location, for logs.
    pub fn location(&self) -> String {
        self.backend.location()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
