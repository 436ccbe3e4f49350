//! Generation-scoped cache store used by the interceptor.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tether_backend::{CacheStorage, PurgeReport};
use tether_core::{CacheKey, GenerationId, ResponseSnapshot};
use tracing::{debug, info, warn};

use crate::lifecycle::{LifecycleManager, TaskId};

#[cfg(feature = "metrics")]
use crate::metrics::{CACHE_WRITE_ERRORS, CACHE_WRITES, GENERATIONS_PURGED};

/// Reads and writes response snapshots in the worker's current generation.
///
/// Storage errors never reach the caller: a failed write is logged, a failed
/// read is a miss.
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn CacheStorage>,
    generation: GenerationId,
    lifecycle: LifecycleManager,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Creates a store bound to `generation`.
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        generation: GenerationId,
        lifecycle: LifecycleManager,
    ) -> Self {
        Self {
            storage,
            generation,
            lifecycle,
        }
    }

    /// The current generation.
    pub fn generation(&self) -> &GenerationId {
        &self.generation
    }

    /// The underlying storage.
    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Only exact `200 OK` responses are stored.
    pub fn admits(&self, snapshot: &ResponseSnapshot) -> bool {
        snapshot.status() == StatusCode::OK
    }

    /// Stores `snapshot` under `key` as a lifecycle-extending task.
    ///
    /// Returns `None` without spawning anything when the snapshot is not
    /// admitted.
    pub fn put_in_background(&self, key: CacheKey, snapshot: ResponseSnapshot) -> Option<TaskId> {
        if !self.admits(&snapshot) {
            return None;
        }
        let storage = self.storage.clone();
        let generation = self.generation.clone();
        let task = self.lifecycle.extend("cache_write", async move {
            let result = match storage.open(&generation).await {
                Ok(bucket) => bucket.put(key.clone(), snapshot).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => {
                    debug!(%generation, cache.key = %key, "response cached");
                    #[cfg(feature = "metrics")]
                    metrics::counter!(*CACHE_WRITES).increment(1);
                }
                Err(err) => {
                    warn!(%generation, cache.key = %key, error = %err, "failed to cache response");
                    #[cfg(feature = "metrics")]
                    metrics::counter!(*CACHE_WRITE_ERRORS).increment(1);
                }
            }
        });
        Some(task)
    }

    /// Looks `key` up in the current generation.
    pub async fn lookup(&self, key: &CacheKey) -> Option<ResponseSnapshot> {
        match self.storage.lookup(&self.generation, key).await {
            Ok(found) => found,
            Err(err) => {
                warn!(generation = %self.generation, cache.key = %key, error = %err, "cache lookup failed");
                None
            }
        }
    }

    /// Deletes every generation except the current one.
    ///
    /// Returns `None` when the generations could not be listed.
    pub async fn purge_others(&self) -> Option<PurgeReport> {
        match self.storage.purge_others(&self.generation).await {
            Ok(report) => {
                if !report.is_noop() {
                    info!(
                        current = %self.generation,
                        deleted = report.deleted.len(),
                        failed = report.failed.len(),
                        "stale cache generations purged"
                    );
                }
                #[cfg(feature = "metrics")]
                metrics::counter!(*GENERATIONS_PURGED).increment(report.deleted.len() as u64);
                Some(report)
            }
            Err(err) => {
                warn!(current = %self.generation, error = %err, "failed to list cache generations");
                None
            }
        }
    }
}
