use std::sync::Arc;

use async_trait::async_trait;
use tether_core::{CacheKey, GenerationId, ResponseSnapshot};
use tracing::{debug, warn};

use crate::StorageError;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// One cache generation: a key/value map of response snapshots.
///
/// Writes to the same key are last-write-wins. Writes to different keys
/// never conflict.
#[async_trait]
pub trait CacheBucket: Send + Sync {
    /// Stores `response` under `key`, replacing any previous entry.
    async fn put(&self, key: CacheKey, response: ResponseSnapshot) -> StorageResult<()>;

    /// Returns the entry stored under `key`.
    async fn lookup(&self, key: &CacheKey) -> StorageResult<Option<ResponseSnapshot>>;

    /// Lists every key in the generation, in no particular order.
    async fn keys(&self) -> StorageResult<Vec<CacheKey>>;
}

/// Outcome of [`CacheStorage::purge_others`].
#[derive(Debug, Default)]
pub struct PurgeReport {
    /// Generations that were deleted.
    pub deleted: Vec<GenerationId>,
    /// Generations that could not be deleted, with the reason.
    pub failed: Vec<(GenerationId, StorageError)>,
}

impl PurgeReport {
    /// `true` when nothing needed deleting.
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.failed.is_empty()
    }
}

/// Set of named cache generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Returns the named generation, creating it if absent. Idempotent.
    async fn open(&self, generation: &GenerationId) -> StorageResult<Arc<dyn CacheBucket>>;

    /// Returns the named generation without creating it.
    async fn find(&self, generation: &GenerationId)
    -> StorageResult<Option<Arc<dyn CacheBucket>>>;

    /// Lists existing generations.
    async fn keys(&self) -> StorageResult<Vec<GenerationId>>;

    /// Deletes a generation and every entry in it.
    ///
    /// Returns `false` when the generation did not exist.
    async fn delete(&self, generation: &GenerationId) -> StorageResult<bool>;

    /// Looks `key` up in `generation` without creating the generation.
    async fn lookup(
        &self,
        generation: &GenerationId,
        key: &CacheKey,
    ) -> StorageResult<Option<ResponseSnapshot>> {
        match self.find(generation).await? {
            Some(bucket) => bucket.lookup(key).await,
            None => Ok(None),
        }
    }

    /// Deletes every generation except `current`.
    ///
    /// Failing to list generations is an error. Failing to delete one
    /// generation is recorded in the report and does not stop the others.
    async fn purge_others(&self, current: &GenerationId) -> StorageResult<PurgeReport> {
        let mut report = PurgeReport::default();
        for generation in self.keys().await? {
            if &generation == current {
                continue;
            }
            match self.delete(&generation).await {
                Ok(true) => {
                    debug!(%generation, "cache generation purged");
                    report.deleted.push(generation);
                }
                Ok(false) => {
                    debug!(%generation, "cache generation already gone");
                }
                Err(error) => {
                    warn!(%generation, %error, "failed to purge cache generation");
                    report.failed.push((generation, error));
                }
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl<T> CacheStorage for Arc<T>
where
    T: CacheStorage + ?Sized,
{
    async fn open(&self, generation: &GenerationId) -> StorageResult<Arc<dyn CacheBucket>> {
        (**self).open(generation).await
    }

    async fn find(
        &self,
        generation: &GenerationId,
    ) -> StorageResult<Option<Arc<dyn CacheBucket>>> {
        (**self).find(generation).await
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationId>> {
        (**self).keys().await
    }

    async fn delete(&self, generation: &GenerationId) -> StorageResult<bool> {
        (**self).delete(generation).await
    }

    async fn lookup(
        &self,
        generation: &GenerationId,
        key: &CacheKey,
    ) -> StorageResult<Option<ResponseSnapshot>> {
        (**self).lookup(generation, key).await
    }

    async fn purge_others(&self, current: &GenerationId) -> StorageResult<PurgeReport> {
        (**self).purge_others(current).await
    }
}
