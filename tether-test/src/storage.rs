//! Cache storage with injectable faults and access counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tether_backend::{CacheBucket, CacheStorage, StorageError, StorageResult};
use tether_core::{CacheKey, GenerationId, ResponseSnapshot};
use tether_moka::MokaStorage;

/// Switches and counters shared by a [`FaultyStorage`] and its buckets.
#[derive(Debug, Default)]
pub struct Faults {
    /// Every `put` fails with [`StorageError::QuotaExceeded`].
    pub quota_exceeded: AtomicBool,
    /// Listing generations fails.
    pub listing_fails: AtomicBool,
    /// Number of bucket reads.
    pub reads: AtomicUsize,
    /// Number of successful bucket writes.
    pub writes: AtomicUsize,
}

impl Faults {
    /// Number of bucket reads so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

/// [`MokaStorage`] wrapped with fault injection.
#[derive(Debug, Clone, Default)]
pub struct FaultyStorage {
    inner: MokaStorage,
    faults: Arc<Faults>,
}

impl FaultyStorage {
    /// Creates an empty storage with no faults switched on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault switches and counters.
    pub fn faults(&self) -> &Arc<Faults> {
        &self.faults
    }

    fn wrap(&self, bucket: Arc<dyn CacheBucket>) -> Arc<dyn CacheBucket> {
        Arc::new(FaultyBucket {
            inner: bucket,
            faults: self.faults.clone(),
        })
    }
}

#[async_trait]
impl CacheStorage for FaultyStorage {
    async fn open(&self, generation: &GenerationId) -> StorageResult<Arc<dyn CacheBucket>> {
        Ok(self.wrap(self.inner.open(generation).await?))
    }

    async fn find(
        &self,
        generation: &GenerationId,
    ) -> StorageResult<Option<Arc<dyn CacheBucket>>> {
        Ok(self
            .inner
            .find(generation)
            .await?
            .map(|bucket| self.wrap(bucket)))
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationId>> {
        if self.faults.listing_fails.load(Ordering::SeqCst) {
            return Err(StorageError::Internal("generation listing failed".into()));
        }
        self.inner.keys().await
    }

    async fn delete(&self, generation: &GenerationId) -> StorageResult<bool> {
        self.inner.delete(generation).await
    }
}

struct FaultyBucket {
    inner: Arc<dyn CacheBucket>,
    faults: Arc<Faults>,
}

#[async_trait]
impl CacheBucket for FaultyBucket {
    async fn put(&self, key: CacheKey, response: ResponseSnapshot) -> StorageResult<()> {
        if self.faults.quota_exceeded.load(Ordering::SeqCst) {
            return Err(StorageError::QuotaExceeded);
        }
        self.inner.put(key, response).await?;
        self.faults.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn lookup(&self, key: &CacheKey) -> StorageResult<Option<ResponseSnapshot>> {
        self.faults.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(key).await
    }

    async fn keys(&self) -> StorageResult<Vec<CacheKey>> {
        self.inner.keys().await
    }
}
