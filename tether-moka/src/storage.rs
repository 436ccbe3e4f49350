//! Moka storage implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use smol_str::SmolStr;
use tether_backend::{CacheBucket, CacheStorage, StorageResult};
use tether_core::{CacheKey, GenerationId, ResponseSnapshot};
use tracing::debug;

/// One cache generation held in a Moka async cache.
///
/// Clones share the same underlying cache.
#[derive(Clone)]
pub struct MokaBucket {
    /// The underlying Moka async cache instance.
    pub cache: Cache<CacheKey, ResponseSnapshot>,
}

impl std::fmt::Debug for MokaBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBucket")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheBucket for MokaBucket {
    async fn put(&self, key: CacheKey, response: ResponseSnapshot) -> StorageResult<()> {
        self.cache.insert(key, response).await;
        Ok(())
    }

    async fn lookup(&self, key: &CacheKey) -> StorageResult<Option<ResponseSnapshot>> {
        Ok(self.cache.get(key).await)
    }

    async fn keys(&self) -> StorageResult<Vec<CacheKey>> {
        Ok(self.cache.iter().map(|(key, _)| (*key).clone()).collect())
    }
}

/// In-memory cache storage powered by Moka.
///
/// # Caveats
///
/// - Data is **not persisted**: every generation is lost on process restart
/// - Data is **not shared** across processes
/// - There is no size-based eviction; a generation only shrinks when it is
///   deleted
#[derive(Clone)]
pub struct MokaStorage {
    generations: Arc<DashMap<GenerationId, MokaBucket>>,
    initial_capacity: Option<usize>,
    label: SmolStr,
}

impl std::fmt::Debug for MokaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStorage")
            .field("label", &self.label)
            .field("generations", &self.generations.len())
            .finish()
    }
}

impl MokaStorage {
    /// Creates a new builder for `MokaStorage`.
    pub fn builder() -> crate::builder::MokaStorageBuilder {
        crate::builder::MokaStorageBuilder::new()
    }

    pub(crate) fn from_builder(initial_capacity: Option<usize>, label: SmolStr) -> Self {
        Self {
            generations: Arc::new(DashMap::new()),
            initial_capacity,
            label,
        }
    }

    /// Label identifying this storage in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn new_bucket(&self) -> MokaBucket {
        let mut builder = Cache::builder();
        if let Some(capacity) = self.initial_capacity {
            builder = builder.initial_capacity(capacity);
        }
        MokaBucket {
            cache: builder.build(),
        }
    }
}

impl Default for MokaStorage {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[async_trait]
impl CacheStorage for MokaStorage {
    async fn open(&self, generation: &GenerationId) -> StorageResult<Arc<dyn CacheBucket>> {
        let bucket = self
            .generations
            .entry(generation.clone())
            .or_insert_with(|| {
                debug!(storage = %self.label, %generation, "cache generation created");
                self.new_bucket()
            })
            .clone();
        Ok(Arc::new(bucket))
    }

    async fn find(
        &self,
        generation: &GenerationId,
    ) -> StorageResult<Option<Arc<dyn CacheBucket>>> {
        Ok(self
            .generations
            .get(generation)
            .map(|bucket| Arc::new(bucket.clone()) as Arc<dyn CacheBucket>))
    }

    async fn keys(&self) -> StorageResult<Vec<GenerationId>> {
        Ok(self
            .generations
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn delete(&self, generation: &GenerationId) -> StorageResult<bool> {
        match self.generations.remove(generation) {
            Some((_, bucket)) => {
                bucket.cache.invalidate_all();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
