//! Simple in-memory test storage implementation using DashMap.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use tether_backend::{CacheBucket, CacheStorage, StorageError, StorageResult};
use tether_core::{CacheKey, GenerationId, ResponseSnapshot};

#[derive(Clone, Default)]
pub struct TestBucket {
    entries: Arc<DashMap<CacheKey, ResponseSnapshot>>,
}

#[async_trait]
impl CacheBucket for TestBucket {
    async fn put(&self, key: CacheKey, response: ResponseSnapshot) -> StorageResult<()> {
        self.entries.insert(key, response);
        Ok(())
    }

    async fn lookup(&self, key: &CacheKey) -> StorageResult<Option<ResponseSnapshot>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    async fn keys(&self) -> StorageResult<Vec<CacheKey>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}

/// Simple in-memory storage for testing.
///
/// Deleting a generation listed in `undeletable` fails with an internal error.
#[derive(Clone, Default)]
pub struct TestStorage {
    generations: Arc<DashMap<GenerationId, TestBucket>>,
    undeletable: Arc<Mutex<HashSet<GenerationId>>>,
}

impl TestStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generations(names: &[&'static str]) -> Self {
        let storage = Self::new();
        for name in names {
            storage
                .generations
                .insert(GenerationId::new_static(name), TestBucket::default());
        }
        storage
    }

    pub fn refuse_delete(&self, generation: &'static str) {
        self.undeletable
            .lock()
            .unwrap()
            .insert(GenerationId::new_static(generation));
    }

    pub fn has(&self, generation: &str) -> bool {
        self.generations.contains_key(&GenerationId::new(generation))
    }
}

#[async_trait]
impl CacheStorage for TestStorage {
    async fn open(&self, generation: &GenerationId) -> StorageResult<Arc<dyn CacheBucket>> {
        let bucket = self.generations.entry(generation.clone()).or_default().clone();
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
        Ok(self.generations.iter().map(|e| e.key().clone()).collect())
    }

    async fn delete(&self, generation: &GenerationId) -> StorageResult<bool> {
        if self.undeletable.lock().unwrap().contains(generation) {
            return Err(StorageError::Internal("generation is locked".into()));
        }
        Ok(self.generations.remove(generation).is_some())
    }
}
