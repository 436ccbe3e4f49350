use http::{HeaderMap, StatusCode};
use pretty_assertions::assert_eq;
use tether_backend::CacheStorage;
use tether_core::{CacheKey, GenerationId, ResponseSnapshot};
use tether_moka::MokaStorage;

fn snapshot(body: &'static str) -> ResponseSnapshot {
    ResponseSnapshot::new(StatusCode::OK, HeaderMap::new(), body)
}

#[tokio::test]
async fn open_is_idempotent() {
    let storage = MokaStorage::default();
    let generation = GenerationId::from("v1");
    let key = CacheKey::parse("/page").unwrap();

    let first = storage.open(&generation).await.unwrap();
    first.put(key.clone(), snapshot("one")).await.unwrap();

    let second = storage.open(&generation).await.unwrap();
    let stored = second.lookup(&key).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"one");
    assert_eq!(storage.keys().await.unwrap(), vec![generation]);
}

#[tokio::test]
async fn put_replaces_previous_entry() {
    let storage = MokaStorage::default();
    let bucket = storage.open(&GenerationId::from("v1")).await.unwrap();
    let key = CacheKey::parse("https://example.org/page").unwrap();

    bucket.put(key.clone(), snapshot("old")).await.unwrap();
    bucket.put(key.clone(), snapshot("new")).await.unwrap();

    let stored = bucket.lookup(&key).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"new");
}

#[tokio::test]
async fn lookup_misses_unknown_key() {
    let storage = MokaStorage::default();
    let bucket = storage.open(&GenerationId::from("v1")).await.unwrap();

    let missing = bucket.lookup(&CacheKey::parse("/nothing").unwrap()).await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn generations_are_isolated() {
    let storage = MokaStorage::default();
    let key = CacheKey::parse("/page").unwrap();

    storage
        .open(&GenerationId::from("v1"))
        .await
        .unwrap()
        .put(key.clone(), snapshot("v1 page"))
        .await
        .unwrap();

    let v2 = storage.open(&GenerationId::from("v2")).await.unwrap();
    assert_eq!(v2.lookup(&key).await.unwrap(), None);
}

#[tokio::test]
async fn activation_purge_keeps_current_generation() {
    let storage = MokaStorage::default();
    let key = CacheKey::parse("/page").unwrap();
    for name in ["v1", "v2"] {
        storage
            .open(&GenerationId::new(name))
            .await
            .unwrap()
            .put(key.clone(), snapshot(name))
            .await
            .unwrap();
    }

    let report = storage.purge_others(&GenerationId::from("v2")).await.unwrap();

    assert_eq!(report.deleted, vec![GenerationId::from("v1")]);
    assert_eq!(storage.keys().await.unwrap(), vec![GenerationId::from("v2")]);
    assert!(storage.find(&GenerationId::from("v1")).await.unwrap().is_none());
    let kept = storage
        .lookup(&GenerationId::from("v2"), &key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.body().as_ref(), b"v2");
}

#[tokio::test]
async fn delete_reports_missing_generation() {
    let storage = MokaStorage::default();
    assert!(!storage.delete(&GenerationId::from("v9")).await.unwrap());
}

#[tokio::test]
async fn bucket_keys_lists_entries() {
    let storage = MokaStorage::default();
    let bucket = storage.open(&GenerationId::from("v1")).await.unwrap();
    bucket
        .put(CacheKey::parse("/a").unwrap(), snapshot("a"))
        .await
        .unwrap();
    bucket
        .put(CacheKey::parse("/b").unwrap(), snapshot("b"))
        .await
        .unwrap();

    let mut keys = bucket.keys().await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec![CacheKey::parse("/a").unwrap(), CacheKey::parse("/b").unwrap()]
    );
}
