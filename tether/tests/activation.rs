use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use pretty_assertions::assert_eq;
use tether::{CacheKey, GenerationId, ResponseSnapshot, Worker, WorkerConfig, WorkerState};
use tether_backend::CacheStorage;
use tether_moka::MokaStorage;

fn snapshot(body: &'static str) -> ResponseSnapshot {
    ResponseSnapshot::new(StatusCode::OK, HeaderMap::new(), body)
}

#[tokio::test]
async fn activation_purges_previous_generation() {
    let storage = Arc::new(MokaStorage::default());
    let key = CacheKey::parse("/page").unwrap();
    storage
        .open(&GenerationId::from("v1"))
        .await
        .unwrap()
        .put(key.clone(), snapshot("old"))
        .await
        .unwrap();

    let worker = Worker::new(
        WorkerConfig::builder().generation("v2").build(),
        storage.clone(),
    );
    assert_eq!(worker.state(), WorkerState::Installing);

    assert!(worker.activate().is_some());
    worker.settled().await;

    assert_eq!(worker.state(), WorkerState::Activated);
    assert!(storage.find(&GenerationId::from("v1")).await.unwrap().is_none());
    assert_eq!(worker.cache().lookup(&key).await, None);
}

#[tokio::test]
async fn activation_runs_once() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    assert!(worker.activate().is_some());
    assert!(worker.activate().is_none());
    worker.settled().await;
    assert!(worker.activate().is_none());
}

#[tokio::test]
async fn background_put_is_visible_after_settle() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    let key = CacheKey::parse("https://example.org/home").unwrap();

    assert!(worker.cache().put_in_background(key.clone(), snapshot("home")).is_some());
    worker.settled().await;

    let stored = worker.cache().lookup(&key).await.unwrap();
    assert_eq!(stored.body().as_ref(), b"home");
}

#[tokio::test]
async fn non_ok_snapshots_are_not_admitted() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    let key = CacheKey::parse("/missing").unwrap();
    let not_found = ResponseSnapshot::new(StatusCode::NOT_FOUND, HeaderMap::new(), "nope");
    let partial = ResponseSnapshot::new(StatusCode::PARTIAL_CONTENT, HeaderMap::new(), "par");

    assert!(worker.cache().put_in_background(key.clone(), not_found).is_none());
    assert!(worker.cache().put_in_background(key.clone(), partial).is_none());
    worker.settled().await;

    assert_eq!(worker.cache().lookup(&key).await, None);
}
