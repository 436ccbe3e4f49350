use std::sync::atomic::Ordering;

use anyhow::Error;
use bytes::Bytes;
use cucumber::given;
use http::{HeaderMap, StatusCode};
use tether_backend::CacheStorage;
use tether_core::{CacheKey, GenerationId, ResponseSnapshot};

use crate::world::OfflineWorld;

#[given(expr = "a worker for cache generation {string}")]
async fn worker_for_generation(world: &mut OfflineWorld, generation: String) -> Result<(), Error> {
    world.start_worker(&generation);
    Ok(())
}

#[given(expr = "the network is online")]
fn network_online(world: &mut OfflineWorld) {
    world.network.set_offline(false);
}

#[given(expr = "the network is offline")]
fn network_offline(world: &mut OfflineWorld) {
    world.network.set_offline(true);
}

#[given(expr = "page {string} is open")]
async fn page_is_open(world: &mut OfflineWorld, name: String) -> Result<(), Error> {
    world.open_page(&name).await
}

#[given(expr = "page {string} navigated to {string}")]
async fn page_navigated(world: &mut OfflineWorld, name: String, uri: String) -> Result<(), Error> {
    world.navigate(&name, &uri).await?;
    world.settle().await
}

#[given(expr = "the network answers {string} with status {int}")]
fn network_answers_with(world: &mut OfflineWorld, path: String, status: u16) -> Result<(), Error> {
    world
        .network
        .respond_with(path, StatusCode::from_u16(status)?);
    Ok(())
}

#[given(expr = "cache writes fail with quota exceeded")]
fn quota_exceeded(world: &mut OfflineWorld) {
    world
        .storage
        .faults()
        .quota_exceeded
        .store(true, Ordering::SeqCst);
}

#[given(expr = "cache generation {string} holds {string}")]
async fn generation_holds(
    world: &mut OfflineWorld,
    generation: String,
    uri: String,
) -> Result<(), Error> {
    let bucket = world.storage.open(&GenerationId::new(generation)).await?;
    let snapshot = ResponseSnapshot::new(
        StatusCode::OK,
        HeaderMap::new(),
        Bytes::from(format!("stored {uri}")),
    );
    bucket.put(CacheKey::parse(&uri)?, snapshot).await?;
    Ok(())
}
