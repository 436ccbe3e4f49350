use anyhow::{Error, anyhow};
use cucumber::when;
use http::Method;
use tether::FetchMeta;

use crate::world::OfflineWorld;

#[when(expr = "the network goes offline")]
fn network_goes_offline(world: &mut OfflineWorld) {
    world.network.set_offline(true);
}

#[when(expr = "the network comes back")]
fn network_comes_back(world: &mut OfflineWorld) {
    world.network.set_offline(false);
}

#[when(expr = "page {string} navigates to {string}")]
async fn page_navigates(world: &mut OfflineWorld, name: String, uri: String) -> Result<(), Error> {
    world.navigate(&name, &uri).await
}

#[when(expr = "page {string} requests {string} with method {word}")]
async fn page_requests_with_method(
    world: &mut OfflineWorld,
    name: String,
    uri: String,
    method: String,
) -> Result<(), Error> {
    let client = world.page(&name)?.client_id()?;
    let method = Method::from_bytes(method.as_bytes())?;
    world
        .request(method, &uri, FetchMeta::subresource(client))
        .await
}

#[when(expr = "page {string} asks for offline mode")]
fn page_asks_offline_mode(world: &mut OfflineWorld, name: String) -> Result<(), Error> {
    world.request_offline_mode(&name)
}

#[when(expr = "page {string} is closed")]
fn page_closed(world: &mut OfflineWorld, name: String) -> Result<(), Error> {
    world
        .pages
        .remove(&name)
        .map(drop)
        .ok_or_else(|| anyhow!("no page named {name}"))
}

#[when(expr = "a worker for cache generation {string} activates")]
async fn worker_activates(world: &mut OfflineWorld, generation: String) -> Result<(), Error> {
    let worker = world.start_worker(&generation);
    worker.activate();
    world.settle().await
}

#[when(expr = "background work settles")]
async fn background_work_settles(world: &mut OfflineWorld) -> Result<(), Error> {
    world.settle().await
}
