use anyhow::{Error, anyhow, ensure};
use cucumber::then;
use pretty_assertions::assert_eq;
use tether_backend::CacheStorage;
use tether_core::{CacheKey, GenerationId, WorkerState};

use crate::world::{LastResponse, OfflineWorld};

#[then(expr = "the response body is {string}")]
fn response_body_is(world: &mut OfflineWorld, expected: String) -> Result<(), Error> {
    match &world.last_response {
        Some(LastResponse::Answered { body, .. }) => {
            assert_eq!(body, &expected);
            Ok(())
        }
        other => Err(anyhow!("expected an answered request, got {other:?}")),
    }
}

#[then(expr = "the response status is {int}")]
fn response_status_is(world: &mut OfflineWorld, expected: u16) -> Result<(), Error> {
    match &world.last_response {
        Some(LastResponse::Answered { status, .. }) => {
            assert_eq!(status.as_u16(), expected);
            Ok(())
        }
        other => Err(anyhow!("expected an answered request, got {other:?}")),
    }
}

#[then(expr = "the request fails")]
fn request_fails(world: &mut OfflineWorld) -> Result<(), Error> {
    match &world.last_response {
        Some(LastResponse::Failed(_)) => Ok(()),
        other => Err(anyhow!("expected a failed request, got {other:?}")),
    }
}

#[then(expr = "the fetch outcome is {string}")]
fn fetch_outcome_is(world: &mut OfflineWorld, expected: String) -> Result<(), Error> {
    let outcome = world
        .span_collector
        .last_fetch_outcome()
        .ok_or_else(|| anyhow!("no tether.fetch span captured"))?;
    assert_eq!(outcome, expected);
    Ok(())
}

#[then(expr = "the cache has an entry for {string}")]
async fn cache_has_entry(world: &mut OfflineWorld, uri: String) -> Result<(), Error> {
    world.settle().await?;
    let found = world.worker()?.cache().lookup(&CacheKey::parse(&uri)?).await;
    ensure!(found.is_some(), "no cache entry for {uri}");
    Ok(())
}

#[then(expr = "the cache has no entry for {string}")]
async fn cache_has_no_entry(world: &mut OfflineWorld, uri: String) -> Result<(), Error> {
    world.settle().await?;
    let found = world.worker()?.cache().lookup(&CacheKey::parse(&uri)?).await;
    ensure!(found.is_none(), "unexpected cache entry for {uri}");
    Ok(())
}

#[then(expr = "cache generation {string} no longer exists")]
async fn generation_gone(world: &mut OfflineWorld, generation: String) -> Result<(), Error> {
    let keys = world.storage.keys().await?;
    ensure!(
        !keys.contains(&GenerationId::new(generation.clone())),
        "generation {generation} still present: {keys:?}"
    );
    Ok(())
}

#[then(expr = "the worker is activated")]
fn worker_activated(world: &mut OfflineWorld) -> Result<(), Error> {
    assert_eq!(world.worker()?.state(), WorkerState::Activated);
    Ok(())
}

#[then(expr = "the worker reports offline")]
fn worker_reports_offline(world: &mut OfflineWorld) -> Result<(), Error> {
    ensure!(world.worker()?.connectivity().is_offline(), "worker is online");
    Ok(())
}

#[then(expr = "the worker reports online")]
fn worker_reports_online(world: &mut OfflineWorld) -> Result<(), Error> {
    ensure!(!world.worker()?.connectivity().is_offline(), "worker is offline");
    Ok(())
}

#[then(expr = "the worker has {int} connected page(s)")]
fn connected_pages(world: &mut OfflineWorld, expected: usize) -> Result<(), Error> {
    assert_eq!(world.worker()?.clients().len(), expected);
    Ok(())
}

#[then(expr = "page {string} shows the offline indicator")]
async fn indicator_shown(world: &mut OfflineWorld, name: String) -> Result<(), Error> {
    let page = world.page(&name)?;
    page.render().await;
    ensure!(page.indicator_visible(), "offline indicator hidden on {name}");
    Ok(())
}

#[then(expr = "page {string} hides the offline indicator")]
async fn indicator_hidden(world: &mut OfflineWorld, name: String) -> Result<(), Error> {
    let page = world.page(&name)?;
    page.render().await;
    ensure!(!page.indicator_visible(), "offline indicator shown on {name}");
    Ok(())
}

#[then(expr = "the network was called {int} times")]
fn network_called(world: &mut OfflineWorld, expected: usize) {
    assert_eq!(world.network.calls(), expected);
}

#[then(expr = "the storage was never read")]
fn storage_never_read(world: &mut OfflineWorld) {
    assert_eq!(world.storage.faults().reads(), 0);
}
