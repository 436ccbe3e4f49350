#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # tether
//!
//! The background worker of the tether offline layer.
//!
//! A [`Worker`] owns everything with state: the connectivity flag derived
//! from navigation outcomes, the registry of connected pages, the
//! [`CacheStore`] bound to the current cache generation, and the
//! lifecycle-extending tasks that must finish before the instance may be
//! recycled. Request interception itself lives in `tether-tower`.

/// Generation-scoped cache store.
///
/// Wraps a [`CacheStorage`](tether_backend::CacheStorage) and pins it to the
/// worker's current generation. Writes run as lifecycle tasks; storage
/// errors are logged and never surface to page requests.
pub mod cache;

/// Worker configuration loaded from YAML or built in code.
pub mod config;

/// Last-known connectivity state.
pub mod connectivity;

/// Worker side of the page message bus.
pub mod bus;

/// Lifetime-extending background tasks.
pub mod lifecycle;

/// Metrics collection.
///
/// When the `metrics` feature is enabled, this module registers counters
/// for fetch outcomes, cache writes, generation purges, lifecycle tasks and
/// page messages.
pub mod metrics;

mod worker;

pub use bus::ClientRegistry;
pub use cache::CacheStore;
pub use config::{ConfigError, WorkerConfig, WorkerConfigBuilder};
pub use connectivity::{Connectivity, ConnectivityTracker};
pub use lifecycle::{LifecycleConfig, LifecycleManager, TaskId};
pub use worker::Worker;

pub use tether_core::{
    CacheKey, ClientId, ClientMessage, FetchMeta, FetchMode, GenerationId, ResponseSnapshot,
    WorkerState,
};
