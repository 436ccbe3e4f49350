#![warn(missing_docs)]
//! Cache storage traits for tether.
//!
//! A [`CacheStorage`] is a set of named [generations](tether_core::GenerationId),
//! each a [`CacheBucket`] mapping [`CacheKey`](tether_core::CacheKey) to
//! [`ResponseSnapshot`](tether_core::ResponseSnapshot). The surface mirrors
//! what a browser exposes to a background worker: `open`, `keys`, `delete`,
//! `match` and `put`.
//!
//! Implementations only need to provide storage primitives. Generation
//! housekeeping ([`CacheStorage::purge_others`]) and non-creating lookups
//! ([`CacheStorage::lookup`]) are provided on top of them.
//!
//! Use `tether-moka` for an in-memory implementation.

mod error;
mod storage;

pub use error::StorageError;
pub use storage::{CacheBucket, CacheStorage, PurgeReport, StorageResult};
