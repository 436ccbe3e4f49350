//! In-memory cache storage for tether.
//!
//! [`MokaStorage`] keeps one `moka::future::Cache` per cache generation.
//! Generations are created on first [`open`](tether_backend::CacheStorage::open)
//! and dropped wholesale on [`delete`](tether_backend::CacheStorage::delete);
//! entries never expire or get evicted on their own.
//!
//! ```
//! use tether_moka::MokaStorage;
//!
//! let storage = MokaStorage::builder().label("pages").build();
//! assert_eq!(storage.label(), "pages");
//! ```
#![warn(missing_docs)]

mod builder;
mod storage;

pub use builder::MokaStorageBuilder;
pub use storage::{MokaBucket, MokaStorage};
