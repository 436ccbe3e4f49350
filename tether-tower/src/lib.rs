//! Tower middleware that keeps pages usable when the network is down.
//!
//! [`Intercept`] is a Tower [`Layer`] placed in front of whatever service
//! performs the actual network fetch. It answers from the network whenever it
//! can, keeps a snapshot of every `200 OK` `GET` response in the worker's
//! current cache generation, and serves that snapshot when the network fails.
//!
//! Navigations, marked with a [`FetchMeta`] request extension, also update the
//! worker's connectivity flag; a failed navigation pushes
//! `offlineMode: true` to the page it was for.
//!
//! # Quick Start
//!
//! ```no_run
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use tether::{Worker, WorkerConfig};
//! use tether_moka::MokaStorage;
//! use tether_tower::Intercept;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
//!
//! let service = ServiceBuilder::new()
//!     .layer(Intercept::builder().worker(worker).build())
//!     .service(service_fn(|_req: http::Request<()>| async {
//!         Ok::<_, std::io::Error>(http::Response::new(Full::new(Bytes::from("hello"))))
//!     }));
//! ```
//!
//! [`Layer`]: tower::Layer
//! [`FetchMeta`]: tether::FetchMeta
//!
//! # Main Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Intercept`] | Tower `Layer`, the main entry point |
//! | [`InterceptBuilder`] | Builder for the layer |
//! | [`InterceptService`] | The Tower `Service` doing the interception |
//! | [`FetchBody`] | Response body: streamed, captured for the cache, or replayed |
//! | [`FetchError`] | Failure with nothing cached to fall back to |

#![warn(missing_docs)]

/// Response body type.
pub mod body;
/// Error type surfaced to the page.
pub mod error;
/// Future types for the intercept service.
pub mod future;
/// Tower layer and builder.
pub mod layer;
/// The Tower service performing interception.
pub mod service;

pub use body::{FetchBody, SnapshotCapture};
pub use error::FetchError;
pub use future::InterceptFuture;
pub use layer::{Intercept, InterceptBuilder, NotSet};
pub use service::InterceptService;
