#![warn(missing_docs)]
//! # tether-core
//!
//! Core types shared by the worker and page sides of the tether offline
//! interception layer.
//!
//! This crate is **protocol-light**: it knows about HTTP URIs and response
//! snapshots, but nothing about storage engines, Tower, or how a page renders
//! its indicator. Those live in `tether-backend`, `tether-tower` and
//! `tether-client` respectively.
//!
//! ## Overview
//!
//! - [`CacheKey`] - normalized request identity (absolute URL without query)
//! - [`GenerationId`] - name of a cache generation, e.g. `"v1"`
//! - [`ResponseSnapshot`] - immutable copy of a successful response
//! - [`ClientMessage`] - the worker/page wire protocol
//! - [`FetchMeta`] - per-request navigation and client addressing metadata
//! - [`Registrar`] - page-facing registration surface of a worker

pub mod generation;
pub mod key;
pub mod message;
pub mod registration;
pub mod request;
pub mod snapshot;

pub use generation::GenerationId;
pub use key::CacheKey;
pub use message::{ClientId, ClientMessage, DeliveryError, MessageError, MessagePort};
pub use registration::{
    Registrar, Registration, RegistrationError, RegistrationOptions, WorkerState,
};
pub use request::{FetchMeta, FetchMode};
pub use snapshot::ResponseSnapshot;
#[doc(hidden)]
pub use smol_str::SmolStr;
