//! Page side of the tether offline layer.
//!
//! [`Bootstrap::start`] registers the worker, waits for it to become active
//! and asks for the current connectivity state. From then on every
//! `offlineMode` message from the worker is rendered by an
//! [`IndicatorRenderer`], which toggles a class on the page's offline
//! indicator elements on the next animation frame.
//!
//! Registration failures are not errors: the page simply gets
//! [`PageSession::Degraded`] and keeps working without offline support.
//!
//! The DOM and the frame clock are reached through the [`Document`] and
//! [`FrameScheduler`] traits. [`MemoryDocument`] and [`ManualFrames`] are
//! in-memory implementations for tests and headless hosts.

#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod document;
pub mod frame;
pub mod refresh;
pub mod renderer;

pub use bootstrap::{Bootstrap, PageSession, Session};
pub use config::BootstrapConfig;
pub use document::{Document, ElementId, MemoryDocument};
pub use frame::{FrameCallback, FrameScheduler, ManualFrames, TokioFrames};
pub use refresh::{AutoRefresh, Navigator, Visibility};
pub use renderer::IndicatorRenderer;
