//! Lifetime-extending background work.
//!
//! Cache writes and the activation purge must not be lost when the request
//! that started them has already been answered. The worker hands such work to
//! a [`LifecycleManager`], and the host awaits
//! [`LifecycleManager::settled`] before recycling the worker instance.
//!
//! # Example
//!
//! ```no_run
//! use tether::lifecycle::{LifecycleConfig, LifecycleManager};
//!
//! # async fn run() {
//! let manager = LifecycleManager::new(LifecycleConfig::default());
//! manager.extend("cache_write", async {
//!     // persist a response snapshot
//! });
//! manager.settled().await;
//! # }
//! ```

mod manager;
mod policy;

pub use manager::{LifecycleManager, TaskId};
pub use policy::{LifecycleConfig, LifecycleConfigBuilder};
