//! Lifecycle task policies and configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the [`LifecycleManager`](super::LifecycleManager).
///
/// Lifecycle tasks are never cancelled; the only policy is how loudly to
/// complain about slow ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Log a warning when a task runs longer than this (e.g. "2s", "500ms").
    #[serde(with = "humantime_serde")]
    pub slow_task_threshold: Option<Duration>,
}

impl LifecycleConfig {
    /// Create a new builder for LifecycleConfig.
    pub fn builder() -> LifecycleConfigBuilder {
        LifecycleConfigBuilder::default()
    }
}

/// Builder for LifecycleConfig.
#[derive(Debug, Clone, Default)]
pub struct LifecycleConfigBuilder {
    slow_task_threshold: Option<Duration>,
}

impl LifecycleConfigBuilder {
    /// Warn about tasks running longer than `threshold`.
    pub fn slow_task_threshold(self, threshold: Duration) -> Self {
        Self {
            slow_task_threshold: Some(threshold),
        }
    }

    /// Build the LifecycleConfig.
    pub fn build(self) -> LifecycleConfig {
        LifecycleConfig {
            slow_task_threshold: self.slow_task_threshold,
        }
    }
}
