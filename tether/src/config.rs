//! Worker configuration.

use serde::{Deserialize, Serialize};
use tether_core::GenerationId;
use thiserror::Error;

use crate::lifecycle::LifecycleConfig;

/// Errors raised while loading a [`WorkerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("invalid worker configuration: {0}")]
    Yaml(#[from] serde_saphyr::Error),
    /// The script path is not an absolute path.
    #[error("script path must start with '/': {0}")]
    InvalidScriptPath(String),
    /// The scope is not an absolute path.
    #[error("scope must start with '/': {0}")]
    InvalidScope(String),
}

/// Static configuration of one worker installation.
///
/// # Example
///
/// ```
/// use tether::WorkerConfig;
///
/// let config = WorkerConfig::from_yaml(
///     r#"
/// generation: v2
/// script_path: /sw.js
/// lifecycle:
///   slow_task_threshold: 2s
/// "#,
/// )
/// .unwrap();
/// assert_eq!(config.generation.as_str(), "v2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name of the cache generation this worker reads and writes.
    pub generation: GenerationId,
    /// Path of the worker script. Requests for it are never intercepted.
    pub script_path: String,
    /// Path prefix of pages the worker controls.
    pub scope: String,
    /// Lifecycle task settings.
    pub lifecycle: LifecycleConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            generation: GenerationId::default(),
            script_path: "/sw.js".to_owned(),
            scope: "/".to_owned(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Creates a new builder starting from defaults.
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    /// Parses and validates a YAML document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: WorkerConfig = serde_saphyr::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the script path and scope are absolute paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.script_path.starts_with('/') {
            return Err(ConfigError::InvalidScriptPath(self.script_path.clone()));
        }
        if !self.scope.starts_with('/') {
            return Err(ConfigError::InvalidScope(self.scope.clone()));
        }
        Ok(())
    }

    /// Directory containing the worker script, with a trailing slash.
    pub fn script_dir(&self) -> &str {
        match self.script_path.rfind('/') {
            Some(idx) => &self.script_path[..=idx],
            None => "/",
        }
    }
}

/// Builder for [`WorkerConfig`].
#[derive(Debug, Clone, Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Sets the current cache generation.
    pub fn generation(mut self, generation: impl Into<GenerationId>) -> Self {
        self.config.generation = generation.into();
        self
    }

    /// Sets the worker script path.
    pub fn script_path(mut self, path: impl Into<String>) -> Self {
        self.config.script_path = path.into();
        self
    }

    /// Sets the controlled scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.config.scope = scope.into();
        self
    }

    /// Sets the lifecycle task settings.
    pub fn lifecycle(mut self, lifecycle: LifecycleConfig) -> Self {
        self.config.lifecycle = lifecycle;
        self
    }

    /// Builds the configuration without validating it.
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}
