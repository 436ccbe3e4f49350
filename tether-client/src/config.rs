//! Page bootstrap configuration.

use serde::{Deserialize, Serialize};

/// How a page registers its worker and renders the offline indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// URL of the worker script.
    pub script_url: String,
    /// Scope the worker should control.
    pub scope: String,
    /// Marker class of offline indicator elements.
    pub indicator_class: String,
    /// Class added to indicators while offline.
    pub visible_class: String,
    /// Reload the page whenever it becomes visible again.
    pub auto_refresh: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            script_url: "/sw.js".to_owned(),
            scope: "/".to_owned(),
            indicator_class: "offline".to_owned(),
            visible_class: "offline_visible".to_owned(),
            auto_refresh: false,
        }
    }
}

impl BootstrapConfig {
    /// Parses a YAML document. Missing fields fall back to their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }
}
