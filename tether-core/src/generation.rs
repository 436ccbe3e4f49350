//! Cache generation identifier.
//!
//! `GenerationId` is a newtype around `SmolStr` naming one versioned bucket of
//! cached responses. Exactly one generation is current per worker; the rest
//! are purged on activation.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Name of a cache generation (e.g. `"v1"`).
///
/// # Example
/// ```
/// use tether_core::GenerationId;
///
/// let current = GenerationId::new("v2");
/// assert_ne!(current, GenerationId::new_static("v1"));
/// assert_eq!(current.as_str(), "v2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(SmolStr);

impl GenerationId {
    /// Creates a new generation identifier.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates an identifier from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new_static("v1")
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for GenerationId {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self::new_static(s)
    }
}

impl From<String> for GenerationId {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for GenerationId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}
