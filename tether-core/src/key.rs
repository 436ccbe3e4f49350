//! Cache key normalization.
//!
//! A [`CacheKey`] is the identity a response is stored under. It is derived
//! from the request URI by dropping the query component, so every variant of
//! a page that differs only in its query string shares one entry:
//!
//! ```
//! use http::Uri;
//! use tether_core::CacheKey;
//!
//! let first = CacheKey::from_uri(&"https://example.org/page?a=1".parse::<Uri>().unwrap());
//! let second = CacheKey::from_uri(&"https://example.org/page?b=2".parse::<Uri>().unwrap());
//! assert_eq!(first, second);
//! assert_eq!(first.as_str(), "https://example.org/page");
//! ```
//!
//! Origin-form URIs (`/page?a=1`), as seen by servers, normalize to the bare
//! path. Normalization is idempotent: parsing a key back as a URI and
//! normalizing again yields the same key.

use std::fmt;

use http::Uri;
use http::uri::InvalidUri;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Normalized request identity.
///
/// Cloning is cheap: short keys are stored inline and long keys are
/// reference counted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Builds the key for a request URI, stripping its query string.
    pub fn from_uri(uri: &Uri) -> Self {
        let path = match uri.path() {
            "" => "/",
            path => path,
        };
        match (uri.scheme(), uri.authority()) {
            (Some(scheme), Some(authority)) => {
                Self(SmolStr::from(format!("{scheme}://{authority}{path}")))
            }
            _ => Self(SmolStr::from(path)),
        }
    }

    /// Parses `uri` and normalizes it.
    pub fn parse(uri: &str) -> Result<Self, InvalidUri> {
        uri.parse::<Uri>().map(|uri| Self::from_uri(&uri))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Uri> for CacheKey {
    fn from(uri: &Uri) -> Self {
        Self::from_uri(uri)
    }
}
