//! Per-request fetch metadata.
//!
//! Hosts attach a [`FetchMeta`] to each outgoing request (as an
//! `http::Extensions` entry) to tell the interceptor whether the request is a
//! page navigation and which page issued it. Requests without metadata are
//! treated as subresource requests from an unknown page.

use serde::{Deserialize, Serialize};

use crate::ClientId;

/// How a request will be used by the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// The response replaces the currently displayed document.
    Navigate,
    /// Anything else: scripts, styles, XHR, images.
    #[default]
    Subresource,
}

/// Navigation classification and client addressing for one request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchMeta {
    /// Request mode.
    pub mode: FetchMode,
    /// Page that issued the request.
    pub client_id: Option<ClientId>,
    /// Page that the navigation will create, when it is a navigation.
    pub resulting_client_id: Option<ClientId>,
}

impl FetchMeta {
    /// Metadata for a navigation that will produce `resulting` page.
    pub fn navigate(resulting: ClientId) -> Self {
        Self {
            mode: FetchMode::Navigate,
            client_id: None,
            resulting_client_id: Some(resulting),
        }
    }

    /// Metadata for a subresource request issued by `client`.
    pub fn subresource(client: ClientId) -> Self {
        Self {
            mode: FetchMode::Subresource,
            client_id: Some(client),
            resulting_client_id: None,
        }
    }

    /// Whether the request is a page navigation.
    pub fn is_navigation(&self) -> bool {
        self.mode == FetchMode::Navigate
    }

    /// The page that should hear about this request's outcome.
    ///
    /// Navigations address the page they produce, falling back to the page
    /// that started them; other requests address their issuer.
    pub fn addressee(&self) -> Option<ClientId> {
        match self.mode {
            FetchMode::Navigate => self.resulting_client_id.or(self.client_id),
            FetchMode::Subresource => self.client_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_addresses_resulting_client() {
        let meta = FetchMeta {
            mode: FetchMode::Navigate,
            client_id: Some(ClientId::new(1)),
            resulting_client_id: Some(ClientId::new(2)),
        };
        assert_eq!(meta.addressee(), Some(ClientId::new(2)));
    }

    #[test]
    fn navigation_falls_back_to_issuer() {
        let meta = FetchMeta {
            mode: FetchMode::Navigate,
            client_id: Some(ClientId::new(1)),
            resulting_client_id: None,
        };
        assert_eq!(meta.addressee(), Some(ClientId::new(1)));
    }

    #[test]
    fn default_is_anonymous_subresource() {
        let meta = FetchMeta::default();
        assert!(!meta.is_navigation());
        assert_eq!(meta.addressee(), None);
    }
}
