//! Errors surfaced to the page by the interceptor.

use thiserror::Error;

/// An intercepted request that could not be answered.
///
/// Only produced when the network failed and nothing was cached under the
/// request's key. Storage failures and failures while streaming a response
/// body never show up here.
#[derive(Debug, Error)]
pub enum FetchError<E> {
    /// The wrapped network service returned an error.
    #[error("network request failed: {0}")]
    Network(E),
}

impl<E> FetchError<E> {
    /// Returns the underlying network error.
    pub fn into_network(self) -> E {
        match self {
            FetchError::Network(err) => err,
        }
    }
}
