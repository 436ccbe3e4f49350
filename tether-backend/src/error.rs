//! Error types for storage operations.

use thiserror::Error;

/// Error type for cache storage operations.
///
/// None of these ever reach a page: the worker logs them and carries on as
/// if the entry had not been stored.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage refused the write because it is out of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The response cannot be stored (e.g. opaque or streaming-only bodies).
    #[error("response is not cacheable: {0}")]
    NotCacheable(String),

    /// Internal storage error, state or computation error.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
