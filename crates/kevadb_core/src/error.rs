//! Error types for KevaDB core.

use kevadb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in KevaDB core operations.
///
/// An absent key is not an error; reads report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Identifier shorter than the key prefix.
    #[error("invalid identifier: expected at least {expected} bytes, got {actual}")]
    InvalidIdentifier {
        /// Required prefix length.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },

    /// Stored value too short to carry a ban tag.
    #[error("malformed value: {len} bytes cannot hold a ban tag")]
    MalformedValue {
        /// Length of the offending value.
        len: usize,
    },

    /// The engine factory failed to open the namespace.
    #[error("failed to open store {namespace}: {source}")]
    StoreOpen {
        /// Namespace being opened.
        namespace: String,
        /// Underlying engine error.
        #[source]
        source: StorageError,
    },

    /// A point lookup failed in the engine.
    #[error("store read failed: {0}")]
    StoreRead(#[source] StorageError),

    /// A put or batch commit failed in the engine.
    #[error("store write failed: {0}")]
    StoreWrite(#[source] StorageError),

    /// The index has not been opened, or has been closed.
    #[error("database is closed")]
    DatabaseClosed,

    /// The on-disk schema version is not supported.
    #[error("unsupported db version {found}, supported: {supported:?}")]
    UnsupportedVersion {
        /// Version found.
        found: u16,
        /// Versions this build understands.
        supported: &'static [u16],
    },

    /// A blocking worker panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    TaskFailed(String),
}

impl CoreError {
    /// Creates an invalid identifier error.
    pub fn invalid_identifier(actual: usize, expected: usize) -> Self {
        Self::InvalidIdentifier { expected, actual }
    }

    /// Creates a store open error.
    pub fn store_open(namespace: impl Into<String>, source: StorageError) -> Self {
        Self::StoreOpen {
            namespace: namespace.into(),
            source,
        }
    }
}
