//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another process holds the namespace lock.
    #[error("namespace locked: {namespace}")]
    Locked {
        /// The namespace that could not be locked.
        namespace: String,
    },

    /// The engine's on-disk data is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// A key, value or commit exceeds the log format's size limits.
    #[error("{what} too large: {len}")]
    TooLarge {
        /// Which part of the commit overflowed.
        what: &'static str,
        /// The offending length or count.
        len: usize,
    },

    /// The engine has been closed.
    #[error("storage is closed")]
    Closed,

    /// A failure injected by a test engine.
    #[error("injected failure: {0}")]
    Injected(String),
}
