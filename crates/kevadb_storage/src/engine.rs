//! Engine and factory trait definitions.

use crate::batch::WriteBatch;
use crate::error::StorageResult;
use std::sync::Arc;

/// A byte-oriented key-value engine.
///
/// Engines are **opaque byte stores**. KevaDB owns all interpretation of
/// keys and values; engines only persist them.
///
/// # Invariants
///
/// - `get` after `put` on the same key returns the last value written
/// - A missing key is `Ok(None)`, never an error
/// - `write_batch` applies every entry or none of them
/// - After `close`, every operation fails with [`StorageError::Closed`]
///
/// # Implementors
///
/// - [`super::InMemoryEngine`] - For testing
/// - [`super::FileEngine`] - For persistent storage
///
/// [`StorageError::Closed`]: crate::StorageError::Closed
pub trait KvEngine: Send + Sync {
    /// Looks up the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the read fails.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the write fails.
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Commits all puts buffered in `batch` as one atomic unit.
    ///
    /// When a key appears more than once, the last occurrence wins.
    /// On failure none of the entries become visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the commit fails.
    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Releases the engine's resources.
    ///
    /// Closing an already closed engine is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if pending data cannot be flushed.
    fn close(&self) -> StorageResult<()>;
}

/// Opens engines scoped to a namespace.
///
/// Distinct namespaces never observe each other's keys, so several indexes
/// can share one physical store.
pub trait EngineFactory: Send + Sync {
    /// Opens (or creates) the engine for `namespace`.
    ///
    /// `for_sync` is set while the caller is bulk-indexing from scratch;
    /// engines may trade per-commit durability for throughput in that mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be opened.
    fn open(&self, namespace: &str, for_sync: bool) -> StorageResult<Arc<dyn KvEngine>>;
}
