//! Engine lifecycle and raw access for one namespace.

use crate::error::{CoreError, CoreResult};
use crate::key::StorageKey;
use kevadb_storage::{EngineFactory, KvEngine, WriteBatch};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the engine handle backing the index.
///
/// The gateway is driven by a single owner: `open` and `close` take
/// `&mut self`. Reads and writes go through a shared handle, so they can be
/// issued from worker threads via [`StoreGateway::engine`].
pub struct StoreGateway {
    namespace: String,
    engine: Option<Arc<dyn KvEngine>>,
}

impl StoreGateway {
    /// Creates a closed gateway for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            engine: None,
        }
    }

    /// Opens the engine for this namespace.
    ///
    /// Opening an already open gateway replaces the previous handle without
    /// closing it; callers pair every `open` with a `close`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreOpen`] if the factory fails.
    pub fn open(&mut self, factory: &dyn EngineFactory, for_sync: bool) -> CoreResult<()> {
        let engine = factory
            .open(&self.namespace, for_sync)
            .map_err(|e| CoreError::store_open(&self.namespace, e))?;
        info!(namespace = %self.namespace, for_sync, "opened store");
        self.engine = Some(engine);
        Ok(())
    }

    /// Releases the engine handle. A no-op when already closed.
    ///
    /// The handle is dropped even if the engine reports an error on close.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreWrite`] if the engine fails to flush.
    pub fn close(&mut self) -> CoreResult<()> {
        if let Some(engine) = self.engine.take() {
            engine.close().map_err(CoreError::StoreWrite)?;
            info!(namespace = %self.namespace, "closed store");
        }
        Ok(())
    }

    /// Returns true while an engine handle is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// Returns the namespace this gateway is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns a shared handle to the open engine.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] if the gateway is not open.
    pub fn engine(&self) -> CoreResult<Arc<dyn KvEngine>> {
        self.engine.clone().ok_or(CoreError::DatabaseClosed)
    }

    fn handle(&self) -> CoreResult<&dyn KvEngine> {
        self.engine.as_deref().ok_or(CoreError::DatabaseClosed)
    }

    /// Point lookup. An absent key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is closed or the engine read fails.
    pub fn get(&self, key: &StorageKey) -> CoreResult<Option<Vec<u8>>> {
        read(self.handle()?, key)
    }

    /// Point write, last writer wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is closed or the engine write fails.
    pub fn put(&self, key: &StorageKey, value: &[u8]) -> CoreResult<()> {
        write(self.handle()?, key, value)
    }

    /// Writes all `entries` as one atomic batch.
    ///
    /// A key repeated within `entries` ends up with its last value. On
    /// failure none of the entries are visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is closed or the commit fails.
    pub fn batch_put<I, V>(&self, entries: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (StorageKey, V)>,
        V: AsRef<[u8]>,
    {
        let engine = self.handle()?;
        let mut batch = WriteBatch::new();
        for (key, value) in entries {
            batch.put(key.as_ref(), value.as_ref());
        }
        let len = batch.len();
        engine.write_batch(batch).map_err(CoreError::StoreWrite)?;
        debug!(namespace = %self.namespace, entries = len, "committed batch");
        Ok(())
    }
}

impl fmt::Debug for StoreGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreGateway")
            .field("namespace", &self.namespace)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Reads `key` from `engine`, wrapping engine failures.
pub(crate) fn read(engine: &dyn KvEngine, key: &StorageKey) -> CoreResult<Option<Vec<u8>>> {
    engine.get(key.as_ref()).map_err(CoreError::StoreRead)
}

/// Writes `value` at `key` in `engine`, wrapping engine failures.
pub(crate) fn write(engine: &dyn KvEngine, key: &StorageKey, value: &[u8]) -> CoreResult<()> {
    engine.put(key.as_ref(), value).map_err(CoreError::StoreWrite)
}
