//! In-memory engine for testing.

use crate::batch::WriteBatch;
use crate::engine::{EngineFactory, KvEngine};
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Failures armed on an [`InMemoryEngine`].
#[derive(Debug, Default)]
struct FailPlan {
    /// Fail batch commits when the entry at this index is staged.
    batch_at: Option<usize>,
    /// Fail every single-key put.
    puts: bool,
}

/// An in-memory key-value engine.
///
/// This engine keeps everything in a sorted map and is suitable for:
/// - Unit tests
/// - Integration tests, including failure injection
/// - Ephemeral indexes that don't need persistence
///
/// # Thread Safety
///
/// This engine is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use kevadb_storage::{InMemoryEngine, KvEngine};
///
/// let engine = InMemoryEngine::new();
/// engine.put(b"key", b"value").unwrap();
/// assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
/// assert_eq!(engine.get(b"missing").unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: RwLock<bool>,
    fail: Mutex<FailPlan>,
}

impl InMemoryEngine {
    /// Creates a new empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or with `None`, disarms) a batch failure.
    ///
    /// While armed, every batch commit with more than `index` entries fails
    /// when the entry at `index` is staged, and nothing is applied.
    pub fn fail_batch_at(&self, index: Option<usize>) {
        self.fail.lock().batch_at = index;
    }

    /// Makes every single-key put fail while `fail` is true.
    pub fn fail_puts(&self, fail: bool) {
        self.fail.lock().puts = fail;
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns true once [`KvEngine::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    fn reopen(&self) {
        *self.closed.write() = false;
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if *self.closed.read() {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }
}

impl KvEngine for InMemoryEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;
        if self.fail.lock().puts {
            return Err(StorageError::Injected("put failure".into()));
        }
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        self.ensure_open()?;
        let fail_at = self.fail.lock().batch_at;

        // Stage everything first so a failure leaves the map untouched
        let mut staged = Vec::with_capacity(batch.len());
        for (index, entry) in batch.into_entries().into_iter().enumerate() {
            if fail_at == Some(index) {
                return Err(StorageError::Injected(format!(
                    "batch failure at entry {index}"
                )));
            }
            staged.push(entry);
        }

        let mut data = self.data.write();
        for (key, value) in staged {
            data.insert(key, value);
        }
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        *self.closed.write() = true;
        Ok(())
    }
}

/// Hands out one [`InMemoryEngine`] per namespace.
///
/// Reopening a namespace after close returns the same engine with its data
/// intact, mimicking a persistent store across restarts.
#[derive(Debug, Default)]
pub struct InMemoryEngineFactory {
    engines: Mutex<HashMap<String, Arc<InMemoryEngine>>>,
    fail_open: RwLock<bool>,
}

impl InMemoryEngineFactory {
    /// Creates a factory with no namespaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes [`EngineFactory::open`] fail while `fail` is true.
    pub fn fail_open(&self, fail: bool) {
        *self.fail_open.write() = fail;
    }

    /// Returns the concrete engine backing `namespace`, if it was ever opened.
    #[must_use]
    pub fn engine(&self, namespace: &str) -> Option<Arc<InMemoryEngine>> {
        self.engines.lock().get(namespace).cloned()
    }
}

impl EngineFactory for InMemoryEngineFactory {
    fn open(&self, namespace: &str, _for_sync: bool) -> StorageResult<Arc<dyn KvEngine>> {
        if *self.fail_open.read() {
            return Err(StorageError::Injected(format!("open failure: {namespace}")));
        }
        let engine = self
            .engines
            .lock()
            .entry(namespace.to_string())
            .or_default()
            .clone();
        engine.reopen();
        Ok(engine)
    }
}
