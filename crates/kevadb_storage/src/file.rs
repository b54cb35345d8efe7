//! File-based engine for persistent storage.
//!
//! Each namespace lives in its own directory:
//!
//! ```text
//! <root>/<namespace>/
//! ├─ LOCK        # Advisory lock for single-owner access
//! └─ data.log    # Append-only commit log
//! ```
//!
//! # Recovery
//!
//! On open the log is replayed from the start. A record cut short by a
//! crash is a torn tail: it is truncated with a `warn!` and the engine opens
//! with every earlier commit. A complete record that fails its checksum
//! fails the open with `Corrupted`.
//!
//! A torn tail is recognised only by length, so a bit flip in the
//! `payload_len` of the last record that makes it claim more bytes than
//! the file holds reads the same as a crash mid-append. That record is
//! dropped with the warning rather than reported as corruption.
//!
//! A commit that fails to append or sync is cut back off the log before
//! the error is returned, so a failed commit never replays. If the cut
//! itself fails, the next commit truncates the log to the last good
//! length before appending.

use crate::batch::WriteBatch;
use crate::engine::{EngineFactory, KvEngine};
use crate::error::{StorageError, StorageResult};
use crate::record::{decode_record, encode_record};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const LOCK_FILE: &str = "LOCK";
const LOG_FILE: &str = "data.log";

/// A file-based key-value engine.
///
/// Commits are appended to a log and mirrored in an in-memory map that
/// serves reads. On open, the log is replayed to rebuild the map.
///
/// # Durability
///
/// - A batch is one log record, so after a crash it is either fully
///   replayed or dropped as a torn tail
/// - Unless opened `for_sync`, every commit is followed by `sync_data()`
/// - A commit that returns an error leaves nothing in the log or the map
///
/// # Example
///
/// ```no_run
/// use kevadb_storage::{FileEngine, KvEngine};
/// use std::path::Path;
///
/// let engine = FileEngine::open(Path::new("index/keva"), "keva", false).unwrap();
/// engine.put(b"key", b"value").unwrap();
/// engine.close().unwrap();
/// ```
#[derive(Debug)]
pub struct FileEngine {
    path: PathBuf,
    lock: Mutex<Option<File>>,
    log: Mutex<Log>,
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    closed: RwLock<bool>,
    sync_each_commit: bool,
    #[cfg(test)]
    faults: Mutex<Faults>,
}

/// The log file and the length of its committed prefix.
#[derive(Debug)]
struct Log {
    file: File,
    len: u64,
}

/// Failures injected into the next commit.
#[cfg(test)]
#[derive(Debug, Default)]
struct Faults {
    /// Write only this many bytes of the record, then fail.
    torn_write: Option<usize>,
    /// Fail the per-commit sync after a full write.
    fail_sync: bool,
}

impl FileEngine {
    /// Opens or creates the engine directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory or files cannot be created
    /// - Another process holds the lock (returns `Locked`)
    /// - A complete log record fails its checksum (returns `Corrupted`)
    pub fn open(path: &Path, namespace: &str, for_sync: bool) -> StorageResult<Self> {
        fs::create_dir_all(path)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked {
                namespace: namespace.to_string(),
            });
        }

        let mut log = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOG_FILE))?;
        let data = replay(&mut log)?;
        let len = log.metadata()?.len();
        debug!(namespace, keys = data.len(), len, for_sync, "replayed commit log");

        Ok(Self {
            path: path.to_path_buf(),
            lock: Mutex::new(Some(lock_file)),
            log: Mutex::new(Log { file: log, len }),
            data: RwLock::new(data),
            closed: RwLock::new(false),
            sync_each_commit: !for_sync,
            #[cfg(test)]
            faults: Mutex::new(Faults::default()),
        })
    }

    /// Returns the engine directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if every commit is synced before it is acknowledged.
    #[must_use]
    pub fn syncs_each_commit(&self) -> bool {
        self.sync_each_commit
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if *self.closed.read() {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }

    /// Appends one record and applies its entries to the map.
    fn commit(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> StorageResult<()> {
        self.ensure_open()?;
        let record = encode_record(entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())))?;

        // Holding the log lock across the map update keeps both in commit order
        let mut log = self.log.lock();
        let committed = log.len;
        if log.file.metadata()?.len() != committed {
            warn!(committed, "truncating uncommitted bytes from log");
            log.file.set_len(committed)?;
        }
        log.file.seek(SeekFrom::Start(committed))?;

        if let Err(err) = self.append(&mut log.file, &record) {
            match log.file.set_len(committed) {
                Ok(()) => warn!(error = %err, "commit failed, log rolled back"),
                Err(rollback) => {
                    warn!(error = %err, %rollback, "commit failed, log rollback failed");
                }
            }
            return Err(err);
        }
        log.len = committed + record.len() as u64;

        let mut data = self.data.write();
        for (key, value) in entries {
            data.insert(key, value);
        }
        Ok(())
    }

    fn append(&self, file: &mut File, record: &[u8]) -> StorageResult<()> {
        #[cfg(test)]
        if let Some(cut) = self.faults.lock().torn_write.take() {
            file.write_all(&record[..cut.min(record.len())])?;
            return Err(std::io::Error::other("injected torn write").into());
        }

        file.write_all(record)?;
        file.flush()?;
        if self.sync_each_commit {
            #[cfg(test)]
            if std::mem::take(&mut self.faults.lock().fail_sync) {
                return Err(std::io::Error::other("injected sync failure").into());
            }
            file.sync_data()?;
        }
        Ok(())
    }
}

/// Rebuilds the key map from the log, truncating a torn tail record.
///
/// A record whose header claims more bytes than remain is a torn tail,
/// whatever the cause.
fn replay(log: &mut File) -> StorageResult<HashMap<Vec<u8>, Vec<u8>>> {
    let mut buf = Vec::new();
    log.seek(SeekFrom::Start(0))?;
    log.read_to_end(&mut buf)?;

    let mut data = HashMap::new();
    let mut offset = 0;
    while offset < buf.len() {
        match decode_record(&buf[offset..])? {
            Some(record) => {
                offset += record.encoded_len;
                data.extend(record.entries);
            }
            None => {
                warn!(
                    offset,
                    discarded = buf.len() - offset,
                    "discarding torn tail record"
                );
                log.set_len(offset as u64)?;
                log.sync_all()?;
                break;
            }
        }
    }
    Ok(data)
}

impl KvEngine for FileEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.commit(vec![(key.to_vec(), value.to_vec())])
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return self.ensure_open();
        }
        self.commit(batch.into_entries())
    }

    fn close(&self) -> StorageResult<()> {
        let mut closed = self.closed.write();
        if *closed {
            return Ok(());
        }

        self.log.lock().file.sync_all()?;
        if let Some(lock_file) = self.lock.lock().take() {
            lock_file.unlock()?;
        }
        self.data.write().clear();

        *closed = true;
        Ok(())
    }
}

impl Drop for FileEngine {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Opens [`FileEngine`]s under a root directory, one subdirectory per namespace.
#[derive(Debug, Clone)]
pub struct FileEngineFactory {
    root: PathBuf,
}

impl FileEngineFactory {
    /// Creates a factory rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl EngineFactory for FileEngineFactory {
    fn open(&self, namespace: &str, for_sync: bool) -> StorageResult<Arc<dyn KvEngine>> {
        let engine = FileEngine::open(&self.root.join(namespace), namespace, for_sync)?;
        Ok(Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(&dir.path().join("keva"), "keva", false).unwrap();
        assert_eq!(engine.get(b"k").unwrap(), None);
        assert!(dir.path().join("keva").join(LOG_FILE).exists());
    }

    #[test]
    fn file_put_and_get() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
        engine.put(b"k", b"v1").unwrap();
        engine.put(b"k", b"v2").unwrap();
        assert_eq!(engine.get(b"k").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();

        {
            let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
            engine.put(b"single", b"one").unwrap();
            let mut batch = WriteBatch::new();
            batch.put(b"a", b"1");
            batch.put(b"b", b"2");
            batch.put(b"a", b"3");
            engine.write_batch(batch).unwrap();
            engine.close().unwrap();
        }

        {
            let engine = FileEngine::open(dir.path(), "keva", true).unwrap();
            assert_eq!(engine.get(b"single").unwrap(), Some(b"one".to_vec()));
            assert_eq!(engine.get(b"a").unwrap(), Some(b"3".to_vec()));
            assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
        }
    }

    #[test]
    fn file_torn_batch_is_discarded() {
        let dir = tempdir().unwrap();

        {
            let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
            engine.put(b"kept", b"yes").unwrap();
            engine.close().unwrap();
        }

        // Simulate a crash halfway through appending a batch record
        let record = encode_record([(&b"a"[..], &b"1"[..]), (&b"b"[..], &b"2"[..])]).unwrap();
        let log_path = dir.path().join(LOG_FILE);
        let clean_len = fs::metadata(&log_path).unwrap().len();
        {
            let mut log = OpenOptions::new().append(true).open(&log_path).unwrap();
            log.write_all(&record[..record.len() / 2]).unwrap();
        }

        let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
        assert_eq!(engine.get(b"kept").unwrap(), Some(b"yes".to_vec()));
        assert_eq!(engine.get(b"a").unwrap(), None);
        assert_eq!(engine.get(b"b").unwrap(), None);
        assert_eq!(fs::metadata(&log_path).unwrap().len(), clean_len);
    }

    #[test]
    fn file_corrupted_record_fails_open() {
        let dir = tempdir().unwrap();
        {
            let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
            engine.put(b"k", b"value").unwrap();
        }

        let log_path = dir.path().join(LOG_FILE);
        let mut bytes = fs::read(&log_path).unwrap();
        let last = bytes.len() - 6;
        bytes[last] ^= 0xFF;
        fs::write(&log_path, bytes).unwrap();

        let result = FileEngine::open(dir.path(), "keva", false);
        assert!(matches!(result, Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn file_lock_is_exclusive() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(dir.path(), "keva", false).unwrap();

        let second = FileEngine::open(dir.path(), "keva", false);
        assert!(matches!(second, Err(StorageError::Locked { .. })));

        engine.close().unwrap();
        assert!(FileEngine::open(dir.path(), "keva", false).is_ok());
    }

    #[test]
    fn file_closed_rejects_access() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
        engine.close().unwrap();
        engine.close().unwrap();
        assert!(matches!(engine.get(b"k"), Err(StorageError::Closed)));
        assert!(matches!(engine.put(b"k", b"v"), Err(StorageError::Closed)));
    }

    #[test]
    fn factory_uses_namespace_directories() {
        let dir = tempdir().unwrap();
        let factory = FileEngineFactory::new(dir.path());
        let keva = factory.open("keva", false).unwrap();
        let other = factory.open("other", false).unwrap();

        keva.put(b"k", b"v").unwrap();
        assert_eq!(other.get(b"k").unwrap(), None);
        assert!(factory.root().join("keva").join(LOCK_FILE).exists());
    }

    #[test]
    fn file_stray_tail_is_cut_before_next_commit() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(LOG_FILE);

        {
            let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
            engine.put(b"first", b"1").unwrap();

            // Part of a record left behind by an append that failed midway
            let record = encode_record([(&b"lost"[..], &[7u8; 64][..])]).unwrap();
            let mut log = OpenOptions::new().append(true).open(&log_path).unwrap();
            log.write_all(&record[..20]).unwrap();
            drop(log);

            engine.put(b"acked", b"2").unwrap();
            engine.close().unwrap();
        }

        let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
        assert_eq!(engine.get(b"first").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"acked").unwrap(), Some(b"2".to_vec()));
        assert_eq!(engine.get(b"lost").unwrap(), None);
    }

    #[test]
    fn file_torn_write_is_rolled_back() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(LOG_FILE);

        {
            let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
            engine.put(b"first", b"1").unwrap();
            let clean_len = fs::metadata(&log_path).unwrap().len();

            engine.faults.lock().torn_write = Some(20);
            let mut batch = WriteBatch::new();
            batch.put(b"lost", &[7u8; 64]);
            batch.put(b"also-lost", b"x");
            assert!(matches!(engine.write_batch(batch), Err(StorageError::Io(_))));
            assert_eq!(fs::metadata(&log_path).unwrap().len(), clean_len);
            assert_eq!(engine.get(b"lost").unwrap(), None);

            engine.put(b"acked", b"2").unwrap();
            engine.close().unwrap();
        }

        let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
        assert_eq!(engine.get(b"first").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"acked").unwrap(), Some(b"2".to_vec()));
        assert_eq!(engine.get(b"lost").unwrap(), None);
        assert_eq!(engine.get(b"also-lost").unwrap(), None);
    }

    #[test]
    fn file_failed_sync_is_rolled_back() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(LOG_FILE);

        {
            let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
            engine.put(b"first", b"1").unwrap();
            let clean_len = fs::metadata(&log_path).unwrap().len();

            engine.faults.lock().fail_sync = true;
            assert!(matches!(engine.put(b"unsynced", b"x"), Err(StorageError::Io(_))));
            assert_eq!(fs::metadata(&log_path).unwrap().len(), clean_len);
            assert_eq!(engine.get(b"unsynced").unwrap(), None);

            engine.put(b"acked", b"2").unwrap();
            engine.close().unwrap();
        }

        let engine = FileEngine::open(dir.path(), "keva", false).unwrap();
        assert_eq!(engine.get(b"acked").unwrap(), Some(b"2".to_vec()));
        assert_eq!(engine.get(b"unsynced").unwrap(), None);
    }

    #[test]
    fn file_for_sync_skips_commit_sync() {
        let dir = tempdir().unwrap();
        let bulk = FileEngine::open(dir.path(), "keva", true).unwrap();
        assert!(!bulk.syncs_each_commit());

        // No sync happens, so the sync fault never fires
        bulk.faults.lock().fail_sync = true;
        bulk.put(b"k", b"v").unwrap();
        bulk.close().unwrap();

        let serving = FileEngine::open(dir.path(), "keva", false).unwrap();
        assert!(serving.syncs_each_commit());
        assert_eq!(serving.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
