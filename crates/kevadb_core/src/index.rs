//! The index facade used by the block processor.

use crate::ban::{clear_ban, set_ban, BanOutcome};
use crate::blocking::run_blocking;
use crate::codec::BanReason;
use crate::config::Config;
use crate::error::CoreResult;
use crate::gateway::{read, StoreGateway};
use crate::key::{derive_key, StorageKey};
use kevadb_storage::EngineFactory;
use std::fmt;

/// Script index keyed by truncated transaction hash.
///
/// `KevaIndex` owns the engine handle for its namespace. Initial indexing
/// (`put_script`, `put_script_batch`) is synchronous. Lookups and ban
/// transitions are `async` and run their engine calls on Tokio's blocking
/// pool so the caller's scheduler never blocks on I/O.
///
/// # Ordering
///
/// Calls on the same transaction are not serialized against each other.
/// Concurrent ban/unban/put on one key race as read-modify-write, last
/// writer wins; the caller is expected to process one block at a time.
///
/// # Example
///
/// ```rust,ignore
/// let factory = FileEngineFactory::new("db");
/// let mut index = KevaIndex::new(Config::new());
///
/// // Catching up: no fsync per commit
/// index.open_db(&factory, true)?;
/// index.put_script_batch(block_scripts)?;
/// index.close_db()?;
///
/// // Serving
/// index.open_db(&factory, false)?;
/// index.ban_transaction(&tx_hash, BanReason::new(1)).await?;
/// index.close_db()?;
/// ```
pub struct KevaIndex {
    config: Config,
    gateway: StoreGateway,
}

impl KevaIndex {
    /// Creates a closed index with `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let gateway = StoreGateway::new(config.namespace.clone());
        Self { config, gateway }
    }

    /// Returns the index configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true while the engine is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.gateway.is_open()
    }

    /// Opens the engine for the configured namespace.
    ///
    /// `for_sync` selects the bulk initial-sync mode and is passed to the
    /// factory on every open, so one index can be reopened in either mode.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreOpen`](crate::CoreError::StoreOpen) if the
    /// factory fails.
    pub fn open_db(&mut self, factory: &dyn EngineFactory, for_sync: bool) -> CoreResult<()> {
        self.gateway.open(factory, for_sync)
    }

    /// Closes the engine. A no-op when already closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to flush on close.
    pub fn close_db(&mut self) -> CoreResult<()> {
        self.gateway.close()
    }

    /// Stores `payload` for the transaction, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is too short, the index is
    /// closed, or the write fails.
    pub fn put_script(&self, identifier: &[u8], payload: &[u8]) -> CoreResult<()> {
        self.gateway.put(&derive_key(identifier)?, payload)
    }

    /// Stores every `(identifier, payload)` pair in one atomic batch.
    ///
    /// All identifiers are validated before anything is written.
    ///
    /// # Errors
    ///
    /// Returns an error if any identifier is too short, the index is closed,
    /// or the commit fails. No entry is visible after a failure.
    pub fn put_script_batch<I, T, P>(&self, entries: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (T, P)>,
        T: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        let keyed = entries
            .into_iter()
            .map(|(identifier, payload)| derive_key(identifier.as_ref()).map(|key| (key, payload)))
            .collect::<CoreResult<Vec<(StorageKey, P)>>>()?;
        self.gateway.batch_put(keyed)
    }

    /// Bans the transaction's script with `reason`.
    ///
    /// A missing or already banned script is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is too short, the index is
    /// closed, the engine fails, or the worker task fails.
    pub async fn ban_transaction(
        &self,
        identifier: &[u8],
        reason: BanReason,
    ) -> CoreResult<BanOutcome> {
        let key = derive_key(identifier)?;
        let engine = self.gateway.engine()?;
        run_blocking(move || set_ban(engine.as_ref(), &key, reason)).await
    }

    /// Blocking form of [`KevaIndex::ban_transaction`].
    ///
    /// # Errors
    ///
    /// Same as [`KevaIndex::ban_transaction`], minus worker failures.
    pub fn ban_transaction_sync(
        &self,
        identifier: &[u8],
        reason: BanReason,
    ) -> CoreResult<BanOutcome> {
        let key = derive_key(identifier)?;
        set_ban(self.gateway.engine()?.as_ref(), &key, reason)
    }

    /// Removes the ban from the transaction's script.
    ///
    /// A missing or unbanned script is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is too short, the index is
    /// closed, the engine fails, or the worker task fails.
    pub async fn unban_transaction(&self, identifier: &[u8]) -> CoreResult<BanOutcome> {
        let key = derive_key(identifier)?;
        let engine = self.gateway.engine()?;
        run_blocking(move || clear_ban(engine.as_ref(), &key)).await
    }

    /// Blocking form of [`KevaIndex::unban_transaction`].
    ///
    /// # Errors
    ///
    /// Same as [`KevaIndex::unban_transaction`], minus worker failures.
    pub fn unban_transaction_sync(&self, identifier: &[u8]) -> CoreResult<BanOutcome> {
        let key = derive_key(identifier)?;
        clear_ban(self.gateway.engine()?.as_ref(), &key)
    }

    /// Returns the stored value, ban header included, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is too short, the index is
    /// closed, the read fails, or the worker task fails.
    pub async fn get_script(&self, identifier: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        let key = derive_key(identifier)?;
        let engine = self.gateway.engine()?;
        run_blocking(move || read(engine.as_ref(), &key)).await
    }

    /// Blocking form of [`KevaIndex::get_script`].
    ///
    /// # Errors
    ///
    /// Same as [`KevaIndex::get_script`], minus worker failures.
    pub fn get_script_sync(&self, identifier: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        self.gateway.get(&derive_key(identifier)?)
    }
}

impl Default for KevaIndex {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for KevaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KevaIndex")
            .field("config", &self.config)
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl Drop for KevaIndex {
    fn drop(&mut self) {
        let _ = self.close_db();
    }
}
