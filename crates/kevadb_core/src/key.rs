//! Storage key derivation.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Number of transaction hash bytes used as the storage key.
///
/// Only the prefix is kept to save space; two hashes sharing it address
/// the same record.
pub const PARTIAL_TX_HASH: usize = 16;

/// The truncated transaction hash a record is stored under.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey([u8; PARTIAL_TX_HASH]);

impl StorageKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PARTIAL_TX_HASH]) -> Self {
        Self(bytes)
    }

    /// Returns the key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PARTIAL_TX_HASH] {
        &self.0
    }
}

impl AsRef<[u8]> for StorageKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({self})")
    }
}

/// Derives the storage key for a transaction hash.
///
/// # Errors
///
/// Returns [`CoreError::InvalidIdentifier`] if `identifier` is shorter
/// than [`PARTIAL_TX_HASH`].
pub fn derive_key(identifier: &[u8]) -> CoreResult<StorageKey> {
    identifier
        .get(..PARTIAL_TX_HASH)
        .and_then(|prefix| <[u8; PARTIAL_TX_HASH]>::try_from(prefix).ok())
        .map(StorageKey)
        .ok_or_else(|| CoreError::invalid_identifier(identifier.len(), PARTIAL_TX_HASH))
}
