//! # KevaDB Core
//!
//! Script index keyed by truncated transaction id, with an in-place ban tag.
//!
//! This crate provides:
//! - Key derivation: a transaction hash is stored under its first 16 bytes
//! - The ban tag codec: `[reason, 0xFF, 0xFF, 0xFF]` prefixed to a payload
//! - A gateway owning the engine handle for one namespace
//! - The ban/unban read-modify-write transitions
//! - [`KevaIndex`], the facade used by the indexer, whose reads and ban
//!   transitions run on Tokio's blocking pool
//!
//! ## Example
//!
//! ```rust
//! use kevadb_core::{BanReason, KevaIndex};
//! use kevadb_storage::InMemoryEngineFactory;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> kevadb_core::CoreResult<()> {
//! let factory = InMemoryEngineFactory::new();
//! let mut index = KevaIndex::default();
//! index.open_db(&factory, false)?;
//!
//! let tx_hash = [0xaa; 32];
//! index.put_script(&tx_hash, b"hello")?;
//! index.ban_transaction(&tx_hash, BanReason::new(7)).await?;
//!
//! let stored = index.get_script(&tx_hash).await?.unwrap();
//! assert!(kevadb_core::is_banned(&stored));
//! index.close_db()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod ban;
mod blocking;
mod codec;
mod config;
mod error;
mod gateway;
mod index;
mod key;

pub use ban::{clear_ban, set_ban, BanOutcome, RecordState};
pub use codec::{
    apply_ban, ban_reason, is_banned, payload, strip_ban, BanReason, BAN_GUARD, BAN_TAG_LEN,
};
pub use config::{check_db_version, Config, DB_VERSIONS, DEFAULT_NAMESPACE};
pub use error::{CoreError, CoreResult};
pub use gateway::StoreGateway;
pub use index::KevaIndex;
pub use key::{derive_key, StorageKey, PARTIAL_TX_HASH};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
