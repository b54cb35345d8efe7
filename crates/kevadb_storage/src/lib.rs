//! # KevaDB Storage
//!
//! Key-value engine trait and implementations for KevaDB.
//!
//! This crate is the lowest layer of KevaDB. Engines are **opaque byte
//! stores**: they map byte keys to byte values and know nothing about
//! transaction ids or ban tags.
//!
//! ## Design Principles
//!
//! - Engines offer point get, point put and an atomic multi-put batch
//! - Engines are opened per namespace through an [`EngineFactory`]
//! - Must be `Send + Sync` so a handle can be moved onto worker threads
//! - Last writer wins; there are no multi-key transactions
//!
//! ## Available Engines
//!
//! - [`InMemoryEngine`] - For testing, with failure injection
//! - [`FileEngine`] - Append-only log file with crash-consistent batches
//!
//! ## Example
//!
//! ```rust
//! use kevadb_storage::{EngineFactory, InMemoryEngineFactory, WriteBatch};
//!
//! let factory = InMemoryEngineFactory::new();
//! let engine = factory.open("keva", false).unwrap();
//!
//! let mut batch = WriteBatch::new();
//! batch.put(b"k1", b"v1");
//! batch.put(b"k2", b"v2");
//! engine.write_batch(batch).unwrap();
//!
//! assert_eq!(engine.get(b"k2").unwrap(), Some(b"v2".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod engine;
mod error;
mod file;
mod memory;
mod record;

pub use batch::WriteBatch;
pub use engine::{EngineFactory, KvEngine};
pub use error::{StorageError, StorageResult};
pub use file::{FileEngine, FileEngineFactory};
pub use memory::{InMemoryEngine, InMemoryEngineFactory};
