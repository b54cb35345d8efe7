//! CLI command implementations.

pub mod ban;
pub mod get;
pub mod import;
pub mod put;

use kevadb_core::{Config, KevaIndex};
use kevadb_storage::FileEngineFactory;
use std::path::Path;

/// Result type shared by the command implementations.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Opens the file-backed index rooted at `path`.
pub fn open_index(path: &Path, namespace: &str, for_sync: bool) -> CliResult<KevaIndex> {
    let factory = FileEngineFactory::new(path);
    let mut index = KevaIndex::new(Config::new().namespace(namespace));
    index.open_db(&factory, for_sync)?;
    Ok(index)
}

/// Parses a display-order transaction id into internal byte order.
pub fn parse_txid(txid: &str) -> CliResult<Vec<u8>> {
    let mut bytes = hex::decode(txid.trim()).map_err(|e| format!("invalid txid {txid:?}: {e}"))?;
    bytes.reverse();
    Ok(bytes)
}

/// Parses hex script bytes.
pub fn parse_script(script: &str) -> CliResult<Vec<u8>> {
    hex::decode(script.trim()).map_err(|e| format!("invalid script {script:?}: {e}").into())
}
