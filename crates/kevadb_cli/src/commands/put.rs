//! Put command implementation.

use super::{parse_script, parse_txid, CliResult};
use kevadb_core::KevaIndex;
use tracing::info;

/// Runs the put command.
pub fn run(index: &KevaIndex, txid: &str, script: &str) -> CliResult<()> {
    let tx_hash = parse_txid(txid)?;
    let script = parse_script(script)?;
    index.put_script(&tx_hash, &script)?;
    info!("Stored {} script bytes for {}", script.len(), txid);
    Ok(())
}
