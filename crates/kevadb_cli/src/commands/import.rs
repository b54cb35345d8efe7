//! Import command implementation.

use super::{parse_script, parse_txid, CliResult};
use kevadb_core::KevaIndex;
use std::fs;
use std::path::Path;
use tracing::info;

/// Parses `<txid> <script>` lines; blank lines and `#` comments are skipped.
pub fn parse_lines(input: &str) -> CliResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut entries = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(txid), script, None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(format!("line {}: expected `<txid> <script>`", number + 1).into());
        };
        entries.push((parse_txid(txid)?, parse_script(script.unwrap_or(""))?));
    }
    Ok(entries)
}

/// Runs the import command.
pub fn run(index: &KevaIndex, file: &Path) -> CliResult<()> {
    info!("Importing scripts from {:?}", file);
    let entries = parse_lines(&fs::read_to_string(file)?)?;
    let count = entries.len();
    index.put_script_batch(entries)?;
    info!("Imported {} scripts", count);
    println!("Imported {count} scripts");
    Ok(())
}
