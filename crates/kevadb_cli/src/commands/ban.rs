//! Ban and unban command implementations.

use super::{parse_txid, CliResult};
use kevadb_core::{BanOutcome, BanReason, KevaIndex};
use tracing::info;

/// Runs the ban command.
pub async fn run_ban(index: &KevaIndex, txid: &str, reason: u8) -> CliResult<()> {
    let tx_hash = parse_txid(txid)?;
    let outcome = index
        .ban_transaction(&tx_hash, BanReason::new(reason))
        .await?;
    info!("Ban {}: {}", txid, describe(outcome));
    println!("{}", describe(outcome));
    Ok(())
}

/// Runs the unban command.
pub async fn run_unban(index: &KevaIndex, txid: &str) -> CliResult<()> {
    let tx_hash = parse_txid(txid)?;
    let outcome = index.unban_transaction(&tx_hash).await?;
    info!("Unban {}: {}", txid, describe(outcome));
    println!("{}", describe(outcome));
    Ok(())
}

fn describe(outcome: BanOutcome) -> &'static str {
    match outcome {
        BanOutcome::Applied => "banned",
        BanOutcome::Cleared => "unbanned",
        BanOutcome::AlreadyBanned => "already banned",
        BanOutcome::NotBanned => "not banned",
        BanOutcome::Absent => "no script for transaction",
    }
}
