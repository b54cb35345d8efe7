//! Get command implementation.

use super::{parse_txid, CliResult};
use kevadb_core::{ban_reason, payload, KevaIndex};
use serde::Serialize;

/// A stored script as shown to the user.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ScriptView {
    /// Transaction id as given.
    pub txid: String,
    /// Whether the script carries a ban tag.
    pub banned: bool,
    /// Ban reason code, if banned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<u8>,
    /// Script bytes with any ban tag removed (hex).
    pub script: String,
    /// Raw stored value (hex).
    pub raw: String,
}

impl ScriptView {
    /// Builds the view of a stored value.
    pub fn new(txid: &str, value: &[u8]) -> Self {
        let reason = ban_reason(value).map(|r| r.code());
        Self {
            txid: txid.to_string(),
            banned: reason.is_some(),
            reason,
            script: hex::encode(payload(value)),
            raw: hex::encode(value),
        }
    }
}

/// Runs the get command.
pub async fn run(index: &KevaIndex, txid: &str, format: &str) -> CliResult<()> {
    let tx_hash = parse_txid(txid)?;
    let Some(value) = index.get_script(&tx_hash).await? else {
        return Err(format!("No script found for {txid}").into());
    };
    let view = ScriptView::new(txid, &value);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("Transaction: {}", view.txid);
        println!("Script:      {}", view.script);
        match view.reason {
            Some(reason) => println!("Banned:      yes (reason {reason})"),
            None => println!("Banned:      no"),
        }
    }
    Ok(())
}
