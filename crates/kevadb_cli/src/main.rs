//! KevaDB CLI
//!
//! Command-line tools for a file-backed KevaDB script index.
//!
//! # Commands
//!
//! - `put` - Store a script for a transaction
//! - `get` - Show the stored script and its ban state
//! - `ban` / `unban` - Set or clear the ban tag
//! - `import` - Bulk-load `<txid> <script>` lines in one batch
//!
//! Transaction ids are given in display order (byte-reversed, as shown by
//! block explorers); scripts are plain hex.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// KevaDB command-line index tools.
#[derive(Parser)]
#[command(name = "kevadb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the index root directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Engine namespace of the index
    #[arg(global = true, short, long, default_value = kevadb_core::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Open in bulk initial-sync mode (no fsync per commit)
    #[arg(global = true, long)]
    for_sync: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a script for a transaction
    Put {
        /// Transaction id (hex, display order)
        txid: String,
        /// Script bytes (hex)
        script: String,
    },

    /// Show the stored script and its ban state
    Get {
        /// Transaction id (hex, display order)
        txid: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Ban a transaction's script
    Ban {
        /// Transaction id (hex, display order)
        txid: String,

        /// Policy reason code
        #[arg(short, long, default_value_t = 0)]
        reason: u8,
    },

    /// Remove the ban from a transaction's script
    Unban {
        /// Transaction id (hex, display order)
        txid: String,
    },

    /// Import `<txid> <script>` lines as one atomic batch
    Import {
        /// Input file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("KevaDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("KevaDB Core v{}", kevadb_core::VERSION);
        println!("Supported db versions: {:?}", kevadb_core::DB_VERSIONS);
        return Ok(());
    }

    let path = cli.path.ok_or("Index path required")?;
    let mut index = commands::open_index(&path, &cli.namespace, cli.for_sync)?;

    match cli.command {
        Commands::Put { txid, script } => commands::put::run(&index, &txid, &script)?,
        Commands::Get { txid, format } => commands::get::run(&index, &txid, &format).await?,
        Commands::Ban { txid, reason } => commands::ban::run_ban(&index, &txid, reason).await?,
        Commands::Unban { txid } => commands::ban::run_unban(&index, &txid).await?,
        Commands::Import { file } => commands::import::run(&index, &file)?,
        Commands::Version => {}
    }

    index.close_db()?;
    Ok(())
}
