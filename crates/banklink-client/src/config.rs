use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Configuration for the banklink client.
#[derive(Parser, Debug, Clone)]
#[command(name = "banklink")]
#[command(about = "Link a bank account and sync its accounts and transactions")]
pub struct Config {
    /// Backend base address
    #[arg(long, default_value = banklink_http::DEFAULT_API_URL, env = "BANKLINK_API_URL")]
    pub api_url: String,

    /// Client name sent when requesting a link token
    #[arg(long, default_value = "", env = "BANKLINK_CLIENT_NAME")]
    pub client_name: String,

    /// Directory holding the persisted session
    #[arg(long, env = "BANKLINK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Keep session state in memory only
    #[arg(long, env = "BANKLINK_EPHEMERAL")]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Config {
    /// Get the effective session state directory.
    pub fn effective_state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("banklink")
                .join("session")
        })
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the current session
    Status,
    /// Request a link token and print it
    LinkToken,
    /// Exchange a public token from a completed link flow
    Link {
        /// Public token reported by the link flow
        #[arg(long)]
        public_token: String,

        /// Success metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Refresh accounts and transactions
    Sync,
    /// Clear the credential and synced data
    Reset,
    /// Interactive session (default)
    Shell,
}
