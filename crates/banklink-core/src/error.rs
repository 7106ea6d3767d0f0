use thiserror::Error;

/// Errors that can occur in the banklink client.
#[derive(Error, Debug)]
pub enum BankLinkError {
    #[error("Link initialization failed: {0}")]
    Initialization(String),

    #[error("Public token exchange failed: {0}")]
    Exchange(String),

    #[error("Sync failed: {0}")]
    Sync(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Corrupt value for '{field}': {reason}")]
    StoreCorruption { field: String, reason: String },

    #[error("No access credential held; link a bank account first")]
    NotLinked,

    #[error("Link widget error: {0}")]
    Widget(String),
}
