use async_trait::async_trait;

use crate::error::BankLinkError;

/// Persistent text storage for the session fields.
///
/// Values are opaque strings keyed by fixed logical names. A key that was
/// never written reads as `None`, which callers distinguish from a value
/// that exists but cannot be decoded.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the backend identifier (e.g., "file", "memory").
    fn backend_name(&self) -> &'static str;

    /// Read a value. Returns `None` if nothing was ever stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, BankLinkError>;

    /// Write a value, replacing any previous one.
    async fn put(&self, key: &str, value: &str) -> Result<(), BankLinkError>;

    /// Remove a value.
    ///
    /// # Returns
    /// `true` if a value existed
    async fn delete(&self, key: &str) -> Result<bool, BankLinkError>;
}
